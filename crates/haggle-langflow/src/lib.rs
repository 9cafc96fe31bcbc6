// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Langflow-backed [`ResponseGenerator`](haggle_core::ResponseGenerator).
//!
//! The flow receives the listing fields and the open counterparty messages as
//! one comma-separated `input_value` and answers with a chat message. HTTP 429
//! backs off exponentially; 5xx replies and network failures are retried under
//! the same budget.

pub mod client;
pub mod payload;

pub use client::{LangflowGenerator, normalize_run_url};
pub use payload::{RunRequest, extract_reply_text};
