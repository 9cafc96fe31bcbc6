// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the persistence API.
//!
//! Every call goes through one [`RetryPolicy`](haggle_resilience::RetryPolicy):
//! timeouts, connection failures, and 5xx replies are retried; 404 becomes
//! [`ApiReply::Unsupported`]; other 4xx replies fail immediately.

pub mod call;
pub mod client;

pub use call::ApiCall;
pub use client::{ApiReply, StoreClient};
