// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives: one parameterized retry policy used by the store
//! client and the response generator alike.

pub mod retry;

pub use retry::{DelayStrategy, RetryPolicy};
