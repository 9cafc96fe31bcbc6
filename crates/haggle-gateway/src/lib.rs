// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST backend exposing the SQLite conversation store over HTTP.
//!
//! Routes keep the original marketplace-facing names (`/criar-conversa`,
//! `/conversas/pendentes`, ...) so existing scrapers keep working.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{bind, router, serve, GatewayState};
