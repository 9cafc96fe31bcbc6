// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite conversation store.
//!
//! WAL-mode SQLite with embedded migrations and a single-writer connection
//! via `tokio-rusqlite`. Every ingest runs in one transaction, which is what
//! keeps `(conversation, direction, text)` unique without a global lock.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStore;
pub use database::Database;
