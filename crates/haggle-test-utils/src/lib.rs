// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Haggle integration tests.
//!
//! Provides mock adapters and a temp SQLite store so the sync engine can be
//! driven deterministically without a browser or a Langflow server.
//!
//! # Components
//!
//! - [`MockChatSurface`] - Scripted inbox with captured sends
//! - [`MockGenerator`] - Response generator with queued replies
//! - [`TestStore`] - [`SqliteStore`](haggle_storage::SqliteStore) in a temp directory

pub mod harness;
pub mod mock_generator;
pub mod mock_surface;

pub use harness::TestStore;
pub use mock_generator::MockGenerator;
pub use mock_surface::MockChatSurface;
