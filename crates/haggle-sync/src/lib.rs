// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message synchronization engine for Haggle.
//!
//! One [`SyncWorker`] drives the cycle: every open conversation on the
//! [`ChatSurface`](haggle_core::ChatSurface) is reconciled into the
//! [`ConversationStore`](haggle_core::ConversationStore) without duplicates,
//! the conversations still awaiting a reply are drafted by the
//! [`ResponseGenerator`](haggle_core::ResponseGenerator), and each draft is
//! sent and recorded so the next cycle sees it as answered.

pub mod context;
pub mod dispatcher;
pub mod link_cache;
pub mod metrics;
pub mod pending;
pub mod reconciler;
pub mod shutdown;
pub mod snapshot;
pub mod worker;

pub use context::SyncContext;
pub use dispatcher::dispatch;
pub use link_cache::{LinkCache, normalize_link};
pub use metrics::{CycleMetrics, SyncMetrics};
pub use pending::{pending_work, reply_context};
pub use reconciler::{ReconcileReport, ingest_line, reconcile_cycle};
pub use snapshot::SnapshotSurface;
pub use worker::SyncWorker;
