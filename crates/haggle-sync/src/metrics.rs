// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-cycle counters and running totals of the sync worker.

use std::ops::AddAssign;

use chrono::{DateTime, Utc};
use tracing::info;

/// Counters for one sync cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleMetrics {
    pub messages_processed: u64,
    pub replies_sent: u64,
    pub errors: u64,
    pub conversations_skipped: u64,
    pub conversations_discovered: u64,
}

impl AddAssign for CycleMetrics {
    fn add_assign(&mut self, rhs: Self) {
        self.messages_processed += rhs.messages_processed;
        self.replies_sent += rhs.replies_sent;
        self.errors += rhs.errors;
        self.conversations_skipped += rhs.conversations_skipped;
        self.conversations_discovered += rhs.conversations_discovered;
    }
}

/// Totals since the worker started.
#[derive(Debug, Clone)]
pub struct SyncMetrics {
    pub started_at: DateTime<Utc>,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub cycles: u64,
    pub failed_cycles: u64,
    pub totals: CycleMetrics,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            last_cycle_at: None,
            cycles: 0,
            failed_cycles: 0,
            totals: CycleMetrics::default(),
        }
    }

    /// Fold a completed cycle into the totals and log both.
    pub fn record(&mut self, cycle: CycleMetrics) {
        self.cycles += 1;
        self.totals += cycle;
        self.last_cycle_at = Some(Utc::now());
        info!(
            messages_processed = cycle.messages_processed,
            replies_sent = cycle.replies_sent,
            errors = cycle.errors,
            skipped = cycle.conversations_skipped,
            discovered = cycle.conversations_discovered,
            "sync cycle complete"
        );
        info!(
            cycles = self.cycles,
            failed_cycles = self.failed_cycles,
            messages_processed = self.totals.messages_processed,
            replies_sent = self.totals.replies_sent,
            errors = self.totals.errors,
            uptime_secs = self.uptime_secs(),
            "sync totals"
        );
    }

    /// Count a cycle that aborted before finishing.
    pub fn record_failure(&mut self) {
        self.cycles += 1;
        self.failed_cycles += 1;
        self.totals.errors += 1;
        self.last_cycle_at = Some(Utc::now());
    }

    /// Seconds between start and the last finished cycle.
    pub fn uptime_secs(&self) -> i64 {
        self.last_cycle_at
            .map(|last| (last - self.started_at).num_seconds())
            .unwrap_or(0)
    }
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_accumulate_across_cycles() {
        let mut metrics = SyncMetrics::new();
        metrics.record(CycleMetrics {
            messages_processed: 3,
            replies_sent: 1,
            ..Default::default()
        });
        metrics.record(CycleMetrics {
            messages_processed: 2,
            errors: 1,
            ..Default::default()
        });

        assert_eq!(metrics.cycles, 2);
        assert_eq!(metrics.totals.messages_processed, 5);
        assert_eq!(metrics.totals.replies_sent, 1);
        assert_eq!(metrics.totals.errors, 1);
        assert!(metrics.last_cycle_at.is_some());
    }

    #[test]
    fn failed_cycle_counts_as_error() {
        let mut metrics = SyncMetrics::new();
        metrics.record_failure();
        assert_eq!(metrics.failed_cycles, 1);
        assert_eq!(metrics.totals.errors, 1);
        assert!(metrics.uptime_secs() >= 0);
    }
}
