// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The polling loop: reconcile, list pending, draft, dispatch, sleep.

use std::time::Duration;

use haggle_config::model::SyncConfig;
use haggle_core::{DispatchOutcome, HaggleError, PendingConversation, ResponseGenerator};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::context::SyncContext;
use crate::dispatcher::dispatch;
use crate::link_cache::LinkCache;
use crate::metrics::{CycleMetrics, SyncMetrics};
use crate::pending::{pending_work, reply_context};
use crate::reconciler::{ReconcileReport, reconcile_cycle};

/// What happened to one pending conversation.
enum Answer {
    /// Not open on the surface this cycle; retried on a later cycle.
    NotOpen,
    /// The generator produced no usable text.
    NoDraft,
    Dispatched(DispatchOutcome),
}

/// Single logical worker synchronizing one account.
pub struct SyncWorker {
    ctx: SyncContext,
    links: LinkCache,
    metrics: SyncMetrics,
    interval: Duration,
    cooldown: Duration,
}

impl SyncWorker {
    pub fn new(ctx: SyncContext, links: LinkCache, config: &SyncConfig) -> Self {
        Self {
            ctx,
            links,
            metrics: SyncMetrics::new(),
            interval: Duration::from_secs(config.cycle_interval_secs),
            cooldown: Duration::from_secs(config.error_cooldown_secs),
        }
    }

    /// Override the pause after a cycle and the cooldown after a failed one.
    pub fn with_timing(mut self, interval: Duration, cooldown: Duration) -> Self {
        self.interval = interval;
        self.cooldown = cooldown;
        self
    }

    pub fn metrics(&self) -> &SyncMetrics {
        &self.metrics
    }

    pub fn links(&self) -> &LinkCache {
        &self.links
    }

    /// Run cycles until `cancel` fires.
    ///
    /// Cancellation is only observed between cycles: a running cycle always
    /// finishes before the worker stops.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), HaggleError> {
        info!(
            account = self.ctx.account_email.as_str(),
            interval_secs = self.interval.as_secs(),
            drafting = self.ctx.generator.is_some(),
            "sync worker running"
        );

        while !cancel.is_cancelled() {
            let pause = match self.run_cycle().await {
                Ok(cycle) => {
                    self.metrics.record(cycle);
                    self.interval
                }
                Err(e) => {
                    error!(error = %e, cooldown_secs = self.cooldown.as_secs(), "sync cycle failed");
                    self.metrics.record_failure();
                    self.cooldown
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = cancel.cancelled() => {}
            }
        }

        if self.links.is_dirty() {
            self.links.persist()?;
        }
        info!(cycles = self.metrics.cycles, "sync worker stopped");
        Ok(())
    }

    /// One full cycle.
    ///
    /// Returns an error only when the whole cycle must be abandoned; failures
    /// of individual conversations are counted in the returned metrics.
    pub async fn run_cycle(&mut self) -> Result<CycleMetrics, HaggleError> {
        let report = reconcile_cycle(&self.ctx, &mut self.links).await?;
        let mut cycle = CycleMetrics {
            messages_processed: report.messages_ingested,
            errors: report.skipped,
            conversations_skipped: report.skipped,
            conversations_discovered: report.discovered,
            ..Default::default()
        };

        let Some(generator) = self.ctx.generator.clone() else {
            return Ok(cycle);
        };

        let pending = pending_work(&self.ctx).await?;
        debug!(count = pending.len(), "pending conversations");
        for conversation in &pending {
            match self.answer(generator.as_ref(), &report, conversation).await {
                Ok(Answer::Dispatched(DispatchOutcome::Delivered)) => cycle.replies_sent += 1,
                Ok(Answer::Dispatched(DispatchOutcome::AlreadyRecorded)) => {
                    debug!(listing_id = conversation.listing_id.as_str(), "reply already recorded");
                }
                Ok(Answer::Dispatched(DispatchOutcome::DeliveryFailed) | Answer::NoDraft) => {
                    cycle.errors += 1;
                }
                Ok(Answer::NotOpen) => {}
                Err(e) if e.is_store_outage() => return Err(e),
                Err(e) => {
                    warn!(
                        listing_id = conversation.listing_id.as_str(),
                        error = %e,
                        "failed to answer conversation"
                    );
                    cycle.errors += 1;
                }
            }
        }
        Ok(cycle)
    }

    /// Draft and send one reply covering every open message of `conversation`.
    async fn answer(
        &self,
        generator: &dyn ResponseGenerator,
        report: &ReconcileReport,
        conversation: &PendingConversation,
    ) -> Result<Answer, HaggleError> {
        let Some(handle) = report.handles.get(&conversation.listing_id) else {
            debug!(
                listing_id = conversation.listing_id.as_str(),
                "pending conversation is not open on the surface"
            );
            return Ok(Answer::NotOpen);
        };

        let context = reply_context(&self.ctx, conversation).await?;
        let Some(reply) = generator.draft(&context).await.map_err(generator_failure)? else {
            warn!(listing_id = conversation.listing_id.as_str(), "no reply drafted");
            return Ok(Answer::NoDraft);
        };
        dispatch(&self.ctx, handle, &context.key, &reply)
            .await
            .map(Answer::Dispatched)
    }
}

/// Generator failures never count as a store outage.
fn generator_failure(e: HaggleError) -> HaggleError {
    match e {
        HaggleError::Generator { .. } => e,
        other => HaggleError::Generator {
            message: other.to_string(),
            source: Some(Box::new(other)),
        },
    }
}
