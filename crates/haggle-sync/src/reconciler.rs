// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconciles what the chat surface shows with what the store holds.

use std::collections::HashMap;

use haggle_core::{
    ConversationHandle, ConversationKey, ConversationStore, HaggleError, IngestOutcome,
    ListingSnapshot, MetadataWrite, ObservedLine,
};
use tracing::{debug, info, warn};

use crate::context::SyncContext;
use crate::link_cache::LinkCache;

/// Result of reconciling every open conversation once.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Conversations fully reconciled.
    pub conversations: u64,
    /// Lines newly written to the store.
    pub messages_ingested: u64,
    /// Lines already present in the store.
    pub messages_known: u64,
    /// Conversations skipped after an extraction or per-conversation store failure.
    pub skipped: u64,
    /// Handles seen for the first time.
    pub discovered: u64,
    /// Surface handle of each reconciled listing, used to send replies.
    pub handles: HashMap<String, ConversationHandle>,
}

#[derive(Debug, Default)]
struct ConversationTally {
    ingested: u64,
    known: u64,
}

/// Record one observed line unless an identical one is already stored.
///
/// Ingestion also closes every open message of the opposite direction.
pub async fn ingest_line(
    store: &dyn ConversationStore,
    key: &ConversationKey,
    line: &ObservedLine,
) -> Result<IngestOutcome, HaggleError> {
    if store.message_exists(key, line.direction, &line.text).await? {
        return Ok(IngestOutcome::AlreadyIngested);
    }
    store.ingest_message(key, line.direction, &line.text).await
}

/// Reconcile every open conversation of the surface.
///
/// A failure confined to one conversation is logged and the conversation is
/// skipped. Failing to list the inbox, or a store error that means the store
/// is unreachable, aborts the cycle with that error.
pub async fn reconcile_cycle(
    ctx: &SyncContext,
    links: &mut LinkCache,
) -> Result<ReconcileReport, HaggleError> {
    let handles = ctx.surface.list_open_conversations().await?;
    debug!(count = handles.len(), "open conversations listed");

    let mut report = ReconcileReport::default();
    for handle in handles {
        if links.add(handle.0.clone()) {
            info!(handle = %handle, "new conversation discovered");
            report.discovered += 1;
        }

        let snapshot = match ctx.surface.extract_metadata(&handle).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(handle = %handle, error = %e, "skipping conversation, metadata unavailable");
                report.skipped += 1;
                continue;
            }
        };

        match sync_conversation(ctx, &handle, &snapshot).await {
            Ok(tally) => {
                report.conversations += 1;
                report.messages_ingested += tally.ingested;
                report.messages_known += tally.known;
                report.handles.insert(snapshot.listing_id.clone(), handle);
            }
            Err(e) if e.is_store_outage() => return Err(e),
            Err(e) => {
                warn!(
                    handle = %handle,
                    listing_id = snapshot.listing_id.as_str(),
                    error = %e,
                    "skipping conversation"
                );
                report.skipped += 1;
            }
        }
    }

    if links.is_dirty() {
        if let Err(e) = links.persist() {
            warn!(error = %e, "failed to persist link cache");
        }
    }
    Ok(report)
}

async fn sync_conversation(
    ctx: &SyncContext,
    handle: &ConversationHandle,
    snapshot: &ListingSnapshot,
) -> Result<ConversationTally, HaggleError> {
    if snapshot.listing_id.trim().is_empty() {
        return Err(HaggleError::Extraction {
            handle: handle.to_string(),
            message: "listing id is empty".to_string(),
        });
    }
    let key = ctx.key_for(&snapshot.listing_id);

    if ctx.store.ensure_conversation(&key).await? {
        info!(listing_id = key.listing_id.as_str(), "conversation created");
    }
    if ctx.store.update_listing_info(&key, &snapshot.info()).await? == MetadataWrite::Skipped {
        debug!(listing_id = key.listing_id.as_str(), "listing info not recorded");
    }
    record_detailed_info(ctx, handle, &key).await?;

    let lines = ctx
        .surface
        .extract_messages(handle)
        .await
        .map_err(|e| surface_failure(handle, e))?;
    let mut tally = ConversationTally::default();
    for line in lines.iter().filter(|l| !l.text.trim().is_empty()) {
        match ingest_line(ctx.store.as_ref(), &key, line).await? {
            IngestOutcome::Ingested => {
                debug!(
                    listing_id = key.listing_id.as_str(),
                    direction = %line.direction,
                    "message ingested"
                );
                tally.ingested += 1;
            }
            IngestOutcome::AlreadyIngested => tally.known += 1,
            IngestOutcome::Unsupported => {
                warn!(listing_id = key.listing_id.as_str(), "store cannot ingest messages");
            }
        }
    }
    Ok(tally)
}

/// Surface errors are local to one conversation, whatever variant the surface chose.
fn surface_failure(handle: &ConversationHandle, e: HaggleError) -> HaggleError {
    match e {
        HaggleError::Extraction { .. } => e,
        other => HaggleError::Extraction {
            handle: handle.to_string(),
            message: other.to_string(),
        },
    }
}

/// Write the detailed listing description once, when the surface has one.
async fn record_detailed_info(
    ctx: &SyncContext,
    handle: &ConversationHandle,
    key: &ConversationKey,
) -> Result<(), HaggleError> {
    let already_set = ctx
        .store
        .listing_info(key)
        .await?
        .and_then(|details| details.searched_info)
        .is_some_and(|info| !info.trim().is_empty());
    if already_set {
        return Ok(());
    }

    let info = match ctx.surface.extract_detailed_info(handle).await {
        Ok(Some(info)) if !info.trim().is_empty() => info,
        Ok(_) => return Ok(()),
        Err(e) => {
            warn!(listing_id = key.listing_id.as_str(), error = %e, "detailed info unavailable");
            return Ok(());
        }
    };
    if ctx.store.set_searched_info(key, &info).await? == MetadataWrite::Written {
        info!(listing_id = key.listing_id.as_str(), "detailed listing info recorded");
    }
    Ok(())
}
