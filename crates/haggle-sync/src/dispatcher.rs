// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sends a drafted reply and records it as outbound.

use haggle_core::{
    ConversationHandle, ConversationKey, Direction, DispatchOutcome, HaggleError, IngestOutcome,
    ObservedLine,
};
use tracing::{info, warn};

use crate::context::SyncContext;
use crate::reconciler::ingest_line;

/// Send `text` into the conversation, then ingest it as an outbound line.
///
/// Recording the reply closes the inbound messages it answers. When the store
/// already held the line the result is [`DispatchOutcome::AlreadyRecorded`];
/// the caller must not send it again. A send the surface refuses or fails is
/// [`DispatchOutcome::DeliveryFailed`], so only store errors come back as `Err`.
pub async fn dispatch(
    ctx: &SyncContext,
    handle: &ConversationHandle,
    key: &ConversationKey,
    text: &str,
) -> Result<DispatchOutcome, HaggleError> {
    match ctx.surface.send(handle, text).await {
        Ok(true) => {}
        Ok(false) => {
            warn!(listing_id = key.listing_id.as_str(), "chat surface refused the reply");
            return Ok(DispatchOutcome::DeliveryFailed);
        }
        Err(e) => {
            warn!(listing_id = key.listing_id.as_str(), error = %e, "failed to send reply");
            return Ok(DispatchOutcome::DeliveryFailed);
        }
    }

    let line = ObservedLine::new(Direction::Outbound, text);
    Ok(match ingest_line(ctx.store.as_ref(), key, &line).await? {
        IngestOutcome::Ingested => {
            info!(listing_id = key.listing_id.as_str(), "reply delivered");
            DispatchOutcome::Delivered
        }
        IngestOutcome::AlreadyIngested => DispatchOutcome::AlreadyRecorded,
        IngestOutcome::Unsupported => {
            warn!(
                listing_id = key.listing_id.as_str(),
                "reply delivered but the store did not record it"
            );
            DispatchOutcome::Delivered
        }
    })
}
