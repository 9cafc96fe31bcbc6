// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The work list: conversations still waiting for our reply.

use haggle_core::{Direction, HaggleError, PendingConversation, ReplyContext};

use crate::context::SyncContext;

/// Conversations of the account with open inbound messages.
///
/// Ordered by conversation id; each conversation keeps only its open inbound
/// messages ordered by id. Conversations left without any are omitted.
pub async fn pending_work(ctx: &SyncContext) -> Result<Vec<PendingConversation>, HaggleError> {
    let mut pending = ctx.store.list_pending(&ctx.account_email).await?;
    for conversation in &mut pending {
        conversation
            .messages
            .retain(|m| m.direction == Direction::Inbound && !m.answered);
        conversation.messages.sort_by_key(|m| m.id);
    }
    pending.retain(|c| !c.messages.is_empty());
    pending.sort_by_key(|c| c.conversation_id);
    Ok(pending)
}

/// Listing fields plus the open messages, as handed to the generator.
pub async fn reply_context(
    ctx: &SyncContext,
    pending: &PendingConversation,
) -> Result<ReplyContext, HaggleError> {
    let key = pending.key();
    let listing = ctx.store.listing_info(&key).await?.unwrap_or_default();
    Ok(ReplyContext {
        key,
        listing,
        pending: pending.messages.clone(),
    })
}
