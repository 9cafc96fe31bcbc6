// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation store trait, implemented by the local SQLite store and by
//! the HTTP client of the persistence API.

use async_trait::async_trait;

use crate::error::HaggleError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    ConversationKey, ConversationThread, Direction, IngestOutcome, ListingDetails, ListingInfo,
    MessageFilter, MetadataWrite, PendingConversation,
};

/// Durable record of conversations and their directional messages.
///
/// Implementations must make [`ingest_message`](ConversationStore::ingest_message)
/// idempotent on `(conversation, direction, text)` and must close every open
/// message of the opposite direction when a new message is recorded.
#[async_trait]
pub trait ConversationStore: PluginAdapter {
    /// Creates the conversation if absent. Returns `true` when it was created.
    async fn ensure_conversation(&self, key: &ConversationKey) -> Result<bool, HaggleError>;

    /// Whether a message with exactly this direction and text exists.
    /// An unknown conversation yields `false`.
    async fn message_exists(
        &self,
        key: &ConversationKey,
        direction: Direction,
        text: &str,
    ) -> Result<bool, HaggleError>;

    /// Records one observed chat line, creating the conversation on demand.
    async fn ingest_message(
        &self,
        key: &ConversationKey,
        direction: Direction,
        text: &str,
    ) -> Result<IngestOutcome, HaggleError>;

    /// Conversations of `account_email` holding at least one open inbound message.
    async fn list_pending(
        &self,
        account_email: &str,
    ) -> Result<Vec<PendingConversation>, HaggleError>;

    /// Filtered view of conversations and their messages.
    async fn list_messages(
        &self,
        account_email: &str,
        filter: &MessageFilter,
    ) -> Result<Vec<ConversationThread>, HaggleError>;

    /// Overwrites the seller, title, and price fields.
    async fn update_listing_info(
        &self,
        key: &ConversationKey,
        info: &ListingInfo,
    ) -> Result<MetadataWrite, HaggleError>;

    /// Stored listing fields, or `None` when the conversation is unknown.
    async fn listing_info(
        &self,
        key: &ConversationKey,
    ) -> Result<Option<ListingDetails>, HaggleError>;

    /// Writes the detailed description unless one is already present.
    async fn set_searched_info(
        &self,
        key: &ConversationKey,
        info: &str,
    ) -> Result<MetadataWrite, HaggleError>;
}
