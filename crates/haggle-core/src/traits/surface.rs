// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat surface trait: the marketplace inbox as seen from the operator account.

use async_trait::async_trait;

use crate::error::HaggleError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ConversationHandle, ListingSnapshot, ObservedLine};

/// Source of observed conversations and sink for outgoing replies.
#[async_trait]
pub trait ChatSurface: PluginAdapter {
    /// Handles of every conversation currently listed in the inbox.
    async fn list_open_conversations(&self) -> Result<Vec<ConversationHandle>, HaggleError>;

    /// Listing header of one conversation.
    async fn extract_metadata(
        &self,
        handle: &ConversationHandle,
    ) -> Result<ListingSnapshot, HaggleError>;

    /// All visible chat lines, top to bottom.
    async fn extract_messages(
        &self,
        handle: &ConversationHandle,
    ) -> Result<Vec<ObservedLine>, HaggleError>;

    /// Sends `text` into the conversation. Returns `true` when the surface accepted it.
    async fn send(&self, handle: &ConversationHandle, text: &str) -> Result<bool, HaggleError>;

    /// Detailed listing description, if the surface exposes one.
    async fn extract_detailed_info(
        &self,
        _handle: &ConversationHandle,
    ) -> Result<Option<String>, HaggleError> {
        Ok(None)
    }
}
