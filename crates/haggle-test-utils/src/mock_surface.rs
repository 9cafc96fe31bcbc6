// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat surface for deterministic sync tests.
//!
//! `MockChatSurface` implements `ChatSurface` over an in-memory inbox.
//! Accepted sends are captured and also appended to the conversation as
//! outbound lines, the way a real chat renders the reply on the next read.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use haggle_core::{
    AdapterType, ChatSurface, ConversationHandle, Direction, HaggleError, HealthStatus,
    ListingSnapshot, ObservedLine, PluginAdapter,
};

#[derive(Debug, Clone)]
struct MockConversation {
    handle: ConversationHandle,
    snapshot: ListingSnapshot,
    lines: Vec<ObservedLine>,
    detailed_info: Option<String>,
    broken: bool,
}

/// An inbox whose conversations are scripted by the test.
pub struct MockChatSurface {
    conversations: Arc<Mutex<Vec<MockConversation>>>,
    sent: Arc<Mutex<Vec<(ConversationHandle, String)>>>,
    accept_sends: Arc<Mutex<bool>>,
}

impl MockChatSurface {
    pub fn new() -> Self {
        Self {
            conversations: Arc::new(Mutex::new(Vec::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            accept_sends: Arc::new(Mutex::new(true)),
        }
    }

    /// Add a conversation with listing `listing_id` and the given lines.
    ///
    /// The handle is `chat-<listing_id>`.
    pub async fn add_conversation(
        &self,
        listing_id: &str,
        lines: Vec<ObservedLine>,
    ) -> ConversationHandle {
        let handle = ConversationHandle(format!("chat-{listing_id}"));
        self.conversations.lock().await.push(MockConversation {
            handle: handle.clone(),
            snapshot: ListingSnapshot {
                listing_id: listing_id.to_string(),
                seller_name: format!("seller {listing_id}"),
                title: format!("listing {listing_id}"),
                price: "100 €".to_string(),
            },
            lines,
            detailed_info: None,
            broken: false,
        });
        handle
    }

    /// Append a line as if the counterparty (or we) just wrote it.
    pub async fn push_line(&self, handle: &ConversationHandle, line: ObservedLine) {
        if let Some(conv) = find_mut(&mut self.conversations.lock().await, handle) {
            conv.lines.push(line);
        }
    }

    pub async fn set_detailed_info(&self, handle: &ConversationHandle, info: &str) {
        if let Some(conv) = find_mut(&mut self.conversations.lock().await, handle) {
            conv.detailed_info = Some(info.to_string());
        }
    }

    /// Make every extraction from `handle` fail.
    pub async fn break_conversation(&self, handle: &ConversationHandle) {
        if let Some(conv) = find_mut(&mut self.conversations.lock().await, handle) {
            conv.broken = true;
        }
    }

    /// Make `send` report that the surface refused the message.
    pub async fn reject_sends(&self) {
        *self.accept_sends.lock().await = false;
    }

    /// Every accepted send, in order.
    pub async fn sent_messages(&self) -> Vec<(ConversationHandle, String)> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    async fn conversation(
        &self,
        handle: &ConversationHandle,
    ) -> Result<MockConversation, HaggleError> {
        let conversations = self.conversations.lock().await;
        let conv = conversations
            .iter()
            .find(|c| &c.handle == handle)
            .ok_or_else(|| HaggleError::Extraction {
                handle: handle.to_string(),
                message: "unknown conversation".to_string(),
            })?;
        if conv.broken {
            return Err(HaggleError::Extraction {
                handle: handle.to_string(),
                message: "page did not load".to_string(),
            });
        }
        Ok(conv.clone())
    }
}

fn find_mut<'a>(
    conversations: &'a mut [MockConversation],
    handle: &ConversationHandle,
) -> Option<&'a mut MockConversation> {
    conversations.iter_mut().find(|c| &c.handle == handle)
}

impl Default for MockChatSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChatSurface {
    fn name(&self) -> &str {
        "mock-surface"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ChatSurface
    }

    async fn health_check(&self) -> Result<HealthStatus, HaggleError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HaggleError> {
        Ok(())
    }
}

#[async_trait]
impl ChatSurface for MockChatSurface {
    async fn list_open_conversations(&self) -> Result<Vec<ConversationHandle>, HaggleError> {
        Ok(self
            .conversations
            .lock()
            .await
            .iter()
            .map(|c| c.handle.clone())
            .collect())
    }

    async fn extract_metadata(
        &self,
        handle: &ConversationHandle,
    ) -> Result<ListingSnapshot, HaggleError> {
        Ok(self.conversation(handle).await?.snapshot)
    }

    async fn extract_messages(
        &self,
        handle: &ConversationHandle,
    ) -> Result<Vec<ObservedLine>, HaggleError> {
        Ok(self.conversation(handle).await?.lines)
    }

    async fn send(&self, handle: &ConversationHandle, text: &str) -> Result<bool, HaggleError> {
        if !*self.accept_sends.lock().await {
            return Ok(false);
        }
        self.conversation(handle).await?;
        self.sent
            .lock()
            .await
            .push((handle.clone(), text.to_string()));
        self.push_line(handle, ObservedLine::new(Direction::Outbound, text))
            .await;
        Ok(true)
    }

    async fn extract_detailed_info(
        &self,
        handle: &ConversationHandle,
    ) -> Result<Option<String>, HaggleError> {
        Ok(self.conversation(handle).await?.detailed_info)
    }
}
