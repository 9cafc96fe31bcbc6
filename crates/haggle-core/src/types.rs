// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the store, the sync engine, and the REST surface.
//!
//! Serde field names follow the persistence API wire format (`anuncio_id`,
//! `tipo`, `respondida`, ...), so the gateway and the client agree on one
//! definition.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::HaggleError;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Store,
    ChatSurface,
    Generator,
}

/// Direction of a chat line relative to the operator account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum Direction {
    /// Written by the counterparty ("recebida").
    #[serde(rename = "recebida")]
    #[strum(serialize = "recebida")]
    Inbound,
    /// Written by the operator ("enviada").
    #[serde(rename = "enviada")]
    #[strum(serialize = "enviada")]
    Outbound,
}

impl Direction {
    /// The direction whose open messages are closed by a message of this direction.
    pub fn opposite(self) -> Self {
        match self {
            Direction::Inbound => Direction::Outbound,
            Direction::Outbound => Direction::Inbound,
        }
    }

    /// Wire value used by the persistence API and the `mensagens.tipo` column.
    pub fn as_wire(self) -> &'static str {
        match self {
            Direction::Inbound => "recebida",
            Direction::Outbound => "enviada",
        }
    }

    /// Parse a wire value, rejecting anything other than `recebida`/`enviada`.
    pub fn parse_wire(value: &str) -> Result<Self, HaggleError> {
        Direction::from_str(value)
            .map_err(|_| HaggleError::Validation(format!("unknown message direction `{value}`")))
    }
}

/// Identifier assigned by the store to a conversation.
pub type ConversationId = i64;

/// Identifier assigned by the store to a message.
pub type MessageId = i64;

/// Unique composite key of a conversation: one thread per account and listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    /// Operator account e-mail.
    #[serde(rename = "email")]
    pub account_email: String,
    /// Marketplace listing identifier.
    #[serde(rename = "anuncio_id")]
    pub listing_id: String,
}

impl ConversationKey {
    pub fn new(account_email: impl Into<String>, listing_id: impl Into<String>) -> Self {
        Self {
            account_email: account_email.into(),
            listing_id: listing_id.into(),
        }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.account_email, self.listing_id)
    }
}

/// One negotiation thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    #[serde(rename = "email")]
    pub account_email: String,
    #[serde(rename = "anuncio_id")]
    pub listing_id: String,
    #[serde(rename = "nome_vendedor", default)]
    pub seller_name: Option<String>,
    #[serde(rename = "titulo_anuncio", default)]
    pub title: Option<String>,
    #[serde(rename = "preco_anuncio", default)]
    pub price: Option<String>,
    /// Detailed listing description, written at most once.
    #[serde(default)]
    pub searched_info: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Conversation {
    pub fn key(&self) -> ConversationKey {
        ConversationKey::new(&self.account_email, &self.listing_id)
    }
}

/// One directional chat line within a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    #[serde(rename = "conversa_id")]
    pub conversation_id: ConversationId,
    #[serde(rename = "tipo")]
    pub direction: Direction,
    #[serde(rename = "mensagem")]
    pub text: String,
    /// Closed by the next opposite-direction message; never reopened.
    #[serde(rename = "respondida")]
    pub answered: bool,
    #[serde(default)]
    pub created_at: String,
}

/// A conversation together with its open inbound messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingConversation {
    #[serde(rename = "id")]
    pub conversation_id: ConversationId,
    #[serde(rename = "email")]
    pub account_email: String,
    #[serde(rename = "anuncio_id")]
    pub listing_id: String,
    #[serde(rename = "mensagens")]
    pub messages: Vec<Message>,
}

impl PendingConversation {
    pub fn key(&self) -> ConversationKey {
        ConversationKey::new(&self.account_email, &self.listing_id)
    }
}

/// A conversation with the messages selected by a [`MessageFilter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationThread {
    #[serde(flatten)]
    pub conversation: Conversation,
    #[serde(rename = "mensagens")]
    pub messages: Vec<Message>,
}

/// Optional filters for the message listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    pub direction: Option<Direction>,
    pub conversation_id: Option<ConversationId>,
    pub listing_id: Option<String>,
    pub answered: Option<bool>,
    /// `Some(true)` keeps conversations with detailed info, `Some(false)` those without.
    pub has_searched_info: Option<bool>,
}

/// Listing fields scraped from the chat surface header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingInfo {
    #[serde(rename = "nome_vendedor")]
    pub seller_name: String,
    #[serde(rename = "titulo_anuncio")]
    pub title: String,
    #[serde(rename = "preco_anuncio")]
    pub price: String,
}

/// Listing fields as stored, all optional until first written.
///
/// Unset fields are omitted on the wire, so an unknown conversation reads as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingDetails {
    #[serde(rename = "nome_vendedor", default, skip_serializing_if = "Option::is_none")]
    pub seller_name: Option<String>,
    #[serde(rename = "titulo_anuncio", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "preco_anuncio", default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searched_info: Option<String>,
}

impl ListingDetails {
    pub fn is_empty(&self) -> bool {
        self.seller_name.is_none()
            && self.title.is_none()
            && self.price.is_none()
            && self.searched_info.is_none()
    }
}

/// Result of creating a conversation that may already exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(Conversation),
    AlreadyExists(Conversation),
}

impl CreateOutcome {
    pub fn conversation(&self) -> &Conversation {
        match self {
            CreateOutcome::Created(c) | CreateOutcome::AlreadyExists(c) => c,
        }
    }
}

/// Result of ingesting one observed chat line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new message row was written and the opposite direction closed.
    Ingested,
    /// The same (conversation, direction, text) was already stored.
    AlreadyIngested,
    /// The remote store does not offer the ingestion endpoint; nothing was recorded.
    Unsupported,
}

/// Result of a metadata write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataWrite {
    Written,
    /// Write-once field already had a value; nothing changed.
    AlreadySet,
    /// Conversation unknown to the store or endpoint unsupported.
    Skipped,
}

/// Opaque reference to a conversation entry point on the chat surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationHandle(pub String);

impl fmt::Display for ConversationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Listing header as extracted from the chat surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSnapshot {
    pub listing_id: String,
    pub seller_name: String,
    pub title: String,
    pub price: String,
}

impl ListingSnapshot {
    pub fn info(&self) -> ListingInfo {
        ListingInfo {
            seller_name: self.seller_name.clone(),
            title: self.title.clone(),
            price: self.price.clone(),
        }
    }
}

/// One chat line as rendered on the surface, in top-to-bottom order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedLine {
    pub direction: Direction,
    pub text: String,
}

impl ObservedLine {
    pub fn new(direction: Direction, text: impl Into<String>) -> Self {
        Self {
            direction,
            text: text.into(),
        }
    }
}

/// Everything a response generator sees when drafting a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyContext {
    pub key: ConversationKey,
    pub listing: ListingDetails,
    /// Open inbound messages, oldest first.
    pub pending: Vec<Message>,
}

impl ReplyContext {
    /// The unanswered counterparty text, one message per line.
    pub fn pending_text(&self) -> String {
        self.pending
            .iter()
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Result of sending a drafted reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Sent and recorded; the inbound messages it answers are closed.
    Delivered,
    /// Sent, but the store already held this outbound line. Do not resend.
    AlreadyRecorded,
    /// The chat surface did not accept the message.
    DeliveryFailed,
}
