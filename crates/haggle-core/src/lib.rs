// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Haggle negotiation assistant.
//!
//! This crate provides the adapter traits, the error type, and the domain
//! types shared by the store, the sync engine, and the REST gateway.

pub mod api;
pub mod error;
pub mod traits;
pub mod types;

pub use error::HaggleError;
pub use types::{
    AdapterType, Conversation, ConversationHandle, ConversationId, ConversationKey,
    ConversationThread, CreateOutcome, Direction, DispatchOutcome, HealthStatus, IngestOutcome,
    ListingDetails, ListingInfo, ListingSnapshot, Message, MessageFilter, MessageId,
    MetadataWrite, ObservedLine, PendingConversation, ReplyContext,
};

pub use traits::{ChatSurface, ConversationStore, PluginAdapter, ResponseGenerator};
