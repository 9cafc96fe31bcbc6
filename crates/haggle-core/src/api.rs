// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and response bodies of the persistence REST API.
//!
//! Shared by the axum gateway and the HTTP client so that both ends agree
//! on paths and field names.

use serde::{Deserialize, Serialize};

use crate::types::{ConversationId, ConversationThread, PendingConversation};

/// Route paths.
pub mod paths {
    pub const CREATE_CONVERSATION: &str = "/criar-conversa";
    pub const PENDING_CONVERSATIONS: &str = "/conversas/pendentes";
    pub const LIST_MESSAGES: &str = "/mensagens";
    pub const MESSAGE_EXISTS: &str = "/mensagem-existe";
    pub const SEND_MESSAGE: &str = "/enviar-mensagem";
    pub const RECEIVE_MESSAGE: &str = "/receber-mensagem";
    pub const UPDATE_LISTING_INFO: &str = "/atualizar-info-anuncio";
    pub const LISTING_INFO: &str = "/info-anuncio";
    pub const UPDATE_SEARCHED_INFO: &str = "/atualizar-searched-info";
    pub const HEALTH: &str = "/health";
}

/// JSON body of the two message ingestion routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub mensagem: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateConversationResponse {
    pub message: String,
    pub created: bool,
    pub conversa_id: ConversationId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingResponse {
    pub conversas_pendentes: Vec<PendingConversation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub conversas: Vec<ConversationThread>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistsResponse {
    pub existe: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub status: String,
    pub conversa_id: ConversationId,
    /// `false` when the same line was already stored.
    pub ingested: bool,
}

/// Reply of the metadata update routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub updated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
