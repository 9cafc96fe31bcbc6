// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request handlers for the persistence API.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::{debug, info};

use haggle_core::api::{
    CreateConversationResponse, ExistsResponse, HealthResponse, IngestResponse, MessageBody,
    MessagesResponse, PendingResponse, StatusResponse,
};
use haggle_core::{
    ConversationKey, ConversationStore, CreateOutcome, Direction, HealthStatus, IngestOutcome,
    ListingDetails, ListingInfo, MessageFilter, MetadataWrite, PluginAdapter,
};

use crate::error::ApiError;
use crate::server::GatewayState;

/// `email` + `anuncio_id`, the conversation key.
#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    pub email: String,
    pub anuncio_id: String,
}

impl KeyQuery {
    fn key(&self) -> ConversationKey {
        ConversationKey::new(&self.email, &self.anuncio_id)
    }
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub email: String,
    pub tipo: Option<String>,
    pub conversa_id: Option<i64>,
    pub anuncio_id: Option<String>,
    pub respondida: Option<bool>,
    pub searched_info: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ExistsQuery {
    pub email: String,
    pub anuncio_id: String,
    pub mensagem: String,
    pub tipo: String,
}

#[derive(Debug, Deserialize)]
pub struct ReceiveQuery {
    pub email: String,
    pub anuncio_id: String,
    pub tipo: String,
}

#[derive(Debug, Deserialize)]
pub struct ListingInfoQuery {
    pub email: String,
    pub anuncio_id: String,
    pub nome_vendedor: String,
    pub titulo_anuncio: String,
    pub preco_anuncio: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchedInfoQuery {
    pub email: String,
    pub anuncio_id: String,
    pub searched_info: String,
}

/// POST /criar-conversa
pub async fn create_conversation(
    State(state): State<GatewayState>,
    Query(q): Query<KeyQuery>,
) -> Result<Json<CreateConversationResponse>, ApiError> {
    let outcome = state.store.create_conversation(&q.key()).await?;
    let (message, created) = match &outcome {
        CreateOutcome::Created(_) => ("Conversa criada com sucesso", true),
        CreateOutcome::AlreadyExists(_) => ("Conversa já existe", false),
    };
    if created {
        info!(email = %q.email, listing_id = %q.anuncio_id, "conversation created");
    }
    Ok(Json(CreateConversationResponse {
        message: message.to_string(),
        created,
        conversa_id: outcome.conversation().id,
    }))
}

/// GET /conversas/pendentes
pub async fn pending_conversations(
    State(state): State<GatewayState>,
    Query(q): Query<EmailQuery>,
) -> Result<Json<PendingResponse>, ApiError> {
    let conversas_pendentes = state.store.list_pending(&q.email).await?;
    Ok(Json(PendingResponse {
        conversas_pendentes,
    }))
}

/// GET /mensagens
pub async fn list_messages(
    State(state): State<GatewayState>,
    Query(q): Query<MessagesQuery>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let filter = MessageFilter {
        direction: q.tipo.as_deref().map(Direction::parse_wire).transpose()?,
        conversation_id: q.conversa_id,
        listing_id: q.anuncio_id,
        answered: q.respondida,
        has_searched_info: q.searched_info,
    };
    let conversas = state.store.list_messages(&q.email, &filter).await?;
    Ok(Json(MessagesResponse { conversas }))
}

/// GET /mensagem-existe
pub async fn message_exists(
    State(state): State<GatewayState>,
    Query(q): Query<ExistsQuery>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let direction = Direction::parse_wire(&q.tipo)?;
    let key = ConversationKey::new(&q.email, &q.anuncio_id);
    let existe = state.store.message_exists(&key, direction, &q.mensagem).await?;
    Ok(Json(ExistsResponse { existe }))
}

async fn ingest(
    state: &GatewayState,
    key: ConversationKey,
    direction: Direction,
    text: &str,
) -> Result<Json<IngestResponse>, ApiError> {
    let (conversa_id, outcome) = state.store.ingest(&key, direction, text).await?;
    let ingested = outcome == IngestOutcome::Ingested;
    debug!(
        conversation = %key,
        direction = %direction,
        ingested,
        "message ingested"
    );
    let status = match (direction, ingested) {
        (_, false) => "Mensagem já registrada",
        (Direction::Outbound, true) => "Mensagem enviada registrada",
        (Direction::Inbound, true) => "Mensagem recebida registrada",
    };
    Ok(Json(IngestResponse {
        status: status.to_string(),
        conversa_id,
        ingested,
    }))
}

/// POST /enviar-mensagem
pub async fn send_message(
    State(state): State<GatewayState>,
    Query(q): Query<KeyQuery>,
    Json(body): Json<MessageBody>,
) -> Result<Json<IngestResponse>, ApiError> {
    ingest(&state, q.key(), Direction::Outbound, &body.mensagem).await
}

/// POST /receber-mensagem
pub async fn receive_message(
    State(state): State<GatewayState>,
    Query(q): Query<ReceiveQuery>,
    Json(body): Json<MessageBody>,
) -> Result<Json<IngestResponse>, ApiError> {
    let direction = Direction::parse_wire(&q.tipo)?;
    let key = ConversationKey::new(q.email, q.anuncio_id);
    ingest(&state, key, direction, &body.mensagem).await
}

/// POST /atualizar-info-anuncio
pub async fn update_listing_info(
    State(state): State<GatewayState>,
    Query(q): Query<ListingInfoQuery>,
) -> Result<Json<StatusResponse>, ApiError> {
    let key = ConversationKey::new(q.email, q.anuncio_id);
    let info = ListingInfo {
        seller_name: q.nome_vendedor,
        title: q.titulo_anuncio,
        price: q.preco_anuncio,
    };
    match state.store.update_listing_info(&key, &info).await? {
        MetadataWrite::Skipped => Err(ApiError::not_found(&key)),
        MetadataWrite::Written | MetadataWrite::AlreadySet => Ok(Json(StatusResponse {
            status: "Informações do anúncio atualizadas com sucesso".to_string(),
            updated: true,
        })),
    }
}

/// GET /info-anuncio
///
/// Unknown conversations answer `{}`.
pub async fn listing_info(
    State(state): State<GatewayState>,
    Query(q): Query<KeyQuery>,
) -> Result<Json<ListingDetails>, ApiError> {
    let details = state.store.listing_info(&q.key()).await?;
    Ok(Json(details.unwrap_or_default()))
}

/// POST /atualizar-searched-info
pub async fn update_searched_info(
    State(state): State<GatewayState>,
    Query(q): Query<SearchedInfoQuery>,
) -> Result<Json<StatusResponse>, ApiError> {
    let key = ConversationKey::new(q.email, q.anuncio_id);
    let (status, updated) = match state.store.set_searched_info(&key, &q.searched_info).await? {
        MetadataWrite::Skipped => return Err(ApiError::not_found(&key)),
        MetadataWrite::Written => ("searched_info atualizado com sucesso", true),
        MetadataWrite::AlreadySet => ("searched_info já está preenchido", false),
    };
    Ok(Json(StatusResponse {
        status: status.to_string(),
        updated,
    }))
}

/// GET /health
///
/// Unauthenticated liveness check that also pings the database.
pub async fn health(State(state): State<GatewayState>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status) = match state.store.health_check().await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "ok".to_string()),
        Ok(HealthStatus::Degraded(reason)) => (StatusCode::OK, format!("degraded: {reason}")),
        Ok(HealthStatus::Unhealthy(reason)) => (StatusCode::SERVICE_UNAVAILABLE, reason),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    };
    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_query_parses_optional_filters() {
        let q: MessagesQuery =
            serde_json::from_str(r#"{"email":"a@b.com","respondida":false}"#).unwrap();
        assert_eq!(q.respondida, Some(false));
        assert!(q.tipo.is_none());
        assert!(q.searched_info.is_none());
    }

    #[test]
    fn key_query_builds_conversation_key() {
        let q = KeyQuery {
            email: "a@b.com".into(),
            anuncio_id: "123".into(),
        };
        assert_eq!(q.key(), ConversationKey::new("a@b.com", "123"));
    }
}
