// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`StoreClient`]: the persistence API seen as a [`ConversationStore`].

use std::time::Duration;

use async_trait::async_trait;
use haggle_config::model::ApiConfig;
use haggle_core::api::{
    CreateConversationResponse, ExistsResponse, HealthResponse, IngestResponse, MessagesResponse,
    PendingResponse, StatusResponse,
};
use haggle_core::{
    AdapterType, ConversationKey, ConversationStore, ConversationThread, Direction, HaggleError,
    HealthStatus, IngestOutcome, ListingDetails, ListingInfo, MessageFilter, MetadataWrite,
    PendingConversation, PluginAdapter,
};
use haggle_resilience::{DelayStrategy, RetryPolicy};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::call::ApiCall;

/// Outcome of a call that reached the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiReply<T> {
    Ok(T),
    /// The API answered 404: the endpoint or the conversation is unknown.
    Unsupported,
}

impl<T> ApiReply<T> {
    /// The value, or `default` when unsupported.
    pub fn or(self, default: T) -> T {
        match self {
            ApiReply::Ok(value) => value,
            ApiReply::Unsupported => default,
        }
    }
}

/// HTTP client for the persistence API with a shared retry policy.
#[derive(Debug, Clone)]
pub struct StoreClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    policy: RetryPolicy,
}

impl StoreClient {
    pub fn new(config: &ApiConfig) -> Result<Self, HaggleError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HaggleError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
            policy: RetryPolicy::new(
                config.max_attempts,
                DelayStrategy::Fixed(Duration::from_secs(config.retry_delay_secs)),
            ),
        })
    }

    /// Replace the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute `call` under the retry policy and decode the JSON reply.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        call: &ApiCall,
    ) -> Result<ApiReply<T>, HaggleError> {
        self.policy
            .run(call.name(), |_| self.attempt(call))
            .await
    }

    fn url(&self, call: &ApiCall) -> Result<Url, HaggleError> {
        let raw = format!("{}{}", self.base_url, call.path());
        let query = call.query();
        let url = if query.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, &query)
        };
        url.map_err(|e| HaggleError::Config(format!("invalid API URL `{raw}`: {e}")))
    }

    async fn attempt<T: DeserializeOwned>(
        &self,
        call: &ApiCall,
    ) -> Result<ApiReply<T>, HaggleError> {
        let mut request = self.client.request(call.method(), self.url(call)?);
        if let Some(body) = call.body() {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.send_error(call, "request failed", e))?;

        let status = response.status();
        debug!(call = call.name(), status = %status, "API response received");

        if status == StatusCode::NOT_FOUND {
            warn!(call = call.name(), "API returned 404, using safe default");
            return Ok(ApiReply::Unsupported);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(if status.is_server_error() {
                HaggleError::Upstream {
                    status: status.as_u16(),
                    body,
                }
            } else {
                HaggleError::Rejected {
                    status: status.as_u16(),
                    body,
                }
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.send_error(call, "response unreadable", e))?;
        serde_json::from_str(&body)
            .map(ApiReply::Ok)
            .map_err(|e| HaggleError::Internal(format!("malformed {} response: {e}", call.name())))
    }

    fn send_error(&self, call: &ApiCall, what: &str, e: reqwest::Error) -> HaggleError {
        if e.is_timeout() {
            HaggleError::Timeout {
                duration: self.timeout,
            }
        } else {
            HaggleError::Transient {
                message: format!("{} {what}: {e}", call.name()),
                source: Some(Box::new(e)),
            }
        }
    }
}

#[async_trait]
impl PluginAdapter for StoreClient {
    fn name(&self) -> &str {
        "persistence-api"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    /// Single probe of `GET /health`, without retries.
    async fn health_check(&self) -> Result<HealthStatus, HaggleError> {
        match self.attempt::<HealthResponse>(&ApiCall::Health).await {
            Ok(ApiReply::Ok(_)) => Ok(HealthStatus::Healthy),
            Ok(ApiReply::Unsupported) => Ok(HealthStatus::Degraded(
                "health endpoint not available".to_string(),
            )),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), HaggleError> {
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for StoreClient {
    async fn ensure_conversation(&self, key: &ConversationKey) -> Result<bool, HaggleError> {
        let reply: ApiReply<CreateConversationResponse> = self
            .execute(&ApiCall::CreateConversation { key: key.clone() })
            .await?;
        Ok(match reply {
            ApiReply::Ok(created) => created.created,
            ApiReply::Unsupported => false,
        })
    }

    async fn message_exists(
        &self,
        key: &ConversationKey,
        direction: Direction,
        text: &str,
    ) -> Result<bool, HaggleError> {
        let reply: ApiReply<ExistsResponse> = self
            .execute(&ApiCall::MessageExists {
                key: key.clone(),
                direction,
                text: text.to_string(),
            })
            .await?;
        Ok(reply.or(ExistsResponse { existe: false }).existe)
    }

    async fn ingest_message(
        &self,
        key: &ConversationKey,
        direction: Direction,
        text: &str,
    ) -> Result<IngestOutcome, HaggleError> {
        let call = match direction {
            Direction::Outbound => ApiCall::SendMessage {
                key: key.clone(),
                text: text.to_string(),
            },
            Direction::Inbound => ApiCall::ReceiveMessage {
                key: key.clone(),
                direction,
                text: text.to_string(),
            },
        };
        let reply: ApiReply<IngestResponse> = self.execute(&call).await?;
        Ok(match reply {
            ApiReply::Ok(r) if r.ingested => IngestOutcome::Ingested,
            ApiReply::Ok(_) => IngestOutcome::AlreadyIngested,
            ApiReply::Unsupported => IngestOutcome::Unsupported,
        })
    }

    async fn list_pending(
        &self,
        account_email: &str,
    ) -> Result<Vec<PendingConversation>, HaggleError> {
        let reply: ApiReply<PendingResponse> = self
            .execute(&ApiCall::PendingConversations {
                account_email: account_email.to_string(),
            })
            .await?;
        Ok(match reply {
            ApiReply::Ok(r) => r.conversas_pendentes,
            ApiReply::Unsupported => Vec::new(),
        })
    }

    async fn list_messages(
        &self,
        account_email: &str,
        filter: &MessageFilter,
    ) -> Result<Vec<ConversationThread>, HaggleError> {
        let reply: ApiReply<MessagesResponse> = self
            .execute(&ApiCall::ListMessages {
                account_email: account_email.to_string(),
                filter: filter.clone(),
            })
            .await?;
        Ok(match reply {
            ApiReply::Ok(r) => r.conversas,
            ApiReply::Unsupported => Vec::new(),
        })
    }

    async fn update_listing_info(
        &self,
        key: &ConversationKey,
        info: &ListingInfo,
    ) -> Result<MetadataWrite, HaggleError> {
        let reply: ApiReply<StatusResponse> = self
            .execute(&ApiCall::UpdateListingInfo {
                key: key.clone(),
                info: info.clone(),
            })
            .await?;
        Ok(match reply {
            ApiReply::Ok(_) => MetadataWrite::Written,
            ApiReply::Unsupported => MetadataWrite::Skipped,
        })
    }

    async fn listing_info(
        &self,
        key: &ConversationKey,
    ) -> Result<Option<ListingDetails>, HaggleError> {
        let reply: ApiReply<ListingDetails> = self
            .execute(&ApiCall::ListingInfo { key: key.clone() })
            .await?;
        Ok(match reply {
            ApiReply::Ok(details) if !details.is_empty() => Some(details),
            ApiReply::Ok(_) | ApiReply::Unsupported => None,
        })
    }

    async fn set_searched_info(
        &self,
        key: &ConversationKey,
        info: &str,
    ) -> Result<MetadataWrite, HaggleError> {
        let reply: ApiReply<StatusResponse> = self
            .execute(&ApiCall::UpdateSearchedInfo {
                key: key.clone(),
                info: info.to_string(),
            })
            .await?;
        Ok(match reply {
            ApiReply::Ok(r) if r.updated => MetadataWrite::Written,
            ApiReply::Ok(_) => MetadataWrite::AlreadySet,
            ApiReply::Unsupported => MetadataWrite::Skipped,
        })
    }
}
