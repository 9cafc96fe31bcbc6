// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`LangflowGenerator`]: drafts replies by running a Langflow flow.

use std::time::Duration;

use async_trait::async_trait;
use haggle_config::model::GeneratorConfig;
use haggle_core::{
    AdapterType, HaggleError, HealthStatus, PluginAdapter, ReplyContext, ResponseGenerator,
};
use haggle_resilience::{DelayStrategy, RetryPolicy};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::payload::{RunRequest, extract_reply_text};

const SERVICE: &str = "langflow";

/// Run endpoints are sometimes configured with the playground's `/predict/` path.
pub fn normalize_run_url(url: &str) -> String {
    url.trim().replace("/predict/", "/run/")
}

/// Response generator backed by a Langflow run endpoint.
#[derive(Debug, Clone)]
pub struct LangflowGenerator {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    policy: RetryPolicy,
}

impl LangflowGenerator {
    /// Build a generator from config. Fails when no flow URL is configured.
    pub fn new(config: &GeneratorConfig) -> Result<Self, HaggleError> {
        let url = config
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| HaggleError::Config("generator.url is not set".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|e| HaggleError::Config(format!("invalid generator api_key: {e}")))?;
            headers.insert("x-api-key", value);
        }

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| HaggleError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: normalize_run_url(url),
            timeout,
            policy: RetryPolicy::new(
                config.max_attempts,
                DelayStrategy::Exponential {
                    base: Duration::from_secs(config.backoff_base_secs),
                },
            ),
        })
    }

    /// Replace the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn attempt(&self, request: &RunRequest) -> Result<Option<String>, HaggleError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        debug!(status = %status, "langflow response received");

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(HaggleError::RateLimited {
                service: SERVICE.to_string(),
            });
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

        let body: Value = response.json().await.map_err(|e| HaggleError::Generator {
            message: format!("malformed langflow response: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(extract_reply_text(&body))
    }

    fn send_error(&self, e: reqwest::Error) -> HaggleError {
        if e.is_timeout() {
            HaggleError::Timeout {
                duration: self.timeout,
            }
        } else {
            HaggleError::Transient {
                message: format!("langflow request failed: {e}"),
                source: Some(Box::new(e)),
            }
        }
    }
}

#[async_trait]
impl PluginAdapter for LangflowGenerator {
    fn name(&self) -> &str {
        SERVICE
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Generator
    }

    async fn health_check(&self) -> Result<HealthStatus, HaggleError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HaggleError> {
        Ok(())
    }
}

#[async_trait]
impl ResponseGenerator for LangflowGenerator {
    /// Run the flow once per pending conversation.
    ///
    /// Failures that survive the retry policy come back as
    /// [`HaggleError::Generator`], so callers never mistake them for a
    /// persistence outage.
    async fn draft(&self, context: &ReplyContext) -> Result<Option<String>, HaggleError> {
        if context.pending.is_empty() {
            return Ok(None);
        }
        let request = RunRequest::for_context(context);
        let reply = self
            .policy
            .run("langflow.run", |_| self.attempt(&request))
            .await
            .map_err(|e| match e {
                generator @ HaggleError::Generator { .. } => generator,
                other => HaggleError::Generator {
                    message: other.to_string(),
                    source: Some(Box::new(other)),
                },
            })?;

        match &reply {
            Some(text) => info!(key = %context.key, chars = text.len(), "reply drafted"),
            None => warn!(key = %context.key, "langflow answered without reply text"),
        }
        Ok(reply)
    }
}
