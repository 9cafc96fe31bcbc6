// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock response generator with queued replies.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use haggle_core::{
    AdapterType, HaggleError, HealthStatus, PluginAdapter, ReplyContext, ResponseGenerator,
};

/// A generator that pops pre-configured replies.
///
/// `Some(text)` drafts `text`, `None` drafts nothing. When the queue is empty
/// a default "mock reply" is drafted. Every context it receives is captured.
pub struct MockGenerator {
    replies: Arc<Mutex<VecDeque<Option<String>>>>,
    contexts: Arc<Mutex<Vec<ReplyContext>>>,
    failing: bool,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            contexts: Arc::new(Mutex::new(Vec::new())),
            failing: false,
        }
    }

    pub fn with_replies(replies: Vec<Option<String>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            ..Self::new()
        }
    }

    /// A generator whose every draft fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    /// Contexts passed to `draft`, in call order.
    pub async fn contexts(&self) -> Vec<ReplyContext> {
        self.contexts.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.contexts.lock().await.len()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockGenerator {
    fn name(&self) -> &str {
        "mock-generator"
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
impl ResponseGenerator for MockGenerator {
    async fn draft(&self, context: &ReplyContext) -> Result<Option<String>, HaggleError> {
        self.contexts.lock().await.push(context.clone());
        if self.failing {
            return Err(HaggleError::Generator {
                message: "mock generator failure".to_string(),
                source: None,
            });
        }
        Ok(self
            .replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Some("mock reply".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haggle_core::{ConversationKey, ListingDetails};

    fn context() -> ReplyContext {
        ReplyContext {
            key: ConversationKey::new("a@b.com", "1"),
            listing: ListingDetails::default(),
            pending: Vec::new(),
        }
    }

    #[tokio::test]
    async fn replies_pop_in_order_then_default() {
        let generator =
            MockGenerator::with_replies(vec![Some("first".to_string()), None]);
        assert_eq!(generator.draft(&context()).await.unwrap().as_deref(), Some("first"));
        assert_eq!(generator.draft(&context()).await.unwrap(), None);
        assert_eq!(
            generator.draft(&context()).await.unwrap().as_deref(),
            Some("mock reply")
        );
        assert_eq!(generator.call_count().await, 3);
    }

    #[tokio::test]
    async fn failing_generator_errors() {
        let err = MockGenerator::failing().draft(&context()).await.unwrap_err();
        assert!(matches!(err, HaggleError::Generator { .. }));
    }
}
