// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Explicit dependencies of one sync worker.

use std::sync::Arc;

use haggle_core::{ChatSurface, ConversationKey, ConversationStore, ResponseGenerator};

/// Everything a sync cycle talks to, passed by reference instead of held globally.
#[derive(Clone)]
pub struct SyncContext {
    /// Marketplace account whose inbox is synchronized.
    pub account_email: String,
    pub store: Arc<dyn ConversationStore>,
    pub surface: Arc<dyn ChatSurface>,
    /// `None` runs reconciliation only; nothing is drafted or sent.
    pub generator: Option<Arc<dyn ResponseGenerator>>,
}

impl SyncContext {
    pub fn new(
        account_email: impl Into<String>,
        store: Arc<dyn ConversationStore>,
        surface: Arc<dyn ChatSurface>,
    ) -> Self {
        Self {
            account_email: account_email.into(),
            store,
            surface,
            generator: None,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn ResponseGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn key_for(&self, listing_id: &str) -> ConversationKey {
        ConversationKey::new(self.account_email.as_str(), listing_id)
    }
}
