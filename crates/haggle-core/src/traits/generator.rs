// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response generator trait.

use async_trait::async_trait;

use crate::error::HaggleError;
use crate::traits::adapter::PluginAdapter;
use crate::types::ReplyContext;

/// Drafts a reply for a conversation with open inbound messages.
#[async_trait]
pub trait ResponseGenerator: PluginAdapter {
    /// Returns the drafted reply, or `None` when the generator produced no usable text.
    async fn draft(&self, context: &ReplyContext) -> Result<Option<String>, HaggleError>;
}
