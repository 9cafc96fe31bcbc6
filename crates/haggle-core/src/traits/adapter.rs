// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity and lifecycle shared by the store, the chat surface and the generator.

use async_trait::async_trait;

use crate::error::HaggleError;
use crate::types::{AdapterType, HealthStatus};

/// Identity and lifecycle of a pluggable collaborator.
///
/// The worker holds these behind `Arc<dyn ...>`, so implementations must be
/// shareable across tasks.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Short name used in logs, e.g. `"sqlite"` or `"langflow"`.
    fn name(&self) -> &str;

    fn version(&self) -> semver::Version;

    fn adapter_type(&self) -> AdapterType;

    /// Check the backing resource (database file, HTTP endpoint, snapshot directory).
    async fn health_check(&self) -> Result<HealthStatus, HaggleError>;

    /// Flush and release resources. Called once when the process stops.
    async fn shutdown(&self) -> Result<(), HaggleError>;
}
