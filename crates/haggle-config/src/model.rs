// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so typos are rejected at
//! startup instead of silently falling back to defaults.

use serde::{Deserialize, Serialize};

/// Top-level Haggle configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HaggleConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Operator marketplace account.
    #[serde(default)]
    pub account: AccountConfig,

    /// REST gateway bind settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// SQLite store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Persistence API client settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Polling worker settings.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Response generator settings.
    #[serde(default)]
    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error. `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AccountConfig {
    /// E-mail of the account whose inbox is synchronized. Required by `sync` and `pending`.
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "haggle.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Persistence API client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Per-request timeout.
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts per call, including the first.
    #[serde(default = "default_api_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts.
    #[serde(default = "default_api_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            timeout_secs: default_api_timeout_secs(),
            max_attempts: default_api_max_attempts(),
            retry_delay_secs: default_api_retry_delay_secs(),
        }
    }
}

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_api_timeout_secs() -> u64 {
    10
}

fn default_api_max_attempts() -> u32 {
    3
}

fn default_api_retry_delay_secs() -> u64 {
    2
}

/// Polling worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Sleep between successful cycles.
    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,

    /// Sleep after a cycle aborted on a store outage.
    #[serde(default = "default_error_cooldown_secs")]
    pub error_cooldown_secs: u64,

    /// JSON file holding already-discovered conversation links.
    #[serde(default = "default_link_cache_path")]
    pub link_cache_path: String,

    /// Directory of conversation snapshots written by the browser automation.
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: String,

    /// JSONL file receiving outgoing replies for the browser automation.
    #[serde(default = "default_outbox_path")]
    pub outbox_path: String,

    /// Marketplace origin used to absolutize relative conversation links.
    #[serde(default = "default_marketplace_url")]
    pub base_url: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: default_cycle_interval_secs(),
            error_cooldown_secs: default_error_cooldown_secs(),
            link_cache_path: default_link_cache_path(),
            snapshot_dir: default_snapshot_dir(),
            outbox_path: default_outbox_path(),
            base_url: default_marketplace_url(),
        }
    }
}

fn default_cycle_interval_secs() -> u64 {
    30
}

fn default_error_cooldown_secs() -> u64 {
    60
}

fn default_link_cache_path() -> String {
    "links_cache.json".to_string()
}

fn default_snapshot_dir() -> String {
    "snapshots".to_string()
}

fn default_outbox_path() -> String {
    "outbox.jsonl".to_string()
}

fn default_marketplace_url() -> String {
    "https://www.olx.pt".to_string()
}

/// Langflow response generator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Flow run endpoint. `None` disables reply drafting.
    #[serde(default)]
    pub url: Option<String>,

    /// Sent as `x-api-key` when set.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_generator_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_generator_max_attempts")]
    pub max_attempts: u32,

    /// Base of the exponential backoff applied on HTTP 429.
    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout_secs: default_generator_timeout_secs(),
            max_attempts: default_generator_max_attempts(),
            backoff_base_secs: default_backoff_base_secs(),
        }
    }
}

fn default_generator_timeout_secs() -> u64 {
    30
}

fn default_generator_max_attempts() -> u32 {
    3
}

fn default_backoff_base_secs() -> u64 {
    5
}
