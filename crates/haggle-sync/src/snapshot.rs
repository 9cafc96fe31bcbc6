// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`SnapshotSurface`]: a chat surface backed by files on disk.
//!
//! The browser automation dumps one JSON file per open conversation into the
//! snapshot directory:
//!
//! ```json
//! {
//!   "link": "/d/anuncio/bicicleta-IDabc.html",
//!   "listing_id": "123",
//!   "seller_name": "Maria",
//!   "title": "Bicicleta",
//!   "price": "120 €",
//!   "searched_info": "Quadro em alumínio, pouco uso",
//!   "messages": [
//!     {"direction": "recebida", "text": "Está disponível?"},
//!     {"direction": "enviada", "text": "Sim, disponível"}
//!   ]
//! }
//! ```
//!
//! Messages are listed top to bottom. Replies are appended to a JSONL outbox
//! which the automation drains and types into the real chat.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use haggle_config::model::SyncConfig;
use haggle_core::{
    AdapterType, ChatSurface, ConversationHandle, HaggleError, HealthStatus, ListingSnapshot,
    ObservedLine, PluginAdapter,
};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::link_cache::normalize_link;

#[derive(Debug, Clone, Deserialize)]
struct ConversationSnapshot {
    #[serde(default)]
    link: Option<String>,
    listing_id: String,
    #[serde(default)]
    seller_name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    price: String,
    #[serde(default)]
    searched_info: Option<String>,
    #[serde(default)]
    messages: Vec<ObservedLine>,
}

/// One line of the outbox file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub handle: String,
    pub listing_id: String,
    pub text: String,
    pub sent_at: String,
}

/// Chat surface reading conversation snapshots from a directory.
///
/// Handles are the normalized listing link when the snapshot carries one,
/// otherwise the file stem.
pub struct SnapshotSurface {
    dir: PathBuf,
    outbox: PathBuf,
    base_url: String,
    index: RwLock<HashMap<ConversationHandle, PathBuf>>,
}

impl SnapshotSurface {
    pub fn new(config: &SyncConfig) -> Self {
        Self::with_paths(&config.snapshot_dir, &config.outbox_path, &config.base_url)
    }

    pub fn with_paths(
        dir: impl Into<PathBuf>,
        outbox: impl Into<PathBuf>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            outbox: outbox.into(),
            base_url: base_url.into(),
            index: RwLock::new(HashMap::new()),
        }
    }

    pub fn outbox_path(&self) -> &Path {
        &self.outbox
    }

    fn listing_failure(&self, e: &std::io::Error) -> HaggleError {
        HaggleError::Extraction {
            handle: self.dir.display().to_string(),
            message: format!("failed to list snapshots: {e}"),
        }
    }

    fn handle_for(&self, path: &Path, snapshot: &ConversationSnapshot) -> Option<ConversationHandle> {
        match snapshot.link.as_deref().filter(|l| !l.trim().is_empty()) {
            Some(link) => Some(ConversationHandle(normalize_link(&self.base_url, link))),
            None => path
                .file_stem()
                .map(|stem| ConversationHandle(stem.to_string_lossy().into_owned())),
        }
    }

    async fn load(&self, handle: &ConversationHandle) -> Result<ConversationSnapshot, HaggleError> {
        let path = self
            .index
            .read()
            .await
            .get(handle)
            .cloned()
            .ok_or_else(|| extraction(handle, "conversation is not in the snapshot index"))?;
        read_snapshot(&path)
            .await
            .map_err(|message| extraction(handle, &message))
    }
}

async fn read_snapshot(path: &Path) -> Result<ConversationSnapshot, String> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&contents).map_err(|e| format!("malformed {}: {e}", path.display()))
}

/// Outbox I/O failures belong to the surface, never to the store.
fn outbox_failure(handle: &ConversationHandle, e: &std::io::Error) -> HaggleError {
    extraction(handle, &format!("failed to append to outbox: {e}"))
}

fn extraction(handle: &ConversationHandle, message: &str) -> HaggleError {
    HaggleError::Extraction {
        handle: handle.to_string(),
        message: message.to_string(),
    }
}

#[async_trait]
impl PluginAdapter for SnapshotSurface {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ChatSurface
    }

    async fn health_check(&self) -> Result<HealthStatus, HaggleError> {
        Ok(match tokio::fs::metadata(&self.dir).await {
            Ok(meta) if meta.is_dir() => HealthStatus::Healthy,
            Ok(_) => HealthStatus::Unhealthy(format!("{} is not a directory", self.dir.display())),
            Err(_) => HealthStatus::Degraded(format!("{} does not exist yet", self.dir.display())),
        })
    }

    async fn shutdown(&self) -> Result<(), HaggleError> {
        Ok(())
    }
}

#[async_trait]
impl ChatSurface for SnapshotSurface {
    async fn list_open_conversations(&self) -> Result<Vec<ConversationHandle>, HaggleError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(dir = %self.dir.display(), "snapshot directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.listing_failure(&e)),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| self.listing_failure(&e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut index = HashMap::new();
        let mut handles = Vec::new();
        for path in paths {
            let snapshot = match read_snapshot(&path).await {
                Ok(snapshot) => snapshot,
                Err(message) => {
                    warn!(error = message.as_str(), "ignoring unreadable snapshot");
                    continue;
                }
            };
            if let Some(handle) = self.handle_for(&path, &snapshot) {
                if index.insert(handle.clone(), path).is_none() {
                    handles.push(handle);
                }
            }
        }
        debug!(count = handles.len(), "snapshots indexed");

        *self.index.write().await = index;
        Ok(handles)
    }

    async fn extract_metadata(
        &self,
        handle: &ConversationHandle,
    ) -> Result<ListingSnapshot, HaggleError> {
        let snapshot = self.load(handle).await?;
        let listing_id = snapshot.listing_id.trim().to_string();
        if listing_id.is_empty() {
            return Err(extraction(handle, "snapshot has no listing id"));
        }
        Ok(ListingSnapshot {
            listing_id,
            seller_name: snapshot.seller_name.trim().to_string(),
            title: snapshot.title.trim().to_string(),
            price: snapshot.price.trim().to_string(),
        })
    }

    async fn extract_messages(
        &self,
        handle: &ConversationHandle,
    ) -> Result<Vec<ObservedLine>, HaggleError> {
        Ok(self
            .load(handle)
            .await?
            .messages
            .into_iter()
            .filter_map(|line| {
                let text = line.text.trim();
                (!text.is_empty()).then(|| ObservedLine::new(line.direction, text))
            })
            .collect())
    }

    async fn send(&self, handle: &ConversationHandle, text: &str) -> Result<bool, HaggleError> {
        let snapshot = self.load(handle).await?;
        let entry = OutboxEntry {
            handle: handle.to_string(),
            listing_id: snapshot.listing_id,
            text: text.to_string(),
            sent_at: chrono::Utc::now().to_rfc3339(),
        };
        let mut line = serde_json::to_string(&entry)
            .map_err(|e| HaggleError::Internal(format!("failed to encode outbox entry: {e}")))?;
        line.push('\n');

        if let Some(parent) = self.outbox.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| outbox_failure(handle, &e))?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.outbox)
            .await
            .map_err(|e| outbox_failure(handle, &e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| outbox_failure(handle, &e))?;
        file.flush()
            .await
            .map_err(|e| outbox_failure(handle, &e))?;
        Ok(true)
    }

    async fn extract_detailed_info(
        &self,
        handle: &ConversationHandle,
    ) -> Result<Option<String>, HaggleError> {
        Ok(self
            .load(handle)
            .await?
            .searched_info
            .map(|info| info.trim().to_string())
            .filter(|info| !info.is_empty()))
    }
}
