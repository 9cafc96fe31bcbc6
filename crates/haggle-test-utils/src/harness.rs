// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temp-directory SQLite store for tests.

use std::sync::Arc;

use haggle_config::model::StorageConfig;
use haggle_core::HaggleError;
use haggle_storage::SqliteStore;
use tempfile::TempDir;

/// A migrated [`SqliteStore`] living in its own temp directory.
///
/// The directory is removed when the harness is dropped.
pub struct TestStore {
    pub store: Arc<SqliteStore>,
    dir: TempDir,
}

impl TestStore {
    pub async fn new() -> Result<Self, HaggleError> {
        let dir = TempDir::new().map_err(|e| HaggleError::Storage { source: e.into() })?;
        let config = StorageConfig {
            database_path: dir.path().join("test.db").to_string_lossy().to_string(),
            wal_mode: true,
        };
        let store = SqliteStore::open(config).await?;
        Ok(Self {
            store: Arc::new(store),
            dir,
        })
    }

    /// Directory holding the database, usable for other test files.
    pub fn dir(&self) -> &std::path::Path {
        self.dir.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haggle_core::{ConversationKey, ConversationStore};

    #[tokio::test]
    async fn harness_store_is_migrated() {
        let harness = TestStore::new().await.unwrap();
        let key = ConversationKey::new("a@b.com", "123");
        assert!(harness.store.ensure_conversation(&key).await.unwrap());
        assert!(harness.dir().join("test.db").exists());
    }
}
