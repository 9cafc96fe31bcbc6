// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of [`ConversationStore`].

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use haggle_config::model::StorageConfig;
use haggle_core::{
    AdapterType, Conversation, ConversationId, ConversationKey, ConversationStore,
    ConversationThread, CreateOutcome, Direction, HaggleError, HealthStatus, IngestOutcome,
    ListingDetails, ListingInfo, Message, MessageFilter, MetadataWrite, PendingConversation,
    PluginAdapter,
};

use crate::database::{map_tr_err, Database};
use crate::queries;

/// SQLite-backed conversation store.
///
/// The database is opened lazily by [`SqliteStore::initialize`].
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Open the database and apply migrations.
    pub async fn initialize(&self) -> Result<(), HaggleError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| HaggleError::Storage {
            source: "store already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite store initialized");
        Ok(())
    }

    /// Create and initialize in one step.
    pub async fn open(config: StorageConfig) -> Result<Self, HaggleError> {
        let store = Self::new(config);
        store.initialize().await?;
        Ok(store)
    }

    fn db(&self) -> Result<&Database, HaggleError> {
        self.db.get().ok_or_else(|| HaggleError::Storage {
            source: "store not initialized -- call initialize() first".into(),
        })
    }

    pub async fn create_conversation(
        &self,
        key: &ConversationKey,
    ) -> Result<CreateOutcome, HaggleError> {
        queries::conversations::create_conversation(self.db()?, key).await
    }

    pub async fn get_or_create_conversation(
        &self,
        key: &ConversationKey,
    ) -> Result<Conversation, HaggleError> {
        queries::conversations::get_or_create_conversation(self.db()?, key).await
    }

    pub async fn find_conversation(
        &self,
        key: &ConversationKey,
    ) -> Result<Option<Conversation>, HaggleError> {
        queries::conversations::find_conversation(self.db()?, key).await
    }

    pub async fn list_conversations(&self) -> Result<Vec<Conversation>, HaggleError> {
        queries::conversations::list_conversations(self.db()?).await
    }

    pub async fn insert_message(
        &self,
        conversation_id: ConversationId,
        direction: Direction,
        text: &str,
    ) -> Result<Message, HaggleError> {
        queries::messages::insert_message(self.db()?, conversation_id, direction, text).await
    }

    pub async fn mark_answered(
        &self,
        conversation_id: ConversationId,
        direction: Direction,
    ) -> Result<usize, HaggleError> {
        queries::messages::mark_answered(self.db()?, conversation_id, direction).await
    }

    pub async fn messages_for(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, HaggleError> {
        queries::messages::messages_for(self.db()?, conversation_id).await
    }

    /// Ingest and also return the conversation id the line landed in.
    pub async fn ingest(
        &self,
        key: &ConversationKey,
        direction: Direction,
        text: &str,
    ) -> Result<(ConversationId, IngestOutcome), HaggleError> {
        queries::messages::ingest_message(self.db()?, key, direction, text).await
    }

    async fn checkpoint(&self) -> Result<(), HaggleError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                    Ok(())
                })
                .await
                .map_err(map_tr_err)?;
            debug!("WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, HaggleError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HaggleError> {
        self.checkpoint().await
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    async fn ensure_conversation(&self, key: &ConversationKey) -> Result<bool, HaggleError> {
        Ok(matches!(
            self.create_conversation(key).await?,
            CreateOutcome::Created(_)
        ))
    }

    async fn message_exists(
        &self,
        key: &ConversationKey,
        direction: Direction,
        text: &str,
    ) -> Result<bool, HaggleError> {
        queries::messages::message_exists_for_key(self.db()?, key, direction, text).await
    }

    async fn ingest_message(
        &self,
        key: &ConversationKey,
        direction: Direction,
        text: &str,
    ) -> Result<IngestOutcome, HaggleError> {
        self.ingest(key, direction, text).await.map(|(_, outcome)| outcome)
    }

    async fn list_pending(
        &self,
        account_email: &str,
    ) -> Result<Vec<PendingConversation>, HaggleError> {
        queries::messages::list_pending(self.db()?, account_email).await
    }

    async fn list_messages(
        &self,
        account_email: &str,
        filter: &MessageFilter,
    ) -> Result<Vec<ConversationThread>, HaggleError> {
        queries::messages::list_messages(self.db()?, account_email, filter).await
    }

    async fn update_listing_info(
        &self,
        key: &ConversationKey,
        info: &ListingInfo,
    ) -> Result<MetadataWrite, HaggleError> {
        match queries::conversations::update_listing_info(self.db()?, key, info).await {
            Ok(()) => Ok(MetadataWrite::Written),
            Err(HaggleError::NotFound { .. }) => Ok(MetadataWrite::Skipped),
            Err(e) => Err(e),
        }
    }

    async fn listing_info(
        &self,
        key: &ConversationKey,
    ) -> Result<Option<ListingDetails>, HaggleError> {
        queries::conversations::listing_info(self.db()?, key).await
    }

    async fn set_searched_info(
        &self,
        key: &ConversationKey,
        info: &str,
    ) -> Result<MetadataWrite, HaggleError> {
        match self.find_conversation(key).await? {
            Some(conversation) => {
                queries::conversations::set_metadata_once(self.db()?, conversation.id, info).await
            }
            None => Ok(MetadataWrite::Skipped),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("store.db").to_str().unwrap().to_string(),
            wal_mode: true,
        };
        (SqliteStore::open(config).await.unwrap(), dir)
    }

    #[tokio::test]
    async fn uninitialized_store_reports_storage_error() {
        let store = SqliteStore::new(StorageConfig::default());
        let err = store.list_pending("a@b.com").await.unwrap_err();
        assert!(matches!(err, HaggleError::Storage { .. }));
    }

    #[tokio::test]
    async fn double_initialize_fails() {
        let (store, _dir) = setup_store().await;
        assert!(store.initialize().await.is_err());
    }

    #[tokio::test]
    async fn health_check_and_shutdown() {
        let (store, _dir) = setup_store().await;
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn ensure_conversation_reports_creation_once() {
        let (store, _dir) = setup_store().await;
        let key = ConversationKey::new("a@b.com", "123");
        assert!(store.ensure_conversation(&key).await.unwrap());
        assert!(!store.ensure_conversation(&key).await.unwrap());
    }

    #[tokio::test]
    async fn metadata_writes_on_unknown_conversation_are_skipped() {
        let (store, _dir) = setup_store().await;
        let key = ConversationKey::new("a@b.com", "missing");
        let info = ListingInfo {
            seller_name: "s".into(),
            title: "t".into(),
            price: "p".into(),
        };
        assert_eq!(
            store.update_listing_info(&key, &info).await.unwrap(),
            MetadataWrite::Skipped
        );
        assert_eq!(
            store.set_searched_info(&key, "details").await.unwrap(),
            MetadataWrite::Skipped
        );
        assert!(store.listing_info(&key).await.unwrap().is_none());
    }
}
