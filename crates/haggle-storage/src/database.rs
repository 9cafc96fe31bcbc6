// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management: PRAGMA setup, migrations, lifecycle.
//!
//! All statements run on tokio-rusqlite's single background thread, so writes
//! are serialized. Do not open a second connection for writes.

use haggle_core::HaggleError;
use tracing::debug;

use crate::migrations::run_migrations;

/// Handle to the SQLite database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` in WAL mode and apply migrations.
    pub async fn open(path: &str) -> Result<Self, HaggleError> {
        Self::open_with(path, true).await
    }

    /// Open the database, choosing the journal mode.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, HaggleError> {
        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), HaggleError> {
            let mut conn = rusqlite::Connection::open(&migrate_path).map_err(storage_err)?;
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")
                    .map_err(storage_err)?;
            }
            run_migrations(&mut conn)
        })
        .await
        .map_err(|e| HaggleError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(storage_err)?;
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA synchronous = NORMAL;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), HaggleError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)
    }
}

fn storage_err(e: rusqlite::Error) -> HaggleError {
    HaggleError::Storage {
        source: Box::new(e),
    }
}

/// Convert a tokio-rusqlite error into [`HaggleError::Storage`].
///
/// A [`HaggleError`] smuggled out of a closure through
/// `FromSqlConversionFailure` is unwrapped back to its original variant.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> HaggleError {
    match e {
        tokio_rusqlite::Error::Error(inner) => unwrap_domain_error(inner),
        other => HaggleError::Storage {
            source: other.to_string().into(),
        },
    }
}

fn unwrap_domain_error(e: rusqlite::Error) -> HaggleError {
    match e {
        rusqlite::Error::ToSqlConversionFailure(source) => match source.downcast::<HaggleError>() {
            Ok(domain) => *domain,
            Err(source) => HaggleError::Storage { source },
        },
        other => storage_err(other),
    }
}

/// Wrap a domain error so it can leave a `call` closure as a `rusqlite::Error`.
pub(crate) fn domain_err(e: HaggleError) -> rusqlite::Error {
    rusqlite::Error::ToSqlConversionFailure(Box::new(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_schema() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("haggle.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();

        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();
        assert!(tables.contains(&"conversas".to_string()));
        assert!(tables.contains(&"mensagens".to_string()));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("haggle.db");
        let path = path.to_str().unwrap();
        Database::open(path).await.unwrap().close().await.unwrap();
        let db = Database::open(path).await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn rejects_unknown_direction_at_schema_level() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("h.db").to_str().unwrap())
            .await
            .unwrap();
        let result = db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute("INSERT INTO conversas (email, anuncio_id) VALUES ('a@b.com', '1')", [])?;
                conn.execute(
                    "INSERT INTO mensagens (conversa_id, tipo, mensagem) VALUES (1, 'forwarded', 'x')",
                    [],
                )?;
                Ok(())
            })
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn domain_errors_survive_the_closure_boundary() {
        let wrapped = domain_err(HaggleError::Validation("empty".into()));
        let back = unwrap_domain_error(wrapped);
        assert!(matches!(back, HaggleError::Validation(_)));
    }
}
