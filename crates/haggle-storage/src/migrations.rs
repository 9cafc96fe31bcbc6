// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations.
//!
//! SQL files under `migrations/` are compiled into the binary and applied
//! on every [`Database::open`](crate::Database::open).

use haggle_core::HaggleError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply all pending migrations. Refinery records progress in `refinery_schema_history`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), HaggleError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| HaggleError::Storage {
            source: Box::new(e),
        })?;
    for migration in report.applied_migrations() {
        tracing::info!(version = migration.version(), name = migration.name(), "applied migration");
    }
    Ok(())
}
