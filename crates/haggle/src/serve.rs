// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `haggle serve`: the persistence API over the local SQLite store.

use std::sync::Arc;

use haggle_config::HaggleConfig;
use haggle_core::{HaggleError, PluginAdapter};
use haggle_gateway::GatewayState;
use haggle_storage::SqliteStore;
use haggle_sync::shutdown;
use tracing::info;

pub async fn run_serve(config: HaggleConfig) -> Result<(), HaggleError> {
    info!(
        database = config.storage.database_path.as_str(),
        "starting haggle serve"
    );

    let store = Arc::new(SqliteStore::open(config.storage.clone()).await?);
    let listener = haggle_gateway::bind(&config.server).await?;
    let cancel = shutdown::install_signal_handler();

    haggle_gateway::serve(listener, GatewayState::new(store.clone()), cancel).await?;

    store.shutdown().await?;
    info!("haggle serve stopped");
    Ok(())
}
