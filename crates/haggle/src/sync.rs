// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `haggle sync`: the polling worker.
//!
//! Reads conversations from the snapshot directory, persists them through the
//! persistence API, and drafts replies with Langflow when `generator.url` is
//! configured.

use std::sync::Arc;

use haggle_client::StoreClient;
use haggle_config::HaggleConfig;
use haggle_core::{HaggleError, HealthStatus, PluginAdapter};
use haggle_langflow::LangflowGenerator;
use haggle_sync::{LinkCache, SnapshotSurface, SyncContext, SyncWorker, shutdown};
use tracing::{info, warn};

pub async fn run_sync(config: HaggleConfig, once: bool) -> Result<(), HaggleError> {
    let account = config.account.email.clone().ok_or_else(|| {
        HaggleError::Config("account.email is required for sync".to_string())
    })?;

    let store = Arc::new(StoreClient::new(&config.api)?);
    match store.health_check().await? {
        HealthStatus::Healthy => info!(api = store.base_url(), "persistence API reachable"),
        HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason) => {
            warn!(api = store.base_url(), reason = reason.as_str(), "persistence API not healthy");
        }
    }

    let surface = Arc::new(SnapshotSurface::new(&config.sync));
    let mut ctx = SyncContext::new(account, store, surface);
    if config.generator.url.is_some() {
        let generator = LangflowGenerator::new(&config.generator)?;
        info!(url = generator.url(), "reply drafting enabled");
        ctx = ctx.with_generator(Arc::new(generator));
    } else {
        info!("generator.url not set, running reconciliation only");
    }

    let links = LinkCache::load_from_disk(&config.sync.link_cache_path);
    let mut worker = SyncWorker::new(ctx, links, &config.sync);

    if once {
        let cycle = worker.run_cycle().await?;
        println!(
            "ingested {} message(s), sent {} repl{}, {} error(s)",
            cycle.messages_processed,
            cycle.replies_sent,
            if cycle.replies_sent == 1 { "y" } else { "ies" },
            cycle.errors
        );
        return Ok(());
    }

    worker.run(shutdown::install_signal_handler()).await
}
