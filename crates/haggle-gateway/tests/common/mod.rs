// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared setup: a gateway on an ephemeral port backed by a temp database.

use std::net::SocketAddr;
use std::sync::Arc;

use haggle_config::model::{ServerConfig, StorageConfig};
use haggle_gateway::{bind, serve, GatewayState};
use haggle_storage::SqliteStore;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: CancellationToken,
    _dir: TempDir,
}

impl TestGateway {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    #[allow(dead_code)]
    pub fn url(&self, path: &str, params: &[(&str, &str)]) -> reqwest::Url {
        reqwest::Url::parse_with_params(&format!("{}{path}", self.base_url()), params).unwrap()
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

pub async fn start_gateway() -> TestGateway {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(StorageConfig {
        database_path: dir.path().join("gateway.db").to_str().unwrap().to_string(),
        wal_mode: true,
    })
    .await
    .unwrap();

    let listener = bind(&ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
    })
    .await
    .unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = CancellationToken::new();
    let state = GatewayState::new(Arc::new(store));
    tokio::spawn(serve(listener, state, shutdown.clone()));

    TestGateway {
        addr,
        shutdown,
        _dir: dir,
    }
}
