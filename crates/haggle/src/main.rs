// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Haggle - marketplace negotiation assistant.
//!
//! This is the binary entry point: the persistence API (`serve`), the sync
//! worker (`sync`), and two operator views of the store (`pending`, `show`).

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod inspect;
mod serve;
mod sync;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use haggle_config::HaggleConfig;

/// Haggle - marketplace negotiation assistant.
#[derive(Parser, Debug)]
#[command(name = "haggle", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the persistence API.
    Serve,
    /// Run the sync worker against the persistence API.
    Sync {
        /// Run a single cycle and exit.
        #[arg(long)]
        once: bool,
    },
    /// Print conversations still waiting for a reply.
    Pending {
        /// Account to inspect. Defaults to `account.email`.
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Print every stored conversation and its messages.
    Show {
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: Option<&std::path::Path>) -> HaggleConfig {
    let loaded = match path {
        Some(path) => haggle_config::load_and_validate_path(path),
        None => haggle_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            haggle_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides `logging.level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

fn default_filter(log_level: &str) -> String {
    const CRATES: [&str; 8] = [
        "haggle",
        "haggle_core",
        "haggle_storage",
        "haggle_client",
        "haggle_gateway",
        "haggle_langflow",
        "haggle_sync",
        "haggle_resilience",
    ];
    let mut directives = vec!["warn".to_string()];
    directives.extend(CRATES.iter().map(|c| format!("{c}={log_level}")));
    directives.push(format!("tower_http={log_level}"));
    directives.join(",")
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());
    init_tracing(&config.logging.level);

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Sync { once } => sync::run_sync(config, once).await,
        Commands::Pending { email, json } => inspect::run_pending(config, email, json).await,
        Commands::Show { json } => inspect::run_show(config, json).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
