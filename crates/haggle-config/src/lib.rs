// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Haggle negotiation assistant.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, `HAGGLE_*` environment variable overrides, and
//! diagnostic error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use haggle_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("API: {}", config.api.base_url);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::HaggleConfig;

/// Load configuration from the standard locations and validate it.
///
/// On a Figment error the TOML sources are re-read so that diagnostics can
/// point at the offending key.
pub fn load_and_validate() -> Result<HaggleConfig, Vec<ConfigError>> {
    let sources = loader::config_paths();
    finish(loader::load_config(), || read_sources(&sources))
}

/// Load configuration from an explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &std::path::Path) -> Result<HaggleConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        read_sources(&[path.to_path_buf()])
    })
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<HaggleConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

fn finish(
    loaded: Result<HaggleConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<HaggleConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|err| diagnostic::figment_to_config_errors(err, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// `(display path, contents)` of every readable file in `paths`.
fn read_sources(paths: &[std::path::PathBuf]) -> Vec<(String, String)> {
    paths
        .iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(path).ok()?;
            let shown = std::fs::canonicalize(path).unwrap_or_else(|_| path.clone());
            Some((shown.display().to_string(), content))
        })
        .collect()
}
