// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Hierarchy: `./haggle.toml` > `~/.config/haggle/haggle.toml` > `/etc/haggle/haggle.toml`,
//! with environment variable overrides via the `HAGGLE_` prefix.

#![allow(clippy::result_large_err)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::HaggleConfig;

/// Top-level config sections, used to map `HAGGLE_<SECTION>_<KEY>` onto `section.key`.
const SECTIONS: &[&str] = &[
    "logging",
    "account",
    "server",
    "storage",
    "api",
    "sync",
    "generator",
];

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/haggle/haggle.toml`
/// 3. `~/.config/haggle/haggle.toml`
/// 4. `./haggle.toml`
/// 5. `HAGGLE_*` environment variables
pub fn load_config() -> Result<HaggleConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<HaggleConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HaggleConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<HaggleConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HaggleConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Candidate config files, lowest precedence first.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/haggle/haggle.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("haggle").join("haggle.toml"));
    }
    paths.push(PathBuf::from("haggle.toml"));
    paths
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    config_paths()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(HaggleConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Map a prefix-stripped env key onto its dotted, lowercase config path.
///
/// Figment hands the key over in its original case, so `GENERATOR_API_KEY`
/// arrives here as is. Only the first underscore after a known section name
/// becomes a dot, so it maps to `generator.api_key`.
pub fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}

fn env_provider() -> Env {
    Env::prefixed("HAGGLE_").map(|key| map_env_key(key.as_str()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("api_base_url"), "api.base_url");
        assert_eq!(map_env_key("sync_cycle_interval_secs"), "sync.cycle_interval_secs");
        assert_eq!(map_env_key("account_email"), "account.email");
    }

    #[test]
    fn uppercase_env_keys_map_to_lowercase_paths() {
        assert_eq!(map_env_key("ACCOUNT_EMAIL"), "account.email");
        assert_eq!(map_env_key("GENERATOR_API_KEY"), "generator.api_key");
        assert_eq!(map_env_key("Server_Port"), "server.port");
    }

    #[test]
    fn nested_section_names_only_split_once() {
        assert_eq!(map_env_key("generator_api_key"), "generator.api_key");
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
    }

    #[test]
    fn local_file_has_the_last_word() {
        let paths = config_paths();
        assert_eq!(paths.first(), Some(&PathBuf::from("/etc/haggle/haggle.toml")));
        assert_eq!(paths.last(), Some(&PathBuf::from("haggle.toml")));
    }

    #[test]
    fn unknown_prefix_is_left_alone() {
        assert_eq!(map_env_key("verbose"), "verbose");
    }
}
