// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::HaggleConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &HaggleConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        errors.push(ConfigError::invalid(format!(
            "logging.level `{}` must be one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        )));
    }

    if let Some(email) = config.account.email.as_deref().filter(|e| !e.contains('@')) {
        errors.push(ConfigError::invalid(format!(
            "account.email `{email}` is not an e-mail address"
        )));
    }

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::invalid("server.host must not be empty"));
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        errors.push(ConfigError::invalid(format!(
            "server.host `{host}` is not a valid IP address or hostname"
        )));
    }

    if config.server.port == 0 {
        errors.push(ConfigError::invalid("server.port must not be 0"));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::invalid("storage.database_path must not be empty"));
    }

    check_http_url(&mut errors, "api.base_url", &config.api.base_url);
    check_at_least_one(&mut errors, "api.timeout_secs", config.api.timeout_secs);
    check_at_least_one(&mut errors, "api.max_attempts", config.api.max_attempts.into());

    check_at_least_one(
        &mut errors,
        "sync.cycle_interval_secs",
        config.sync.cycle_interval_secs,
    );
    check_http_url(&mut errors, "sync.base_url", &config.sync.base_url);
    for (name, value) in [
        ("sync.link_cache_path", &config.sync.link_cache_path),
        ("sync.snapshot_dir", &config.sync.snapshot_dir),
        ("sync.outbox_path", &config.sync.outbox_path),
    ] {
        if value.trim().is_empty() {
            errors.push(ConfigError::invalid(format!("{name} must not be empty")));
        }
    }

    if let Some(url) = &config.generator.url {
        check_http_url(&mut errors, "generator.url", url);
    }
    check_at_least_one(
        &mut errors,
        "generator.timeout_secs",
        config.generator.timeout_secs,
    );
    check_at_least_one(
        &mut errors,
        "generator.max_attempts",
        config.generator.max_attempts.into(),
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(errors: &mut Vec<ConfigError>, name: &str, value: &str) {
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        errors.push(ConfigError::invalid(format!(
            "{name} `{value}` must start with http:// or https://"
        )));
    }
}

fn check_at_least_one(errors: &mut Vec<ConfigError>, name: &str, value: u64) {
    if value == 0 {
        errors.push(ConfigError::invalid(format!("{name} must be at least 1")));
    }
}
