// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bridges Figment errors into miette diagnostics with "did you mean?" hints.

#![allow(unused_assignments)]

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a key suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration problem, renderable by miette.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key that no section accepts.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(haggle::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value of the wrong type, e.g. a string where a port number belongs.
    #[error("invalid type for `{key}`: {detail}")]
    #[diagnostic(code(haggle::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    /// A required key without a default.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(haggle::config::missing_key),
        help("add `{key} = <value>` to haggle.toml")
    )]
    MissingKey { key: String },

    /// A value that parsed but makes no sense (zero port, empty path, ...).
    #[error("invalid value: {message}")]
    #[diagnostic(code(haggle::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(haggle::config::other))]
    Other(String),
}

impl ConfigError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ConfigError::Validation {
            message: message.into(),
        }
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert every error carried by a `figment::Error` into a [`ConfigError`].
///
/// `toml_sources` holds `(path, content)` pairs used to attach source spans
/// to unknown-key errors.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let section: Vec<String> = error.path.iter().map(|s| s.to_string()).collect();
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let (span, src) = locate(&error, &section, field, toml_sources);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::MissingField(field) => ConfigError::MissingKey {
                    key: field.to_string(),
                },
                Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                    key: section.join("."),
                    detail: format!("found {actual}"),
                    expected: expected.clone(),
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// Resolve the source file an error came from and the byte span of `field` in it.
fn locate(
    error: &figment::error::Error,
    section: &[String],
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let origin = match error.metadata.as_ref().and_then(|m| m.source.as_ref()) {
        Some(figment::Source::File(path)) => path.display().to_string(),
        _ => "<inline>".to_string(),
    };

    let Some((path, content)) = toml_sources.iter().find(|(p, _)| *p == origin) else {
        return (None, None);
    };

    match find_key_offset(content, section, field) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), field.len())),
            Some(NamedSource::new(path, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `field` within the `[section]` table of a TOML document.
///
/// Top-level fields are searched from the start of the document.
pub fn find_key_offset(content: &str, section: &[String], field: &str) -> Option<usize> {
    let start = match section.first() {
        Some(name) => {
            let header = format!("[{name}]");
            content.find(&header)? + header.len()
        }
        None => 0,
    };

    let mut offset = start;
    for line in content[start..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') && offset > start {
            break;
        }
        let assigns = trimmed
            .strip_prefix(field)
            .is_some_and(|after| after.trim_start().starts_with('='));
        if assigns {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

/// Best Jaro-Winkler match for `unknown` among `valid_keys`, if close enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render config errors to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_close_key() {
        let valid = &["base_url", "timeout_secs", "max_attempts", "retry_delay_secs"];
        assert_eq!(suggest_key("base_ulr", valid), Some("base_url".to_string()));
        assert_eq!(
            suggest_key("max_attemps", valid),
            Some("max_attempts".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_unrelated_key() {
        let valid = &["host", "port"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn finds_key_inside_its_section() {
        let content = "[server]\nport = 8000\n\n[api]\nbase_ulr = \"http://x\"\n";
        let offset = find_key_offset(content, &["api".to_string()], "base_ulr").unwrap();
        assert_eq!(&content[offset..offset + 8], "base_ulr");
    }

    #[test]
    fn does_not_match_key_from_following_section() {
        let content = "[server]\nhost = \"a\"\n[api]\nport = 1\n";
        assert!(find_key_offset(content, &["server".to_string()], "port").is_none());
    }
}
