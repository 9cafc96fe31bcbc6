// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Haggle negotiation assistant.

use thiserror::Error;

/// The primary error type used across all Haggle adapter traits and core operations.
#[derive(Debug, Error)]
pub enum HaggleError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Local storage errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Timeout or connection failure talking to a remote dependency.
    #[error("transient network error: {message}")]
    Transient {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A remote dependency answered with a 5xx status.
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// A remote dependency refused the request with a 4xx status other than 404.
    #[error("request rejected with {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The response generator signalled rate limiting (HTTP 429).
    #[error("rate limited by {service}")]
    RateLimited { service: String },

    /// Input rejected at a boundary (unknown direction, empty text, bad parameter).
    #[error("validation error: {0}")]
    Validation(String),

    /// The referenced conversation does not exist.
    #[error("conversation not found for {account_email}/{listing_id}")]
    NotFound {
        account_email: String,
        listing_id: String,
    },

    /// The chat surface could not produce metadata or messages for a conversation.
    #[error("extraction failed for {handle}: {message}")]
    Extraction { handle: String, message: String },

    /// The response generator failed in a non-retryable way.
    #[error("generator error: {message}")]
    Generator {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HaggleError {
    /// Whether a retry policy may attempt the failed call again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HaggleError::Transient { .. }
                | HaggleError::Upstream { .. }
                | HaggleError::RateLimited { .. }
                | HaggleError::Timeout { .. }
        )
    }

    /// Whether the error means the persistence API itself is unusable.
    ///
    /// Such errors abort the whole sync cycle instead of skipping a single
    /// conversation.
    pub fn is_store_outage(&self) -> bool {
        matches!(
            self,
            HaggleError::Transient { .. }
                | HaggleError::Upstream { .. }
                | HaggleError::Timeout { .. }
                | HaggleError::Storage { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_and_upstream_are_retryable() {
        let transient = HaggleError::Transient {
            message: "connection refused".into(),
            source: None,
        };
        let upstream = HaggleError::Upstream {
            status: 503,
            body: "overloaded".into(),
        };
        assert!(transient.is_retryable());
        assert!(upstream.is_retryable());
        assert!(transient.is_store_outage());
        assert!(upstream.is_store_outage());
    }

    #[test]
    fn rejected_and_validation_are_terminal() {
        let rejected = HaggleError::Rejected {
            status: 400,
            body: "bad".into(),
        };
        let validation = HaggleError::Validation("unknown direction `x`".into());
        assert!(!rejected.is_retryable());
        assert!(!validation.is_retryable());
        assert!(!validation.is_store_outage());
    }

    #[test]
    fn extraction_is_local_to_one_conversation() {
        let err = HaggleError::Extraction {
            handle: "tab-3".into(),
            message: "selector not found".into(),
        };
        assert!(!err.is_store_outage());
        assert!(err.to_string().contains("tab-3"));
    }

    #[test]
    fn rate_limit_is_retryable_but_not_an_outage() {
        let err = HaggleError::RateLimited {
            service: "langflow".into(),
        };
        assert!(err.is_retryable());
        assert!(!err.is_store_outage());
    }
}
