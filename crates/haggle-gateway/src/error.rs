// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of [`HaggleError`] onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use haggle_core::api::ErrorBody;
use haggle_core::{ConversationKey, HaggleError};

/// Handler error rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError(pub HaggleError);

impl From<HaggleError> for ApiError {
    fn from(err: HaggleError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn not_found(key: &ConversationKey) -> Self {
        ApiError(HaggleError::NotFound {
            account_email: key.account_email.clone(),
            listing_id: key.listing_id.clone(),
        })
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            HaggleError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            HaggleError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
