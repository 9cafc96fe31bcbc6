// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Langflow run request body and reply text extraction.

use haggle_core::ReplyContext;
use serde::Serialize;
use serde_json::{Map, Value};

/// Body of `POST /api/v1/run/<flow>`.
#[derive(Debug, Clone, Serialize)]
pub struct RunRequest {
    pub input_value: String,
    pub output_type: &'static str,
    pub input_type: &'static str,
    /// One Langflow session per conversation, so flow memory stays per thread.
    pub session_id: String,
    pub tweaks: Map<String, Value>,
}

impl RunRequest {
    pub fn for_context(context: &ReplyContext) -> Self {
        Self {
            input_value: input_value(context),
            output_type: "chat",
            input_type: "chat",
            session_id: context.key.to_string(),
            tweaks: Map::new(),
        }
    }
}

/// `listing_id,title,seller,price,message`, the flow's expected prompt input.
pub fn input_value(context: &ReplyContext) -> String {
    let listing = &context.listing;
    format!(
        "{},{},{},{},{}",
        context.key.listing_id,
        listing.title.as_deref().unwrap_or_default(),
        listing.seller_name.as_deref().unwrap_or_default(),
        listing.price.as_deref().unwrap_or_default(),
        context.pending_text()
    )
}

fn text_of_message(message: &Value) -> Option<&str> {
    match message {
        Value::String(s) => Some(s),
        Value::Object(obj) => obj
            .get("data")
            .and_then(|d| d.get("text"))
            .or_else(|| obj.get("text"))
            .or_else(|| obj.get("message"))
            .and_then(Value::as_str),
        _ => None,
    }
}

/// Find the reply text in a Langflow run response.
///
/// Looks at `outputs[].outputs[].results.message` first, then a top-level
/// `message`, then a top-level `text`. Blank text counts as no reply.
pub fn extract_reply_text(response: &Value) -> Option<String> {
    let nested = response
        .get("outputs")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|output| output.get("outputs").and_then(Value::as_array))
        .flatten()
        .filter_map(|sub| sub.get("results").and_then(|r| r.get("message")))
        .filter(|message| message.is_object())
        .find_map(text_of_message);

    nested
        .or_else(|| response.get("message").and_then(text_of_message))
        .or_else(|| response.get("text").and_then(Value::as_str))
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
