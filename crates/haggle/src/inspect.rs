// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `haggle pending` and `haggle show`: read-only views of the local store.

use std::fmt::Write;

use haggle_config::HaggleConfig;
use haggle_core::{
    Conversation, ConversationStore, ConversationThread, Direction, HaggleError, Message,
    PendingConversation,
};
use haggle_storage::SqliteStore;

pub async fn run_pending(
    config: HaggleConfig,
    email: Option<String>,
    json: bool,
) -> Result<(), HaggleError> {
    let email = email.or(config.account.email.clone()).ok_or_else(|| {
        HaggleError::Config("pass --email or set account.email".to_string())
    })?;
    let store = SqliteStore::open(config.storage.clone()).await?;
    let pending = store.list_pending(&email).await?;

    if json {
        println!("{}", to_json(&pending)?);
    } else {
        print!("{}", render_pending(&email, &pending));
    }
    Ok(())
}

pub async fn run_show(config: HaggleConfig, json: bool) -> Result<(), HaggleError> {
    let store = SqliteStore::open(config.storage.clone()).await?;
    let mut threads = Vec::new();
    for conversation in store.list_conversations().await? {
        let messages = store.messages_for(conversation.id).await?;
        threads.push(ConversationThread {
            conversation,
            messages,
        });
    }

    if json {
        println!("{}", to_json(&threads)?);
    } else {
        print!("{}", render_threads(&threads));
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, HaggleError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| HaggleError::Internal(format!("failed to encode output: {e}")))
}

fn render_pending(email: &str, pending: &[PendingConversation]) -> String {
    if pending.is_empty() {
        return format!("no conversations waiting for a reply ({email})\n");
    }
    let mut out = String::new();
    for conversation in pending {
        let _ = writeln!(
            out,
            "#{} listing {} ({} open)",
            conversation.conversation_id,
            conversation.listing_id,
            conversation.messages.len()
        );
        for message in &conversation.messages {
            let _ = writeln!(out, "    {}", message_line(message));
        }
    }
    out
}

fn render_threads(threads: &[ConversationThread]) -> String {
    if threads.is_empty() {
        return "no conversations stored\n".to_string();
    }
    let mut out = String::new();
    for thread in threads {
        let _ = writeln!(out, "{}", header(&thread.conversation));
        if let Some(info) = &thread.conversation.searched_info {
            let _ = writeln!(out, "    info: {info}");
        }
        for message in &thread.messages {
            let _ = writeln!(out, "    {}", message_line(message));
        }
        out.push('\n');
    }
    out
}

fn header(conversation: &Conversation) -> String {
    let mut line = format!(
        "#{} {} / listing {}",
        conversation.id, conversation.account_email, conversation.listing_id
    );
    if let Some(title) = &conversation.title {
        let _ = write!(line, " \"{title}\"");
    }
    if let Some(price) = &conversation.price {
        let _ = write!(line, " {price}");
    }
    if let Some(seller) = &conversation.seller_name {
        let _ = write!(line, " by {seller}");
    }
    line
}

fn message_line(message: &Message) -> String {
    let arrow = match message.direction {
        Direction::Inbound => "<-",
        Direction::Outbound => "->",
    };
    let mark = if message.answered { "x" } else { " " };
    format!("[{mark}] {arrow} {}", message.text)
}
