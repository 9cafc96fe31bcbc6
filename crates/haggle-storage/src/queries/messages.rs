// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message operations: dedup checks, inserts, the answered state machine,
//! and the pending/filtered read models.

use haggle_core::{
    ConversationId, ConversationKey, ConversationThread, Direction, HaggleError, IngestOutcome,
    Message, MessageFilter, PendingConversation,
};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection};

use crate::database::{map_tr_err, Database};
use crate::queries::conversations::{conversation_from_row, get_or_insert_in, touch_in, validate_key};

const MESSAGE_COLUMNS: &str = "m.id, m.conversa_id, m.tipo, m.mensagem, m.respondida, m.created_at";

/// Map the six [`MESSAGE_COLUMNS`] starting at `offset`.
fn message_from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Message> {
    let tipo: String = row.get(offset + 2)?;
    let direction = Direction::parse_wire(&tipo)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(offset + 2, Type::Text, Box::new(e)))?;
    Ok(Message {
        id: row.get(offset)?,
        conversation_id: row.get(offset + 1)?,
        direction,
        text: row.get(offset + 3)?,
        answered: row.get(offset + 4)?,
        created_at: row.get(offset + 5)?,
    })
}

fn validate_text(text: &str) -> Result<(), HaggleError> {
    if text.trim().is_empty() {
        return Err(HaggleError::Validation(
            "message text must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn exists_in(
    conn: &Connection,
    conversation_id: ConversationId,
    direction: Direction,
    text: &str,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM mensagens WHERE conversa_id = ?1 AND tipo = ?2 AND mensagem = ?3)",
        params![conversation_id, direction.as_wire(), text],
        |row| row.get(0),
    )
}

pub(crate) fn insert_in(
    conn: &Connection,
    conversation_id: ConversationId,
    direction: Direction,
    text: &str,
) -> rusqlite::Result<Message> {
    conn.execute(
        "INSERT INTO mensagens (conversa_id, tipo, mensagem, respondida) VALUES (?1, ?2, ?3, 0)",
        params![conversation_id, direction.as_wire(), text],
    )?;
    let id = conn.last_insert_rowid();
    conn.query_row(
        &format!("SELECT {MESSAGE_COLUMNS} FROM mensagens m WHERE m.id = ?1"),
        params![id],
        |row| message_from_row(row, 0),
    )
}

pub(crate) fn mark_answered_in(
    conn: &Connection,
    conversation_id: ConversationId,
    direction: Direction,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE mensagens SET respondida = 1 WHERE conversa_id = ?1 AND tipo = ?2 AND respondida = 0",
        params![conversation_id, direction.as_wire()],
    )
}

/// Insert one message with `answered = false`. Does not check for duplicates.
pub async fn insert_message(
    db: &Database,
    conversation_id: ConversationId,
    direction: Direction,
    text: &str,
) -> Result<Message, HaggleError> {
    validate_text(text)?;
    let text = text.to_string();
    db.connection()
        .call(move |conn| -> Result<Message, rusqlite::Error> {
            insert_in(conn, conversation_id, direction, &text)
        })
        .await
        .map_err(map_tr_err)
}

/// Whether `(conversation_id, direction, text)` is already stored.
pub async fn message_exists(
    db: &Database,
    conversation_id: ConversationId,
    direction: Direction,
    text: &str,
) -> Result<bool, HaggleError> {
    let text = text.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            exists_in(conn, conversation_id, direction, &text)
        })
        .await
        .map_err(map_tr_err)
}

/// Same check addressed by conversation key. An unknown conversation yields `false`.
pub async fn message_exists_for_key(
    db: &Database,
    key: &ConversationKey,
    direction: Direction,
    text: &str,
) -> Result<bool, HaggleError> {
    let key = key.clone();
    let text = text.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            conn.query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM mensagens m JOIN conversas c ON c.id = m.conversa_id
                     WHERE c.email = ?1 AND c.anuncio_id = ?2 AND m.tipo = ?3 AND m.mensagem = ?4)",
                params![key.account_email, key.listing_id, direction.as_wire(), text],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Close every open message of `direction`. Returns how many were closed.
pub async fn mark_answered(
    db: &Database,
    conversation_id: ConversationId,
    direction: Direction,
) -> Result<usize, HaggleError> {
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            mark_answered_in(conn, conversation_id, direction)
        })
        .await
        .map_err(map_tr_err)
}

/// Record one observed chat line in a single transaction.
///
/// Creates the conversation on demand, skips exact duplicates, inserts the
/// message, closes the opposite direction, and touches `updated_at`.
pub async fn ingest_message(
    db: &Database,
    key: &ConversationKey,
    direction: Direction,
    text: &str,
) -> Result<(ConversationId, IngestOutcome), HaggleError> {
    validate_key(key)?;
    validate_text(text)?;
    let key = key.clone();
    let text = text.to_string();
    db.connection()
        .call(
            move |conn| -> Result<(ConversationId, IngestOutcome), rusqlite::Error> {
                let tx = conn.transaction()?;
                let (conversation, _) = get_or_insert_in(&tx, &key)?;
                let outcome = if exists_in(&tx, conversation.id, direction, &text)? {
                    IngestOutcome::AlreadyIngested
                } else {
                    insert_in(&tx, conversation.id, direction, &text)?;
                    mark_answered_in(&tx, conversation.id, direction.opposite())?;
                    touch_in(&tx, conversation.id)?;
                    IngestOutcome::Ingested
                };
                tx.commit()?;
                Ok((conversation.id, outcome))
            },
        )
        .await
        .map_err(map_tr_err)
}

/// All messages of one conversation in creation order.
pub async fn messages_for(
    db: &Database,
    conversation_id: ConversationId,
) -> Result<Vec<Message>, HaggleError> {
    db.connection()
        .call(move |conn| -> Result<Vec<Message>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM mensagens m
                 WHERE m.conversa_id = ?1 ORDER BY m.created_at, m.id"
            ))?;
            let rows = stmt.query_map(params![conversation_id], |row| message_from_row(row, 0))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Conversations of `account_email` with at least one open inbound message.
///
/// Ordered by conversation id, then message id. Conversations with nothing
/// open are omitted.
pub async fn list_pending(
    db: &Database,
    account_email: &str,
) -> Result<Vec<PendingConversation>, HaggleError> {
    let email = account_email.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<PendingConversation>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT c.email, c.anuncio_id, {MESSAGE_COLUMNS}
                 FROM conversas c JOIN mensagens m ON m.conversa_id = c.id
                 WHERE c.email = ?1 AND m.tipo = ?2 AND m.respondida = 0
                 ORDER BY c.id, m.id"
            ))?;
            let rows = stmt.query_map(params![email, Direction::Inbound.as_wire()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, message_from_row(row, 2)?))
            })?;

            let mut pending: Vec<PendingConversation> = Vec::new();
            for row in rows {
                let (email, listing_id, message) = row?;
                match pending.last_mut() {
                    Some(last) if last.conversation_id == message.conversation_id => {
                        last.messages.push(message);
                    }
                    _ => pending.push(PendingConversation {
                        conversation_id: message.conversation_id,
                        account_email: email,
                        listing_id,
                        messages: vec![message],
                    }),
                }
            }
            Ok(pending)
        })
        .await
        .map_err(map_tr_err)
}

/// Filtered listing grouped by conversation, messages in creation order.
///
/// Conversations with no message matching the filter are omitted.
pub async fn list_messages(
    db: &Database,
    account_email: &str,
    filter: &MessageFilter,
) -> Result<Vec<ConversationThread>, HaggleError> {
    let mut clauses = vec!["c.email = ?".to_string()];
    let mut values = vec![Value::Text(account_email.to_string())];

    if let Some(direction) = filter.direction {
        clauses.push("m.tipo = ?".to_string());
        values.push(Value::Text(direction.as_wire().to_string()));
    }
    if let Some(id) = filter.conversation_id {
        clauses.push("c.id = ?".to_string());
        values.push(Value::Integer(id));
    }
    if let Some(listing_id) = &filter.listing_id {
        clauses.push("c.anuncio_id = ?".to_string());
        values.push(Value::Text(listing_id.clone()));
    }
    if let Some(answered) = filter.answered {
        clauses.push("m.respondida = ?".to_string());
        values.push(Value::Integer(i64::from(answered)));
    }
    match filter.has_searched_info {
        Some(true) => {
            clauses.push("(c.searched_info IS NOT NULL AND c.searched_info != '')".to_string())
        }
        Some(false) => clauses.push("(c.searched_info IS NULL OR c.searched_info = '')".to_string()),
        None => {}
    }

    let sql = format!(
        "SELECT c.id, c.email, c.anuncio_id, c.nome_vendedor, c.titulo_anuncio, c.preco_anuncio,
                c.searched_info, c.created_at, c.updated_at, {MESSAGE_COLUMNS}
         FROM conversas c JOIN mensagens m ON m.conversa_id = c.id
         WHERE {}
         ORDER BY c.id, m.created_at, m.id",
        clauses.join(" AND ")
    );

    db.connection()
        .call(move |conn| -> Result<Vec<ConversationThread>, rusqlite::Error> {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values), |row| {
                Ok((conversation_from_row(row)?, message_from_row(row, 9)?))
            })?;

            let mut threads: Vec<ConversationThread> = Vec::new();
            for row in rows {
                let (conversation, message) = row?;
                match threads.last_mut() {
                    Some(last) if last.conversation.id == conversation.id => {
                        last.messages.push(message);
                    }
                    _ => threads.push(ConversationThread {
                        conversation,
                        messages: vec![message],
                    }),
                }
            }
            Ok(threads)
        })
        .await
        .map_err(map_tr_err)
}
