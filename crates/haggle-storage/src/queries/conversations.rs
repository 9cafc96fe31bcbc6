// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation operations.

use haggle_core::{
    Conversation, ConversationId, ConversationKey, CreateOutcome, HaggleError, ListingDetails,
    ListingInfo, MetadataWrite,
};
use rusqlite::{params, Connection, OptionalExtension};

use crate::database::{domain_err, map_tr_err, Database};

const CONVERSATION_COLUMNS: &str = "id, email, anuncio_id, nome_vendedor, titulo_anuncio, \
     preco_anuncio, searched_info, created_at, updated_at";

pub(crate) fn conversation_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        account_email: row.get(1)?,
        listing_id: row.get(2)?,
        seller_name: row.get(3)?,
        title: row.get(4)?,
        price: row.get(5)?,
        searched_info: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

pub(crate) fn validate_key(key: &ConversationKey) -> Result<(), HaggleError> {
    if key.account_email.trim().is_empty() || key.listing_id.trim().is_empty() {
        return Err(HaggleError::Validation(
            "email and anuncio_id must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn find_in(
    conn: &Connection,
    key: &ConversationKey,
) -> rusqlite::Result<Option<Conversation>> {
    conn.query_row(
        &format!("SELECT {CONVERSATION_COLUMNS} FROM conversas WHERE email = ?1 AND anuncio_id = ?2"),
        params![key.account_email, key.listing_id],
        conversation_from_row,
    )
    .optional()
}

/// Insert the conversation unless the key already exists. Returns the row and whether it is new.
pub(crate) fn get_or_insert_in(
    conn: &Connection,
    key: &ConversationKey,
) -> rusqlite::Result<(Conversation, bool)> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO conversas (email, anuncio_id) VALUES (?1, ?2)",
        params![key.account_email, key.listing_id],
    )?;
    let conversation = find_in(conn, key)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
    Ok((conversation, inserted == 1))
}

pub(crate) fn touch_in(conn: &Connection, id: ConversationId) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE conversas SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?1",
        params![id],
    )?;
    Ok(())
}

/// Create a conversation, reporting whether it already existed.
pub async fn create_conversation(
    db: &Database,
    key: &ConversationKey,
) -> Result<CreateOutcome, HaggleError> {
    validate_key(key)?;
    let key = key.clone();
    db.connection()
        .call(move |conn| -> Result<CreateOutcome, rusqlite::Error> {
            let (conversation, created) = get_or_insert_in(conn, &key)?;
            Ok(if created {
                CreateOutcome::Created(conversation)
            } else {
                CreateOutcome::AlreadyExists(conversation)
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Return the conversation for `key`, creating it first if needed.
pub async fn get_or_create_conversation(
    db: &Database,
    key: &ConversationKey,
) -> Result<Conversation, HaggleError> {
    create_conversation(db, key).await.map(|outcome| match outcome {
        CreateOutcome::Created(c) | CreateOutcome::AlreadyExists(c) => c,
    })
}

/// Look up a conversation by its composite key.
pub async fn find_conversation(
    db: &Database,
    key: &ConversationKey,
) -> Result<Option<Conversation>, HaggleError> {
    let key = key.clone();
    db.connection()
        .call(move |conn| -> Result<Option<Conversation>, rusqlite::Error> { find_in(conn, &key) })
        .await
        .map_err(map_tr_err)
}

/// Every conversation, oldest first.
pub async fn list_conversations(db: &Database) -> Result<Vec<Conversation>, HaggleError> {
    db.connection()
        .call(|conn| -> Result<Vec<Conversation>, rusqlite::Error> {
            let mut stmt =
                conn.prepare(&format!("SELECT {CONVERSATION_COLUMNS} FROM conversas ORDER BY id"))?;
            let rows = stmt.query_map([], conversation_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Overwrite seller, title, and price. Fails with [`HaggleError::NotFound`] for an unknown key.
pub async fn update_listing_info(
    db: &Database,
    key: &ConversationKey,
    info: &ListingInfo,
) -> Result<(), HaggleError> {
    let key = key.clone();
    let info = info.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE conversas
                 SET nome_vendedor = ?1, titulo_anuncio = ?2, preco_anuncio = ?3,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE email = ?4 AND anuncio_id = ?5",
                params![
                    info.seller_name,
                    info.title,
                    info.price,
                    key.account_email,
                    key.listing_id
                ],
            )?;
            if changed == 0 {
                return Err(domain_err(HaggleError::NotFound {
                    account_email: key.account_email,
                    listing_id: key.listing_id,
                }));
            }
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Stored listing fields, or `None` for an unknown conversation.
pub async fn listing_info(
    db: &Database,
    key: &ConversationKey,
) -> Result<Option<ListingDetails>, HaggleError> {
    find_conversation(db, key).await.map(|found| {
        found.map(|c| ListingDetails {
            seller_name: c.seller_name,
            title: c.title,
            price: c.price,
            searched_info: c.searched_info,
        })
    })
}

/// Write the detailed listing description once.
///
/// An empty stored value counts as unset. An unknown id yields
/// [`MetadataWrite::Skipped`].
pub async fn set_metadata_once(
    db: &Database,
    conversation_id: ConversationId,
    searched_info: &str,
) -> Result<MetadataWrite, HaggleError> {
    let searched_info = searched_info.to_string();
    db.connection()
        .call(move |conn| -> Result<MetadataWrite, rusqlite::Error> {
            let tx = conn.transaction()?;
            let current: Option<Option<String>> = tx
                .query_row(
                    "SELECT searched_info FROM conversas WHERE id = ?1",
                    params![conversation_id],
                    |row| row.get(0),
                )
                .optional()?;
            let outcome = match current {
                None => MetadataWrite::Skipped,
                Some(Some(existing)) if !existing.is_empty() => MetadataWrite::AlreadySet,
                Some(_) => {
                    tx.execute(
                        "UPDATE conversas
                         SET searched_info = ?1, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                         WHERE id = ?2",
                        params![searched_info, conversation_id],
                    )?;
                    MetadataWrite::Written
                }
            };
            tx.commit()?;
            Ok(outcome)
        })
        .await
        .map_err(map_tr_err)
}
