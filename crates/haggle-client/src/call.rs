// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The closed set of persistence API operations.

use haggle_core::api::{paths, MessageBody};
use haggle_core::{ConversationKey, Direction, ListingInfo, MessageFilter};
use reqwest::Method;

/// One persistence API operation with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    CreateConversation {
        key: ConversationKey,
    },
    PendingConversations {
        account_email: String,
    },
    ListMessages {
        account_email: String,
        filter: MessageFilter,
    },
    MessageExists {
        key: ConversationKey,
        direction: Direction,
        text: String,
    },
    /// Records an outbound line.
    SendMessage {
        key: ConversationKey,
        text: String,
    },
    /// Records a line of either direction.
    ReceiveMessage {
        key: ConversationKey,
        direction: Direction,
        text: String,
    },
    UpdateListingInfo {
        key: ConversationKey,
        info: ListingInfo,
    },
    ListingInfo {
        key: ConversationKey,
    },
    UpdateSearchedInfo {
        key: ConversationKey,
        info: String,
    },
    Health,
}

fn key_params(key: &ConversationKey) -> Vec<(&'static str, String)> {
    vec![
        ("email", key.account_email.clone()),
        ("anuncio_id", key.listing_id.clone()),
    ]
}

impl ApiCall {
    /// Short operation name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ApiCall::CreateConversation { .. } => "create_conversation",
            ApiCall::PendingConversations { .. } => "pending_conversations",
            ApiCall::ListMessages { .. } => "list_messages",
            ApiCall::MessageExists { .. } => "message_exists",
            ApiCall::SendMessage { .. } => "send_message",
            ApiCall::ReceiveMessage { .. } => "receive_message",
            ApiCall::UpdateListingInfo { .. } => "update_listing_info",
            ApiCall::ListingInfo { .. } => "listing_info",
            ApiCall::UpdateSearchedInfo { .. } => "update_searched_info",
            ApiCall::Health => "health",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            ApiCall::PendingConversations { .. }
            | ApiCall::ListMessages { .. }
            | ApiCall::MessageExists { .. }
            | ApiCall::ListingInfo { .. }
            | ApiCall::Health => Method::GET,
            ApiCall::CreateConversation { .. }
            | ApiCall::SendMessage { .. }
            | ApiCall::ReceiveMessage { .. }
            | ApiCall::UpdateListingInfo { .. }
            | ApiCall::UpdateSearchedInfo { .. } => Method::POST,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            ApiCall::CreateConversation { .. } => paths::CREATE_CONVERSATION,
            ApiCall::PendingConversations { .. } => paths::PENDING_CONVERSATIONS,
            ApiCall::ListMessages { .. } => paths::LIST_MESSAGES,
            ApiCall::MessageExists { .. } => paths::MESSAGE_EXISTS,
            ApiCall::SendMessage { .. } => paths::SEND_MESSAGE,
            ApiCall::ReceiveMessage { .. } => paths::RECEIVE_MESSAGE,
            ApiCall::UpdateListingInfo { .. } => paths::UPDATE_LISTING_INFO,
            ApiCall::ListingInfo { .. } => paths::LISTING_INFO,
            ApiCall::UpdateSearchedInfo { .. } => paths::UPDATE_SEARCHED_INFO,
            ApiCall::Health => paths::HEALTH,
        }
    }

    /// Query string parameters.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            ApiCall::CreateConversation { key }
            | ApiCall::SendMessage { key, .. }
            | ApiCall::ListingInfo { key } => key_params(key),
            ApiCall::PendingConversations { account_email } => {
                vec![("email", account_email.clone())]
            }
            ApiCall::ListMessages {
                account_email,
                filter,
            } => {
                let mut params = vec![("email", account_email.clone())];
                if let Some(direction) = filter.direction {
                    params.push(("tipo", direction.as_wire().to_string()));
                }
                if let Some(id) = filter.conversation_id {
                    params.push(("conversa_id", id.to_string()));
                }
                if let Some(listing_id) = &filter.listing_id {
                    params.push(("anuncio_id", listing_id.clone()));
                }
                if let Some(answered) = filter.answered {
                    params.push(("respondida", answered.to_string()));
                }
                if let Some(has_info) = filter.has_searched_info {
                    params.push(("searched_info", has_info.to_string()));
                }
                params
            }
            ApiCall::MessageExists {
                key,
                direction,
                text,
            } => {
                let mut params = key_params(key);
                params.push(("mensagem", text.clone()));
                params.push(("tipo", direction.as_wire().to_string()));
                params
            }
            ApiCall::ReceiveMessage { key, direction, .. } => {
                let mut params = key_params(key);
                params.push(("tipo", direction.as_wire().to_string()));
                params
            }
            ApiCall::UpdateListingInfo { key, info } => {
                let mut params = key_params(key);
                params.push(("nome_vendedor", info.seller_name.clone()));
                params.push(("titulo_anuncio", info.title.clone()));
                params.push(("preco_anuncio", info.price.clone()));
                params
            }
            ApiCall::UpdateSearchedInfo { key, info } => {
                let mut params = key_params(key);
                params.push(("searched_info", info.clone()));
                params
            }
            ApiCall::Health => Vec::new(),
        }
    }

    /// JSON body, for the ingestion routes only.
    pub fn body(&self) -> Option<MessageBody> {
        match self {
            ApiCall::SendMessage { text, .. } | ApiCall::ReceiveMessage { text, .. } => {
                Some(MessageBody {
                    mensagem: text.clone(),
                })
            }
            ApiCall::CreateConversation { .. }
            | ApiCall::PendingConversations { .. }
            | ApiCall::ListMessages { .. }
            | ApiCall::MessageExists { .. }
            | ApiCall::UpdateListingInfo { .. }
            | ApiCall::ListingInfo { .. }
            | ApiCall::UpdateSearchedInfo { .. }
            | ApiCall::Health => None,
        }
    }
}
