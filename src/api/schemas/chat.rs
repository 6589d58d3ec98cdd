use crate::api::schemas::users::UserSummary;
use crate::domain::message::{Conversation, ConversationDetail, DirectMessage};
use crate::storage::records::timestamp_ms;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub to_user: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub message: String,
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: i64,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub body: String,
    pub created_at: i64,
    pub is_read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_has_read: Option<bool>,
}

impl From<DirectMessage> for MessageResponse {
    fn from(message: DirectMessage) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            recipient_id: message.recipient_id,
            body: message.body,
            created_at: timestamp_ms(message.created_at),
            is_read: message.is_read,
            recipient_has_read: message.recipient_has_read,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConversationSummary {
    pub partner: UserSummary,
    pub last_message: MessageResponse,
    pub unread_count: i64,
    pub is_sent_last: bool,
}

impl From<Conversation> for ConversationSummary {
    fn from(conversation: Conversation) -> Self {
        Self {
            partner: conversation.partner.into(),
            last_message: conversation.last_message.into(),
            unread_count: conversation.unread_count,
            is_sent_last: conversation.is_sent_last,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub partner: UserSummary,
    pub messages: Vec<MessageResponse>,
}

impl From<ConversationDetail> for ConversationResponse {
    fn from(detail: ConversationDetail) -> Self {
        Self {
            partner: detail.partner.into(),
            messages: detail.messages.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}
