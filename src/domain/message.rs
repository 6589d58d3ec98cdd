use crate::domain::user::{User, UserId};
use time::OffsetDateTime;

/// One owner's copy of a direct message. Every logical send stores two of
/// these: the sender's copy (already read) and the recipient's copy (unread
/// until viewed). Copies have no pairing key; they are correlated by
/// (sender, recipient, body) within a small time window.
#[derive(Debug, Clone)]
pub struct DirectMessage {
    pub id: i64,
    pub owner_id: UserId,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    pub body: String,
    pub created_at: OffsetDateTime,
    pub is_read: bool,
    /// Whether the other side has read their copy. Only populated on
    /// messages the viewer sent; `None` on received messages.
    pub recipient_has_read: Option<bool>,
}

/// A (user, partner) conversation summary derived from the user's owned
/// message copies. Never stored.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub partner: User,
    pub last_message: DirectMessage,
    pub unread_count: i64,
    pub is_sent_last: bool,
}

#[derive(Debug, Clone)]
pub struct ConversationDetail {
    pub partner: User,
    pub messages: Vec<DirectMessage>,
}
