use crate::domain::user::UserId;
use time::OffsetDateTime;

#[derive(Debug, Clone)]
pub struct Room {
    pub id: i64,
    pub name: String,
    /// Null once the admin account has been removed.
    pub admin_id: Option<UserId>,
    /// Opaque reference into the external media store.
    pub avatar: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct RoomMessage {
    pub id: i64,
    pub room_id: i64,
    pub sender_id: UserId,
    pub body: String,
    pub created_at: OffsetDateTime,
    pub is_read: bool,
}

/// A room as it appears in a user's room list.
#[derive(Debug, Clone)]
pub struct RoomOverview {
    pub room: Room,
    pub last_message: Option<RoomMessage>,
}

#[derive(Debug, Clone)]
pub struct RoomDetail {
    pub room: Room,
    pub participant_ids: Vec<UserId>,
    pub messages: Vec<RoomMessage>,
}
