use crate::storage::records::from_timestamp_ms;

#[derive(sqlx::FromRow)]
pub(crate) struct Room {
    pub id: i64,
    pub name: String,
    pub admin_id: Option<i64>,
    pub avatar: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Room> for crate::domain::room::Room {
    fn from(record: Room) -> Self {
        Self {
            id: record.id,
            name: record.name,
            admin_id: record.admin_id,
            avatar: record.avatar,
            description: record.description,
            is_active: record.is_active,
            created_at: from_timestamp_ms(record.created_at),
            updated_at: from_timestamp_ms(record.updated_at),
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct RoomMessage {
    pub id: i64,
    pub room_id: i64,
    pub sender_id: i64,
    pub body: String,
    pub created_at: i64,
    pub is_read: bool,
}

impl From<RoomMessage> for crate::domain::room::RoomMessage {
    fn from(record: RoomMessage) -> Self {
        Self {
            id: record.id,
            room_id: record.room_id,
            sender_id: record.sender_id,
            body: record.body,
            created_at: from_timestamp_ms(record.created_at),
            is_read: record.is_read,
        }
    }
}
