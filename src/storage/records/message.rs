use crate::storage::records::from_timestamp_ms;

#[derive(sqlx::FromRow)]
pub(crate) struct Message {
    pub id: i64,
    pub owner_id: i64,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub body: String,
    pub created_at: i64,
    pub is_read: bool,
}

impl From<Message> for crate::domain::message::DirectMessage {
    fn from(record: Message) -> Self {
        Self {
            id: record.id,
            owner_id: record.owner_id,
            sender_id: record.sender_id,
            recipient_id: record.recipient_id,
            body: record.body,
            created_at: from_timestamp_ms(record.created_at),
            is_read: record.is_read,
            recipient_has_read: None,
        }
    }
}
