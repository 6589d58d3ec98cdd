use crate::storage::records::from_timestamp_ms;

#[derive(sqlx::FromRow)]
pub(crate) struct User {
    pub id: i64,
    pub username: String,
    pub created_at: i64,
}

impl From<User> for crate::domain::user::User {
    fn from(record: User) -> Self {
        Self { id: record.id, username: record.username, created_at: from_timestamp_ms(record.created_at) }
    }
}
