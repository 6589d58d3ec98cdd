use crate::domain::room::{Room, RoomMessage};
use crate::domain::user::UserId;
use crate::error::Result;
use crate::storage::{DbPool, records};
use std::collections::BTreeSet;

#[derive(Clone, Debug)]
pub struct RoomRepository {
    pool: DbPool,
}

impl RoomRepository {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Inserts the room and its participant set in one transaction.
    pub async fn create(
        &self,
        name: &str,
        admin_id: UserId,
        participant_ids: &BTreeSet<UserId>,
        description: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<Room> {
        let now = records::now_ms();
        let mut tx = self.pool.begin().await?;

        let room = sqlx::query_as::<_, records::room::Room>(
            r"
            INSERT INTO rooms (name, admin_id, avatar, description, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)
            RETURNING id, name, admin_id, avatar, description, is_active, created_at, updated_at
            ",
        )
        .bind(name)
        .bind(admin_id)
        .bind(avatar)
        .bind(description)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        for user_id in participant_ids {
            sqlx::query("INSERT INTO room_participants (room_id, user_id) VALUES (?1, ?2)")
                .bind(room.id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(room.into())
    }

    /// Whether this admin already owns a room with this name, ignoring case.
    pub async fn name_taken(&self, admin_id: UserId, name: &str) -> Result<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM rooms WHERE admin_id = ?1 AND lower(name) = lower(?2))",
        )
        .bind(admin_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    pub async fn find(&self, room_id: i64) -> Result<Option<Room>> {
        let room = sqlx::query_as::<_, records::room::Room>(
            r"
            SELECT id, name, admin_id, avatar, description, is_active, created_at, updated_at
            FROM rooms
            WHERE id = ?1
            ",
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(room.map(Into::into))
    }

    pub async fn participants(&self, room_id: i64) -> Result<Vec<UserId>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM room_participants WHERE room_id = ?1 ORDER BY user_id ASC",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    pub async fn is_participant(&self, room_id: i64, user_id: UserId) -> Result<bool> {
        let member = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM room_participants WHERE room_id = ?1 AND user_id = ?2)",
        )
        .bind(room_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(member)
    }

    /// Rooms the user participates in, newest-created first, optionally
    /// filtered by a case-insensitive name fragment.
    pub async fn rooms_for_user(&self, user_id: UserId, name_fragment: Option<&str>) -> Result<Vec<Room>> {
        let rooms = match name_fragment {
            Some(fragment) => {
                sqlx::query_as::<_, records::room::Room>(
                    r"
                    SELECT r.id, r.name, r.admin_id, r.avatar, r.description, r.is_active, r.created_at, r.updated_at
                    FROM rooms r
                    JOIN room_participants p ON p.room_id = r.id
                    WHERE p.user_id = ?1 AND instr(lower(r.name), lower(?2)) > 0
                    ORDER BY r.created_at DESC, r.id DESC
                    ",
                )
                .bind(user_id)
                .bind(fragment)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, records::room::Room>(
                    r"
                    SELECT r.id, r.name, r.admin_id, r.avatar, r.description, r.is_active, r.created_at, r.updated_at
                    FROM rooms r
                    JOIN room_participants p ON p.room_id = r.id
                    WHERE p.user_id = ?1
                    ORDER BY r.created_at DESC, r.id DESC
                    ",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rooms.into_iter().map(Into::into).collect())
    }

    pub async fn latest_message(&self, room_id: i64) -> Result<Option<RoomMessage>> {
        let message = sqlx::query_as::<_, records::room::RoomMessage>(
            r"
            SELECT id, room_id, sender_id, body, created_at, is_read
            FROM room_messages
            WHERE room_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            ",
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message.map(Into::into))
    }

    /// Full room history, oldest first.
    pub async fn messages(&self, room_id: i64) -> Result<Vec<RoomMessage>> {
        let messages = sqlx::query_as::<_, records::room::RoomMessage>(
            r"
            SELECT id, room_id, sender_id, body, created_at, is_read
            FROM room_messages
            WHERE room_id = ?1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages.into_iter().map(Into::into).collect())
    }

    pub async fn insert_message(&self, room_id: i64, sender_id: UserId, body: &str) -> Result<RoomMessage> {
        let message = sqlx::query_as::<_, records::room::RoomMessage>(
            r"
            INSERT INTO room_messages (room_id, sender_id, body, created_at, is_read)
            VALUES (?1, ?2, ?3, ?4, 0)
            RETURNING id, room_id, sender_id, body, created_at, is_read
            ",
        )
        .bind(room_id)
        .bind(sender_id)
        .bind(body)
        .bind(records::now_ms())
        .fetch_one(&self.pool)
        .await?;

        Ok(message.into())
    }

    pub async fn find_message(&self, room_id: i64, message_id: i64) -> Result<Option<RoomMessage>> {
        let message = sqlx::query_as::<_, records::room::RoomMessage>(
            r"
            SELECT id, room_id, sender_id, body, created_at, is_read
            FROM room_messages
            WHERE id = ?1 AND room_id = ?2
            ",
        )
        .bind(message_id)
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message.map(Into::into))
    }

    pub async fn delete_message(&self, message_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM room_messages WHERE id = ?1")
            .bind(message_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes the room, its participant rows, and all of its messages in
    /// one transaction. Returns the number of messages removed.
    pub async fn delete_room(&self, room_id: i64) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let messages = sqlx::query("DELETE FROM room_messages WHERE room_id = ?1")
            .bind(room_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM room_participants WHERE room_id = ?1")
            .bind(room_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM rooms WHERE id = ?1")
            .bind(room_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(messages.rows_affected())
    }
}
