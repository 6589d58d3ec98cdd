use crate::domain::message::DirectMessage;
use crate::domain::user::UserId;
use crate::error::Result;
use crate::storage::{DbPool, records};

/// Half the correlation window used to pair a sent copy with the
/// recipient's copy when computing read receipts.
const READ_RECEIPT_WINDOW_MS: i64 = 5_000;

#[derive(Clone, Debug)]
pub struct MessageRepository {
    pool: DbPool,
}

impl MessageRepository {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Stores both copies of a direct message in one transaction: the
    /// sender-owned copy already read, the recipient-owned copy unread.
    /// Either both rows commit or neither does.
    pub async fn create_pair(
        &self,
        sender_id: UserId,
        recipient_id: UserId,
        body: &str,
    ) -> Result<(DirectMessage, DirectMessage)> {
        let created_at = records::now_ms();
        let mut tx = self.pool.begin().await?;

        let sender_copy = sqlx::query_as::<_, records::message::Message>(
            r"
            INSERT INTO messages (owner_id, sender_id, recipient_id, body, created_at, is_read)
            VALUES (?1, ?2, ?3, ?4, ?5, 1)
            RETURNING id, owner_id, sender_id, recipient_id, body, created_at, is_read
            ",
        )
        .bind(sender_id)
        .bind(sender_id)
        .bind(recipient_id)
        .bind(body)
        .bind(created_at)
        .fetch_one(&mut *tx)
        .await?;

        let recipient_copy = sqlx::query_as::<_, records::message::Message>(
            r"
            INSERT INTO messages (owner_id, sender_id, recipient_id, body, created_at, is_read)
            VALUES (?1, ?2, ?3, ?4, ?5, 0)
            RETURNING id, owner_id, sender_id, recipient_id, body, created_at, is_read
            ",
        )
        .bind(recipient_id)
        .bind(sender_id)
        .bind(recipient_id)
        .bind(body)
        .bind(created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((sender_copy.into(), recipient_copy.into()))
    }

    /// The newest owned copy per conversation partner, newest conversation
    /// first. Ties on the timestamp fall back to the insert order.
    pub async fn latest_per_partner(&self, owner_id: UserId) -> Result<Vec<DirectMessage>> {
        let messages = sqlx::query_as::<_, records::message::Message>(
            r"
            SELECT id, owner_id, sender_id, recipient_id, body, created_at, is_read
            FROM (
                SELECT m.*, ROW_NUMBER() OVER (
                    PARTITION BY CASE WHEN m.sender_id = ?1 THEN m.recipient_id ELSE m.sender_id END
                    ORDER BY m.created_at DESC, m.id DESC
                ) AS rn
                FROM messages m
                WHERE m.owner_id = ?1
            )
            WHERE rn = 1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages.into_iter().map(Into::into).collect())
    }

    pub async fn latest_with_partner(&self, owner_id: UserId, partner_id: UserId) -> Result<Option<DirectMessage>> {
        let message = sqlx::query_as::<_, records::message::Message>(
            r"
            SELECT id, owner_id, sender_id, recipient_id, body, created_at, is_read
            FROM messages
            WHERE owner_id = ?1
              AND ((sender_id = ?1 AND recipient_id = ?2) OR (sender_id = ?2 AND recipient_id = ?1))
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            ",
        )
        .bind(owner_id)
        .bind(partner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message.map(Into::into))
    }

    /// Unread counts grouped by sending partner, for the owner's copies.
    pub async fn unread_counts(&self, owner_id: UserId) -> Result<Vec<(UserId, i64)>> {
        let counts = sqlx::query_as::<_, (i64, i64)>(
            r"
            SELECT sender_id, COUNT(*)
            FROM messages
            WHERE owner_id = ?1 AND recipient_id = ?1 AND is_read = 0
            GROUP BY sender_id
            ",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    pub async fn unread_from(&self, owner_id: UserId, partner_id: UserId) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*)
            FROM messages
            WHERE owner_id = ?1 AND sender_id = ?2 AND recipient_id = ?1 AND is_read = 0
            ",
        )
        .bind(owner_id)
        .bind(partner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Flips all of the owner's unread copies from this partner to read.
    pub async fn mark_read(&self, owner_id: UserId, partner_id: UserId) -> Result<u64> {
        let result = sqlx::query(
            r"
            UPDATE messages
            SET is_read = 1
            WHERE owner_id = ?1 AND sender_id = ?2 AND recipient_id = ?1 AND is_read = 0
            ",
        )
        .bind(owner_id)
        .bind(partner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// The owner's copies of a conversation, oldest first.
    pub async fn conversation(&self, owner_id: UserId, partner_id: UserId) -> Result<Vec<DirectMessage>> {
        let messages = sqlx::query_as::<_, records::message::Message>(
            r"
            SELECT id, owner_id, sender_id, recipient_id, body, created_at, is_read
            FROM messages
            WHERE owner_id = ?1
              AND ((sender_id = ?1 AND recipient_id = ?2) OR (sender_id = ?2 AND recipient_id = ?1))
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(owner_id)
        .bind(partner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages.into_iter().map(Into::into).collect())
    }

    /// Looks up the recipient-owned copy matching a sent message and returns
    /// its read flag. Copies share no key, so the match is by (sender,
    /// recipient, body) within ±5 seconds of the sent copy; the oldest
    /// matching row wins. `None` when no copy survives (recipient deleted it).
    pub async fn recipient_copy_read(
        &self,
        recipient_id: UserId,
        sender_id: UserId,
        body: &str,
        sent_at: time::OffsetDateTime,
    ) -> Result<Option<bool>> {
        let sent_ms = records::timestamp_ms(sent_at);

        let is_read = sqlx::query_scalar::<_, bool>(
            r"
            SELECT is_read
            FROM messages
            WHERE owner_id = ?1 AND sender_id = ?2 AND recipient_id = ?1 AND body = ?3
              AND created_at BETWEEN ?4 AND ?5
            ORDER BY id ASC
            LIMIT 1
            ",
        )
        .bind(recipient_id)
        .bind(sender_id)
        .bind(body)
        .bind(sent_ms - READ_RECEIPT_WINDOW_MS)
        .bind(sent_ms + READ_RECEIPT_WINDOW_MS)
        .fetch_optional(&self.pool)
        .await?;

        Ok(is_read)
    }

    /// Deletes one owned copy. The other party's copy is untouched.
    pub async fn delete_owned(&self, owner_id: UserId, message_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?1 AND owner_id = ?2")
            .bind(message_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Deletes every owned copy of a conversation. The partner keeps theirs.
    pub async fn delete_conversation(&self, owner_id: UserId, partner_id: UserId) -> Result<u64> {
        let result = sqlx::query(
            r"
            DELETE FROM messages
            WHERE owner_id = ?1
              AND ((sender_id = ?1 AND recipient_id = ?2) OR (sender_id = ?2 AND recipient_id = ?1))
            ",
        )
        .bind(owner_id)
        .bind(partner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
