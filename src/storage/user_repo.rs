use crate::domain::user::{User, UserId};
use crate::error::Result;
use crate::storage::{DbPool, records};

#[derive(Clone, Debug)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Upserts the directory projection of an externally-managed identity.
    pub async fn ensure(&self, id: UserId, username: &str) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO users (id, username, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (id) DO UPDATE SET username = excluded.username
            ",
        )
        .bind(id)
        .bind(username)
        .bind(records::now_ms())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, records::user::User>(
            r"
            SELECT id, username, created_at
            FROM users
            WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user.map(Into::into))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, records::user::User>(
            r"
            SELECT id, username, created_at
            FROM users
            WHERE username = ?1
            ",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user.map(Into::into))
    }

    /// First user whose name contains the fragment (case-insensitive),
    /// excluding the caller. Ordered by username so the match is stable.
    pub async fn first_match(&self, fragment: &str, exclude: UserId) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, records::user::User>(
            r"
            SELECT id, username, created_at
            FROM users
            WHERE instr(lower(username), lower(?1)) > 0 AND id != ?2
            ORDER BY username ASC
            LIMIT 1
            ",
        )
        .bind(fragment)
        .bind(exclude)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user.map(Into::into))
    }

    pub async fn search(&self, fragment: &str, exclude: UserId, limit: i64) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, records::user::User>(
            r"
            SELECT id, username, created_at
            FROM users
            WHERE instr(lower(username), lower(?1)) > 0 AND id != ?2
            ORDER BY username ASC
            LIMIT ?3
            ",
        )
        .bind(fragment)
        .bind(exclude)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(users.into_iter().map(Into::into).collect())
    }

    pub async fn list_excluding(&self, exclude: UserId, limit: i64) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, records::user::User>(
            r"
            SELECT id, username, created_at
            FROM users
            WHERE id != ?1
            ORDER BY username ASC
            LIMIT ?2
            ",
        )
        .bind(exclude)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(users.into_iter().map(Into::into).collect())
    }
}
