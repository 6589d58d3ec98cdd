use time::OffsetDateTime;

/// Stable identifier handed out by the external identity provider.
pub type UserId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub created_at: OffsetDateTime,
}

/// An authenticated peer, as extracted from a verified identity token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
}
