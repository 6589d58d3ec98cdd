use crate::domain::user::{Identity, User, UserId};
use crate::error::Result;
use crate::storage::user_repo::UserRepository;

/// How many users a query-less directory search returns.
const SEARCH_LIMIT: i64 = 20;

/// Local projection of the external identity provider's user directory.
#[derive(Clone, Debug)]
pub struct UserService {
    repo: UserRepository,
}

impl UserService {
    #[must_use]
    pub const fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    /// Records (or refreshes) the directory row for a connected identity.
    pub async fn ensure_known(&self, identity: &Identity) -> Result<()> {
        self.repo.ensure(identity.user_id, &identity.username).await
    }

    pub async fn find(&self, id: UserId) -> Result<Option<User>> {
        self.repo.find_by_id(id).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.repo.find_by_username(username).await
    }

    /// Directory search: username-substring match excluding the caller, or
    /// an alphabetical sample when no query is given.
    pub async fn search(&self, caller: UserId, query: Option<&str>) -> Result<Vec<User>> {
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(fragment) => self.repo.search(fragment, caller, SEARCH_LIMIT).await,
            None => self.repo.list_excluding(caller, SEARCH_LIMIT).await,
        }
    }
}
