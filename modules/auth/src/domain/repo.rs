use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::User;

/// A user row including its password hash; only the domain sees this.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub user: User,
    pub password_hash: String,
}

/// Port for the domain layer: persistence operations the domain needs.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Insert a new user; fails with a unique violation on a taken email.
    async fn insert_user(&self, user: StoredUser) -> anyhow::Result<()>;
    /// Lookup by normalized email.
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<StoredUser>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
}
