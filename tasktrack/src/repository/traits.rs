//! Repository trait definitions
//!
//! Services hold repositories as `Arc<dyn UserRepository>` /
//! `Arc<dyn TaskRepository>`, so the traits use `async_trait` to stay
//! object-safe. Lookups return `Ok(None)` when nothing matches; `Err` is
//! reserved for backend failures and uniqueness violations.

use async_trait::async_trait;

use super::error::RepositoryError;
use crate::models::{NewTask, NewUser, Task, User};
use crate::pagination::Page;

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Storage for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Store a new user and return it with its id and timestamps
    ///
    /// Fails with [`RepositoryError::already_exists`] when the email is taken.
    async fn create(&self, user: NewUser) -> RepositoryResult<User>;

    async fn get_by_id(&self, id: i64) -> RepositoryResult<Option<User>>;

    async fn get_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
}

/// Storage for tasks
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Store a new, incomplete task
    async fn create(&self, task: NewTask) -> RepositoryResult<Task>;

    async fn get_by_id(&self, id: i64) -> RepositoryResult<Option<Task>>;

    /// One page of `owner_id`'s tasks
    ///
    /// Rows are ordered by `page.sorts()`. With a cursor, only rows strictly
    /// after the cursor's `last_val` tuple are returned and `offset` is not
    /// applied. At most `page.limit` rows come back.
    async fn list_by_owner(&self, owner_id: i64, page: &Page) -> RepositoryResult<Vec<Task>>;
}
