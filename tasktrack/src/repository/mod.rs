//! Storage traits and the in-memory implementation
//!
//! - [`UserRepository`] / [`TaskRepository`]: what services need from storage
//! - [`RepositoryError`]: categorized failures, convertible to
//!   [`ApiError`](crate::pipeline::ApiError)
//! - [`MemoryUserRepository`] / [`MemoryTaskRepository`]: `DashMap`-backed
//!   implementations used by the default binary and by tests

mod error;
mod memory;
mod traits;

pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use memory::{MemoryTaskRepository, MemoryUserRepository};
pub use traits::{RepositoryResult, TaskRepository, UserRepository};
