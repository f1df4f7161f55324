//! Business operations behind the handlers
//!
//! Services own their collaborators as trait objects and run all of one
//! request's downstream calls under a single [`Deadline`]. They fail with
//! [`ApiError`] so handlers can return their errors unchanged.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::pipeline::ApiError;
use crate::repository::{RepositoryError, RepositoryOperation, RepositoryResult};

mod tasks;
mod users;

pub use tasks::{TaskPage, TaskService};
pub use users::{Registration, UserService};

/// Time budget for one request's downstream work
///
/// Each service operation calls [`Deadline::start`] once and runs every
/// downstream step (repository calls, password hashing) against the returned
/// [`Expiry`], so the steps share one budget instead of each getting a fresh
/// one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Duration);

impl Deadline {
    pub fn new(budget: Duration) -> Self {
        Self(budget)
    }

    pub fn budget(&self) -> Duration {
        self.0
    }

    /// Start the clock for one request
    pub fn start(&self) -> Expiry {
        Expiry {
            at: Instant::now() + self.0,
            budget: self.0,
        }
    }
}

/// Fixed point in time after which a request's pending work is dropped
///
/// Dropping the pending future cancels it; the caller gets an internal error
/// whose text names the step that ran out of time.
#[derive(Debug, Clone, Copy)]
pub struct Expiry {
    at: Instant,
    budget: Duration,
}

impl Expiry {
    /// Await a repository call within the remaining budget
    pub async fn run<T, F>(&self, operation: RepositoryOperation, call: F) -> Result<T, ApiError>
    where
        F: Future<Output = RepositoryResult<T>>,
    {
        match tokio::time::timeout_at(self.at, call).await {
            Ok(result) => result.map_err(ApiError::from),
            Err(_) => Err(ApiError::internal(RepositoryError::timeout(
                operation,
                format!("request budget of {}ms exhausted", self.budget.as_millis()),
            ))),
        }
    }

    /// Await any other step, e.g. password hashing, within the remaining budget
    pub async fn bound<T, F>(&self, step: &str, work: F) -> Result<T, ApiError>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout_at(self.at, work).await.map_err(|_| {
            ApiError::internal(format!(
                "{step}: request budget of {}ms exhausted",
                self.budget.as_millis()
            ))
        })
    }
}
