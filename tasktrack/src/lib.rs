//! # tasktrack
//!
//! Multi-tenant task tracking HTTP API built on a small request pipeline.
//!
//! Every endpoint is a [`Handler`](pipeline::Handler) wrapped by zero or more
//! [`Middleware`](pipeline::Middleware) values and run by a
//! [`Dispatcher`](pipeline::Dispatcher), which owns the per-request
//! [`RequestContext`](pipeline::RequestContext), maps errors to statuses,
//! writes the `{status, data, errors}` envelope and emits one log line.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tasktrack::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let state = AppState::builder().config(config.clone()).build()?;
//!
//!     Server::new(config).serve(router(state)).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod ids;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod pagination;
pub mod pipeline;
pub mod repository;
pub mod server;
pub mod service;
pub mod state;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::auth::{Argon2Hasher, AuthClaims, JwtSigner, PasswordHasher, TokenSigner};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::handlers::router;
    pub use crate::health::health;
    pub use crate::ids::RequestId;
    pub use crate::middleware::{Authenticate, Paginate};
    pub use crate::models::{NewTask, NewUser, Task, TaskData, User, UserData};
    pub use crate::observability::init_tracing;
    pub use crate::pagination::{Cursor, Direction, FieldType, Page, Sort, SortableFields};
    pub use crate::pipeline::{
        ApiError, Chain, Dispatcher, Handler, Middleware, Outcome, Reply, RequestContext,
    };
    pub use crate::repository::{
        MemoryTaskRepository, MemoryUserRepository, RepositoryError, TaskRepository,
        UserRepository,
    };
    pub use crate::server::Server;
    pub use crate::service::{Deadline, TaskService, UserService};
    pub use crate::state::{AppState, AppStateBuilder};

    pub use axum::Router;
}
