//! Route handlers and the application router
//!
//! Each endpoint is a [`Handler`](crate::pipeline::Handler) wrapped in its
//! middleware [`Chain`] and mounted through the dispatcher, so every route
//! answers with the same envelope and logs the same line.

use async_trait::async_trait;
use axum::{
    extract::{DefaultBodyLimit, Request},
    routing::{get, post},
    Router,
};

use crate::health::health;
use crate::middleware::{Authenticate, Paginate};
use crate::pipeline::{ApiError, Chain, Handler, Outcome, RequestContext};
use crate::state::AppState;

pub mod body;
pub mod tasks;
pub mod users;

pub use tasks::{sortable_fields, CreateTask, CreateTaskRequest, ListTasks};
pub use users::{Login, LoginRequest, Register, RegisterRequest};

/// Answers unmatched requests with `ResourceNotFound("route")`
///
/// Used both for unknown paths and for known paths with no handler for the
/// method, so neither bypasses the envelope.
pub struct RouteNotFound {
    message: &'static str,
}

impl RouteNotFound {
    pub fn unknown_path() -> Self {
        Self { message: "no such route" }
    }

    pub fn unsupported_method() -> Self {
        Self {
            message: "method not allowed",
        }
    }
}

#[async_trait]
impl Handler for RouteNotFound {
    async fn call(&self, _request: Request, ctx: &mut RequestContext) -> Outcome {
        ctx.add_log_message(self.message);
        Err(ApiError::not_found("route"))
    }
}

/// Build the application router
///
/// | route | chain |
/// |---|---|
/// | `POST /users` | register |
/// | `POST /login` | login |
/// | `POST /tasks` | authenticate, create task |
/// | `GET /tasks` | authenticate, paginate, list tasks |
/// | `GET /health` | not dispatched |
///
/// Request bodies are capped at `middleware.body_limit_mb`; the JSON reader
/// turns an oversized body into a validation failure.
pub fn router(state: AppState) -> Router {
    let dispatcher = state.dispatcher().clone();
    let body_limit = state.config().middleware.body_limit_mb.saturating_mul(1024 * 1024);
    let public = Chain::new();
    let authenticated = Chain::new().with(Authenticate::new(state.signer()));
    let paginated = authenticated.clone().with(Paginate::new(sortable_fields()));

    Router::new()
        .route(
            "/users",
            post(dispatcher.endpoint(public.handler(Register::new(state.users().clone())))),
        )
        .route(
            "/login",
            post(dispatcher.endpoint(public.handler(Login::new(state.users().clone())))),
        )
        .route(
            "/tasks",
            post(dispatcher.endpoint(authenticated.handler(CreateTask::new(state.tasks().clone()))))
                .get(dispatcher.endpoint(paginated.handler(ListTasks::new(state.tasks().clone())))),
        )
        .route("/health", get(health))
        .fallback(dispatcher.endpoint(public.handler(RouteNotFound::unknown_path())))
        .method_not_allowed_fallback(
            dispatcher.endpoint(public.handler(RouteNotFound::unsupported_method())),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
