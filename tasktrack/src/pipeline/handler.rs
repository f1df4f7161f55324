//! Handlers and middleware composition
//!
//! A [`Handler`] takes the request and the request's context and produces an
//! [`Outcome`]. A [`Middleware`] turns a handler into another handler, so a
//! chain is plain function application: `outer.wrap(inner.wrap(handler))`.
//!
//! ```rust,ignore
//! let list_tasks = Chain::new()
//!     .with(Authenticate::new(signer))
//!     .with(Paginate::new(fields))
//!     .handler(ListTasks::new(tasks));
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Request;

use super::context::RequestContext;
use super::error::ApiError;
use super::response::Reply;

/// Result of running a handler
pub type Outcome = Result<Reply, ApiError>;

/// Terminal or wrapped request handler
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Handle `request`, recording identity, page and log fields on `ctx`
    async fn call(&self, request: Request, ctx: &mut RequestContext) -> Outcome;
}

/// Shared, type-erased handler
pub type BoxedHandler = Arc<dyn Handler>;

/// `Handler -> Handler` transformation
///
/// A middleware may change the request or context before delegating, return
/// its own error without delegating, or look at the delegate's outcome on the
/// way out.
pub trait Middleware: Send + Sync + 'static {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler;
}

/// Wrap `handler` in `middlewares`, the first one outermost
pub fn compose(handler: BoxedHandler, middlewares: &[Arc<dyn Middleware>]) -> BoxedHandler {
    middlewares
        .iter()
        .rev()
        .fold(handler, |next, middleware| middleware.wrap(next))
}

/// Builder for a middleware chain, listed outermost first
#[derive(Default, Clone)]
pub struct Chain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware; it runs after every middleware added before it
    #[must_use]
    pub fn with(mut self, middleware: impl Middleware) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Append an already shared middleware
    #[must_use]
    pub fn with_shared(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Terminate the chain with `handler`
    pub fn handler(&self, handler: impl Handler) -> BoxedHandler {
        compose(Arc::new(handler), &self.middlewares)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::RequestId;
    use axum::body::Body;
    use axum::http::StatusCode;
    use std::sync::Mutex;

    type Trace = Arc<Mutex<Vec<String>>>;

    struct Terminal {
        trace: Trace,
    }

    #[async_trait]
    impl Handler for Terminal {
        async fn call(&self, _request: Request, ctx: &mut RequestContext) -> Outcome {
            self.trace.lock().unwrap().push("handler".into());
            ctx.add_log_message("handled");
            Reply::ok(&serde_json::json!({ "user": ctx.user_id() }))
        }
    }

    struct Recording {
        name: &'static str,
        trace: Trace,
        reject: bool,
    }

    struct Recorded {
        name: &'static str,
        trace: Trace,
        reject: bool,
        next: BoxedHandler,
    }

    impl Middleware for Recording {
        fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
            Arc::new(Recorded {
                name: self.name,
                trace: self.trace.clone(),
                reject: self.reject,
                next,
            })
        }
    }

    #[async_trait]
    impl Handler for Recorded {
        async fn call(&self, request: Request, ctx: &mut RequestContext) -> Outcome {
            self.trace.lock().unwrap().push(format!("{} in", self.name));
            if self.reject {
                return Err(ApiError::Unauthorized);
            }
            ctx.set_user_id(ctx.user_id().unwrap_or(0) + 1);

            let outcome = self.next.call(request, ctx).await;

            let status = outcome.as_ref().map(|r| r.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            self.trace.lock().unwrap().push(format!("{} out {}", self.name, status.as_u16()));
            outcome
        }
    }

    fn recording(name: &'static str, trace: &Trace, reject: bool) -> Recording {
        Recording {
            name,
            trace: trace.clone(),
            reject,
        }
    }

    fn request() -> Request {
        axum::http::Request::builder().uri("/tasks").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_outer_middleware_runs_first() {
        let trace = Trace::default();
        let chain = Chain::new()
            .with(recording("auth", &trace, false))
            .with(recording("paginate", &trace, false))
            .handler(Terminal { trace: trace.clone() });

        let mut ctx = RequestContext::new(RequestId::new(), "GET", "/tasks");
        let reply = chain.call(request(), &mut ctx).await.unwrap();

        assert_eq!(
            *trace.lock().unwrap(),
            vec!["auth in", "paginate in", "handler", "paginate out 200", "auth out 200"]
        );
        assert_eq!(reply.data, serde_json::json!({ "user": 2 }));
        assert_eq!(ctx.log().message(), "handled");
    }

    #[tokio::test]
    async fn test_middleware_can_short_circuit() {
        let trace = Trace::default();
        let chain = Chain::new()
            .with(recording("auth", &trace, true))
            .handler(Terminal { trace: trace.clone() });

        let mut ctx = RequestContext::new(RequestId::new(), "GET", "/tasks");
        let outcome = chain.call(request(), &mut ctx).await;

        assert_eq!(outcome, Err(ApiError::Unauthorized));
        assert_eq!(*trace.lock().unwrap(), vec!["auth in"]);
    }

    #[tokio::test]
    async fn test_empty_chain_is_the_handler() {
        let trace = Trace::default();
        let handler = compose(Arc::new(Terminal { trace: trace.clone() }), &[]);

        let mut ctx = RequestContext::new(RequestId::new(), "POST", "/users");
        assert!(handler.call(request(), &mut ctx).await.is_ok());
        assert_eq!(*trace.lock().unwrap(), vec!["handler"]);
    }
}
