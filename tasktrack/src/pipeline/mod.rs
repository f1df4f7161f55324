//! Request pipeline
//!
//! Every API route is a chain of [`Middleware`]s around a terminal
//! [`Handler`], run by a [`Dispatcher`]:
//!
//! 1. the dispatcher creates a [`RequestContext`] with a fresh request id
//! 2. middlewares (authentication, pagination) run outermost first and may
//!    stop the request with an [`ApiError`]
//! 3. the terminal handler returns a [`Reply`] or an [`ApiError`]
//! 4. the dispatcher writes the `{status, data?, errors?}` envelope and logs
//!    one line for the request

mod context;
mod dispatcher;
mod error;
mod handler;
mod response;

pub use context::{LogScope, RequestContext};
pub use dispatcher::{Dispatcher, REQUEST_ID_HEADER};
pub use error::{ApiError, ErrorBody, ErrorKind, ValidationErrors};
pub use handler::{compose, BoxedHandler, Chain, Handler, Middleware, Outcome};
pub use response::{rule_for, ApiResponse, Reply, Severity, StatusRule, FALLBACK_RULE, STATUS_RULES};
