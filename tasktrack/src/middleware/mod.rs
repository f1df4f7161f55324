//! Pipeline middlewares
//!
//! Both are [`Middleware`](crate::pipeline::Middleware) values composed with
//! [`Chain`](crate::pipeline::Chain); listing routes use
//! `Authenticate` then `Paginate`.

pub mod auth;
pub mod paginate;

pub use auth::{extract_token, Authenticate};
pub use paginate::Paginate;
