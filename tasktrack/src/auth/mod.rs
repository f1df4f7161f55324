//! Credentials: password hashing and bearer tokens
//!
//! Services depend on the [`PasswordHasher`] and [`TokenSigner`] traits and
//! receive the concrete Argon2id and HS256 implementations at startup, so
//! tests can substitute their own.

pub mod password;
pub mod token;

pub use password::{Argon2Hasher, PasswordHasher};
pub use token::{AuthClaims, JwtSigner, TokenSigner, USER_SUBJECT};
