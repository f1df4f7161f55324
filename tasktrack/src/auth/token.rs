//! Bearer token signing and verification (HS256 JWT)

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::error::Error;
use crate::models::User;

/// Subject written into every user token
pub const USER_SUBJECT: &str = "user";

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Issuer
    pub iss: String,
    /// Always [`USER_SUBJECT`]
    pub sub: String,
    /// Numeric id of the authenticated user
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub name: String,
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl AuthClaims {
    /// Claims for `user`, valid for `lifetime` from now
    pub fn for_user(user: &User, issuer: &str, lifetime: Duration) -> Self {
        let now = Utc::now().timestamp();
        let lifetime = i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX);

        Self {
            iss: issuer.to_string(),
            sub: USER_SUBJECT.to_string(),
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            iat: now,
            exp: now.saturating_add(lifetime),
        }
    }
}

/// Produce and check access tokens
pub trait TokenSigner: Send + Sync {
    fn sign(&self, claims: &AuthClaims) -> Result<String, Error>;

    /// Fails on a bad signature, an expired token, a foreign issuer or
    /// malformed input
    fn verify(&self, token: &str) -> Result<AuthClaims, Error>;
}

/// HS256 signer over a shared secret
#[derive(Clone)]
pub struct JwtSigner {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Validation,
}

impl JwtSigner {
    /// Build a signer from `[auth.jwt]`
    pub fn new(config: &JwtConfig) -> Result<Self, Error> {
        if config.secret.is_empty() {
            return Err(Error::Config(Box::new(figment::Error::from(
                "auth.jwt.secret must not be empty".to_string(),
            ))));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        Ok(Self {
            encoding_key: Arc::new(EncodingKey::from_secret(config.secret.as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(config.secret.as_bytes())),
            validation,
        })
    }
}

impl TokenSigner for JwtSigner {
    fn sign(&self, claims: &AuthClaims) -> Result<String, Error> {
        let header = Header::new(Algorithm::HS256);
        encode(&header, claims, &self.encoding_key).map_err(|e| Error::Jwt(Box::new(e)))
    }

    fn verify(&self, token: &str) -> Result<AuthClaims, Error> {
        let token_data = decode::<AuthClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}
