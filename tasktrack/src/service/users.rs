//! Registration and login

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthClaims, PasswordHasher, TokenSigner};
use crate::models::{NewUser, User};
use crate::pipeline::ApiError;
use crate::repository::{RepositoryOperation, UserRepository};

use super::Deadline;

/// Validated registration input, password still in clear
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// User accounts and token issuance
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    signer: Arc<dyn TokenSigner>,
    deadline: Deadline,
    issuer: String,
    token_lifetime: Duration,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        signer: Arc<dyn TokenSigner>,
        deadline: Deadline,
    ) -> Self {
        Self {
            users,
            hasher,
            signer,
            deadline,
            issuer: "todo-api".to_string(),
            token_lifetime: Duration::from_secs(3600),
        }
    }

    /// Issuer and lifetime written into issued tokens
    #[must_use]
    pub fn with_token_policy(mut self, issuer: impl Into<String>, lifetime: Duration) -> Self {
        self.issuer = issuer.into();
        self.token_lifetime = lifetime;
        self
    }

    /// Create an account; a taken email is a conflict on `user.email`
    ///
    /// Lookup, hashing and insert share one request budget.
    pub async fn register(&self, registration: Registration) -> Result<User, ApiError> {
        let expiry = self.deadline.start();

        let existing = expiry
            .run(
                RepositoryOperation::FindByEmail,
                self.users.get_by_email(&registration.email),
            )
            .await?;

        if existing.is_some() {
            return Err(ApiError::conflict("user", "email"));
        }

        let hasher = self.hasher.clone();
        let password = registration.password;
        let password_hash = expiry
            .bound(
                "password hashing",
                tokio::task::spawn_blocking(move || hasher.hash(&password)),
            )
            .await?
            .map_err(ApiError::internal)?
            .map_err(ApiError::internal)?;

        let new_user = NewUser {
            name: registration.name,
            email: registration.email,
            password_hash,
        };

        // A concurrent registration can still win the race; the repository
        // reports that as the same conflict
        expiry
            .run(RepositoryOperation::Create, self.users.create(new_user))
            .await
    }

    /// Check credentials and issue a signed token
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn generate_auth_token(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let expiry = self.deadline.start();

        let user = expiry
            .run(RepositoryOperation::FindByEmail, self.users.get_by_email(email))
            .await?
            .ok_or(ApiError::PasswordMismatch)?;

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let stored = user.password_hash.clone();
        let matches = expiry
            .bound(
                "password verification",
                tokio::task::spawn_blocking(move || hasher.verify(&password, &stored)),
            )
            .await?
            .map_err(ApiError::internal)?
            .map_err(ApiError::internal)?;

        if !matches {
            return Err(ApiError::PasswordMismatch);
        }

        let claims = AuthClaims::for_user(&user, &self.issuer, self.token_lifetime);
        self.signer.sign(&claims).map_err(ApiError::internal)
    }
}
