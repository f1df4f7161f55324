//! `POST /users` and `POST /login`

use async_trait::async_trait;
use axum::extract::Request;
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use super::body::read_json;
use crate::models::UserData;
use crate::pipeline::{ApiError, Handler, Outcome, Reply, RequestContext, ValidationErrors};
use crate::service::{Registration, UserService};

const REQUIRED: &str = "Non-empty value is required";
const MIN_PASSWORD_LEN: usize = 6;

/// Body of `POST /users`; absent fields decode as empty
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Report every invalid field at once
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();

        if self.name.trim().is_empty() {
            errors.add("name", REQUIRED);
        }

        if self.email.trim().is_empty() {
            errors.add("email", REQUIRED);
        } else if !self.email.validate_email() {
            errors.add("email", "Invalid value");
        }

        let password = self.password.trim();
        if password.is_empty() {
            errors.add("password", REQUIRED);
        } else if password.chars().count() < MIN_PASSWORD_LEN {
            errors.add("password", "Length should be 6 or more");
        }

        errors.finish("validation error")
    }
}

impl From<RegisterRequest> for Registration {
    fn from(body: RegisterRequest) -> Self {
        Self {
            name: body.name,
            email: body.email,
            password: body.password,
        }
    }
}

#[derive(Debug, Serialize)]
struct CreatedUser {
    user: UserData,
}

/// Registers a new account
pub struct Register {
    users: UserService,
}

impl Register {
    pub fn new(users: UserService) -> Self {
        Self { users }
    }
}

#[async_trait]
impl Handler for Register {
    async fn call(&self, request: Request, ctx: &mut RequestContext) -> Outcome {
        let body: RegisterRequest = read_json(request, ctx).await?;

        body.validate().inspect_err(|_| ctx.add_log_message("validation error"))?;

        let user = self.users.register(body.into()).await?;
        ctx.add_log_field("user_id", user.id);

        Reply::created(&CreatedUser {
            user: UserData::from(&user),
        })
    }
}

/// Body of `POST /login`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct IssuedToken {
    token: String,
}

/// Exchanges credentials for a bearer token
pub struct Login {
    users: UserService,
}

impl Login {
    pub fn new(users: UserService) -> Self {
        Self { users }
    }
}

#[async_trait]
impl Handler for Login {
    async fn call(&self, request: Request, ctx: &mut RequestContext) -> Outcome {
        let body: LoginRequest = read_json(request, ctx).await?;

        let token = self
            .users
            .generate_auth_token(&body.email, &body.password)
            .await
            .inspect_err(|_| ctx.add_log_message("login failed"))?;

        Reply::ok(&IssuedToken { token })
    }
}
