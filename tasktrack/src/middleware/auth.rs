//! Bearer token authentication

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap},
};

use crate::auth::TokenSigner;
use crate::pipeline::{ApiError, BoxedHandler, Handler, Middleware, Outcome, RequestContext};

/// Extract the token from the `Authorization` header
///
/// The header carries the raw token; a `Bearer ` prefix is tolerated.
pub fn extract_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    if token.is_empty() {
        return Err(ApiError::Unauthorized);
    }
    Ok(token)
}

/// Rejects requests without a valid token and records the caller's id
#[derive(Clone)]
pub struct Authenticate {
    signer: Arc<dyn TokenSigner>,
}

impl Authenticate {
    pub fn new(signer: Arc<dyn TokenSigner>) -> Self {
        Self { signer }
    }
}

impl Middleware for Authenticate {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(Authenticated {
            signer: self.signer.clone(),
            next,
        })
    }
}

struct Authenticated {
    signer: Arc<dyn TokenSigner>,
    next: BoxedHandler,
}

#[async_trait]
impl Handler for Authenticated {
    async fn call(&self, request: Request, ctx: &mut RequestContext) -> Outcome {
        let claims = {
            let token = extract_token(request.headers()).inspect_err(|_| {
                ctx.add_log_message("missing authorization header");
            })?;

            self.signer.verify(token).map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                ctx.add_log_message("invalid token");
                ApiError::Unauthorized
            })?
        };

        ctx.set_user_id(claims.user_id);
        ctx.add_log_field("user_id", claims.user_id);

        self.next.call(request, ctx).await
    }
}
