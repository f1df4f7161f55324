//! JSON request bodies

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
};
use serde::de::DeserializeOwned;

use crate::pipeline::{ApiError, ErrorBody, RequestContext};

/// Read and decode the whole body as `T`
///
/// The size cap is the router's `DefaultBodyLimit`. An oversized body is
/// reported as "Request body too large", any other unreadable or
/// undecodable body as "Invalid request body".
pub async fn read_json<T: DeserializeOwned>(request: Request, ctx: &mut RequestContext) -> Result<T, ApiError> {
    let bytes = match Bytes::from_request(request, &()).await {
        Ok(bytes) => bytes,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            ctx.add_log_message("Request body too large");
            return Err(body_too_large());
        }
        Err(rejection) => {
            tracing::debug!(reason = %rejection, "unreadable request body");
            ctx.add_log_message("Invalid request body");
            return Err(ApiError::invalid_request_body());
        }
    };

    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!(reason = %e, "undecodable request body");
        ctx.add_log_message("Invalid request body");
        ApiError::invalid_request_body()
    })
}

fn body_too_large() -> ApiError {
    ApiError::ValidationFailed {
        message: "Request body too large".to_string(),
        bodies: vec![ErrorBody::generic("Request body too large")],
    }
}
