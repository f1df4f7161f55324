//! Turns a handler chain into an axum endpoint
//!
//! The dispatcher is the only place an [`Outcome`] becomes a wire response. It
//! builds the [`RequestContext`], runs the chain, writes the JSON envelope with
//! `Content-Type` and `X-Request-ID`, then emits exactly one log event whose
//! level follows the status table.

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::Response,
};
use futures::future::{BoxFuture, FutureExt};

use super::context::RequestContext;
use super::error::ApiError;
use super::handler::{BoxedHandler, Handler, Outcome};
use super::response::{rule_for, ApiResponse, Severity, StatusRule, FALLBACK_RULE};
use crate::ids::RequestId;

/// Response header carrying the request id
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const FALLBACK_BODY: &[u8] = br#"{"status":500,"errors":[{"message":"Internal server error"}]}"#;

/// Runs handler chains and writes their responses
///
/// Every request log line is a child of `root`, the span handed over at
/// construction.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    root: tracing::Span,
}

impl Dispatcher {
    pub fn new(root: tracing::Span) -> Self {
        Self { root }
    }

    /// Run `handler` for `request` and write the response
    pub async fn dispatch(&self, handler: &dyn Handler, request: Request) -> Response {
        let mut ctx = RequestContext::new(
            RequestId::new(),
            request.method().as_str(),
            request.uri().to_string(),
        );

        let outcome = handler.call(request, &mut ctx).await;
        let (rule, error) = self.settle(outcome, &mut ctx);

        let response = write_response(&ctx);
        self.log(&ctx, rule, error.as_ref());
        response
    }

    /// Axum handler running `handler` through this dispatcher
    ///
    /// ```rust,ignore
    /// Router::new().route("/tasks", post(dispatcher.endpoint(create_task)))
    /// ```
    pub fn endpoint(
        &self,
        handler: BoxedHandler,
    ) -> impl Fn(Request) -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static {
        let dispatcher = self.clone();
        move |request: Request| {
            let dispatcher = dispatcher.clone();
            let handler = handler.clone();
            async move { dispatcher.dispatch(handler.as_ref(), request).await }.boxed()
        }
    }

    /// Fill the envelope from `outcome`; returns the log rule and any error
    fn settle(&self, outcome: Outcome, ctx: &mut RequestContext) -> (StatusRule, Option<ApiError>) {
        let error = match outcome {
            Ok(reply) => match rule_for(reply.status) {
                Some(rule) if reply.status.is_success() => {
                    ctx.response = ApiResponse::success(reply.status, reply.data);
                    return (rule, None);
                }
                _ => ApiError::internal(format!("unsupported success status {}", reply.status.as_u16())),
            },
            Err(error) => error,
        };

        ctx.response = ApiResponse::failure(&error);
        let rule = StatusCode::from_u16(ctx.response.status)
            .ok()
            .and_then(rule_for)
            .unwrap_or(FALLBACK_RULE);
        (rule, Some(error))
    }

    fn log(&self, ctx: &RequestContext, rule: StatusRule, error: Option<&ApiError>) {
        let error = error.filter(|_| rule.attach_error).map(ToString::to_string);

        macro_rules! request_event {
            ($level:ident $(, $key:ident = $value:expr)?) => {
                tracing::$level!(
                    parent: &self.root,
                    request_id = %ctx.request_id(),
                    method = %ctx.method(),
                    uri = %ctx.uri(),
                    status = ctx.response().status,
                    scope = %ctx.log().fields_json(),
                    $($key = %$value,)?
                    "{}",
                    ctx.log().message()
                )
            };
        }

        match (rule.severity, error) {
            (Severity::Info, _) => request_event!(info),
            (Severity::Warn, None) => request_event!(warn),
            (Severity::Warn, Some(error)) => request_event!(warn, error = error),
            (Severity::Error, None) => request_event!(error),
            (Severity::Error, Some(error)) => request_event!(error, error = error),
        }
    }
}

fn write_response(ctx: &RequestContext) -> Response {
    let envelope = ctx.response();
    let (status, body) = match serde_json::to_vec(envelope) {
        Ok(body) => (
            StatusCode::from_u16(envelope.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        ),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, FALLBACK_BODY.to_vec()),
    };

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(request_id) = ctx.request_id().header_value() {
        headers.insert(REQUEST_ID_HEADER, request_id);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ErrorBody, Reply};
    use async_trait::async_trait;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    struct Fixed(fn() -> Outcome);

    #[async_trait]
    impl Handler for Fixed {
        async fn call(&self, _request: Request, ctx: &mut RequestContext) -> Outcome {
            ctx.add_log_field("handler", "fixed");
            (self.0)()
        }
    }

    async fn run(outcome: fn() -> Outcome) -> (StatusCode, Option<HeaderValue>, Value) {
        let dispatcher = Dispatcher::new(tracing::info_span!("test"));
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/users")
            .body(Body::empty())
            .unwrap();

        let response = dispatcher.dispatch(&Fixed(outcome), request).await;
        let status = response.status();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let request_id = response.headers().get(REQUEST_ID_HEADER).cloned();

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, request_id, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let (status, request_id, body) = run(|| Reply::created(&json!({ "user": { "id": 1 } }))).await;

        assert_eq!(status, StatusCode::CREATED);
        assert!(request_id.unwrap().to_str().unwrap().starts_with("req_"));
        assert_eq!(body, json!({ "status": 201, "data": { "user": { "id": 1 } } }));
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let (status, _, body) = run(|| Err(ApiError::conflict("user", "email"))).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(
            body,
            json!({ "status": 409, "errors": [{ "message": "Conflicting data", "target": "email" }] })
        );
    }

    #[tokio::test]
    async fn test_validation_bodies_pass_through() {
        let (status, _, body) = run(|| Err(ApiError::invalid("validation error", "Non-empty value is required", "name"))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let errors: Vec<ErrorBody> = serde_json::from_value(body["errors"].clone()).unwrap();
        assert_eq!(errors, vec![ErrorBody::new("Non-empty value is required", "name")]);
    }

    #[tokio::test]
    async fn test_unknown_success_status_becomes_internal() {
        let (status, _, body) = run(|| Reply::with_status(StatusCode::ACCEPTED, &json!({ "queued": true }))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({ "status": 500, "errors": [{ "message": "Internal server error" }] })
        );
    }

    #[tokio::test]
    async fn test_internal_error_text_stays_private() {
        let (status, _, body) = run(|| Err(ApiError::internal("db password is hunter2"))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.to_string().contains("hunter2"));
    }

    #[tokio::test]
    async fn test_each_request_gets_its_own_id() {
        let (_, first, _) = run(|| Reply::ok(&json!({}))).await;
        let (_, second, _) = run(|| Reply::ok(&json!({}))).await;
        assert_ne!(first, second);
    }

    #[test]
    fn test_settle_picks_log_rule() {
        let dispatcher = Dispatcher::new(tracing::Span::none());
        let mut ctx = RequestContext::new(RequestId::new(), "GET", "/tasks");

        let (rule, error) = dispatcher.settle(Err(ApiError::conflict("user", "email")), &mut ctx);
        assert_eq!(rule.severity, Severity::Warn);
        assert!(rule.attach_error);
        assert!(error.is_some());

        let (rule, error) = dispatcher.settle(Err(ApiError::Unauthorized), &mut ctx);
        assert_eq!(rule.severity, Severity::Warn);
        assert!(!rule.attach_error);
        assert!(error.is_some());

        let (rule, error) = dispatcher.settle(Err(ApiError::internal("boom")), &mut ctx);
        assert_eq!(rule.severity, Severity::Error);
        assert!(rule.attach_error);
        assert!(error.is_some());
        assert_eq!(ctx.response().status, 500);

        let (rule, error) = dispatcher.settle(Reply::ok(&json!([])), &mut ctx);
        assert_eq!(rule.severity, Severity::Info);
        assert!(error.is_none());
        assert_eq!(ctx.response().status, 200);
    }

    /// Records the level and field names of every request event
    #[derive(Clone, Default)]
    struct EventCapture {
        events: Arc<Mutex<Vec<(tracing::Level, Vec<String>)>>>,
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
            let fields: Vec<String> = event.metadata().fields().iter().map(|f| f.name().to_string()).collect();
            if fields.iter().any(|f| f == "request_id") {
                self.events
                    .lock()
                    .unwrap()
                    .push((*event.metadata().level(), fields));
            }
        }
    }

    async fn logged(outcome: fn() -> Outcome) -> (tracing::Level, bool) {
        let capture = EventCapture::default();
        let _guard = tracing_subscriber::registry().with(capture.clone()).set_default();

        let dispatcher = Dispatcher::new(tracing::Span::none());
        let request = axum::http::Request::builder().uri("/tasks").body(Body::empty()).unwrap();
        dispatcher.dispatch(&Fixed(outcome), request).await;

        let events = capture.events.lock().unwrap();
        assert_eq!(events.len(), 1, "one event per request");
        let (level, fields) = &events[0];
        (*level, fields.iter().any(|f| f == "error"))
    }

    #[tokio::test]
    async fn test_log_level_and_error_field_follow_status() {
        use tracing::Level;

        assert_eq!(logged(|| Reply::ok(&json!({}))).await, (Level::INFO, false));
        assert_eq!(
            logged(|| Err(ApiError::invalid("validation error", "Non-empty value is required", "name"))).await,
            (Level::WARN, false)
        );
        assert_eq!(logged(|| Err(ApiError::Unauthorized)).await, (Level::WARN, false));
        assert_eq!(logged(|| Err(ApiError::not_found("route"))).await, (Level::WARN, false));
        assert_eq!(logged(|| Err(ApiError::conflict("user", "email"))).await, (Level::WARN, true));
        assert_eq!(logged(|| Err(ApiError::internal("boom"))).await, (Level::ERROR, true));
    }
}
