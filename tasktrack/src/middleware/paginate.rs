//! Pagination, sorting and cursor parameters

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Request;

use crate::pagination::{parse_page, parse_query, SortableFields};
use crate::pipeline::{BoxedHandler, Handler, Middleware, Outcome, RequestContext};

/// Parses `limit`, `page`, `sort` and `cursor` into the context's page
///
/// Only routes that declare sortable fields get this middleware.
#[derive(Clone)]
pub struct Paginate {
    fields: Arc<SortableFields>,
}

impl Paginate {
    pub fn new(fields: SortableFields) -> Self {
        Self {
            fields: Arc::new(fields),
        }
    }
}

impl Middleware for Paginate {
    fn wrap(&self, next: BoxedHandler) -> BoxedHandler {
        Arc::new(Paginated {
            fields: self.fields.clone(),
            next,
        })
    }
}

struct Paginated {
    fields: Arc<SortableFields>,
    next: BoxedHandler,
}

#[async_trait]
impl Handler for Paginated {
    async fn call(&self, request: Request, ctx: &mut RequestContext) -> Outcome {
        let page = parse_query(request.uri().query())
            .and_then(|params| parse_page(&params, &self.fields))
            .inspect_err(|e| {
                ctx.add_log_message(e.to_string());
            })?;

        ctx.set_page(page);
        self.next.call(request, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::RequestId;
    use crate::pagination::{Direction, FieldType, Page, Sort};
    use crate::pipeline::{ApiError, Chain, ErrorBody, Reply};
    use axum::body::Body;

    struct EchoPage;

    #[async_trait]
    impl Handler for EchoPage {
        async fn call(&self, _request: Request, ctx: &mut RequestContext) -> Outcome {
            Reply::ok(&serde_json::json!({
                "limit": ctx.page().limit,
                "offset": ctx.page().offset,
            }))
        }
    }

    async fn run(uri: &str) -> (Outcome, RequestContext) {
        let chain = Chain::new()
            .with(Paginate::new(
                SortableFields::new().field("title", FieldType::String),
            ))
            .handler(EchoPage);

        let request = axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap();
        let mut ctx = RequestContext::new(RequestId::new(), "GET", uri);
        let outcome = chain.call(request, &mut ctx).await;
        (outcome, ctx)
    }

    #[tokio::test]
    async fn test_page_is_stored_on_context() {
        let (outcome, ctx) = run("/tasks?limit=5&page=2&sort=title:asc").await;

        let reply = outcome.unwrap();
        assert_eq!(reply.data, serde_json::json!({ "limit": 5, "offset": 10 }));
        assert_eq!(ctx.page().sort, vec![Sort::new("title", Direction::Asc)]);
    }

    #[tokio::test]
    async fn test_defaults_without_query() {
        let (outcome, ctx) = run("/tasks").await;
        assert!(outcome.is_ok());
        assert_eq!(ctx.page(), &Page::default());
    }

    #[tokio::test]
    async fn test_invalid_parameters_stop_the_chain() {
        let (outcome, ctx) = run("/tasks?limit=0").await;

        let err = outcome.unwrap_err();
        assert_eq!(
            err.bodies(),
            vec![ErrorBody::new("Limit should be a number greater than zero", "limit")]
        );
        assert!(matches!(err, ApiError::ValidationFailed { .. }));
        assert_eq!(ctx.log().message(), "Invalid pagination");
    }

    #[tokio::test]
    async fn test_bad_escapes_are_logged() {
        let (outcome, ctx) = run("/tasks?limit=%zz").await;

        assert!(matches!(outcome, Err(ApiError::ValidationFailed { .. })));
        assert!(!ctx.log().message().is_empty());
        assert_eq!(ctx.log().message(), "Invalid pagination");
    }
}
