//! Per-request state

use std::collections::BTreeMap;

use serde_json::Value;

use super::response::ApiResponse;
use crate::ids::RequestId;
use crate::pagination::Page;

/// Fields and message accumulated for the request's single log line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogScope {
    fields: BTreeMap<String, Value>,
    message: String,
}

impl LogScope {
    /// Extra fields, sorted by key
    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Pending message, empty unless a handler set one
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Extra fields rendered as one JSON object
    pub fn fields_json(&self) -> String {
        serde_json::to_string(&self.fields).unwrap_or_default()
    }
}

/// State owned by one request from dispatch to response
///
/// Created by the dispatcher, threaded through every middleware and the
/// terminal handler by `&mut`, and never shared between requests.
#[derive(Debug)]
pub struct RequestContext {
    request_id: RequestId,
    method: String,
    uri: String,
    user_id: Option<i64>,
    log: LogScope,
    page: Page,
    pub(crate) response: ApiResponse,
}

impl RequestContext {
    /// Fresh context for a request
    pub fn new(request_id: RequestId, method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            request_id,
            method: method.into(),
            uri: uri.into(),
            user_id: None,
            log: LogScope::default(),
            page: Page::default(),
            response: ApiResponse::default(),
        }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Authenticated caller, `None` until the auth middleware succeeds
    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    pub fn set_user_id(&mut self, user_id: i64) {
        self.user_id = Some(user_id);
    }

    /// Add one field to the log line
    pub fn add_log_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.log.fields.insert(key.into(), value.into());
    }

    /// Add several fields to the log line; later keys win
    pub fn add_log_fields<K, V>(&mut self, fields: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in fields {
            self.add_log_field(key, value);
        }
    }

    /// Set the message of the log line
    pub fn add_log_message(&mut self, message: impl Into<String>) {
        self.log.message = message.into();
    }

    pub fn log(&self) -> &LogScope {
        &self.log
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn set_page(&mut self, page: Page) {
        self.page = page;
    }

    /// Envelope written for this request
    pub fn response(&self) -> &ApiResponse {
        &self.response
    }
}
