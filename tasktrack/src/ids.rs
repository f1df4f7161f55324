//! Request identifiers
//!
//! Every inbound request gets a [`RequestId`] in TypeID format (`req_` prefix
//! followed by a base32-encoded UUIDv7). The id is stamped on the request's
//! log line and returned to the caller in the `X-Request-ID` header.

use http::HeaderValue;
use mti::prelude::*;
use std::fmt;

/// Time-sortable, globally unique request identifier.
///
/// ```rust
/// use tasktrack::ids::RequestId;
///
/// let id = RequestId::new();
/// assert!(id.as_str().starts_with("req_"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(MagicTypeId);

impl RequestId {
    /// The prefix used for request IDs
    pub const PREFIX: &'static str = "req";

    /// Creates a new request ID backed by a UUIDv7.
    #[must_use]
    pub fn new() -> Self {
        Self(Self::PREFIX.create_type_id::<V7>())
    }

    /// Returns the request ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Header value for `X-Request-ID`.
    ///
    /// TypeIDs are lowercase ASCII, so the conversion cannot fail in practice;
    /// `None` is returned rather than panicking if it ever does.
    pub fn header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(self.as_str()).ok()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
