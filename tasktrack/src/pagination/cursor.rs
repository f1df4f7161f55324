//! Opaque cursor tokens
//!
//! A cursor is the JSON encoding of a sort list, base64url-encoded. Tokens are
//! emitted padded; decoding accepts padded and unpadded input.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use serde::{Deserialize, Serialize};

use super::page::Sort;

const CURSOR_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Why a cursor token could not be read
#[derive(Debug, thiserror::Error)]
pub enum CursorError {
    /// Not base64url
    #[error("cursor is not base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// Not a JSON array of sorts
    #[error("cursor is not a sort list: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Encode `sorts` as a cursor token
pub fn encode(sorts: &[Sort]) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(sorts)?;
    Ok(CURSOR_ENGINE.encode(json))
}

/// Decode a cursor token back into its sort list
pub fn decode(token: &str) -> Result<Vec<Sort>, CursorError> {
    let bytes = CURSOR_ENGINE.decode(token)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Continuation metadata returned with a listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cursor {
    /// Token for the next page, empty when there is none
    pub next: String,
    /// Whether another page may exist
    pub has_next: bool,
}

impl Cursor {
    /// No further pages
    pub fn end() -> Self {
        Self::default()
    }

    /// Further pages continue from `next`
    pub fn continue_from(next: String) -> Self {
        Self {
            next,
            has_next: true,
        }
    }
}
