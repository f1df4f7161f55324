//! Offset and cursor pagination
//!
//! Listing endpoints accept `limit`, `page`, `sort` (repeatable,
//! `field[:asc|desc]`, comma separated) and `cursor`. The parser turns those
//! into a validated [`Page`]; repositories read the page to order and slice
//! their results, and listing handlers hand back a [`Cursor`] for the next
//! request.

mod cursor;
mod page;
mod parser;

pub use cursor::{decode as decode_cursor, encode as encode_cursor, Cursor, CursorError};
pub use page::{Direction, FieldType, Page, Sort, SortableFields, DEFAULT_LIMIT};
pub use parser::{parse_page, parse_query, QueryParams};
