//! Page, sort and field-type definitions

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Default number of items per page
pub const DEFAULT_LIMIT: u32 = 20;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending (A-Z, 0-9, oldest first)
    Asc,
    /// Descending (Z-A, 9-0, newest first)
    #[default]
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

impl Direction {
    /// Parse `asc` / `desc` exactly
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// One sort key
///
/// `last_val` is only meaningful for sorts carried by a cursor: it is the
/// keyset continuation point for `field`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    /// Field name
    pub field: String,

    /// Direction, descending when unspecified
    #[serde(default)]
    pub direction: Direction,

    /// Last value seen for `field` on the previous page
    #[serde(rename = "lastVal", default)]
    pub last_val: String,
}

impl Sort {
    /// Sort on `field` in `direction`
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
            last_val: String::new(),
        }
    }

    /// Set the continuation value
    #[must_use]
    pub fn with_last_val(mut self, last_val: impl Into<String>) -> Self {
        self.last_val = last_val.into();
        self
    }

    /// Check `last_val` against the declared type of the field
    ///
    /// An empty value never passes, whatever the type.
    pub fn has_valid_last_val(&self, field_type: FieldType) -> bool {
        !self.last_val.is_empty() && field_type.accepts(&self.last_val)
    }
}

/// How a sortable field's cursor value is parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// `true` / `false`, case-insensitive
    Boolean,
    /// Base-10 signed 64-bit integer
    Int64,
    /// Unsigned 32-bit seconds since the epoch
    UnixTime,
    /// Any text
    String,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "BOOLEAN"),
            Self::Int64 => write!(f, "INT64"),
            Self::UnixTime => write!(f, "UNIXTIME"),
            Self::String => write!(f, "STRING"),
        }
    }
}

impl FieldType {
    /// True when `value` is a legal value of this type
    pub fn accepts(self, value: &str) -> bool {
        match self {
            Self::Boolean => value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false"),
            Self::Int64 => value.parse::<i64>().is_ok(),
            Self::UnixTime => value.parse::<u32>().is_ok(),
            Self::String => true,
        }
    }
}

/// Fields a listing endpoint allows in cursors, with their types
///
/// ```rust
/// use tasktrack::pagination::{FieldType, SortableFields};
///
/// let fields = SortableFields::new()
///     .field("title", FieldType::String)
///     .field("created_at", FieldType::UnixTime);
/// assert_eq!(fields.get("created_at"), Some(FieldType::UnixTime));
/// assert_eq!(fields.get("owner"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortableFields(HashMap<String, FieldType>);

impl SortableFields {
    /// No sortable fields
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name` as sortable with type `field_type`
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.0.insert(name.into(), field_type);
        self
    }

    /// Declared type of `name`
    pub fn get(&self, name: &str) -> Option<FieldType> {
        self.0.get(name).copied()
    }

    /// True when no field is declared
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Validated pagination state for one request
///
/// `sort` and `cursor` are mutually exclusive: at most one of them is
/// non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Maximum number of items, always positive
    pub limit: u32,
    /// Items to skip, `limit * page`
    pub offset: u64,
    /// Sorts requested with `sort=`
    pub sort: Vec<Sort>,
    /// Sorts decoded from `cursor=`
    pub cursor: Vec<Sort>,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            sort: Vec::new(),
            cursor: Vec::new(),
        }
    }
}

impl Page {
    /// Sorts in effect, whichever strategy the caller chose
    pub fn sorts(&self) -> &[Sort] {
        if self.cursor.is_empty() {
            &self.sort
        } else {
            &self.cursor
        }
    }

    /// True when the request continues from a cursor
    pub fn is_keyset(&self) -> bool {
        !self.cursor.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_page() {
        let page = Page::default();
        assert_eq!(page.limit, 20);
        assert_eq!(page.offset, 0);
        assert!(page.sorts().is_empty());
        assert!(!page.is_keyset());
    }

    #[test]
    fn test_direction_defaults_to_desc() {
        assert_eq!(Direction::default(), Direction::Desc);
        assert_eq!(Direction::parse("asc"), Some(Direction::Asc));
        assert_eq!(Direction::parse("ASC"), None);
    }

    #[test]
    fn test_field_type_validation() {
        assert!(FieldType::Boolean.accepts("TRUE"));
        assert!(FieldType::Boolean.accepts("false"));
        assert!(!FieldType::Boolean.accepts("yes"));

        assert!(FieldType::Int64.accepts("-9223372036854775808"));
        assert!(!FieldType::Int64.accepts("9223372036854775808"));

        assert!(FieldType::UnixTime.accepts("4294967295"));
        assert!(!FieldType::UnixTime.accepts("4294967296"));
        assert!(!FieldType::UnixTime.accepts("-1"));

        assert!(FieldType::String.accepts("anything"));
    }

    #[test]
    fn test_empty_last_val_is_never_valid() {
        let sort = Sort::new("title", Direction::Asc);
        assert!(!sort.has_valid_last_val(FieldType::String));
        assert!(sort.with_last_val("x").has_valid_last_val(FieldType::String));
    }

    #[test]
    fn test_sort_wire_names() {
        let sort = Sort::new("created_at", Direction::Asc).with_last_val("1700000000");
        let json = serde_json::to_value(&sort).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "field": "created_at", "direction": "asc", "lastVal": "1700000000" })
        );
    }
}
