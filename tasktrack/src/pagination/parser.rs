//! Query parameters to [`Page`]
//!
//! [`parse_page`] is a pure function of the query-parameter multiset: the
//! same parameters always give the same page or the same error.

use std::collections::HashSet;

use super::cursor;
use super::page::{Direction, Page, Sort, SortableFields};
use crate::pipeline::ApiError;

/// Query parameters as received, in order, repeated keys kept
pub type QueryParams = Vec<(String, String)>;

/// Split a raw query string into its parameters
pub fn parse_query(raw: Option<&str>) -> Result<QueryParams, ApiError> {
    match raw {
        None | Some("") => Ok(Vec::new()),
        Some(raw) => serde_urlencoded::from_str(raw)
            .map_err(|_| ApiError::invalid("Invalid query string", "Invalid query string", "query")),
    }
}

fn first<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn all<'a>(params: &'a [(String, String)], key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    params
        .iter()
        .filter(move |(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Validate `limit`, `page`, `cursor` and `sort` into a [`Page`]
///
/// ```rust
/// use tasktrack::pagination::{parse_page, SortableFields};
///
/// let params = vec![
///     ("limit".to_string(), "10".to_string()),
///     ("page".to_string(), "2".to_string()),
/// ];
/// let page = parse_page(&params, &SortableFields::new()).unwrap();
/// assert_eq!(page.limit, 10);
/// assert_eq!(page.offset, 20);
/// ```
pub fn parse_page(params: &[(String, String)], fields: &SortableFields) -> Result<Page, ApiError> {
    let mut page = Page::default();

    if let Some(raw) = first(params, "limit") {
        page.limit = match raw.parse::<u32>() {
            Ok(limit) if limit > 0 => limit,
            _ => {
                return Err(ApiError::invalid(
                    "Invalid pagination",
                    "Limit should be a number greater than zero",
                    "limit",
                ))
            }
        };
    }

    if let Some(raw) = first(params, "page") {
        let invalid_page =
            || ApiError::invalid("Invalid pagination", "Page should be non-negative number", "page");
        let number = raw.parse::<u64>().map_err(|_| invalid_page())?;
        page.offset = number
            .checked_mul(u64::from(page.limit))
            .ok_or_else(invalid_page)?;
    }

    let cursor = first(params, "cursor");
    let has_sort = first(params, "sort").is_some();

    if cursor.is_some() && has_sort {
        return Err(ApiError::invalid(
            "Cannot provide both sort and cursor",
            "Not required",
            "sort",
        ));
    }

    if let Some(token) = cursor {
        page.cursor = parse_cursor(token, fields)?;
    }

    if has_sort {
        page.sort = parse_sort(all(params, "sort"))?;
    }

    Ok(page)
}

fn parse_cursor(token: &str, fields: &SortableFields) -> Result<Vec<Sort>, ApiError> {
    let invalid_cursor = || ApiError::invalid("Invalid cursor parameter", "Invalid cursor", "cursor");

    let sorts = cursor::decode(token).map_err(|e| {
        tracing::debug!(error = %e, "rejecting cursor");
        invalid_cursor()
    })?;

    for sort in &sorts {
        if let Some(field_type) = fields.get(&sort.field) {
            if !sort.has_valid_last_val(field_type) {
                return Err(invalid_cursor());
            }
        }
    }

    Ok(sorts)
}

fn parse_sort<'a>(values: impl Iterator<Item = &'a str>) -> Result<Vec<Sort>, ApiError> {
    let mut sorts = Vec::new();
    let mut seen = HashSet::new();

    for value in values {
        let lowered = value.to_lowercase();

        for token in lowered.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let parts: Vec<&str> = token.split(':').map(str::trim).collect();

            let (field, direction) = match parts.as_slice() {
                [field] => (*field, Direction::default()),
                [field, direction] => {
                    let direction = Direction::parse(direction).ok_or_else(|| {
                        ApiError::invalid("Invalid sort parameter", "Invalid sort direction", "sort")
                    })?;
                    (*field, direction)
                }
                _ => return Err(ApiError::invalid("Invalid sort", "Invalid sort parameter", "sort")),
            };

            if field.is_empty() {
                return Err(ApiError::invalid("Invalid sort", "Invalid sort parameter", "sort"));
            }

            if !seen.insert(field.to_string()) {
                return Err(ApiError::invalid(
                    "Invalid sort parameter",
                    "Duplicate sort fields",
                    "sort",
                ));
            }

            sorts.push(Sort::new(field, direction));
        }
    }

    Ok(sorts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::FieldType;
    use crate::pipeline::{ErrorBody, ErrorKind};

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn task_fields() -> SortableFields {
        SortableFields::new()
            .field("title", FieldType::String)
            .field("created_at", FieldType::UnixTime)
            .field("id", FieldType::Int64)
    }

    fn body_of(err: &ApiError) -> ErrorBody {
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        err.bodies().remove(0)
    }

    #[test]
    fn test_defaults_without_parameters() {
        let page = parse_page(&[], &task_fields()).unwrap();
        assert_eq!(page, Page::default());
        assert_eq!(page.limit, 20);
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn test_offset_is_limit_times_page() {
        let page = parse_page(&params(&[("limit", "15"), ("page", "3")]), &task_fields()).unwrap();
        assert_eq!(page.offset, 45);

        let page = parse_page(&params(&[("page", "2")]), &task_fields()).unwrap();
        assert_eq!(page.offset, 40);
    }

    #[test]
    fn test_invalid_limits_are_rejected() {
        for bad in ["0", "-5", "abc", ""] {
            let err = parse_page(&params(&[("limit", bad)]), &task_fields()).unwrap_err();
            let body = body_of(&err);
            assert_eq!(body.target, "limit", "limit={bad}");
            assert_eq!(body.message, "Limit should be a number greater than zero");
        }
    }

    #[test]
    fn test_negative_page_is_rejected() {
        let err = parse_page(&params(&[("page", "-1")]), &task_fields()).unwrap_err();
        assert_eq!(body_of(&err).target, "page");
    }

    #[test]
    fn test_sort_and_cursor_are_exclusive() {
        let token = cursor::encode(&[Sort::new("title", Direction::Asc).with_last_val("a")]).unwrap();
        let err = parse_page(&params(&[("cursor", token.as_str()), ("sort", "title")]), &task_fields()).unwrap_err();

        assert_eq!(err.to_string(), "Cannot provide both sort and cursor");
        assert_eq!(body_of(&err), ErrorBody::new("Not required", "sort"));
    }

    #[test]
    fn test_cursor_round_trip() {
        let sorts = vec![
            Sort::new("created_at", Direction::Desc).with_last_val("1700000000"),
            Sort::new("id", Direction::Asc).with_last_val("42"),
        ];
        let token = cursor::encode(&sorts).unwrap();

        let page = parse_page(&params(&[("cursor", token.as_str())]), &task_fields()).unwrap();
        assert_eq!(page.cursor, sorts);
        assert!(page.sort.is_empty());
        assert!(page.is_keyset());
    }

    #[test]
    fn test_cursor_values_are_checked_against_field_types() {
        let cases = [
            Sort::new("created_at", Direction::Asc).with_last_val("-3"),
            Sort::new("id", Direction::Asc).with_last_val("forty-two"),
            Sort::new("title", Direction::Asc),
        ];

        for sort in cases {
            let token = cursor::encode(std::slice::from_ref(&sort)).unwrap();
            let err = parse_page(&params(&[("cursor", token.as_str())]), &task_fields()).unwrap_err();
            assert_eq!(body_of(&err), ErrorBody::new("Invalid cursor", "cursor"), "{sort:?}");
        }
    }

    #[test]
    fn test_unmapped_cursor_fields_pass_through() {
        let sorts = vec![Sort::new("owner", Direction::Asc)];
        let token = cursor::encode(&sorts).unwrap();
        let page = parse_page(&params(&[("cursor", token.as_str())]), &task_fields()).unwrap();
        assert_eq!(page.cursor, sorts);
    }

    #[test]
    fn test_undecodable_cursor_is_rejected() {
        let err = parse_page(&params(&[("cursor", "not*base64")]), &task_fields()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid cursor parameter");
        assert_eq!(body_of(&err).target, "cursor");
    }

    #[test]
    fn test_sort_defaults_to_desc_and_lowercases() {
        let page = parse_page(&params(&[("sort", " Title , created_at:ASC ")]), &task_fields()).unwrap();
        assert_eq!(
            page.sort,
            vec![
                Sort::new("title", Direction::Desc),
                Sort::new("created_at", Direction::Asc),
            ]
        );
    }

    #[test]
    fn test_repeated_sort_parameters_accumulate() {
        let page = parse_page(&params(&[("sort", "title:asc"), ("sort", "id")]), &task_fields()).unwrap();
        assert_eq!(page.sort.len(), 2);
        assert_eq!(page.sort[1], Sort::new("id", Direction::Desc));
    }

    #[test]
    fn test_empty_sort_tokens_are_skipped() {
        let page = parse_page(&params(&[("sort", "title,,")]), &task_fields()).unwrap();
        assert_eq!(page.sort, vec![Sort::new("title", Direction::Desc)]);
    }

    #[test]
    fn test_duplicate_sort_fields() {
        let err = parse_page(&params(&[("sort", "title,title:asc")]), &task_fields()).unwrap_err();
        assert_eq!(body_of(&err), ErrorBody::new("Duplicate sort fields", "sort"));

        let err = parse_page(&params(&[("sort", "id"), ("sort", "ID:desc")]), &task_fields()).unwrap_err();
        assert_eq!(body_of(&err).message, "Duplicate sort fields");
    }

    #[test]
    fn test_invalid_sort_direction() {
        let err = parse_page(&params(&[("sort", "title:up")]), &task_fields()).unwrap_err();
        assert_eq!(body_of(&err), ErrorBody::new("Invalid sort direction", "sort"));
    }

    #[test]
    fn test_too_many_colons() {
        let err = parse_page(&params(&[("sort", "title:asc:desc")]), &task_fields()).unwrap_err();
        assert_eq!(body_of(&err), ErrorBody::new("Invalid sort parameter", "sort"));
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let query = params(&[("limit", "5"), ("page", "1"), ("sort", "title:asc,id")]);
        let first = parse_page(&query, &task_fields());
        let second = parse_page(&query, &task_fields());
        assert_eq!(first, second);

        let bad = params(&[("sort", "title,title")]);
        assert_eq!(parse_page(&bad, &task_fields()), parse_page(&bad, &task_fields()));
    }

    #[test]
    fn test_parse_query_keeps_repeats_in_order() {
        let parsed = parse_query(Some("sort=title&limit=5&sort=id%3Aasc")).unwrap();
        assert_eq!(
            parsed,
            params(&[("sort", "title"), ("limit", "5"), ("sort", "id:asc")])
        );
        assert!(parse_query(None).unwrap().is_empty());
    }
}
