//! REST API module.
//!
//! Thin handlers: translate query parameters into a [`Filter`], dispatch to
//! the repository / aggregation pipeline, shape the response.

mod catalog;
mod occurrences;
mod tiles;

pub use catalog::*;
pub use occurrences::*;
pub use tiles::*;

use crate::errors::AppError;

/// Extract an optional integer parameter; absent, empty and `"null"` all
/// mean unset.
fn extract_int_param(query: &str, name: &str) -> Result<Option<i64>, AppError> {
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if key == name {
            if value.is_empty() || value == "null" {
                return Ok(None);
            }
            return value.parse().map(Some).map_err(|_| {
                AppError::InvalidParameter(format!(
                    "{}: expected an integer, got {:?}",
                    name, value
                ))
            });
        }
    }
    Ok(None)
}

/// Extract an optional string parameter; absent, empty and `"null"` all
/// mean unset.
fn extract_str_param(query: &str, name: &str) -> Option<String> {
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if key == name && !value.is_empty() && value != "null" {
            return Some(value.into_owned());
        }
    }
    None
}
