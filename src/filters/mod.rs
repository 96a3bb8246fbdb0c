//! Filter model: a normalized, composable set of predicates over occurrences.
//!
//! A [`Filter`] is built per request from raw query parameters and never
//! persisted. Every consumer (tile aggregation, counts, paginated lists,
//! histograms) must go through the same repository method so the map and the
//! data table never diverge.

use chrono::NaiveDate;

use crate::errors::AppError;

/// Date exchange format for the `startDate` / `endDate` parameters.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Seen/unseen status of an occurrence for a given viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    Seen,
    Unseen,
}

/// Immutable predicate set over occurrences.
///
/// An empty id list means "no restriction on that dimension", not "match
/// nothing". Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub species_ids: Vec<i64>,
    pub dataset_ids: Vec<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub area_ids: Vec<i64>,
    pub data_import_ids: Vec<i64>,
    /// Only meaningful combined with an authenticated viewer.
    pub status: Option<ViewStatus>,
}

impl Filter {
    /// Parse a filter from raw query pairs.
    ///
    /// Id lists use the repeated-key convention (`speciesIds[]=1&speciesIds[]=2`).
    /// Absent parameters, empty strings and the literal `"null"` all mean
    /// "unset". Unknown keys are ignored: pagination and zoom parameters share
    /// the same query string.
    pub fn from_query_pairs<'a, I>(pairs: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>,
    {
        let mut filter = Filter::default();

        for (key, value) in pairs {
            match key.as_ref() {
                "speciesIds[]" => filter.species_ids.push(parse_id(&key, &value)?),
                "datasetsIds[]" => filter.dataset_ids.push(parse_id(&key, &value)?),
                "areaIds[]" => filter.area_ids.push(parse_id(&key, &value)?),
                "initialDataImportIds[]" => {
                    filter.data_import_ids.push(parse_id(&key, &value)?)
                }
                "startDate" => filter.start_date = parse_date(&key, &value)?,
                "endDate" => filter.end_date = parse_date(&key, &value)?,
                "status" => filter.status = parse_status(&value),
                _ => {}
            }
        }

        Ok(filter)
    }

    /// Parse a filter from an URL query string.
    pub fn from_query_string(query: &str) -> Result<Self, AppError> {
        Self::from_query_pairs(form_urlencoded::parse(query.as_bytes()))
    }
}

fn is_unset(value: &str) -> bool {
    value.is_empty() || value == "null"
}

fn parse_id(key: &str, value: &str) -> Result<i64, AppError> {
    value.parse().map_err(|_| {
        AppError::InvalidParameter(format!("{}: expected an integer, got {:?}", key, value))
    })
}

fn parse_date(key: &str, value: &str) -> Result<Option<NaiveDate>, AppError> {
    if is_unset(value) {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(Some)
        .map_err(|_| {
            AppError::InvalidParameter(format!(
                "{}: expected a YYYY-MM-DD date, got {:?}",
                key, value
            ))
        })
}

fn parse_status(value: &str) -> Option<ViewStatus> {
    // Unknown tokens are treated as unset, like the sentinel values.
    match value {
        "seen" => Some(ViewStatus::Seen),
        "unseen" => Some(ViewStatus::Unseen),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_is_unrestricted() {
        let filter = Filter::from_query_string("").unwrap();
        assert_eq!(filter, Filter::default());
    }

    #[test]
    fn test_repeated_id_keys() {
        let filter =
            Filter::from_query_string("speciesIds[]=10&speciesIds[]=12&datasetsIds[]=3").unwrap();
        assert_eq!(filter.species_ids, vec![10, 12]);
        assert_eq!(filter.dataset_ids, vec![3]);
        assert!(filter.area_ids.is_empty());
    }

    #[test]
    fn test_dates_parsed_inclusive_bounds() {
        let filter = Filter::from_query_string("startDate=2021-09-01&endDate=2021-09-30").unwrap();
        assert_eq!(
            filter.start_date,
            Some(NaiveDate::from_ymd_opt(2021, 9, 1).unwrap())
        );
        assert_eq!(
            filter.end_date,
            Some(NaiveDate::from_ymd_opt(2021, 9, 30).unwrap())
        );
    }

    #[test]
    fn test_null_and_empty_sentinels_unset() {
        let filter = Filter::from_query_string("startDate=null&endDate=").unwrap();
        assert_eq!(filter.start_date, None);
        assert_eq!(filter.end_date, None);
    }

    #[test]
    fn test_bad_date_rejected() {
        let err = Filter::from_query_string("startDate=09/01/2021").unwrap_err();
        assert!(matches!(err, AppError::InvalidParameter(_)));
    }

    #[test]
    fn test_non_integer_id_rejected() {
        let err = Filter::from_query_string("speciesIds[]=abc").unwrap_err();
        assert!(matches!(err, AppError::InvalidParameter(_)));
    }

    #[test]
    fn test_status_tokens() {
        let filter = Filter::from_query_string("status=seen").unwrap();
        assert_eq!(filter.status, Some(ViewStatus::Seen));
        let filter = Filter::from_query_string("status=unseen").unwrap();
        assert_eq!(filter.status, Some(ViewStatus::Unseen));
        let filter = Filter::from_query_string("status=whatever").unwrap();
        assert_eq!(filter.status, None);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let filter = Filter::from_query_string("zoom=8&limit=50&page_number=2").unwrap();
        assert_eq!(filter, Filter::default());
    }
}
