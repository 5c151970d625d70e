//! Pagination and sorting for task listings.
//!
//! [`Filters`] is built from the query string of a listing request and
//! validated before any SQL is produced. The sort key is checked against a
//! safelist, and [`Filters::sort_column`] only ever hands back a
//! `&'static str` taken from that safelist, so it is safe to interpolate
//! into an `ORDER BY` clause.
//!
//! [`Metadata`] describes where a page sits within the full result set and
//! is derived from the window count returned alongside the rows.

use super::validator::{permitted_value, Validator};
use serde::Serialize;

/// Sort keys accepted by the listing endpoint. A leading `-` sorts descending.
pub const SORT_SAFELIST: &[&str] = &["id", "title", "completed", "-id", "-title", "-completed"];

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE: i64 = 10_000_000;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Filters {
    pub page: i64,
    pub page_size: i64,
    pub sort: String,
    pub sort_safelist: &'static [&'static str],
}

impl Default for Filters {
    fn default() -> Self {
        Filters {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            sort: "id".to_string(),
            sort_safelist: SORT_SAFELIST,
        }
    }
}

impl Filters {
    /// Column name for the requested sort key, or `None` if the key is not
    /// in the safelist.
    pub fn sort_column(&self) -> Option<&'static str> {
        self.sort_safelist
            .iter()
            .find(|safe| **safe == self.sort)
            .map(|safe| safe.trim_start_matches('-'))
    }

    pub fn sort_direction(&self) -> &'static str {
        if self.sort.starts_with('-') {
            "DESC"
        } else {
            "ASC"
        }
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

pub fn validate_filters(v: &mut Validator, filters: &Filters) {
    v.check(filters.page > 0, "page", "must be greater than zero");
    v.check(filters.page <= MAX_PAGE, "page", "must be a maximum of 10 million");
    v.check(filters.page_size > 0, "page_size", "must be greater than zero");
    v.check(filters.page_size <= MAX_PAGE_SIZE, "page_size", "must be a maximum of 100");

    v.check(permitted_value(&filters.sort.as_str(), filters.sort_safelist), "sort", "invalid sort value");
}

/// Position of a page within the full result set.
///
/// Every field is omitted from JSON when zero, so an empty listing carries
/// an empty metadata object.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "is_zero")]
    pub current_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub page_size: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub last_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub total_records: i64,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

pub fn calculate_metadata(total_records: i64, page: i64, page_size: i64) -> Metadata {
    if total_records == 0 || page_size <= 0 {
        return Metadata::default();
    }

    Metadata {
        current_page: page,
        page_size,
        first_page: 1,
        last_page: (total_records + page_size - 1) / page_size,
        total_records,
    }
}
