//! Keyed validation error collection.
//!
//! A [`Validator`] is created per request, fed a series of checks, and then
//! asked whether everything passed. Each field keeps only the first message
//! recorded against it, so the most basic failure ("must be provided") wins
//! over follow-up checks on the same field.
//!
//! ## Usage
//!
//! ```rust
//! use todo_api::libs::validator::{permitted_value, Validator};
//!
//! let mut v = Validator::new();
//! v.check(!"".is_empty(), "title", "must be provided");
//! v.check(permitted_value(&"-id", &["id", "-id"]), "sort", "invalid sort value");
//!
//! assert!(!v.valid());
//! assert_eq!(v.errors["title"], "must be provided");
//! ```

use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;
use std::sync::LazyLock;
use url::Url;

/// Pattern for plausible e-mail addresses.
pub static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern is a valid regex")
});

/// Pattern for phone numbers written as `555-123-4567`, optionally with a
/// leading `+`, a parenthesised area code and spaces around the dashes.
pub static PHONE_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?\(?[0-9]{3}\)?\s?-\s?[0-9]{3}\s?-\s?[0-9]{4}$").expect("phone pattern is a valid regex"));

/// Collection of validation failures keyed by field name.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Validator {
    /// Field name to message. Sorted so responses are stable.
    pub errors: BTreeMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when no errors have been recorded.
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Records `message` for `key` unless the key already has an error.
    pub fn add_error(&mut self, key: &str, message: &str) {
        if !self.errors.contains_key(key) {
            self.errors.insert(key.to_string(), message.to_string());
        }
    }

    /// Records `message` for `key` when `ok` is false.
    pub fn check(&mut self, ok: bool, key: &str, message: &str) {
        if !ok {
            self.add_error(key, message);
        }
    }

    /// Consumes the validator, returning the collected errors.
    pub fn into_errors(self) -> BTreeMap<String, String> {
        self.errors
    }
}

/// Returns `true` if `value` is one of `list`.
pub fn permitted_value<T: PartialEq>(value: &T, list: &[T]) -> bool {
    list.iter().any(|item| item == value)
}

/// Returns `true` if `value` matches `rx`.
pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}

/// Returns `true` if `website` is an absolute URL or an absolute path.
pub fn valid_website(website: &str) -> bool {
    website.starts_with('/') || Url::parse(website).is_ok()
}

/// Returns `true` if no value appears more than once.
pub fn unique<T: Eq + Hash>(values: &[T]) -> bool {
    let distinct: HashSet<&T> = values.iter().collect();
    distinct.len() == values.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_error_per_field_wins() {
        let mut v = Validator::new();
        v.check(false, "title", "must be provided");
        v.check(false, "title", "must not be more than 250 bytes long");

        assert_eq!(v.errors.len(), 1);
        assert_eq!(v.errors["title"], "must be provided");
    }

    #[test]
    fn test_passing_checks_leave_validator_valid() {
        let mut v = Validator::new();
        v.check(true, "title", "must be provided");
        v.check(1 < 2, "page", "must be greater than zero");
        assert!(v.valid());
    }

    #[test]
    fn test_errors_for_several_fields() {
        let mut v = Validator::new();
        v.check(false, "title", "must be provided");
        v.add_error("description", "must be provided");

        let errors = v.into_errors();
        assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["description", "title"]);
    }

    #[test]
    fn test_permitted_value() {
        let safelist = ["id", "title", "-id"];
        assert!(permitted_value(&"-id", &safelist));
        assert!(!permitted_value(&"version", &safelist));
    }

    #[test]
    fn test_unique() {
        assert!(unique(&["a", "b", "c"]));
        assert!(!unique(&["a", "b", "a"]));
        assert!(unique::<&str>(&[]));
    }

    #[test]
    fn test_matches_email() {
        assert!(matches("alice@example.com", &EMAIL_RX));
        assert!(!matches("not an email", &EMAIL_RX));
    }

    #[test]
    fn test_matches_phone() {
        assert!(matches("555-123-4567", &PHONE_RX));
        assert!(matches("+(555) - 123 - 4567", &PHONE_RX));
        assert!(!matches("5551234567", &PHONE_RX));
    }

    #[test]
    fn test_valid_website() {
        assert!(valid_website("https://example.com/todo"));
        assert!(valid_website("/v1/todo"));
        assert!(!valid_website("example.com"));
        assert!(!valid_website(""));
    }
}
