//! Pure field validators shared by the user and profile input checks.
//!
//! Request bodies arrive as structs of optional strings. The `validate_*`
//! functions next to each input type turn those into a [Validation] report;
//! nothing here touches a request or a store.

use crate::error::{DcError, DcResult};

use std::borrow::Cow;
use std::collections::BTreeMap;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use validator::{ValidateEmail, ValidateLength, ValidateUrl};

/// Field name -> first error message for that field.
pub type FieldErrors = BTreeMap<&'static str, String>;

#[derive(Debug, Default)]
pub struct Validation {
    pub errors: FieldErrors,
    pub is_valid: bool,
}

impl Validation {
    pub fn from_errors(errors: FieldErrors) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn into_result(self) -> DcResult<()> {
        if self.is_valid {
            Ok(())
        } else {
            Err(DcError::Validation(self.errors))
        }
    }
}

/// A missing value and a blank one count the same.
pub fn is_empty(value: Option<&str>) -> bool {
    value.map_or(true, |value| value.trim().is_empty())
}

/// Returns the trimmed value when it carries any content.
pub fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub fn is_length(value: &str, min: usize, max: usize) -> bool {
    value.validate_length(Some(min as u64), Some(max as u64), None)
}

/// Accepts `http`, `https` and `ftp` URLs, with or without the scheme, as
/// long as the host has a top level domain.
pub fn is_url(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || value.contains(char::is_whitespace) {
        return false;
    }

    let candidate = if value.contains("://") {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(format!("http://{value}"))
    };

    if !candidate.validate_url() {
        return false;
    }

    url::Url::parse(&candidate).map_or(false, |url| {
        matches!(url.scheme(), "http" | "https" | "ftp")
            && url.host_str().map_or(false, |host| {
                host.contains('.') && !host.starts_with('.') && !host.ends_with('.')
            })
    })
}

/// An RFC 5322 style address whose domain has a top level part.
pub fn is_email(value: &str) -> bool {
    let value = value.trim();

    value.validate_email()
        && value
            .rsplit_once('@')
            .map_or(false, |(_, domain)| domain.contains('.'))
}

/// Parses `YYYY-MM-DD`, or a full RFC 3339 timestamp of which only the date
/// is kept.
pub fn parse_date(value: &str) -> Option<Date> {
    let value = value.trim();
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .ok()
        .or_else(|| {
            OffsetDateTime::parse(value, &Rfc3339)
                .ok()
                .map(|datetime| datetime.date())
        })
}
