use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::errors::ScrapeError;

static ORDINAL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)(st|nd|rd|th)").expect("valid ordinal regex"));

/// Strip ordinal suffixes: "21st Jan" -> "21 Jan".
pub fn strip_ordinals(fragment: &str) -> String {
    ORDINAL_SUFFIX.replace_all(fragment, "$1").into_owned()
}

/// Parse a "Date Placed" fragment such as "3rd Jan" into a date.
///
/// The board omits the year, so the year of `reference` is assumed. A run on
/// 1 January will therefore date a "31st Dec" posting at the end of the
/// *current* year rather than the previous one.
pub fn parse_date_placed(fragment: &str, reference: NaiveDate) -> Result<NaiveDate, ScrapeError> {
    let cleaned = strip_ordinals(fragment.trim());
    let with_year = format!("{} {}", cleaned.trim(), reference.year());

    NaiveDate::parse_from_str(&with_year, "%d %b %Y").map_err(|_| ScrapeError::DateFormat {
        fragment: fragment.to_string(),
    })
}
