//! Timestamps on the wire.
//!
//! The remote emits ISO-8601 timestamps without an offset and means UTC, and it marks absent
//! timestamps with `xsi:nil="true"`.

use crate::xml::Element;
use crate::{WireError, WireResult};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Reads an optional remote timestamp. Missing, nil and empty elements are `None`.
pub fn parse_remote_datetime(
    field: &str,
    element: Option<&Element>,
) -> WireResult<Option<DateTime<Utc>>> {
    let Some(element) = element else {
        return Ok(None);
    };
    let raw = element.text.trim();
    if element.is_nil() || raw.is_empty() {
        return Ok(None);
    }
    parse_remote_text(raw)
        .map(Some)
        .ok_or_else(|| WireError::InvalidValue {
            field: field.to_owned(),
            value: raw.to_owned(),
        })
}

/// Reads the named child of `parent` as an optional remote timestamp.
pub fn datetime_of(parent: &Element, name: &str) -> WireResult<Option<DateTime<Utc>>> {
    parse_remote_datetime(name, parent.child(name))
}

fn parse_remote_text(raw: &str) -> Option<DateTime<Utc>> {
    // The remote strips the zone; `Z` is always appended.
    DateTime::parse_from_rfc3339(&format!("{raw}Z"))
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Formats a timestamp for a request body.
pub fn format_remote_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Midnight UTC on the given day, the remote's representation of a calendar date.
pub fn date_to_remote(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

/// Optional timestamp leaf, omitted when `None`.
pub fn datetime_leaf(name: &str, value: Option<&DateTime<Utc>>) -> Option<Element> {
    value.map(|value| Element::leaf(name, format_remote_datetime(value)))
}
