//! Field parsing for raw incident rows.
//!
//! Historical snapshots and the live API disagree on timestamp formats and
//! flag encodings; these helpers accept every variant seen in the data.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use boston_crime_incident_models::{BoundingBox, Coordinates};

/// Timestamp formats tried in order after the UTC suffix is stripped.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
];

/// Strips the explicit UTC offsets (`+00`, `+00:00`, `Z`) that some
/// snapshots append to their timestamps.
#[must_use]
pub fn normalize_timestamp(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without = trimmed
        .strip_suffix("+00:00")
        .or_else(|| trimmed.strip_suffix("+00"))
        .or_else(|| trimmed.strip_suffix('Z'))
        .unwrap_or(trimmed);
    without.trim()
}

/// Parses an occurrence timestamp. All source timestamps are treated as
/// UTC. Returns `None` if no known format matches.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = normalize_timestamp(raw);
    if s.is_empty() {
        return None;
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    ["%Y-%m-%d", "%m/%d/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parses lat/long strings into validated coordinates.
///
/// Returns `None` if either value is missing, unparsable, zero, outside
/// the valid geographic range, or outside `bounds` when given.
#[must_use]
pub fn parse_coordinates(
    lat: Option<&str>,
    long: Option<&str>,
    bounds: Option<&BoundingBox>,
) -> Option<Coordinates> {
    let latitude = lat?.trim().parse::<f64>().ok()?;
    let longitude = long?.trim().parse::<f64>().ok()?;

    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }
    if latitude == 0.0 || longitude == 0.0 {
        return None;
    }
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }

    let coordinates = Coordinates {
        latitude,
        longitude,
    };
    match bounds {
        Some(bbox) if !bbox.contains(coordinates) => None,
        _ => Some(coordinates),
    }
}

/// Parses the shooting flag. Snapshots use `Y`/`N`, the API uses `1`/`0`,
/// and blanks mean no shooting.
#[must_use]
pub fn parse_shooting(raw: Option<&str>) -> bool {
    raw.map(str::trim).is_some_and(|s| {
        s.eq_ignore_ascii_case("y") || s == "1" || s.eq_ignore_ascii_case("true")
    })
}

/// Trims a text field, mapping blanks to `None`.
#[must_use]
pub fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("nan"))
        .map(str::to_string)
}
