#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident record types and the canonical schema.
//!
//! Every raw row, whether it came from a historical CSV snapshot or the
//! live CKAN API, is normalized into an [`IncidentRecord`]. The merged set
//! of records forms an [`IncidentTable`], which is immutable once built:
//! filters and aggregations produce new tables that share the same
//! reference-counted records.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Datelike as _, Timelike as _, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Canonical column names.
///
/// Source columns are trimmed and uppercased before matching, so `Lat` in a
/// historical file and `LAT` in the API both resolve to [`LAT`].
pub mod columns {
    /// Incident number assigned by the department.
    pub const INCIDENT_NUMBER: &str = "INCIDENT_NUMBER";
    /// Numeric offense code.
    pub const OFFENSE_CODE: &str = "OFFENSE_CODE";
    /// Offense description (crime type).
    pub const OFFENSE_DESCRIPTION: &str = "OFFENSE_DESCRIPTION";
    /// Police district code (e.g. `B2`).
    pub const DISTRICT: &str = "DISTRICT";
    /// Street name.
    pub const STREET: &str = "STREET";
    /// Shooting flag.
    pub const SHOOTING: &str = "SHOOTING";
    /// Occurrence timestamp.
    pub const OCCURRED_ON_DATE: &str = "OCCURRED_ON_DATE";
    /// Derived year.
    pub const YEAR: &str = "YEAR";
    /// Derived month (1-12).
    pub const MONTH: &str = "MONTH";
    /// Derived day of week.
    pub const DAY_OF_WEEK: &str = "DAY_OF_WEEK";
    /// Derived hour (0-23).
    pub const HOUR: &str = "HOUR";
    /// Latitude.
    pub const LAT: &str = "LAT";
    /// Longitude.
    pub const LONG: &str = "LONG";

    /// Columns every raw source must provide.
    pub const REQUIRED: &[&str] = &[INCIDENT_NUMBER, OCCURRED_ON_DATE, OFFENSE_DESCRIPTION, DISTRICT];

    /// Column order of the unified table when serialized.
    pub const CANONICAL: &[&str] = &[
        INCIDENT_NUMBER,
        OFFENSE_CODE,
        OFFENSE_DESCRIPTION,
        DISTRICT,
        STREET,
        SHOOTING,
        OCCURRED_ON_DATE,
        YEAR,
        MONTH,
        DAY_OF_WEEK,
        HOUR,
        LAT,
        LONG,
    ];
}

/// Timestamp format used when writing [`IncidentRecord::occurred_on_date`]
/// back out to CSV.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Day of the week, ordered Monday first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum DayOfWeek {
    /// Monday
    Monday,
    /// Tuesday
    Tuesday,
    /// Wednesday
    Wednesday,
    /// Thursday
    Thursday,
    /// Friday
    Friday,
    /// Saturday
    Saturday,
    /// Sunday
    Sunday,
}

impl DayOfWeek {
    /// All days in chronological order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Monday,
            Self::Tuesday,
            Self::Wednesday,
            Self::Thursday,
            Self::Friday,
            Self::Saturday,
            Self::Sunday,
        ]
    }
}

impl From<chrono::Weekday> for DayOfWeek {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }
}

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// A geographic bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Returns `true` if the point lies inside the box (edges inclusive).
    #[must_use]
    pub fn contains(&self, coordinates: Coordinates) -> bool {
        (self.south..=self.north).contains(&coordinates.latitude)
            && (self.west..=self.east).contains(&coordinates.longitude)
    }
}

/// Stable identity of a record, used to drop duplicates when historical
/// snapshots and the live API overlap.
///
/// An incident number can carry several offenses, so the offense (code, or
/// description when no code is present) and the occurrence time are part
/// of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    /// Incident number.
    pub incident_number: String,
    /// Offense code, falling back to the offense description.
    pub offense: String,
    /// Occurrence timestamp.
    pub occurred_on_date: DateTime<Utc>,
}

/// One normalized crime report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// Incident number assigned by the department.
    pub incident_number: String,
    /// Numeric offense code, if provided.
    pub offense_code: Option<String>,
    /// Offense description (crime type).
    pub offense_description: String,
    /// Police district, `None` when unknown.
    pub district: Option<String>,
    /// Street name, if provided.
    pub street: Option<String>,
    /// Whether a shooting was involved.
    pub shooting: bool,
    /// When the incident occurred.
    pub occurred_on_date: DateTime<Utc>,
    /// Year derived from [`Self::occurred_on_date`].
    pub year: i32,
    /// Month (1-12) derived from [`Self::occurred_on_date`].
    pub month: u32,
    /// Day of week derived from [`Self::occurred_on_date`].
    pub day_of_week: DayOfWeek,
    /// Hour (0-23) derived from [`Self::occurred_on_date`].
    pub hour: u32,
    /// Location, `None` when missing or invalid.
    pub coordinates: Option<Coordinates>,
}

impl IncidentRecord {
    /// Builds a record, deriving the temporal fields from `occurred_on_date`.
    #[must_use]
    pub fn new(
        incident_number: String,
        offense_description: String,
        district: Option<String>,
        occurred_on_date: DateTime<Utc>,
    ) -> Self {
        Self {
            incident_number,
            offense_code: None,
            offense_description,
            district,
            street: None,
            shooting: false,
            occurred_on_date,
            year: occurred_on_date.year(),
            month: occurred_on_date.month(),
            day_of_week: occurred_on_date.weekday().into(),
            hour: occurred_on_date.hour(),
            coordinates: None,
        }
    }

    /// Returns the identity used for de-duplication.
    #[must_use]
    pub fn record_id(&self) -> RecordId {
        RecordId {
            incident_number: self.incident_number.clone(),
            offense: self
                .offense_code
                .clone()
                .unwrap_or_else(|| self.offense_description.clone()),
            occurred_on_date: self.occurred_on_date,
        }
    }
}

/// An ordered, immutable collection of incident records.
///
/// Cloning a table or deriving a subset from it only clones `Arc`
/// pointers; the records themselves are never mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentTable {
    records: Vec<Arc<IncidentRecord>>,
}

impl IncidentTable {
    /// Creates a table from already shared records.
    #[must_use]
    pub const fn new(records: Vec<Arc<IncidentRecord>>) -> Self {
        Self { records }
    }

    /// Creates a table that takes ownership of `records`.
    #[must_use]
    pub fn from_records(records: Vec<IncidentRecord>) -> Self {
        Self {
            records: records.into_iter().map(Arc::new).collect(),
        }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when the table holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates the records in table order.
    pub fn iter(&self) -> impl Iterator<Item = &IncidentRecord> {
        self.records.iter().map(AsRef::as_ref)
    }

    /// The shared records backing this table.
    #[must_use]
    pub fn records(&self) -> &[Arc<IncidentRecord>] {
        &self.records
    }

    /// Returns a new table holding the records for which `predicate`
    /// returns `true`, in their original order.
    #[must_use]
    pub fn select(&self, predicate: impl Fn(&IncidentRecord) -> bool) -> Self {
        Self {
            records: self
                .records
                .iter()
                .filter(|r| predicate(r))
                .cloned()
                .collect(),
        }
    }

    /// Distinct years present in the table.
    #[must_use]
    pub fn years(&self) -> BTreeSet<i32> {
        self.iter().map(|r| r.year).collect()
    }

    /// Distinct non-null districts present in the table.
    #[must_use]
    pub fn districts(&self) -> BTreeSet<String> {
        self.iter().filter_map(|r| r.district.clone()).collect()
    }

    /// Distinct offense descriptions present in the table.
    #[must_use]
    pub fn offense_descriptions(&self) -> BTreeSet<String> {
        self.iter().map(|r| r.offense_description.clone()).collect()
    }
}

impl FromIterator<IncidentRecord> for IncidentTable {
    fn from_iter<T: IntoIterator<Item = IncidentRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().map(Arc::new).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    fn record(number: &str, year: i32, district: Option<&str>) -> IncidentRecord {
        IncidentRecord::new(
            number.to_string(),
            "LARCENY".to_string(),
            district.map(str::to_string),
            Utc.with_ymd_and_hms(year, 3, 14, 22, 5, 0).unwrap(),
        )
    }

    #[test]
    fn derives_temporal_fields() {
        let r = record("I1", 2021, Some("A1"));
        assert_eq!(r.year, 2021);
        assert_eq!(r.month, 3);
        assert_eq!(r.hour, 22);
        assert_eq!(r.day_of_week, DayOfWeek::Sunday);
    }

    #[test]
    fn record_id_falls_back_to_description() {
        let mut r = record("I1", 2021, None);
        assert_eq!(r.record_id().offense, "LARCENY");
        r.offense_code = Some("619".to_string());
        assert_eq!(r.record_id().offense, "619");
    }

    #[test]
    fn day_of_week_parses_case_insensitively() {
        assert_eq!("monday".parse::<DayOfWeek>().unwrap(), DayOfWeek::Monday);
        assert_eq!(DayOfWeek::Friday.to_string(), "Friday");
        assert!(DayOfWeek::Monday < DayOfWeek::Sunday);
    }

    #[test]
    fn select_shares_records_without_mutating_source() {
        let table = IncidentTable::from_records(vec![
            record("I1", 2020, Some("A1")),
            record("I2", 2021, None),
        ]);
        let subset = table.select(|r| r.year == 2021);
        assert_eq!(subset.len(), 1);
        assert_eq!(table.len(), 2);
        assert!(Arc::ptr_eq(&subset.records()[0], &table.records()[1]));
        assert_eq!(table.districts().len(), 1);
        assert_eq!(table.years().into_iter().collect::<Vec<_>>(), vec![2020, 2021]);
    }

    #[test]
    fn bounding_box_contains_edges() {
        let bbox = BoundingBox::new(-71.2, 42.2, -70.9, 42.4);
        assert!(bbox.contains(Coordinates {
            latitude: 42.2,
            longitude: -71.0
        }));
        assert!(!bbox.contains(Coordinates {
            latitude: -1.0,
            longitude: -1.0
        }));
    }
}
