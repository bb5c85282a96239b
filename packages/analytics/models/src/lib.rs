#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filter selection and aggregate view types for the crime dashboard.
//!
//! A [`FilterSelection`] describes which incidents the user wants to see.
//! A [`GroupingSpec`] describes how matching incidents are counted, and an
//! [`AggregateView`] holds the resulting counts keyed by [`GroupKey`]s.

use std::collections::BTreeSet;
use std::fmt;

use boston_crime_incident_models::DayOfWeek;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The years, offense descriptions, and districts the user selected.
///
/// An empty set means "no restriction" on that dimension. Dimensions combine
/// with AND; values within a dimension combine with OR.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    /// Selected years.
    pub years: BTreeSet<i32>,
    /// Selected offense descriptions, matched exactly.
    pub offenses: BTreeSet<String>,
    /// Selected district codes, matched exactly.
    pub districts: BTreeSet<String>,
}

impl FilterSelection {
    /// A selection that keeps every record.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Builds a selection from comma-separated lists as they arrive in query
    /// strings. Blank entries and years that are not integers are ignored.
    #[must_use]
    pub fn from_lists(
        years: Option<&str>,
        offenses: Option<&str>,
        districts: Option<&str>,
    ) -> Self {
        Self {
            years: split_list(years)
                .filter_map(|s| s.parse().ok())
                .collect(),
            offenses: split_list(offenses).map(str::to_string).collect(),
            districts: split_list(districts).map(str::to_string).collect(),
        }
    }

    /// Replaces the selected years.
    #[must_use]
    pub fn with_years(mut self, years: impl IntoIterator<Item = i32>) -> Self {
        self.years = years.into_iter().collect();
        self
    }

    /// Replaces the selected offenses.
    #[must_use]
    pub fn with_offenses<S: Into<String>>(mut self, offenses: impl IntoIterator<Item = S>) -> Self {
        self.offenses = offenses.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the selected districts.
    #[must_use]
    pub fn with_districts<S: Into<String>>(
        mut self,
        districts: impl IntoIterator<Item = S>,
    ) -> Self {
        self.districts = districts.into_iter().map(Into::into).collect();
        self
    }

    /// The same selection with the district restriction removed.
    #[must_use]
    pub fn without_districts(&self) -> Self {
        Self {
            districts: BTreeSet::new(),
            ..self.clone()
        }
    }

    /// The same selection with the offense restriction removed.
    #[must_use]
    pub fn without_offenses(&self) -> Self {
        Self {
            offenses: BTreeSet::new(),
            ..self.clone()
        }
    }

    /// Whether no dimension is restricted.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.years.is_empty() && self.offenses.is_empty() && self.districts.is_empty()
    }
}

fn split_list(list: Option<&str>) -> impl Iterator<Item = &str> {
    list.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// A record attribute that incidents can be grouped by.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Dimension {
    /// Calendar year.
    Year,
    /// Month number, 1-12.
    Month,
    /// Day of week.
    DayOfWeek,
    /// Hour of day, 0-23.
    Hour,
    /// District code.
    District,
    /// Offense description.
    Offense,
    /// Calendar date.
    Day,
    /// Week, identified by the Sunday it ends on.
    Week,
}

impl Dimension {
    /// Whether the dimension is a continuous calendar axis whose gaps can
    /// be filled with zero counts.
    #[must_use]
    pub const fn is_calendar(self) -> bool {
        matches!(self, Self::Day | Self::Week)
    }
}

/// How to group records for an [`AggregateView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingSpec {
    /// One or two grouping dimensions, outermost first.
    pub dimensions: Vec<Dimension>,
    /// Emit zero-count rows for missing days or weeks between the first
    /// and last observed key. Only applies to a single calendar dimension.
    pub dense: bool,
}

impl GroupingSpec {
    /// Groups by a single dimension.
    #[must_use]
    pub fn by(dimension: Dimension) -> Self {
        Self {
            dimensions: vec![dimension],
            dense: false,
        }
    }

    /// Groups by two dimensions.
    #[must_use]
    pub fn by_pair(outer: Dimension, inner: Dimension) -> Self {
        Self {
            dimensions: vec![outer, inner],
            dense: false,
        }
    }

    /// Enables gap filling.
    #[must_use]
    pub const fn dense(mut self) -> Self {
        self.dense = true;
        self
    }
}

/// The value of one grouping dimension for a row of an [`AggregateView`].
///
/// Keys of a given dimension are always the same variant, or
/// [`GroupKey::Missing`]. `Missing` orders after every other key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupKey {
    /// Year, month, or hour.
    Int(i64),
    /// Day of week.
    Day(DayOfWeek),
    /// Calendar date for day and week dimensions.
    Date(NaiveDate),
    /// District or offense.
    Text(String),
    /// The record had no value for this dimension.
    Missing,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Day(d) => write!(f, "{d}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Text(s) => f.write_str(s),
            Self::Missing => Ok(()),
        }
    }
}

/// One group and its record count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRow {
    /// One key per grouping dimension, in [`AggregateView::dimensions`]
    /// order.
    pub keys: Vec<GroupKey>,
    /// Number of records in the group.
    pub count: u64,
}

/// Record counts grouped by one or two dimensions.
///
/// An empty view still carries its dimensions so that charts have columns
/// to bind to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateView {
    /// Grouping dimensions.
    pub dimensions: Vec<Dimension>,
    /// Groups in ascending key order unless produced by a top-N.
    pub rows: Vec<AggregateRow>,
}

impl AggregateView {
    /// An empty view over `dimensions`.
    #[must_use]
    pub const fn empty(dimensions: Vec<Dimension>) -> Self {
        Self {
            dimensions,
            rows: Vec::new(),
        }
    }

    /// Whether there are no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of every group's count.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.rows.iter().map(|r| r.count).sum()
    }

    /// Count for the group with exactly `keys`, or 0.
    #[must_use]
    pub fn count_for(&self, keys: &[GroupKey]) -> u64 {
        self.rows
            .iter()
            .find(|r| r.keys == keys)
            .map_or(0, |r| r.count)
    }
}

/// Headline numbers for the current selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMetrics {
    /// Records matching the selection.
    pub total_records: u64,
    /// Matching records that occurred in the current calendar month.
    pub incidents_this_month: u64,
    /// Matching records flagged as shootings.
    pub shooting_incidents: u64,
    /// Distinct non-null districts among matching records.
    pub unique_districts: u64,
}

/// A single incident plotted on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// District code.
    pub district: Option<String>,
    /// Offense description.
    pub offense_description: String,
    /// Day of week.
    pub day_of_week: DayOfWeek,
    /// Hour of day.
    pub hour: u32,
}

/// Points for the map panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapSample {
    /// Plotted points.
    pub points: Vec<MapPoint>,
    /// Records that had usable coordinates before sampling.
    pub total_with_coordinates: usize,
}

impl MapSample {
    /// Whether some records with coordinates were left out.
    #[must_use]
    pub fn is_sampled(&self) -> bool {
        self.points.len() < self.total_with_coordinates
    }
}
