#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filter engine and aggregator for the crime dashboard.
//!
//! Everything here is a pure function of an [`IncidentTable`] and a
//! selection or grouping spec. Functions never fail: an empty table simply
//! produces empty views.
//!
//! [`IncidentTable`]: boston_crime_incident_models::IncidentTable

pub mod aggregate;
pub mod dashboard;
pub mod filter;
pub mod map;
pub mod metrics;

pub use aggregate::{aggregate, top_n};
pub use dashboard::{Dashboard, DashboardConfig, build_dashboard};
pub use filter::filter;
pub use map::{DEFAULT_MAP_POINT_CAP, map_points};
pub use metrics::key_metrics;

#[cfg(test)]
pub(crate) mod test_support {
    use boston_crime_incident_models::{Coordinates, IncidentRecord, IncidentTable};
    use chrono::{NaiveDateTime, TimeZone as _, Utc};

    /// Builds a record occurring at `timestamp` (`%Y-%m-%d %H:%M`).
    pub fn record(offense: &str, district: Option<&str>, timestamp: &str) -> IncidentRecord {
        let naive = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M").unwrap();
        IncidentRecord::new(
            format!("I{timestamp}{offense}"),
            offense.to_string(),
            district.map(str::to_string),
            Utc.from_utc_datetime(&naive),
        )
    }

    pub fn located(mut record: IncidentRecord, latitude: f64, longitude: f64) -> IncidentRecord {
        record.coordinates = Some(Coordinates {
            latitude,
            longitude,
        });
        record
    }

    /// The three-record table: 2020 Larceny A1, 2021 Larceny B2, 2021
    /// Assault A1.
    pub fn three_records() -> IncidentTable {
        IncidentTable::from_records(vec![
            record("Larceny", Some("A1"), "2020-05-01 10:00"),
            record("Larceny", Some("B2"), "2021-05-01 11:00"),
            record("Assault", Some("A1"), "2021-07-04 22:00"),
        ])
    }
}
