#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Normalizes raw incident rows into the unified [`IncidentTable`].
//!
//! Loading renames columns to the canonical schema, coerces types, derives
//! the temporal fields, validates rows, and merges historical and live
//! sources while dropping duplicate records. Rows with unparsable dates are
//! dropped; invalid coordinates are nulled so the row still counts toward
//! every view except the map.

pub mod columns;
pub mod parsing;

use std::collections::HashSet;

use boston_crime_incident_models::columns as col;
use boston_crime_incident_models::{BoundingBox, IncidentRecord, IncidentTable, RecordId};
use boston_crime_source::RawTable;
use boston_crime_source::source_def::SourceDefinition;
use chrono::{Datelike as _, Utc};

use crate::columns::ColumnIndex;
use crate::parsing::{non_empty, parse_coordinates, parse_shooting, parse_timestamp};

/// Errors that can occur while loading.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A source lacks a column the canonical schema requires.
    #[error("{source_name}: missing required column {column}")]
    MissingColumn {
        /// Source that is missing the column.
        source_name: String,
        /// Canonical name of the missing column.
        column: String,
    },
}

/// Validation settings applied while loading.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Earliest accepted year.
    pub min_year: i32,
    /// Latest accepted year; defaults to the current year.
    pub max_year: i32,
    /// Service area; coordinates outside it are nulled.
    pub bounds: Option<BoundingBox>,
}

impl LoadOptions {
    /// Options for data from `min_year` through the current year.
    #[must_use]
    pub fn since(min_year: i32) -> Self {
        Self {
            min_year,
            max_year: Utc::now().year(),
            bounds: None,
        }
    }

    /// Options derived from a source definition.
    #[must_use]
    pub fn for_source(source: &SourceDefinition) -> Self {
        Self {
            bounds: source
                .bounds
                .map(|b| BoundingBox::new(b.west, b.south, b.east, b.north)),
            ..Self::since(source.min_year)
        }
    }
}

/// Row counters collected while loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Raw rows seen across all sources.
    pub raw_rows: usize,
    /// Rows dropped because the timestamp could not be parsed.
    pub dropped_unparsable_date: usize,
    /// Rows dropped because the year fell outside the accepted range.
    pub dropped_out_of_range_year: usize,
    /// Rows kept with their coordinates nulled.
    pub nulled_coordinates: usize,
    /// Live rows dropped because a historical record has the same identity.
    pub duplicates_removed: usize,
    /// Records contributed by the live sources.
    pub live_records_added: usize,
}

/// Result of a successful load.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    /// The unified table.
    pub table: IncidentTable,
    /// Counters describing what happened to the raw rows.
    pub stats: LoadStats,
}

/// Why a raw row did not become a record.
enum Rejection {
    UnparsableDate,
    YearOutOfRange,
}

/// Converts a single raw row into a record.
fn parse_row(
    index: &ColumnIndex,
    row: &[String],
    options: &LoadOptions,
    stats: &mut LoadStats,
) -> Result<IncidentRecord, Rejection> {
    let occurred_on_date = index
        .get(row, col::OCCURRED_ON_DATE)
        .and_then(parse_timestamp)
        .ok_or(Rejection::UnparsableDate)?;

    let year = occurred_on_date.year();
    if year < options.min_year || year > options.max_year {
        return Err(Rejection::YearOutOfRange);
    }

    let mut record = IncidentRecord::new(
        index
            .get(row, col::INCIDENT_NUMBER)
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        index
            .get(row, col::OFFENSE_DESCRIPTION)
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        non_empty(index.get(row, col::DISTRICT)),
        occurred_on_date,
    );
    record.offense_code = non_empty(index.get(row, col::OFFENSE_CODE));
    record.street = non_empty(index.get(row, col::STREET));
    record.shooting = parse_shooting(index.get(row, col::SHOOTING));
    record.coordinates = parse_coordinates(
        index.get(row, col::LAT),
        index.get(row, col::LONG),
        options.bounds.as_ref(),
    );
    if record.coordinates.is_none() {
        stats.nulled_coordinates += 1;
    }

    Ok(record)
}

/// Normalizes every row of `table` into records.
fn load_table(
    table: &RawTable,
    options: &LoadOptions,
    stats: &mut LoadStats,
) -> Result<Vec<IncidentRecord>, LoadError> {
    if table.columns.is_empty() {
        log::debug!("Skipping {}: no columns", table.source_name);
        return Ok(Vec::new());
    }

    let index = ColumnIndex::validated(table)?;
    stats.raw_rows += table.len();

    let mut records = Vec::with_capacity(table.len());
    for row in &table.rows {
        match parse_row(&index, row, options, stats) {
            Ok(record) => records.push(record),
            Err(Rejection::UnparsableDate) => stats.dropped_unparsable_date += 1,
            Err(Rejection::YearOutOfRange) => stats.dropped_out_of_range_year += 1,
        }
    }

    log::debug!(
        "Loaded {} records from {} ({} raw rows)",
        records.len(),
        table.source_name,
        table.len()
    );
    Ok(records)
}

/// Builds the unified table from historical snapshots and live API rows.
///
/// Every historical record is kept, in source order. Live records follow
/// and are skipped when a historical record already carries the same
/// [`RecordId`], which is where the two feeds overlap.
///
/// # Errors
///
/// Returns [`LoadError::MissingColumn`] if any non-empty source lacks a
/// required column.
pub fn load(
    historical: &[RawTable],
    live: &[RawTable],
    options: &LoadOptions,
) -> Result<Loaded, LoadError> {
    let capacity = historical.iter().chain(live).map(RawTable::len).sum();
    let mut records = Vec::with_capacity(capacity);
    let mut stats = LoadStats::default();

    for table in historical {
        records.extend(load_table(table, options, &mut stats)?);
    }

    let historical_ids: HashSet<RecordId> =
        records.iter().map(IncidentRecord::record_id).collect();
    for table in live {
        for record in load_table(table, options, &mut stats)? {
            if historical_ids.contains(&record.record_id()) {
                stats.duplicates_removed += 1;
            } else {
                records.push(record);
                stats.live_records_added += 1;
            }
        }
    }

    log::info!(
        "Loaded {} incidents from {} raw rows \
         (dropped: {} bad dates, {} out-of-range years, {} duplicates; \
         {} without coordinates; {} from live API)",
        records.len(),
        stats.raw_rows,
        stats.dropped_unparsable_date,
        stats.dropped_out_of_range_year,
        stats.duplicates_removed,
        stats.nulled_coordinates,
        stats.live_records_added,
    );

    Ok(Loaded {
        table: IncidentTable::from_records(records),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HISTORICAL_HEADER: &[&str] = &[
        "INCIDENT_NUMBER",
        "OFFENSE_CODE",
        "OFFENSE_DESCRIPTION",
        "DISTRICT",
        "SHOOTING",
        "OCCURRED_ON_DATE",
        "Lat",
        "Long",
    ];

    fn raw(source: &str, header: &[&str], rows: &[&[&str]]) -> RawTable {
        let mut table = RawTable::new(source, header.iter().map(|s| (*s).to_string()).collect());
        for row in rows {
            table.push_row(row.iter().map(|s| (*s).to_string()).collect());
        }
        table
    }

    fn options() -> LoadOptions {
        LoadOptions {
            min_year: 2015,
            max_year: 2025,
            bounds: None,
        }
    }

    #[test]
    fn normalizes_historical_rows() {
        let table = raw(
            "2021.csv",
            HISTORICAL_HEADER,
            &[&[
                "I212000001",
                "619",
                " LARCENY ALL OTHERS ",
                "B2",
                "Y",
                "2021-07-04 13:45:00+00",
                "42.33",
                "-71.08",
            ]],
        );
        let loaded = load(&[table], &[], &options()).unwrap();
        let record = loaded.table.iter().next().unwrap();
        assert_eq!(record.offense_description, "LARCENY ALL OTHERS");
        assert_eq!(record.offense_code.as_deref(), Some("619"));
        assert_eq!(record.district.as_deref(), Some("B2"));
        assert!(record.shooting);
        assert_eq!((record.year, record.month, record.hour), (2021, 7, 13));
        assert!(record.coordinates.is_some());
        assert_eq!(loaded.stats.raw_rows, 1);
    }

    #[test]
    fn zero_coordinates_are_nulled_not_dropped() {
        let table = raw(
            "2020.csv",
            HISTORICAL_HEADER,
            &[&[
                "I202000001",
                "3115",
                "INVESTIGATE PERSON",
                "",
                "",
                "2020-02-01 08:00:00",
                "0.0",
                "0.0",
            ]],
        );
        let loaded = load(&[table], &[], &options()).unwrap();
        assert_eq!(loaded.table.len(), 1);
        let record = loaded.table.iter().next().unwrap();
        assert!(record.coordinates.is_none());
        assert!(record.district.is_none());
        assert!(!record.shooting);
        assert_eq!(loaded.stats.nulled_coordinates, 1);
    }

    #[test]
    fn drops_unparsable_dates_and_out_of_range_years() {
        let table = raw(
            "mixed.csv",
            HISTORICAL_HEADER,
            &[
                &["I1", "1", "A", "A1", "N", "not a date", "", ""],
                &["I2", "1", "A", "A1", "N", "2014-12-31 23:59:00", "", ""],
                &["I3", "1", "A", "A1", "N", "2030-01-01 00:00:00", "", ""],
                &["I4", "1", "A", "A1", "N", "2016-01-01 00:00:00", "", ""],
            ],
        );
        let loaded = load(&[table], &[], &options()).unwrap();
        assert_eq!(loaded.table.len(), 1);
        assert_eq!(loaded.stats.dropped_unparsable_date, 1);
        assert_eq!(loaded.stats.dropped_out_of_range_year, 2);
    }

    #[test]
    fn merges_sources_and_removes_duplicates() {
        let historical = raw(
            "2023-present.csv",
            HISTORICAL_HEADER,
            &[&[
                "I232000001",
                "3301",
                "VERBAL DISPUTE",
                "C11",
                "0",
                "2023-05-05 10:00:00+00",
                "42.3",
                "-71.06",
            ]],
        );
        let live = raw(
            "Boston open data API",
            &[
                "_id",
                "INCIDENT_NUMBER",
                "OFFENSE_CODE",
                "OFFENSE_DESCRIPTION",
                "DISTRICT",
                "SHOOTING",
                "OCCURRED_ON_DATE",
                "Lat",
                "Long",
            ],
            &[
                &[
                    "1",
                    "I232000001",
                    "3301",
                    "VERBAL DISPUTE",
                    "C11",
                    "0",
                    "2023-05-05T10:00:00",
                    "42.3",
                    "-71.06",
                ],
                &[
                    "2",
                    "I232000001",
                    "1402",
                    "VANDALISM",
                    "C11",
                    "0",
                    "2023-05-05T10:00:00",
                    "42.3",
                    "-71.06",
                ],
            ],
        );
        let loaded = load(&[historical], &[live], &options()).unwrap();
        assert_eq!(loaded.table.len(), 2);
        assert_eq!(loaded.stats.duplicates_removed, 1);
        assert_eq!(loaded.stats.live_records_added, 1);
        let descriptions: Vec<&str> = loaded
            .table
            .iter()
            .map(|r| r.offense_description.as_str())
            .collect();
        assert_eq!(descriptions, vec!["VERBAL DISPUTE", "VANDALISM"]);
    }

    #[test]
    fn keeps_distinct_snapshot_rows_sharing_an_identity() {
        let table = raw(
            "2019.csv",
            HISTORICAL_HEADER,
            &[
                &["I1", "3115", "INVESTIGATE PERSON", "A1", "", "2019-06-01 12:00:00", "", ""],
                &["I1", "3115", "INVESTIGATE PERSON", "B2", "", "2019-06-01 12:00:00", "", ""],
            ],
        );
        let loaded = load(&[table], &[], &options()).unwrap();
        assert_eq!(loaded.table.len(), 2);
        assert_eq!(loaded.stats.duplicates_removed, 0);
        let districts: Vec<_> = loaded
            .table
            .iter()
            .map(|r| r.district.as_deref())
            .collect();
        assert_eq!(districts, vec![Some("A1"), Some("B2")]);
    }

    #[test]
    fn live_rows_sharing_an_identity_with_each_other_are_kept() {
        let header = &[
            "INCIDENT_NUMBER",
            "OFFENSE_CODE",
            "OFFENSE_DESCRIPTION",
            "DISTRICT",
            "OCCURRED_ON_DATE",
        ];
        let live = raw(
            "Boston open data API",
            header,
            &[
                &["I9", "619", "LARCENY", "D4", "2024-01-02T03:00:00"],
                &["I9", "619", "LARCENY", "E13", "2024-01-02T03:00:00"],
            ],
        );
        let loaded = load(&[], &[live], &options()).unwrap();
        assert_eq!(loaded.table.len(), 2);
        assert_eq!(loaded.stats.live_records_added, 2);
    }

    #[test]
    fn missing_required_column_fails() {
        let table = raw("2019.csv", &["INCIDENT_NUMBER", "OCCURRED_ON_DATE"], &[]);
        let err = load(&[table], &[], &options()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "2019.csv: missing required column OFFENSE_DESCRIPTION"
        );
    }

    #[test]
    fn columnless_tables_are_skipped() {
        let empty = RawTable::new("Boston open data API", Vec::new());
        let loaded = load(&[], &[empty], &options()).unwrap();
        assert!(loaded.table.is_empty());
    }

    #[test]
    fn options_from_source_definition() {
        let source = boston_crime_source::registry::find_source("boston_pd").unwrap();
        let options = LoadOptions::for_source(&source);
        assert_eq!(options.min_year, 2015);
        assert!(options.bounds.is_some());
        assert!(options.max_year >= 2025);
    }
}
