//! CSV export of the filtered table.
//!
//! Rows are written in canonical column order. Exports are capped; when the
//! filtered table is larger than the cap, the first `cap` rows are written
//! and the result carries an [`ExportTooLarge`] describing the truncation.

use std::collections::BTreeSet;
use std::io::Write;

use boston_crime_analytics_models::FilterSelection;
use boston_crime_incident_models::{IncidentRecord, IncidentTable, TIMESTAMP_FORMAT, columns};

/// Default maximum number of rows per export.
pub const DEFAULT_EXPORT_ROW_CAP: usize = 1_000_000;

/// Dimensions with more selected values than this are abbreviated in file
/// names.
const MAX_NAMED_VALUES: usize = 3;

/// The filtered table exceeded the export cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("export truncated to {cap} of {total_rows} rows")]
pub struct ExportTooLarge {
    /// Rows matching the selection.
    pub total_rows: usize,
    /// Rows actually written.
    pub cap: usize,
}

/// Errors that can occur while writing an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The underlying writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of [`write_csv`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvExport {
    /// Data rows written, excluding the header.
    pub rows_written: usize,
    /// Rows in the table that was exported.
    pub total_rows: usize,
    /// Set when rows were left out because of the cap.
    pub truncation: Option<ExportTooLarge>,
}

/// Writes a header and at most `cap` rows of `table` to `writer`.
///
/// # Errors
///
/// Returns [`ExportError`] if serialization or the writer fails.
pub fn write_csv<W: Write>(
    table: &IncidentTable,
    cap: usize,
    writer: W,
) -> Result<CsvExport, ExportError> {
    let total_rows = table.len();
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(columns::CANONICAL)?;

    let mut rows_written = 0;
    for record in table.iter().take(cap) {
        csv.write_record(record_fields(record))?;
        rows_written += 1;
    }
    csv.flush()?;

    let truncation = (total_rows > cap).then_some(ExportTooLarge { total_rows, cap });
    if let Some(truncation) = truncation {
        log::warn!("{truncation}");
    }

    Ok(CsvExport {
        rows_written,
        total_rows,
        truncation,
    })
}

/// Serializes `record` in [`columns::CANONICAL`] order.
fn record_fields(record: &IncidentRecord) -> [String; 13] {
    let optional = |value: &Option<String>| value.clone().unwrap_or_default();
    let (lat, long) = record.coordinates.map_or_else(
        || (String::new(), String::new()),
        |c| (c.latitude.to_string(), c.longitude.to_string()),
    );

    [
        record.incident_number.clone(),
        optional(&record.offense_code),
        record.offense_description.clone(),
        optional(&record.district),
        optional(&record.street),
        if record.shooting { "1" } else { "0" }.to_string(),
        record.occurred_on_date.format(TIMESTAMP_FORMAT).to_string(),
        record.year.to_string(),
        record.month.to_string(),
        record.day_of_week.to_string(),
        record.hour.to_string(),
        lat,
        long,
    ]
}

/// Download file name describing `selection`, e.g.
/// `boston_crime_2021_a1_larceny.csv`. Unrestricted dimensions read `all`.
#[must_use]
pub fn export_file_name(selection: &FilterSelection) -> String {
    let years: BTreeSet<String> = selection.years.iter().map(ToString::to_string).collect();
    format!(
        "boston_crime_{}_{}_{}.csv",
        name_part(&years, "years"),
        name_part(&selection.districts, "districts"),
        name_part(&selection.offenses, "offenses"),
    )
}

fn name_part(values: &BTreeSet<String>, plural: &str) -> String {
    match values.len() {
        0 => "all".to_string(),
        n if n > MAX_NAMED_VALUES => format!("{n}_{plural}"),
        _ => values
            .iter()
            .map(|v| slug(v))
            .collect::<Vec<_>>()
            .join("-"),
    }
}

/// Lowercase ASCII alphanumerics with runs of anything else collapsed to a
/// single underscore.
fn slug(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}
