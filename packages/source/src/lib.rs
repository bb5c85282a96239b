#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Remote fetchers for Boston crime incident data.
//!
//! Two kinds of upstream data are supported: historical CSV snapshots in
//! object storage ([`csv_download`]) and the live CKAN Datastore API
//! ([`ckan`]). Both produce [`RawTable`]s of untyped string fields that the
//! loader later coerces into the canonical schema.
//!
//! Every request is attempted exactly once. Failures are reported as a
//! [`FetchError`] naming the source that failed.

pub mod ckan;
pub mod csv_download;
pub mod progress;
pub mod registry;
pub mod source_def;

use std::sync::Arc;

use async_trait::async_trait;

use crate::progress::ProgressCallback;
use crate::source_def::{HistoricalFile, SourceDefinition};

/// Errors that can occur while fetching raw data.
///
/// Every variant carries the name of the failing source (a historical file
/// name or the live API label) so it can be shown to the user as-is.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The HTTP request could not be completed.
    #[error("{source_name}: HTTP request failed: {error}")]
    Http {
        /// Source that failed.
        source_name: String,
        /// Underlying transport error.
        #[source]
        error: reqwest::Error,
    },

    /// The server answered with a non-success status code.
    #[error("{source_name}: server responded with HTTP {status}")]
    Status {
        /// Source that failed.
        source_name: String,
        /// HTTP status code.
        status: u16,
    },

    /// The response body could not be decoded.
    #[error("{source_name}: malformed payload: {message}")]
    Malformed {
        /// Source that failed.
        source_name: String,
        /// Description of what went wrong.
        message: String,
    },
}

impl FetchError {
    /// Name of the source that failed.
    #[must_use]
    pub fn source_name(&self) -> &str {
        match self {
            Self::Http { source_name, .. }
            | Self::Status { source_name, .. }
            | Self::Malformed { source_name, .. } => source_name,
        }
    }

    pub(crate) fn malformed(source_name: &str, message: impl Into<String>) -> Self {
        Self::Malformed {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }
}

/// Rows of untyped string fields, as delivered by a single source.
///
/// Every row holds one value per entry in [`Self::columns`]; missing values
/// are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Name of the source the rows came from.
    pub source_name: String,
    /// Column headers exactly as the source named them.
    pub columns: Vec<String>,
    /// Row values, aligned with [`Self::columns`].
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Creates an empty table with the given columns.
    #[must_use]
    pub fn new(source_name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            source_name: source_name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` when the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row, padding or truncating it to the column count.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }
}

/// Inclusive span of years to retrieve historical snapshots for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoricalRange {
    /// First year, inclusive.
    pub from_year: i32,
    /// Last year, inclusive.
    pub to_year: i32,
}

impl HistoricalRange {
    /// Creates a range covering `from_year..=to_year`.
    #[must_use]
    pub const fn new(from_year: i32, to_year: i32) -> Self {
        Self { from_year, to_year }
    }

    /// A range covering every configured snapshot.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            from_year: i32::MIN,
            to_year: i32::MAX,
        }
    }
}

/// A provider of raw incident data.
///
/// The HTTP implementation is [`HttpSource`]; the trait exists so the
/// dataset layer can be exercised without network access.
#[async_trait]
pub trait IncidentSource: Send + Sync {
    /// Returns the source definition this fetcher was built from.
    fn definition(&self) -> &SourceDefinition;

    /// Downloads a single historical snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the download fails or the CSV is malformed.
    async fn fetch_historical_file(&self, file: &HistoricalFile) -> Result<RawTable, FetchError>;

    /// Downloads the most recent records from the live API.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if any page request fails or a page cannot be
    /// decoded.
    async fn fetch_live(&self) -> Result<RawTable, FetchError>;

    /// Downloads every historical snapshot overlapping `range`, stopping at
    /// the first failure.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchError`] of the first snapshot that fails.
    async fn fetch_historical(
        &self,
        range: HistoricalRange,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<Vec<RawTable>, FetchError> {
        let files = self.definition().historical.files_in(range);
        progress.set_total(files.len() as u64);

        let mut tables = Vec::with_capacity(files.len());
        for file in files {
            progress.set_message(format!("Downloading {}", file.name));
            tables.push(self.fetch_historical_file(file).await?);
            progress.inc(1);
        }

        progress.finish(format!("Downloaded {} historical files", tables.len()));
        Ok(tables)
    }
}

/// Fetches data over HTTP according to a [`SourceDefinition`].
pub struct HttpSource {
    definition: SourceDefinition,
    client: reqwest::Client,
}

impl HttpSource {
    /// Creates a fetcher with a client honoring the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the HTTP client cannot be constructed.
    pub fn new(definition: SourceDefinition) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(definition.timeout_secs))
            .build()
            .map_err(|error| FetchError::Http {
                source_name: definition.name.clone(),
                error,
            })?;

        Ok(Self { definition, client })
    }
}

#[async_trait]
impl IncidentSource for HttpSource {
    fn definition(&self) -> &SourceDefinition {
        &self.definition
    }

    async fn fetch_historical_file(&self, file: &HistoricalFile) -> Result<RawTable, FetchError> {
        csv_download::fetch_csv(&self.client, &self.definition.historical, file).await
    }

    async fn fetch_live(&self) -> Result<RawTable, FetchError> {
        ckan::fetch_ckan(&self.client, &self.definition.live).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_row_aligns_to_columns() {
        let mut table = RawTable::new("test", vec!["A".to_string(), "B".to_string()]);
        table.push_row(vec!["1".to_string()]);
        table.push_row(vec!["1".to_string(), "2".to_string(), "3".to_string()]);
        assert_eq!(table.rows[0], vec!["1".to_string(), String::new()]);
        assert_eq!(table.rows[1].len(), 2);
    }

    #[test]
    fn fetch_error_names_source() {
        let err = FetchError::Status {
            source_name: "2019.csv".to_string(),
            status: 404,
        };
        assert_eq!(err.source_name(), "2019.csv");
        assert_eq!(err.to_string(), "2019.csv: server responded with HTTP 404");
    }
}
