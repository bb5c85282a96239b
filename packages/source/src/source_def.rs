//! Config-driven source definition.
//!
//! [`SourceDefinition`] captures everything about where incident data
//! lives: the live CKAN resource, the object-storage snapshot files, and
//! the validation bounds applied while loading.

use std::path::Path;

use serde::Deserialize;

use crate::HistoricalRange;

/// A complete source definition, deserialized from TOML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceDefinition {
    /// Unique identifier (e.g., `"boston_pd"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// City the incidents belong to.
    pub city: String,
    /// Two-letter state abbreviation.
    pub state: String,
    /// Earliest year of supported data; older records are dropped.
    pub min_year: i32,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Service area; coordinates outside it are treated as invalid.
    #[serde(default)]
    pub bounds: Option<Bounds>,
    /// Live CKAN Datastore resource.
    pub live: LiveConfig,
    /// Historical snapshot files.
    pub historical: HistoricalConfig,
}

const fn default_timeout_secs() -> u64 {
    120
}

/// Service-area bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Bounds {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

/// CKAN `datastore_search` configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LiveConfig {
    /// Label used in log lines and error messages.
    pub label: String,
    /// `datastore_search` endpoint.
    pub api_url: String,
    /// CKAN resource ID.
    pub resource_id: String,
    /// Records requested per page.
    pub page_size: u64,
    /// Maximum number of records to fetch in total.
    #[serde(default)]
    pub limit: Option<u64>,
}

/// Object-storage configuration for historical snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoricalConfig {
    /// URL prefix the file names are appended to.
    pub base_url: String,
    /// Compression of the stored files (`"gzip"` or unset).
    #[serde(default)]
    pub compressed: Option<String>,
    /// Snapshot files in chronological order.
    pub files: Vec<HistoricalFile>,
}

impl HistoricalConfig {
    /// Returns the files whose year span overlaps `range`.
    #[must_use]
    pub fn files_in(&self, range: HistoricalRange) -> Vec<&HistoricalFile> {
        self.files.iter().filter(|f| f.overlaps(range)).collect()
    }

    /// Full download URL for `file`.
    #[must_use]
    pub fn url_for(&self, file: &HistoricalFile) -> String {
        format!("{}{}", self.base_url, file.name)
    }

    /// Whether the stored files are gzip-compressed.
    #[must_use]
    pub fn is_gzipped(&self) -> bool {
        self.compressed.as_deref() == Some("gzip")
    }
}

/// A single historical snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoricalFile {
    /// File name relative to [`HistoricalConfig::base_url`].
    pub name: String,
    /// First year covered by the file.
    pub first_year: i32,
    /// Last year covered, or unset for files that grow to the present.
    #[serde(default)]
    pub last_year: Option<i32>,
}

impl HistoricalFile {
    /// Returns `true` if the file covers any year in `range`.
    #[must_use]
    pub fn overlaps(&self, range: HistoricalRange) -> bool {
        self.first_year <= range.to_year && self.last_year.unwrap_or(i32::MAX) >= range.from_year
    }
}

/// Errors reading a source definition from disk.
#[derive(Debug, thiserror::Error)]
pub enum SourceConfigError {
    /// The file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid source definition.
    #[error("invalid source definition: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Parses a TOML string into a [`SourceDefinition`].
///
/// # Errors
///
/// Returns an error if the TOML is malformed or missing required fields.
pub fn parse_source_toml(toml_str: &str) -> Result<SourceDefinition, toml::de::Error> {
    toml::de::from_str(toml_str)
}

/// Reads a [`SourceDefinition`] from a TOML file.
///
/// # Errors
///
/// Returns [`SourceConfigError`] if the file cannot be read or parsed.
pub fn load_source_file(path: &Path) -> Result<SourceDefinition, SourceConfigError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(parse_source_toml(&contents)?)
}
