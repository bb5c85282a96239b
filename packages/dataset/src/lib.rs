#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Fetch-and-load orchestration and the shared incident table cache.
//!
//! [`SourceRefresher`] runs the fetchers and the loader to produce a
//! [`Dataset`]. [`TtlCache`] keeps the last dataset for a refresh interval
//! so that filter changes never trigger a refetch. Both sit behind traits
//! ([`DatasetRefresher`], [`TableCache`]) so callers can substitute them.

pub mod cache;
pub mod refresh;

use boston_crime_incident_models::IncidentTable;
use boston_crime_loader::{LoadError, LoadStats};
use boston_crime_source::FetchError;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub use cache::{CacheKey, TableCache, TtlCache};
pub use refresh::{DatasetRefresher, SourceRefresher};

/// Errors that can occur while building a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// Fetching raw data failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Normalizing raw data failed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// None of the historical snapshots could be downloaded.
    #[error("no historical data could be loaded ({failed} of {attempted} files failed)")]
    NoData {
        /// Number of snapshot files requested.
        attempted: usize,
        /// Number of snapshot files that failed.
        failed: usize,
    },
}

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Informational message.
    Info,
    /// Something went wrong but the dataset is still usable.
    Warning,
}

/// A user-facing message produced while building a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Message text.
    pub message: String,
}

impl Notice {
    /// Creates an informational notice.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// Creates a warning notice.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// A loaded unified table together with how it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// The unified incident table.
    pub table: IncidentTable,
    /// Loader counters.
    pub stats: LoadStats,
    /// Messages to surface to the user.
    pub notices: Vec<Notice>,
    /// When the data was fetched.
    pub refreshed_at: DateTime<Utc>,
}

impl Dataset {
    /// Wraps an already loaded table.
    #[must_use]
    pub fn from_table(table: IncidentTable) -> Self {
        Self {
            table,
            stats: LoadStats::default(),
            notices: Vec::new(),
            refreshed_at: Utc::now(),
        }
    }
}
