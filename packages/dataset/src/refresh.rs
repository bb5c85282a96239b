//! Runs the fetchers and the loader to produce a [`Dataset`].
//!
//! A snapshot file or the live API failing is not fatal: the failure
//! becomes a warning [`Notice`] and the remaining sources still load. Only
//! when no historical snapshot could be downloaded does the refresh fail.

use std::sync::Arc;

use async_trait::async_trait;
use boston_crime_loader::{LoadOptions, load};
use boston_crime_source::progress::{ProgressCallback, null_progress};
use boston_crime_source::{HistoricalRange, IncidentSource};
use chrono::Utc;

use crate::{Dataset, DatasetError, Notice};

/// Produces a fresh [`Dataset`].
#[async_trait]
pub trait DatasetRefresher: Send + Sync {
    /// Identifier of the underlying source, used in cache keys.
    fn source_id(&self) -> &str;

    /// Fetches and loads the data.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if no historical data could be fetched or
    /// loading fails.
    async fn refresh(&self) -> Result<Dataset, DatasetError>;
}

/// Refreshes from an [`IncidentSource`].
pub struct SourceRefresher<S> {
    source: S,
    range: HistoricalRange,
    options: LoadOptions,
    include_live: bool,
    progress: Arc<dyn ProgressCallback>,
}

impl<S: IncidentSource> SourceRefresher<S> {
    /// Creates a refresher covering every snapshot plus the live API, with
    /// load options taken from the source definition.
    #[must_use]
    pub fn new(source: S) -> Self {
        let options = LoadOptions::for_source(source.definition());
        Self {
            source,
            range: HistoricalRange::all(),
            options,
            include_live: true,
            progress: null_progress(),
        }
    }

    /// Restricts the snapshots fetched to `range`.
    #[must_use]
    pub const fn with_range(mut self, range: HistoricalRange) -> Self {
        self.range = range;
        self
    }

    /// Overrides the load options.
    #[must_use]
    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Enables or disables the live API fetch.
    #[must_use]
    pub const fn with_live(mut self, include_live: bool) -> Self {
        self.include_live = include_live;
        self
    }

    /// Reports per-file download progress to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }
}

#[async_trait]
impl<S: IncidentSource> DatasetRefresher for SourceRefresher<S> {
    fn source_id(&self) -> &str {
        &self.source.definition().id
    }

    async fn refresh(&self) -> Result<Dataset, DatasetError> {
        let definition = self.source.definition();
        let files = definition.historical.files_in(self.range);
        let mut notices = Vec::new();
        let mut historical = Vec::with_capacity(files.len());

        self.progress.set_total(files.len() as u64);
        for file in &files {
            self.progress.set_message(format!("Downloading {}", file.name));
            match self.source.fetch_historical_file(file).await {
                Ok(table) => historical.push(table),
                Err(e) => {
                    log::warn!("Could not load {}: {e}", file.name);
                    notices.push(Notice::warning(format!("Could not load {}: {e}", file.name)));
                }
            }
            self.progress.inc(1);
        }
        self.progress.finish(format!(
            "Downloaded {}/{} historical files",
            historical.len(),
            files.len()
        ));

        if historical.is_empty() {
            return Err(DatasetError::NoData {
                attempted: files.len(),
                failed: files.len(),
            });
        }

        let mut live = Vec::new();
        if self.include_live {
            match self.source.fetch_live().await {
                Ok(table) => live.push(table),
                Err(e) => {
                    log::warn!("Could not fetch live data: {e}");
                    notices.push(Notice::warning(format!("Could not fetch live data: {e}")));
                }
            }
        }

        let loaded = load(&historical, &live, &self.options)?;
        if loaded.stats.live_records_added > 0 {
            notices.push(Notice::info(format!(
                "Added {} new records from {}",
                loaded.stats.live_records_added, definition.live.label
            )));
        }

        Ok(Dataset {
            table: loaded.table,
            stats: loaded.stats,
            notices,
            refreshed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use boston_crime_source::source_def::{HistoricalFile, SourceDefinition};
    use boston_crime_source::{FetchError, RawTable, registry};

    use super::*;
    use crate::NoticeLevel;

    const HEADER: &[&str] = &[
        "INCIDENT_NUMBER",
        "OFFENSE_DESCRIPTION",
        "DISTRICT",
        "OCCURRED_ON_DATE",
    ];

    fn raw(source: &str, rows: &[[&str; 4]]) -> RawTable {
        let mut table = RawTable::new(source, HEADER.iter().map(|s| (*s).to_string()).collect());
        for row in rows {
            table.push_row(row.iter().map(|s| (*s).to_string()).collect());
        }
        table
    }

    /// Serves canned tables; files named in `failing` return a 404.
    struct FakeSource {
        definition: SourceDefinition,
        failing: Vec<&'static str>,
        live_fails: bool,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                definition: registry::find_source(registry::DEFAULT_SOURCE_ID).unwrap(),
                failing: Vec::new(),
                live_fails: false,
            }
        }
    }

    #[async_trait]
    impl IncidentSource for FakeSource {
        fn definition(&self) -> &SourceDefinition {
            &self.definition
        }

        async fn fetch_historical_file(
            &self,
            file: &HistoricalFile,
        ) -> Result<RawTable, FetchError> {
            if self.failing.contains(&file.name.as_str()) {
                return Err(FetchError::Status {
                    source_name: file.name.clone(),
                    status: 404,
                });
            }
            let date = format!("{}-06-01 12:00:00+00", file.first_year);
            let number = format!("I{}", file.first_year);
            Ok(raw(&file.name, &[[number.as_str(), "LARCENY", "A1", date.as_str()]]))
        }

        async fn fetch_live(&self) -> Result<RawTable, FetchError> {
            if self.live_fails {
                return Err(FetchError::Status {
                    source_name: self.definition.live.label.clone(),
                    status: 503,
                });
            }
            Ok(raw(
                &self.definition.live.label,
                &[
                    ["I2023", "LARCENY", "A1", "2023-06-01T12:00:00"],
                    ["I2024X", "ASSAULT", "B2", "2024-02-01T08:00:00"],
                ],
            ))
        }
    }

    #[tokio::test]
    async fn refresh_merges_historical_and_live() {
        let refresher = SourceRefresher::new(FakeSource::new());
        let dataset = refresher.refresh().await.unwrap();

        // One record per snapshot (2015..=2023) plus one new live record.
        assert_eq!(dataset.table.len(), 10);
        assert_eq!(dataset.stats.duplicates_removed, 1);
        assert_eq!(dataset.stats.live_records_added, 1);
        assert_eq!(dataset.notices.len(), 1);
        assert_eq!(dataset.notices[0].level, NoticeLevel::Info);
        assert_eq!(refresher.source_id(), "boston_pd");
    }

    #[tokio::test]
    async fn failing_file_and_live_become_warnings() {
        let mut source = FakeSource::new();
        source.failing = vec!["2016.csv"];
        source.live_fails = true;
        let dataset = SourceRefresher::new(source).refresh().await.unwrap();

        assert_eq!(dataset.table.len(), 8);
        let warnings: Vec<&str> = dataset
            .notices
            .iter()
            .filter(|n| n.level == NoticeLevel::Warning)
            .map(|n| n.message.as_str())
            .collect();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("2016.csv"));
        assert!(warnings[1].contains("HTTP 503"));
    }

    #[tokio::test]
    async fn no_historical_data_is_an_error() {
        let mut source = FakeSource::new();
        source.failing = vec!["2019.csv"];
        let refresher = SourceRefresher::new(source).with_range(HistoricalRange::new(2019, 2019));
        match refresher.refresh().await {
            Err(DatasetError::NoData { attempted, failed }) => {
                assert_eq!((attempted, failed), (1, 1));
            }
            other => panic!("expected NoData, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn range_and_live_toggle_limit_fetches() {
        let refresher = SourceRefresher::new(FakeSource::new())
            .with_range(HistoricalRange::new(2020, 2021))
            .with_live(false);
        let dataset = refresher.refresh().await.unwrap();
        assert_eq!(dataset.table.years().into_iter().collect::<Vec<_>>(), vec![2020, 2021]);
        assert!(dataset.notices.is_empty());
    }
}
