//! Obtaining the unified table from the network or a local CSV.

use std::path::Path;

use boston_crime_cli_utils::{IndicatifProgress, MultiProgress};
use boston_crime_dataset::{DatasetRefresher as _, NoticeLevel, SourceRefresher};
use boston_crime_incident_models::IncidentTable;
use boston_crime_loader::{LoadOptions, Loaded, load};
use boston_crime_source::csv_download::parse_csv;
use boston_crime_source::source_def::{SourceDefinition, load_source_file};
use boston_crime_source::{HistoricalRange, HttpSource, IncidentSource as _, registry};

/// The source definition read from `source_file`, or the built-in Boston
/// definition.
fn source_definition(
    source_file: Option<&Path>,
) -> Result<SourceDefinition, Box<dyn std::error::Error>> {
    if let Some(path) = source_file {
        let definition = load_source_file(path)?;
        log::info!("Using source {} from {}", definition.id, path.display());
        return Ok(definition);
    }
    registry::find_source(registry::DEFAULT_SOURCE_ID)
        .ok_or_else(|| format!("Unknown source: {}", registry::DEFAULT_SOURCE_ID).into())
}

/// Downloads the snapshots in `range` and, optionally, the live API, then
/// loads them. Any failing snapshot aborts; a failing live fetch is logged
/// and skipped.
pub async fn fetch_strict(
    source_file: Option<&Path>,
    range: HistoricalRange,
    include_live: bool,
    multi: &MultiProgress,
) -> Result<Loaded, Box<dyn std::error::Error>> {
    let definition = source_definition(source_file)?;
    let options = LoadOptions::for_source(&definition);
    let source = HttpSource::new(definition)?;

    let progress = IndicatifProgress::download_bar(multi, "Downloading historical files");
    let historical = source.fetch_historical(range, &progress).await?;

    let mut live = Vec::new();
    if include_live {
        log::info!("Fetching {}...", source.definition().live.label);
        match source.fetch_live().await {
            Ok(table) => live.push(table),
            Err(e) => log::warn!("Could not fetch live data: {e}"),
        }
    }

    Ok(load(&historical, &live, &options)?)
}

/// Returns the unified table, read from `input` when given or downloaded
/// otherwise. Download problems that still leave usable data are logged.
pub async fn unified_table(
    source_file: Option<&Path>,
    input: Option<&Path>,
    include_live: bool,
    multi: &MultiProgress,
) -> Result<IncidentTable, Box<dyn std::error::Error>> {
    let definition = source_definition(source_file)?;

    if let Some(path) = input {
        let name = path.display().to_string();
        let gzipped = path.extension().is_some_and(|ext| ext == "gz");
        let raw = parse_csv(&name, &std::fs::read(path)?, gzipped)?;
        let loaded = load(&[raw], &[], &LoadOptions::for_source(&definition))?;
        log::info!("Read {} records from {name}", loaded.table.len());
        return Ok(loaded.table);
    }

    let progress = IndicatifProgress::download_bar(multi, "Downloading historical files");
    let dataset = SourceRefresher::new(HttpSource::new(definition)?)
        .with_live(include_live)
        .with_progress(progress)
        .refresh()
        .await?;
    for notice in &dataset.notices {
        match notice.level {
            NoticeLevel::Info => log::info!("{}", notice.message),
            NoticeLevel::Warning => log::warn!("{}", notice.message),
        }
    }
    Ok(dataset.table)
}
