//! Historical CSV snapshot fetcher.
//!
//! Downloads a CSV file (optionally gzip-compressed) from object storage
//! and parses it into a [`RawTable`] keyed by the header row.

use std::io::Read as _;

use crate::source_def::{HistoricalConfig, HistoricalFile};
use crate::{FetchError, RawTable};

/// Parses CSV bytes into a [`RawTable`].
///
/// Headers and values are trimmed. Rows shorter than the header row are
/// padded with empty strings.
///
/// # Errors
///
/// Returns [`FetchError::Malformed`] if decompression fails, the file has
/// no header row, or a record cannot be read.
pub fn parse_csv(source_name: &str, bytes: &[u8], gzipped: bool) -> Result<RawTable, FetchError> {
    let csv_bytes: Vec<u8> = if gzipped {
        let mut decoder = flate2::read::GzDecoder::new(bytes);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| FetchError::malformed(source_name, format!("gzip: {e}")))?;
        log::debug!("Decompressed {source_name} to {} bytes", decompressed.len());
        decompressed
    } else {
        bytes.to_vec()
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(csv_bytes.as_slice());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| FetchError::malformed(source_name, e.to_string()))?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_owned())
        .collect();

    if columns.iter().all(String::is_empty) {
        return Err(FetchError::malformed(
            source_name,
            "CSV file contains no header row",
        ));
    }

    let mut table = RawTable::new(source_name, columns);
    for result in reader.records() {
        let record = result.map_err(|e| FetchError::malformed(source_name, e.to_string()))?;
        table.push_row(record.iter().map(|v| v.trim().to_owned()).collect());
    }

    log::info!("Parsed {} records from {source_name}", table.len());
    Ok(table)
}

/// Downloads and parses a single historical snapshot.
///
/// # Errors
///
/// Returns [`FetchError`] if the request fails, the server returns a
/// non-success status, or the CSV cannot be parsed.
pub async fn fetch_csv(
    client: &reqwest::Client,
    config: &HistoricalConfig,
    file: &HistoricalFile,
) -> Result<RawTable, FetchError> {
    let url = config.url_for(file);
    let source_name = file.name.as_str();
    log::info!("Downloading {source_name} from {url}");

    let http_error = |error| FetchError::Http {
        source_name: source_name.to_string(),
        error,
    };

    let response = client.get(&url).send().await.map_err(http_error)?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            source_name: source_name.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().await.map_err(http_error)?;
    log::debug!("Downloaded {} bytes from {url}", bytes.len());

    parse_csv(source_name, &bytes, config.is_gzipped())
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    const SAMPLE: &str = "\u{feff}INCIDENT_NUMBER, OFFENSE_DESCRIPTION ,DISTRICT,Lat,Long\n\
        I192000001,LARCENY ALL OTHERS,B2,42.33,-71.08\n\
        I192000002,VANDALISM,,0,0\n\
        I192000003,ASSAULT - SIMPLE\n";

    #[test]
    fn parses_header_and_trims() {
        let table = parse_csv("2019.csv", SAMPLE.as_bytes(), false).unwrap();
        assert_eq!(
            table.columns,
            vec!["INCIDENT_NUMBER", "OFFENSE_DESCRIPTION", "DISTRICT", "Lat", "Long"]
        );
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[1][2], "");
        assert_eq!(table.rows[2], vec!["I192000003", "ASSAULT - SIMPLE", "", "", ""]);
    }

    #[test]
    fn decompresses_gzip() {
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let table = parse_csv("2019.csv.gz", &compressed, true).unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn invalid_gzip_is_malformed() {
        let err = parse_csv("2019.csv.gz", b"not gzip", true).unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
        assert_eq!(err.source_name(), "2019.csv.gz");
    }

    #[test]
    fn empty_file_is_malformed() {
        assert!(parse_csv("empty.csv", b"", false).is_err());
    }
}
