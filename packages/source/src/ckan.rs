//! CKAN Datastore API fetcher.
//!
//! Handles paginated fetching from CKAN `datastore_search` endpoints.
//! Each page is requested once; any failure aborts the whole fetch.

use serde_json::Value;

use crate::source_def::LiveConfig;
use crate::{FetchError, RawTable};

/// One decoded `datastore_search` response page.
#[derive(Debug, Clone, PartialEq)]
pub struct CkanPage {
    /// Field IDs in the order CKAN reports them.
    pub fields: Vec<String>,
    /// Records on this page.
    pub records: Vec<serde_json::Map<String, Value>>,
}

/// Decodes a `datastore_search` response body.
///
/// # Errors
///
/// Returns [`FetchError::Malformed`] if the body is not a successful CKAN
/// response or a record is not a JSON object.
pub fn parse_ckan_page(source_name: &str, body: &Value) -> Result<CkanPage, FetchError> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = body
            .get("error")
            .map_or_else(|| "request unsuccessful".to_string(), Value::to_string);
        return Err(FetchError::malformed(source_name, message));
    }

    let result = body
        .get("result")
        .ok_or_else(|| FetchError::malformed(source_name, "missing `result` object"))?;

    let records = result
        .get("records")
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::malformed(source_name, "missing `result.records` array"))?
        .iter()
        .map(|record| {
            record
                .as_object()
                .cloned()
                .ok_or_else(|| FetchError::malformed(source_name, "record is not an object"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let fields = result
        .get("fields")
        .and_then(Value::as_array)
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| f.get("id").and_then(Value::as_str).map(str::to_string))
                .collect::<Vec<_>>()
        })
        .filter(|fields| !fields.is_empty())
        .unwrap_or_else(|| {
            records
                .first()
                .map(|r| r.keys().cloned().collect())
                .unwrap_or_default()
        });

    Ok(CkanPage { fields, records })
}

/// Renders a JSON scalar the way it would appear in a CSV cell.
fn stringify(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Appends the records of `page` to `table`, aligned with its columns.
fn append_page(table: &mut RawTable, page: CkanPage) {
    if table.columns.is_empty() {
        table.columns = page.fields;
    }
    for record in page.records {
        let row = table
            .columns
            .iter()
            .map(|column| stringify(record.get(column)))
            .collect();
        table.push_row(row);
    }
}

/// Fetches records from a CKAN Datastore endpoint with pagination.
///
/// # Errors
///
/// Returns [`FetchError`] if a request fails, the server returns a
/// non-success status, or a page cannot be decoded.
pub async fn fetch_ckan(
    client: &reqwest::Client,
    config: &LiveConfig,
) -> Result<RawTable, FetchError> {
    let label = config.label.as_str();
    let mut table = RawTable::new(label, Vec::new());
    let mut offset: u64 = 0;
    let fetch_limit = config.limit.unwrap_or(u64::MAX);

    loop {
        let remaining = fetch_limit.saturating_sub(offset);
        if remaining == 0 {
            break;
        }
        let page_limit = remaining.min(config.page_size);

        log::info!("Fetching {label} data: offset={offset}, limit={page_limit}");

        let response = client
            .get(&config.api_url)
            .query(&[
                ("resource_id", config.resource_id.as_str()),
                ("limit", &page_limit.to_string()),
                ("offset", &offset.to_string()),
            ])
            .send()
            .await
            .map_err(|error| FetchError::Http {
                source_name: label.to_string(),
                error,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                source_name: label.to_string(),
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::malformed(label, e.to_string()))?;
        let page = parse_ckan_page(label, &body)?;

        let count = page.records.len() as u64;
        append_page(&mut table, page);
        offset += count;

        if count < page_limit {
            break;
        }
    }

    log::info!("Downloaded {} {label} records total", table.len());
    Ok(table)
}
