#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the Boston crime dashboard.
//!
//! Serves the REST API that backs the dashboard page (filter options,
//! metrics and Vega-Lite charts, the raw incident table, and CSV export)
//! plus the static page itself. Crime data is loaded lazily through a
//! [`TableCache`] and reused until the refresh interval elapses.

pub mod charts;
pub mod config;
pub mod export;
mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use boston_crime_dataset::{CacheKey, SourceRefresher, TableCache, TtlCache};
use boston_crime_source::{FetchError, HttpSource, registry};

pub use config::ServerConfig;
pub use handlers::{EXPORT_TOTAL_ROWS_HEADER, EXPORT_TRUNCATED_HEADER};

/// Errors that can occur while starting the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// No source definition has the requested id.
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    /// The HTTP fetcher could not be built.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Binding or running the HTTP server failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared application state.
pub struct AppState {
    /// Source of the unified table.
    pub cache: Arc<dyn TableCache>,
    /// Key every request reads the cache with.
    pub cache_key: CacheKey,
    /// Runtime settings.
    pub config: ServerConfig,
}

/// Builds a TTL cache that fetches from the configured source `source_id`
/// over HTTP.
///
/// # Errors
///
/// Returns [`ServerError`] if the source is unknown or its HTTP client
/// cannot be built.
pub fn source_cache(
    source_id: &str,
) -> Result<TtlCache<SourceRefresher<HttpSource>>, ServerError> {
    let definition = registry::find_source(source_id)
        .ok_or_else(|| ServerError::UnknownSource(source_id.to_string()))?;
    Ok(TtlCache::new(SourceRefresher::new(HttpSource::new(
        definition,
    )?)))
}

/// Registers the `/api` routes.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/options", web::get().to(handlers::options))
            .route("/dashboard", web::get().to(handlers::dashboard))
            .route("/incidents", web::get().to(handlers::incidents))
            .route("/export", web::get().to(handlers::export)),
    );
}

/// Serves the dashboard page and its assets from `dir`.
#[must_use]
pub fn static_files(dir: impl Into<std::path::PathBuf>) -> Files {
    Files::new("/", dir).index_file("index.html")
}

/// Starts the crime dashboard API server.
///
/// Data for the default source is fetched on the first request and cached
/// for `config.cache_ttl`. This is a regular async function; the caller is
/// responsible for providing the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if the source cannot be set up, or if the HTTP
/// server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let cache = source_cache(registry::DEFAULT_SOURCE_ID)?;
    let cache_key = cache.key(config.cache_ttl);

    let bind_addr = config.bind_addr.clone();
    let port = config.port;
    let static_dir = config.static_dir.clone();

    let state = web::Data::new(AppState {
        cache: Arc::new(cache),
        cache_key,
        config,
    });

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_api)
            .service(static_files(static_dir.clone()))
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;
    use async_trait::async_trait;
    use boston_crime_dataset::{Dataset, DatasetError, Notice};
    use boston_crime_incident_models::{Coordinates, IncidentRecord, IncidentTable};
    use boston_crime_source::FetchError;
    use chrono::{TimeZone as _, Utc};
    use serde_json::Value;

    use super::*;

    /// Always returns the same dataset, or fails when it has none.
    struct FixedCache(Option<Arc<Dataset>>);

    #[async_trait]
    impl TableCache for FixedCache {
        async fn get_or_refresh(&self, _key: &CacheKey) -> Result<Arc<Dataset>, DatasetError> {
            self.0.clone().ok_or_else(|| {
                DatasetError::Fetch(FetchError::Status {
                    source_name: "2015.csv".to_string(),
                    status: 502,
                })
            })
        }
    }

    fn record(
        number: &str,
        year: i32,
        offense: &str,
        district: &str,
        coordinates: Option<(f64, f64)>,
    ) -> IncidentRecord {
        let mut record = IncidentRecord::new(
            number.to_string(),
            offense.to_string(),
            Some(district.to_string()),
            Utc.with_ymd_and_hms(year, 6, 1, 12, 0, 0).unwrap(),
        );
        record.coordinates = coordinates.map(|(latitude, longitude)| Coordinates {
            latitude,
            longitude,
        });
        record
    }

    fn dataset() -> Dataset {
        let mut dataset = Dataset::from_table(IncidentTable::from_records(vec![
            record("I1", 2020, "Larceny", "A1", Some((42.35, -71.06))),
            record("I2", 2021, "Larceny", "B2", Some((42.31, -71.08))),
            record("I3", 2021, "Assault", "A1", None),
        ]));
        dataset.notices.push(Notice::warning("Could not load 2016.csv"));
        dataset
    }

    fn state(cache: FixedCache, config: ServerConfig) -> web::Data<AppState> {
        web::Data::new(AppState {
            cache: Arc::new(cache),
            cache_key: CacheKey::new("boston_pd", config.cache_ttl),
            config,
        })
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(App::new().app_data($state).configure(configure_api)).await
        };
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = app!(state(FixedCache(None), ServerConfig::default()));
        let body: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/health").to_request())
                .await;
        assert_eq!(body["healthy"], true);
    }

    #[actix_web::test]
    async fn options_lists_years_newest_first() {
        let app = app!(state(FixedCache(Some(Arc::new(dataset()))), ServerConfig::default()));
        let body: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/options").to_request())
                .await;
        assert_eq!(body["years"], serde_json::json!([2021, 2020]));
        assert_eq!(body["offenses"], serde_json::json!(["Assault", "Larceny"]));
        assert_eq!(body["districts"], serde_json::json!(["A1", "B2"]));
    }

    #[actix_web::test]
    async fn offense_options_are_limited() {
        let config = ServerConfig {
            offense_option_limit: 1,
            ..ServerConfig::default()
        };
        let app = app!(state(FixedCache(Some(Arc::new(dataset()))), config));
        let body: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/options").to_request())
                .await;
        assert_eq!(body["offenses"], serde_json::json!(["Assault"]));
    }

    #[actix_web::test]
    async fn dashboard_applies_selection() {
        let app = app!(state(FixedCache(Some(Arc::new(dataset()))), ServerConfig::default()));
        let request = test::TestRequest::get()
            .uri("/api/dashboard?years=2021&districts=A1")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;

        assert_eq!(body["metrics"]["totalRecords"], 1);
        assert_eq!(body["charts"].as_array().unwrap().len(), 6);
        // The map ignores the district filter: only I2 (2021, B2) has
        // coordinates.
        assert_eq!(body["map"]["points"].as_array().unwrap().len(), 1);
        assert_eq!(body["notices"][0]["level"], "warning");
    }

    #[actix_web::test]
    async fn incidents_returns_filtered_rows() {
        let app = app!(state(FixedCache(Some(Arc::new(dataset()))), ServerConfig::default()));
        let request = test::TestRequest::get()
            .uri("/api/incidents?offenses=Larceny")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;

        assert_eq!(body["total"], 2);
        assert_eq!(body["incidents"][0]["incidentNumber"], "I1");
        assert_eq!(body["incidents"][1]["incidentNumber"], "I2");
    }

    #[actix_web::test]
    async fn incident_rows_are_limited() {
        let config = ServerConfig {
            incident_table_rows: 1,
            ..ServerConfig::default()
        };
        let app = app!(state(FixedCache(Some(Arc::new(dataset()))), config));
        let request = test::TestRequest::get().uri("/api/incidents").to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;

        assert_eq!(body["total"], 3);
        assert_eq!(body["incidents"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn export_sets_headers_and_truncates() {
        let config = ServerConfig {
            export_row_cap: 1,
            ..ServerConfig::default()
        };
        let app = app!(state(FixedCache(Some(Arc::new(dataset()))), config));
        let request = test::TestRequest::get()
            .uri("/api/export?years=2021")
            .to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers.get(EXPORT_TRUNCATED_HEADER).unwrap(), "true");
        assert_eq!(headers.get(EXPORT_TOTAL_ROWS_HEADER).unwrap(), "2");
        assert_eq!(
            headers.get("content-disposition").unwrap(),
            "attachment; filename=\"boston_crime_2021_all_all.csv\""
        );

        let body = test::read_body(response).await;
        let text = std::str::from_utf8(&body).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().nth(1).unwrap().starts_with("I2,"));
    }

    #[actix_web::test]
    async fn serves_dashboard_page() {
        let page_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../../app/dist");
        let app = test::init_service(App::new().service(static_files(page_dir))).await;
        let response =
            test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = test::read_body(response).await;
        let html = std::str::from_utf8(&body).unwrap();
        assert!(html.contains("vega-embed"));
        assert!(html.contains("/api/export"));
    }

    #[actix_web::test]
    async fn data_failure_is_service_unavailable() {
        let app = app!(state(FixedCache(None), ServerConfig::default()));
        let response =
            test::call_service(&app, test::TestRequest::get().uri("/api/dashboard").to_request())
                .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = test::read_body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("HTTP 502"));
    }
}
