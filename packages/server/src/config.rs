//! Runtime settings read from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use boston_crime_analytics::DashboardConfig;

use crate::export::DEFAULT_EXPORT_ROW_CAP;

/// Default data refresh interval.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Offense types offered in the filter widget.
pub const DEFAULT_OFFENSE_OPTION_LIMIT: usize = 40;

/// Rows returned by the incident table endpoint.
pub const DEFAULT_INCIDENT_TABLE_ROWS: usize = 500;

/// Server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind (`BIND_ADDR`).
    pub bind_addr: String,
    /// Port to bind (`PORT`).
    pub port: u16,
    /// Directory holding the dashboard page (`STATIC_DIR`).
    pub static_dir: PathBuf,
    /// How long loaded data is reused (`BOSTON_CRIME_CACHE_TTL_SECS`).
    pub cache_ttl: Duration,
    /// Maximum rows per CSV export (`BOSTON_CRIME_EXPORT_ROW_CAP`).
    pub export_row_cap: usize,
    /// Offense types offered in the filter widget.
    pub offense_option_limit: usize,
    /// Rows returned by `/api/incidents`.
    pub incident_table_rows: usize,
    /// Dashboard panel sizes.
    pub dashboard: DashboardConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            static_dir: PathBuf::from("app/dist"),
            cache_ttl: DEFAULT_CACHE_TTL,
            export_row_cap: DEFAULT_EXPORT_ROW_CAP,
            offense_option_limit: DEFAULT_OFFENSE_OPTION_LIMIT,
            incident_table_rows: DEFAULT_INCIDENT_TABLE_ROWS,
            dashboard: DashboardConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads settings from the process environment, falling back to the
    /// defaults for unset or unparsable values.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |name: &str| lookup(name).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            static_dir: lookup("STATIC_DIR").map_or(defaults.static_dir, PathBuf::from),
            cache_ttl: parsed("BOSTON_CRIME_CACHE_TTL_SECS")
                .map_or(defaults.cache_ttl, Duration::from_secs),
            export_row_cap: parsed("BOSTON_CRIME_EXPORT_ROW_CAP")
                .and_then(|v| usize::try_from(v).ok())
                .unwrap_or(defaults.export_row_cap),
            offense_option_limit: defaults.offense_option_limit,
            incident_table_rows: defaults.incident_table_rows,
            dashboard: defaults.dashboard,
        }
    }
}
