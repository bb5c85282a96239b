#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the crime dashboard server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the incident and analytics types to allow independent evolution of
//! the API contract.

use boston_crime_analytics_models::{FilterSelection, KeyMetrics, MapPoint, MapSample};
use boston_crime_incident_models::{DayOfWeek, IncidentRecord, TIMESTAMP_FORMAT};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Widget state shared by the dashboard, incidents, and export endpoints.
///
/// Each field is a comma-separated list. Absent or empty lists mean "no
/// restriction".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQueryParams {
    /// Years, e.g. `2021,2022`.
    pub years: Option<String>,
    /// Offense descriptions.
    pub offenses: Option<String>,
    /// District codes.
    pub districts: Option<String>,
}

impl From<&DashboardQueryParams> for FilterSelection {
    fn from(params: &DashboardQueryParams) -> Self {
        Self::from_lists(
            params.years.as_deref(),
            params.offenses.as_deref(),
            params.districts.as_deref(),
        )
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Values available to the filter widgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOptions {
    /// Years present in the data, newest first.
    pub years: Vec<i32>,
    /// Offense descriptions, alphabetical.
    pub offenses: Vec<String>,
    /// District codes, alphabetical.
    pub districts: Vec<String>,
}

/// Headline numbers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMetrics {
    /// Records matching the selection.
    pub total_records: u64,
    /// Matching records in the current calendar month.
    pub incidents_this_month: u64,
    /// Matching shootings.
    pub shooting_incidents: u64,
    /// Distinct districts among matching records.
    pub unique_districts: u64,
}

impl From<KeyMetrics> for ApiMetrics {
    fn from(metrics: KeyMetrics) -> Self {
        Self {
            total_records: metrics.total_records,
            incidents_this_month: metrics.incidents_this_month,
            shooting_incidents: metrics.shooting_incidents,
            unique_districts: metrics.unique_districts,
        }
    }
}

/// Severity of an [`ApiNotice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiNoticeLevel {
    /// Informational.
    Info,
    /// Partial failure while loading data.
    Warning,
}

/// A message to show above the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiNotice {
    /// Severity.
    pub level: ApiNoticeLevel,
    /// Message text.
    pub message: String,
}

/// A chart as a Vega-Lite specification with inline data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiChart {
    /// Stable identifier used by the frontend to place the chart.
    pub id: String,
    /// Chart title.
    pub title: String,
    /// Vega-Lite specification.
    pub spec: serde_json::Value,
}

/// A point on the incident map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMapPoint {
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// District code.
    pub district: Option<String>,
    /// Offense description.
    pub offense_description: String,
    /// Day of week.
    pub day_of_week: DayOfWeek,
    /// Hour of day.
    pub hour: u32,
}

impl From<MapPoint> for ApiMapPoint {
    fn from(point: MapPoint) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
            district: point.district,
            offense_description: point.offense_description,
            day_of_week: point.day_of_week,
            hour: point.hour,
        }
    }
}

/// Map panel payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMap {
    /// Plotted points.
    pub points: Vec<ApiMapPoint>,
    /// Records with coordinates before sampling.
    pub total_with_coordinates: usize,
    /// Whether `points` is a sample.
    pub sampled: bool,
}

impl From<MapSample> for ApiMap {
    fn from(sample: MapSample) -> Self {
        let sampled = sample.is_sampled();
        Self {
            points: sample.points.into_iter().map(ApiMapPoint::from).collect(),
            total_with_coordinates: sample.total_with_coordinates,
            sampled,
        }
    }
}

/// Everything the dashboard page renders for one selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDashboard {
    /// Headline numbers.
    pub metrics: ApiMetrics,
    /// Messages produced while loading the data.
    pub notices: Vec<ApiNotice>,
    /// Charts in display order.
    pub charts: Vec<ApiChart>,
    /// Map panel.
    pub map: ApiMap,
    /// When the underlying data was fetched.
    pub refreshed_at: DateTime<Utc>,
}

/// An incident as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiIncident {
    /// Incident number.
    pub incident_number: String,
    /// Offense code.
    pub offense_code: Option<String>,
    /// Offense description.
    pub offense_description: String,
    /// District code.
    pub district: Option<String>,
    /// Street.
    pub street: Option<String>,
    /// Whether a shooting was involved.
    pub shooting: bool,
    /// Occurrence time, `YYYY-MM-DD HH:MM:SS`.
    pub occurred_on_date: String,
    /// Day of week.
    pub day_of_week: DayOfWeek,
    /// Hour of day.
    pub hour: u32,
    /// Latitude.
    pub latitude: Option<f64>,
    /// Longitude.
    pub longitude: Option<f64>,
}

impl From<&IncidentRecord> for ApiIncident {
    fn from(record: &IncidentRecord) -> Self {
        Self {
            incident_number: record.incident_number.clone(),
            offense_code: record.offense_code.clone(),
            offense_description: record.offense_description.clone(),
            district: record.district.clone(),
            street: record.street.clone(),
            shooting: record.shooting,
            occurred_on_date: record
                .occurred_on_date
                .format(TIMESTAMP_FORMAT)
                .to_string(),
            day_of_week: record.day_of_week,
            hour: record.hour,
            latitude: record.coordinates.map(|c| c.latitude),
            longitude: record.coordinates.map(|c| c.longitude),
        }
    }
}

/// First rows of the filtered table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiIncidents {
    /// Records matching the selection.
    pub total: usize,
    /// Up to the configured number of rows, in table order.
    pub incidents: Vec<ApiIncident>,
}
