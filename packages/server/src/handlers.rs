//! HTTP handler functions for the crime dashboard API.

use std::sync::Arc;

use actix_web::http::header;
use actix_web::{HttpResponse, web};
use boston_crime_analytics::{build_dashboard, filter};
use boston_crime_analytics_models::{FilterSelection, MapSample};
use boston_crime_dataset::{Dataset, Notice, NoticeLevel};
use boston_crime_server_models::{
    ApiDashboard, ApiHealth, ApiIncident, ApiIncidents, ApiNotice, ApiNoticeLevel, ApiOptions,
    DashboardQueryParams,
};
use chrono::Local;

use crate::AppState;
use crate::charts::dashboard_charts;
use crate::export::{export_file_name, write_csv};

/// Response header set to `true` when an export was cut off at the cap.
pub const EXPORT_TRUNCATED_HEADER: &str = "X-Export-Truncated";

/// Response header carrying the number of rows that matched the export.
pub const EXPORT_TOTAL_ROWS_HEADER: &str = "X-Export-Total-Rows";

/// Loads the current dataset, or builds the 503 response to return.
async fn current_dataset(state: &AppState) -> Result<Arc<Dataset>, HttpResponse> {
    match state.cache.get_or_refresh(&state.cache_key).await {
        Ok(dataset) => Ok(dataset),
        Err(e) => {
            log::error!("Failed to load crime data: {e}");
            Err(HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "error": format!("Failed to load crime data: {e}")
            })))
        }
    }
}

fn api_notice(notice: &Notice) -> ApiNotice {
    ApiNotice {
        level: match notice.level {
            NoticeLevel::Info => ApiNoticeLevel::Info,
            NoticeLevel::Warning => ApiNoticeLevel::Warning,
        },
        message: notice.message.clone(),
    }
}

fn map_notice(map: &MapSample) -> Option<ApiNotice> {
    if map.total_with_coordinates == 0 {
        Some(ApiNotice {
            level: ApiNoticeLevel::Warning,
            message: "No map data available for the selected filters.".to_string(),
        })
    } else if map.is_sampled() {
        Some(ApiNotice {
            level: ApiNoticeLevel::Info,
            message: format!(
                "Showing a sample of {} of {} points for performance.",
                map.points.len(),
                map.total_with_coordinates
            ),
        })
    } else {
        None
    }
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/options`
///
/// Returns the values offered by the year, offense, and district widgets.
pub async fn options(state: web::Data<AppState>) -> HttpResponse {
    let dataset = match current_dataset(&state).await {
        Ok(dataset) => dataset,
        Err(response) => return response,
    };

    HttpResponse::Ok().json(ApiOptions {
        years: dataset.table.years().into_iter().rev().collect(),
        offenses: dataset
            .table
            .offense_descriptions()
            .into_iter()
            .take(state.config.offense_option_limit)
            .collect(),
        districts: dataset.table.districts().into_iter().collect(),
    })
}

/// `GET /api/dashboard`
///
/// Computes metrics, charts, and map points for the selection.
pub async fn dashboard(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    let dataset = match current_dataset(&state).await {
        Ok(dataset) => dataset,
        Err(response) => return response,
    };

    let selection = FilterSelection::from(&*params);
    let config = state.config.dashboard;
    let shared = Arc::clone(&dataset);

    let built = web::block(move || {
        let today = Local::now().date_naive();
        let dashboard = build_dashboard(&shared.table, &selection, today, &config);
        let charts = dashboard_charts(&dashboard);
        (dashboard, charts)
    })
    .await;

    let (dashboard, charts) = match built {
        Ok(built) => built,
        Err(e) => {
            log::error!("Dashboard task failed: {e}");
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to build dashboard"
            }));
        }
    };

    let mut notices: Vec<ApiNotice> = dataset.notices.iter().map(api_notice).collect();
    notices.extend(map_notice(&dashboard.map));

    HttpResponse::Ok().json(ApiDashboard {
        metrics: dashboard.metrics.into(),
        notices,
        charts,
        map: dashboard.map.into(),
        refreshed_at: dataset.refreshed_at,
    })
}

/// `GET /api/incidents`
///
/// Returns the first rows of the filtered table.
pub async fn incidents(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    let dataset = match current_dataset(&state).await {
        Ok(dataset) => dataset,
        Err(response) => return response,
    };

    let filtered = filter(&dataset.table, &FilterSelection::from(&*params));
    HttpResponse::Ok().json(ApiIncidents {
        total: filtered.len(),
        incidents: filtered
            .iter()
            .take(state.config.incident_table_rows)
            .map(ApiIncident::from)
            .collect(),
    })
}

/// `GET /api/export`
///
/// Streams the filtered table as a CSV attachment, capped at the configured
/// row limit.
pub async fn export(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    let dataset = match current_dataset(&state).await {
        Ok(dataset) => dataset,
        Err(response) => return response,
    };

    let selection = FilterSelection::from(&*params);
    let file_name = export_file_name(&selection);
    let cap = state.config.export_row_cap;

    let written = web::block(move || {
        let filtered = filter(&dataset.table, &selection);
        let mut body = Vec::new();
        write_csv(&filtered, cap, &mut body).map(|export| (export, body))
    })
    .await;

    match written {
        Ok(Ok((export, body))) => {
            log::info!(
                "Exported {} of {} rows as {file_name}",
                export.rows_written,
                export.total_rows
            );
            HttpResponse::Ok()
                .content_type("text/csv; charset=utf-8")
                .insert_header((
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{file_name}\""),
                ))
                .insert_header((
                    EXPORT_TRUNCATED_HEADER,
                    export.truncation.is_some().to_string(),
                ))
                .insert_header((EXPORT_TOTAL_ROWS_HEADER, export.total_rows.to_string()))
                .body(body)
        }
        Ok(Err(e)) => {
            log::error!("Failed to export incidents: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to export incidents"
            }))
        }
        Err(e) => {
            log::error!("Export task failed: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to export incidents"
            }))
        }
    }
}
