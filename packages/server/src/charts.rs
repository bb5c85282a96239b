//! Vega-Lite chart specifications for the dashboard panels.
//!
//! Every chart embeds its data inline, so the frontend only has to hand the
//! spec to `vega-embed`.

use boston_crime_analytics::Dashboard;
use boston_crime_analytics_models::{AggregateView, GroupKey, MapSample};
use boston_crime_incident_models::DayOfWeek;
use boston_crime_server_models::ApiChart;
use serde_json::{Map, Value, json};

const SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// All dashboard charts in display order.
#[must_use]
pub fn dashboard_charts(dashboard: &Dashboard) -> Vec<ApiChart> {
    vec![
        daily_volume(&dashboard.daily_volume),
        day_hour_heatmap(&dashboard.day_hour),
        top_offenses(&dashboard.top_offenses),
        weekly_shootings(&dashboard.weekly_shootings),
        by_district(&dashboard.by_district),
        incident_map(&dashboard.map),
    ]
}

fn chart(id: &str, title: &str, mut spec: Value) -> ApiChart {
    if let Value::Object(map) = &mut spec {
        map.insert("$schema".to_string(), json!(SCHEMA));
        map.entry("width").or_insert_with(|| json!("container"));
    }
    ApiChart {
        id: id.to_string(),
        title: title.to_string(),
        spec,
    }
}

fn key_value(key: &GroupKey) -> Value {
    match key {
        GroupKey::Int(v) => json!(v),
        GroupKey::Day(d) => json!(d.to_string()),
        GroupKey::Date(d) => json!(d.format("%Y-%m-%d").to_string()),
        GroupKey::Text(s) => json!(s),
        GroupKey::Missing => Value::Null,
    }
}

/// One object per row, keyed by dimension name plus `count`.
fn view_values(view: &AggregateView) -> Vec<Value> {
    view.rows
        .iter()
        .map(|row| {
            let mut object: Map<String, Value> = view
                .dimensions
                .iter()
                .zip(&row.keys)
                .map(|(dimension, key)| (dimension.to_string(), key_value(key)))
                .collect();
            object.insert("count".to_string(), json!(row.count));
            Value::Object(object)
        })
        .collect()
}

fn daily_volume(view: &AggregateView) -> ApiChart {
    chart(
        "daily_volume",
        "Crime Volume Over Time",
        json!({
            "data": { "values": view_values(view) },
            "mark": "line",
            "height": 300,
            "encoding": {
                "x": { "field": "day", "type": "temporal", "title": "Date" },
                "y": { "field": "count", "type": "quantitative", "title": "Number of Incidents" },
            },
        }),
    )
}

fn day_hour_heatmap(view: &AggregateView) -> ApiChart {
    let days: Vec<String> = DayOfWeek::all().iter().map(ToString::to_string).collect();
    chart(
        "day_hour_heatmap",
        "Crime Heatmap",
        json!({
            "data": { "values": view_values(view) },
            "mark": "rect",
            "height": 300,
            "encoding": {
                "x": { "field": "hour", "type": "ordinal", "title": "Hour of Day" },
                "y": { "field": "day_of_week", "type": "ordinal", "title": "Day of Week", "sort": days },
                "color": { "field": "count", "type": "quantitative", "scale": { "scheme": "reds" } },
            },
        }),
    )
}

fn top_offenses(view: &AggregateView) -> ApiChart {
    chart(
        "top_offenses",
        &format!("Top {} Crimes", view.rows.len()),
        json!({
            "data": { "values": view_values(view) },
            "mark": "bar",
            "encoding": {
                "y": { "field": "offense", "type": "nominal", "sort": "-x", "title": "Crime" },
                "x": { "field": "count", "type": "quantitative", "title": "Count" },
                "tooltip": [
                    { "field": "offense", "type": "nominal", "title": "Crime" },
                    { "field": "count", "type": "quantitative", "title": "Count" },
                ],
            },
        }),
    )
}

fn weekly_shootings(view: &AggregateView) -> ApiChart {
    chart(
        "weekly_shootings",
        "Shooting Incidents Timeline",
        json!({
            "data": { "values": view_values(view) },
            "mark": { "type": "line", "color": "red" },
            "height": 250,
            "encoding": {
                "x": { "field": "week", "type": "temporal", "title": "Date" },
                "y": { "field": "count", "type": "quantitative", "title": "Number of Shootings" },
            },
        }),
    )
}

fn by_district(view: &AggregateView) -> ApiChart {
    chart(
        "by_district",
        "Crime by Police District",
        json!({
            "data": { "values": view_values(view) },
            "mark": "bar",
            "encoding": {
                "y": { "field": "district", "type": "nominal", "sort": "-x", "title": "District" },
                "x": { "field": "count", "type": "quantitative", "title": "Count" },
                "tooltip": [
                    { "field": "district", "type": "nominal", "title": "District" },
                    { "field": "count", "type": "quantitative", "title": "Count" },
                ],
            },
        }),
    )
}

fn incident_map(sample: &MapSample) -> ApiChart {
    let values: Vec<Value> = sample
        .points
        .iter()
        .map(|p| {
            json!({
                "latitude": p.latitude,
                "longitude": p.longitude,
                "district": p.district,
                "offense": p.offense_description,
                "day_of_week": p.day_of_week.to_string(),
                "hour": p.hour,
            })
        })
        .collect();

    chart(
        "incident_map",
        "Crime Map with Police Districts",
        json!({
            "data": { "values": values },
            "mark": { "type": "circle", "size": 35, "opacity": 0.5 },
            "height": 500,
            "projection": { "type": "mercator" },
            "encoding": {
                "longitude": { "field": "longitude", "type": "quantitative" },
                "latitude": { "field": "latitude", "type": "quantitative" },
                "color": { "field": "district", "type": "nominal", "legend": null },
                "tooltip": [
                    { "field": "district", "type": "nominal", "title": "District" },
                    { "field": "offense", "type": "nominal", "title": "Crime Type" },
                    { "field": "day_of_week", "type": "nominal", "title": "Day of Week" },
                    { "field": "hour", "type": "quantitative", "title": "Hour of Day" },
                ],
            },
        }),
    )
}

#[cfg(test)]
mod tests {
    use boston_crime_analytics_models::{AggregateRow, Dimension};
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn rows_become_named_values() {
        let view = AggregateView {
            dimensions: vec![Dimension::DayOfWeek, Dimension::Hour],
            rows: vec![AggregateRow {
                keys: vec![GroupKey::Day(DayOfWeek::Friday), GroupKey::Int(23)],
                count: 4,
            }],
        };
        assert_eq!(
            view_values(&view),
            vec![json!({ "day_of_week": "Friday", "hour": 23, "count": 4 })]
        );
    }

    #[test]
    fn missing_keys_are_null_and_dates_are_iso() {
        let view = AggregateView {
            dimensions: vec![Dimension::Week],
            rows: vec![AggregateRow {
                keys: vec![GroupKey::Date(NaiveDate::from_ymd_opt(2021, 3, 7).unwrap())],
                count: 0,
            }],
        };
        assert_eq!(view_values(&view)[0]["week"], "2021-03-07");
        assert_eq!(key_value(&GroupKey::Missing), Value::Null);
    }

    #[test]
    fn charts_carry_schema_and_inline_data() {
        let chart = by_district(&AggregateView::empty(vec![Dimension::District]));
        assert_eq!(chart.id, "by_district");
        assert_eq!(chart.spec["$schema"], SCHEMA);
        assert_eq!(chart.spec["width"], "container");
        assert_eq!(chart.spec["data"]["values"], json!([]));
    }
}
