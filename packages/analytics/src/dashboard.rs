//! Builds every dashboard panel for one selection.
//!
//! Most panels use the full selection. The weekly shooting timeline ignores
//! the offense restriction and the district breakdown and map ignore the
//! district restriction, so those panels keep showing context the user
//! has filtered away elsewhere.

use boston_crime_analytics_models::{
    AggregateView, Dimension, FilterSelection, GroupingSpec, KeyMetrics, MapSample,
};
use boston_crime_incident_models::IncidentTable;
use chrono::NaiveDate;

use crate::{aggregate, filter, key_metrics, map_points, top_n};

/// Panel sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Offenses in the "top crimes" chart.
    pub top_offenses: usize,
    /// Maximum map points.
    pub map_point_cap: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_offenses: 20,
            map_point_cap: crate::DEFAULT_MAP_POINT_CAP,
        }
    }
}

/// All computed panels.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    /// Headline numbers.
    pub metrics: KeyMetrics,
    /// Records per day, gaps filled.
    pub daily_volume: AggregateView,
    /// Records per day of week and hour.
    pub day_hour: AggregateView,
    /// Most frequent offenses.
    pub top_offenses: AggregateView,
    /// Shootings per week, gaps filled, ignoring the offense restriction.
    pub weekly_shootings: AggregateView,
    /// Records per district, ignoring the district restriction.
    pub by_district: AggregateView,
    /// Map points, ignoring the district restriction.
    pub map: MapSample,
}

/// Computes every panel of the dashboard for `selection`.
#[must_use]
pub fn build_dashboard(
    table: &IncidentTable,
    selection: &FilterSelection,
    today: NaiveDate,
    config: &DashboardConfig,
) -> Dashboard {
    let filtered = filter(table, selection);
    let all_districts = filter(table, &selection.without_districts());
    let shootings = filter(table, &selection.without_offenses()).select(|r| r.shooting);

    Dashboard {
        metrics: key_metrics(&filtered, today),
        daily_volume: aggregate(&filtered, &GroupingSpec::by(Dimension::Day).dense()),
        day_hour: aggregate(
            &filtered,
            &GroupingSpec::by_pair(Dimension::DayOfWeek, Dimension::Hour),
        ),
        top_offenses: top_n(
            &aggregate(&filtered, &GroupingSpec::by(Dimension::Offense)),
            config.top_offenses,
        ),
        weekly_shootings: aggregate(&shootings, &GroupingSpec::by(Dimension::Week).dense()),
        by_district: aggregate(&all_districts, &GroupingSpec::by(Dimension::District)),
        map: map_points(&all_districts, config.map_point_cap),
    }
}

#[cfg(test)]
mod tests {
    use boston_crime_analytics_models::GroupKey;

    use super::*;
    use crate::test_support::{located, record};

    fn table() -> IncidentTable {
        let mut shooting = record("Homicide", Some("B2"), "2021-03-10 23:00");
        shooting.shooting = true;
        IncidentTable::from_records(vec![
            located(record("Larceny", Some("A1"), "2021-03-01 10:00"), 42.35, -71.06),
            located(record("Larceny", Some("B2"), "2021-03-03 11:00"), 42.31, -71.08),
            record("Assault", Some("A1"), "2021-03-03 12:00"),
            shooting,
        ])
    }

    #[test]
    fn panels_follow_the_selection() {
        let selection = FilterSelection::all()
            .with_offenses(["Larceny"])
            .with_districts(["A1"]);
        let today = NaiveDate::from_ymd_opt(2021, 3, 15).unwrap();
        let dashboard = build_dashboard(&table(), &selection, today, &DashboardConfig::default());

        assert_eq!(dashboard.metrics.total_records, 1);
        assert_eq!(dashboard.metrics.incidents_this_month, 1);
        assert_eq!(dashboard.daily_volume.total(), 1);
        assert_eq!(dashboard.top_offenses.rows.len(), 1);
        assert_eq!(dashboard.day_hour.dimensions.len(), 2);

        // District breakdown and map ignore the district restriction.
        assert_eq!(dashboard.by_district.total(), 2);
        assert_eq!(
            dashboard
                .by_district
                .count_for(&[GroupKey::Text("B2".to_string())]),
            1
        );
        assert_eq!(dashboard.map.points.len(), 2);

        // The shooting timeline ignores the offense restriction only.
        assert!(dashboard.weekly_shootings.is_empty());
    }

    #[test]
    fn shooting_timeline_ignores_offense_filter() {
        let selection = FilterSelection::all().with_offenses(["Larceny"]);
        let today = NaiveDate::from_ymd_opt(2021, 3, 15).unwrap();
        let dashboard = build_dashboard(&table(), &selection, today, &DashboardConfig::default());

        assert_eq!(dashboard.metrics.shooting_incidents, 0);
        assert_eq!(dashboard.weekly_shootings.total(), 1);
        assert_eq!(
            dashboard.weekly_shootings.rows[0].keys,
            vec![GroupKey::Date(NaiveDate::from_ymd_opt(2021, 3, 14).unwrap())]
        );
    }

    #[test]
    fn config_limits_panel_sizes() {
        let config = DashboardConfig {
            top_offenses: 1,
            map_point_cap: 1,
        };
        let today = NaiveDate::from_ymd_opt(2021, 3, 15).unwrap();
        let dashboard = build_dashboard(&table(), &FilterSelection::all(), today, &config);

        assert_eq!(dashboard.top_offenses.rows.len(), 1);
        assert_eq!(
            dashboard.top_offenses.rows[0].keys,
            vec![GroupKey::Text("Larceny".to_string())]
        );
        assert_eq!(dashboard.map.points.len(), 1);
        assert!(dashboard.map.is_sampled());
        assert_eq!(dashboard.daily_volume.rows.len(), 10);
    }
}
