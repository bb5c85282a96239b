//! Plain-text rendering of a selection summary.

use boston_crime_analytics_models::{AggregateView, FilterSelection, KeyMetrics};

fn describe<T: ToString>(values: impl IntoIterator<Item = T>) -> String {
    let values: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();
    if values.is_empty() {
        "all".to_string()
    } else {
        values.join(", ")
    }
}

/// Lines printed by the `summary` command.
pub fn summary_lines(
    selection: &FilterSelection,
    metrics: &KeyMetrics,
    offenses: &AggregateView,
) -> Vec<String> {
    let mut lines = vec![
        format!("Years:     {}", describe(&selection.years)),
        format!("Offenses:  {}", describe(&selection.offenses)),
        format!("Districts: {}", describe(&selection.districts)),
        String::new(),
        format!("{:<24} {:>10}", "Total records", metrics.total_records),
        format!("{:<24} {:>10}", "Incidents this month", metrics.incidents_this_month),
        format!("{:<24} {:>10}", "Shooting incidents", metrics.shooting_incidents),
        format!("{:<24} {:>10}", "Unique districts", metrics.unique_districts),
    ];

    if !offenses.is_empty() {
        lines.push(String::new());
        lines.push(format!("{:<50} {:>10}", "OFFENSE", "COUNT"));
        lines.push("-".repeat(61));
        for row in &offenses.rows {
            let name = row.keys.first().map(ToString::to_string).unwrap_or_default();
            lines.push(format!("{name:<50} {:>10}", row.count));
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use boston_crime_analytics_models::{AggregateRow, Dimension, GroupKey};

    use super::*;

    #[test]
    fn lists_selection_metrics_and_offenses() {
        let selection = FilterSelection::all().with_years([2021, 2022]);
        let metrics = KeyMetrics {
            total_records: 12,
            incidents_this_month: 2,
            shooting_incidents: 1,
            unique_districts: 3,
        };
        let offenses = AggregateView {
            dimensions: vec![Dimension::Offense],
            rows: vec![AggregateRow {
                keys: vec![GroupKey::Text("LARCENY".to_string())],
                count: 7,
            }],
        };

        let lines = summary_lines(&selection, &metrics, &offenses);
        assert_eq!(lines[0], "Years:     2021, 2022");
        assert_eq!(lines[1], "Offenses:  all");
        assert!(lines[4].starts_with("Total records"));
        assert!(lines[4].ends_with("12"));
        assert!(lines.last().unwrap().starts_with("LARCENY "));
        assert!(lines.last().unwrap().ends_with(" 7"));
    }

    #[test]
    fn omits_offense_table_when_empty() {
        let lines = summary_lines(
            &FilterSelection::all(),
            &KeyMetrics::default(),
            &AggregateView::empty(vec![Dimension::Offense]),
        );
        assert_eq!(lines.len(), 8);
    }
}
