//! Headline numbers shown above the charts.

use std::collections::BTreeSet;

use boston_crime_analytics_models::KeyMetrics;
use boston_crime_incident_models::IncidentTable;
use chrono::{Datelike as _, NaiveDate};

/// Computes [`KeyMetrics`] for `table`. "This month" is the calendar month
/// (and year) containing `today`.
#[must_use]
pub fn key_metrics(table: &IncidentTable, today: NaiveDate) -> KeyMetrics {
    let mut metrics = KeyMetrics::default();
    let mut districts = BTreeSet::new();

    for record in table.iter() {
        metrics.total_records += 1;
        if record.year == today.year() && record.month == today.month() {
            metrics.incidents_this_month += 1;
        }
        if record.shooting {
            metrics.shooting_incidents += 1;
        }
        if let Some(district) = &record.district {
            districts.insert(district.as_str());
        }
    }

    metrics.unique_districts = districts.len() as u64;
    metrics
}
