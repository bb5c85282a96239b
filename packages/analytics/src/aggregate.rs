//! Groups records and counts them.
//!
//! Rows come out in ascending key order: chronological for temporal
//! dimensions (Monday first for day of week), alphabetical for districts
//! and offenses, with missing values last.

use std::collections::BTreeMap;

use boston_crime_analytics_models::{AggregateRow, AggregateView, Dimension, GroupKey, GroupingSpec};
use boston_crime_incident_models::{IncidentRecord, IncidentTable};
use chrono::{Datelike as _, Days, NaiveDate};

/// The key `record` falls under for `dimension`.
#[must_use]
pub fn group_key(record: &IncidentRecord, dimension: Dimension) -> GroupKey {
    match dimension {
        Dimension::Year => GroupKey::Int(i64::from(record.year)),
        Dimension::Month => GroupKey::Int(i64::from(record.month)),
        Dimension::DayOfWeek => GroupKey::Day(record.day_of_week),
        Dimension::Hour => GroupKey::Int(i64::from(record.hour)),
        Dimension::District => record
            .district
            .clone()
            .map_or(GroupKey::Missing, GroupKey::Text),
        Dimension::Offense => GroupKey::Text(record.offense_description.clone()),
        Dimension::Day => GroupKey::Date(record.occurred_on_date.date_naive()),
        Dimension::Week => GroupKey::Date(week_ending(record.occurred_on_date.date_naive())),
    }
}

/// The Sunday that ends the week containing `date`.
#[must_use]
pub fn week_ending(date: NaiveDate) -> NaiveDate {
    let days_left = 6 - date.weekday().num_days_from_monday();
    date + Days::new(u64::from(days_left))
}

/// Counts the records of `table` grouped by `spec`.
#[must_use]
pub fn aggregate(table: &IncidentTable, spec: &GroupingSpec) -> AggregateView {
    let mut counts: BTreeMap<Vec<GroupKey>, u64> = BTreeMap::new();
    for record in table.iter() {
        let keys = spec
            .dimensions
            .iter()
            .map(|d| group_key(record, *d))
            .collect();
        *counts.entry(keys).or_default() += 1;
    }

    if spec.dense
        && let [dimension] = spec.dimensions.as_slice()
        && dimension.is_calendar()
    {
        fill_calendar_gaps(&mut counts, *dimension);
    }

    AggregateView {
        dimensions: spec.dimensions.clone(),
        rows: counts
            .into_iter()
            .map(|(keys, count)| AggregateRow { keys, count })
            .collect(),
    }
}

fn fill_calendar_gaps(counts: &mut BTreeMap<Vec<GroupKey>, u64>, dimension: Dimension) {
    let dates: Vec<NaiveDate> = counts
        .keys()
        .filter_map(|keys| match keys.first() {
            Some(GroupKey::Date(d)) => Some(*d),
            _ => None,
        })
        .collect();
    let (Some(&first), Some(&last)) = (dates.first(), dates.last()) else {
        return;
    };

    let step = Days::new(if dimension == Dimension::Week { 7 } else { 1 });
    let mut date = first;
    while date <= last {
        counts.entry(vec![GroupKey::Date(date)]).or_insert(0);
        let Some(next) = date.checked_add_days(step) else {
            break;
        };
        date = next;
    }
}

/// Keeps the `n` largest groups of `view`, largest first. Ties are broken
/// by ascending key so the result is stable.
#[must_use]
pub fn top_n(view: &AggregateView, n: usize) -> AggregateView {
    let mut rows = view.rows.clone();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.keys.cmp(&b.keys)));
    rows.truncate(n);
    AggregateView {
        dimensions: view.dimensions.clone(),
        rows,
    }
}
