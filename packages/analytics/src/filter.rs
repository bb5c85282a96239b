//! Applies a [`FilterSelection`] to the unified table.

use boston_crime_analytics_models::FilterSelection;
use boston_crime_incident_models::{IncidentRecord, IncidentTable};

/// Whether `record` passes every restricted dimension of `selection`.
///
/// A record with no district never matches a non-empty district set.
#[must_use]
pub fn matches(record: &IncidentRecord, selection: &FilterSelection) -> bool {
    (selection.years.is_empty() || selection.years.contains(&record.year))
        && (selection.offenses.is_empty()
            || selection.offenses.contains(&record.offense_description))
        && (selection.districts.is_empty()
            || record
                .district
                .as_ref()
                .is_some_and(|d| selection.districts.contains(d)))
}

/// Returns the records of `table` that match `selection`, in table order.
#[must_use]
pub fn filter(table: &IncidentTable, selection: &FilterSelection) -> IncidentTable {
    if selection.is_unrestricted() {
        return table.clone();
    }
    let filtered = table.select(|r| matches(r, selection));
    log::debug!("Filtered {} of {} records", filtered.len(), table.len());
    filtered
}
