//! Points for the incident map.

use boston_crime_analytics_models::{MapPoint, MapSample};
use boston_crime_incident_models::IncidentTable;

/// Maximum number of points sent to the map by default.
pub const DEFAULT_MAP_POINT_CAP: usize = 20_000;

/// Collects records with usable coordinates as map points.
///
/// When more than `cap` records have coordinates, an evenly spaced subset of
/// `cap` points is returned, so the same table always yields the same
/// sample. Records without coordinates are never plotted.
#[must_use]
pub fn map_points(table: &IncidentTable, cap: usize) -> MapSample {
    let located: Vec<MapPoint> = table
        .iter()
        .filter_map(|record| {
            record.coordinates.map(|c| MapPoint {
                latitude: c.latitude,
                longitude: c.longitude,
                district: record.district.clone(),
                offense_description: record.offense_description.clone(),
                day_of_week: record.day_of_week,
                hour: record.hour,
            })
        })
        .collect();
    let total_with_coordinates = located.len();

    let points = if total_with_coordinates <= cap {
        located
    } else {
        log::debug!("Sampling {cap} of {total_with_coordinates} map points");
        (0..cap)
            .map(|i| located[i * total_with_coordinates / cap].clone())
            .collect()
    };

    MapSample {
        points,
        total_with_coordinates,
    }
}
