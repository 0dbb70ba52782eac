//! Previous-school markers.

use std::collections::BTreeMap;

use serde::Serialize;
use student_map_student_models::{LatLng, PreviousSchool};

/// One marker on the previous-school layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchoolMarker {
    /// Name of the first school seen at this location.
    pub name: String,
    /// Marker location.
    pub location: LatLng,
    /// Senior-high students from every school at this location.
    pub senior_high_count: u64,
    /// College students from every school at this location.
    pub college_count: u64,
}

/// Groups schools sharing a location (coordinates rounded to four
/// decimals) into single markers, summing their counts.
///
/// Schools without valid coordinates are skipped. Markers keep the order
/// in which their location was first seen.
#[must_use]
pub fn group_previous_schools(schools: &[PreviousSchool]) -> Vec<SchoolMarker> {
    let mut markers: Vec<SchoolMarker> = Vec::new();
    let mut by_key: BTreeMap<(i64, i64), usize> = BTreeMap::new();

    for school in schools {
        let Some(location) = LatLng::new(school.latitude, school.longitude) else {
            log::debug!("Skipping previous school {:?} without coordinates", school.name);
            continue;
        };
        let key = (round4(location.lat), round4(location.lng));
        let i = *by_key.entry(key).or_insert_with(|| {
            markers.push(SchoolMarker {
                name: school.name.clone(),
                location,
                senior_high_count: 0,
                college_count: 0,
            });
            markers.len() - 1
        });
        markers[i].senior_high_count += school.senior_high_count;
        markers[i].college_count += school.college_count;
    }

    markers
}

#[allow(clippy::cast_possible_truncation)]
fn round4(value: f64) -> i64 {
    (value * 10_000.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schools() -> Vec<PreviousSchool> {
        serde_json::from_value(serde_json::json!([
            { "name": "Cebu City NHS", "latitude": 10.30001, "longitude": 123.89, "senior_high_count": 3, "college_count": 1 },
            { "name": "Abellana NHS", "latitude": 10.29, "longitude": 123.88, "senior_high_count": 2, "college_count": 0 },
            { "name": "Cebu City NHS Annex", "latitude": "10.30004", "longitude": 123.89, "senior_high_count": 1, "college_count": 5 },
            { "name": "Unknown", "latitude": null, "longitude": 123.0, "senior_high_count": 9, "college_count": 9 },
            { "name": "Bad", "latitude": "n/a", "longitude": "n/a" }
        ]))
        .unwrap()
    }

    #[test]
    fn merges_schools_at_same_rounded_location() {
        let markers = group_previous_schools(&schools());
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].name, "Cebu City NHS");
        assert_eq!(markers[0].senior_high_count, 4);
        assert_eq!(markers[0].college_count, 6);
        assert_eq!(markers[1].name, "Abellana NHS");
    }

    #[test]
    fn skips_schools_without_coordinates() {
        let markers = group_previous_schools(&schools());
        assert!(markers.iter().all(|m| m.name != "Unknown" && m.name != "Bad"));
    }

    #[test]
    fn empty_input_has_no_markers() {
        assert!(group_previous_schools(&[]).is_empty());
    }
}
