#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Hazard types and the affected-area report payloads exchanged with the
//! backend.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use student_map_student_models::{ClusterType, Cohort};

/// Category of a drawn affected area.
///
/// Only one shape per type is active at a time.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum HazardType {
    /// Flooded area.
    #[serde(rename = "flood")]
    #[strum(serialize = "flood")]
    Flood,
    /// Transport strike.
    #[serde(rename = "strike")]
    #[strum(serialize = "strike")]
    Strike,
    /// Road closures and other mobility restrictions.
    #[serde(rename = "mobility restriction", alias = "restricted")]
    #[strum(to_string = "mobility restriction", serialize = "restricted")]
    MobilityRestriction,
    /// Fire.
    #[serde(rename = "fire")]
    #[strum(serialize = "fire")]
    Fire,
}

impl HazardType {
    /// Every hazard type, in display order.
    pub const ALL: [Self; 4] = [
        Self::Flood,
        Self::Strike,
        Self::MobilityRestriction,
        Self::Fire,
    ];

    /// Human-readable tag shown on affected markers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Flood => "Flood",
            Self::Strike => "Strike",
            Self::MobilityRestriction => "Mobility Restriction",
            Self::Fire => "Fire",
        }
    }

    /// Colour used to draw shapes of this type.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Flood => "blue",
            Self::Strike => "red",
            Self::MobilityRestriction => "green",
            Self::Fire => "orange",
        }
    }
}

/// Body of `POST /affected-areas`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedAreaReport {
    /// Hazard type of the confirmed shape.
    #[serde(rename = "type")]
    pub hazard_type: HazardType,
    /// Students of the active cohort inside the shape.
    pub number_of_students_affected: usize,
    /// Area of the confirmed shape, in km².
    pub total_area: f64,
    /// The confirmed shape as a GeoJSON feature.
    pub geojson_data: geojson::Feature,
    /// Cluster labelling active when the shape was drawn.
    pub clustering_type: Option<ClusterType>,
    /// Cohort active when the shape was drawn.
    pub education_level: Option<Cohort>,
    /// When the report was created. Optional on the backend, which
    /// falls back to its own clock.
    pub created_at: DateTime<Utc>,
}

/// A stored report returned by `GET /event-reports/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventReport {
    /// Backend identifier.
    #[serde(default)]
    pub id: Option<u64>,
    /// Hazard type of the stored shape.
    #[serde(rename = "type")]
    pub hazard_type: HazardType,
    /// The stored shape (a geometry, feature, or feature collection).
    pub geojson: geojson::GeoJson,
    /// Affected student count at the time of the report.
    #[serde(default)]
    pub number_of_students_affected: Option<u64>,
    /// Area at the time of the report, in km².
    #[serde(default)]
    pub total_area: Option<f64>,
    /// Cluster labelling at the time of the report.
    #[serde(default)]
    pub clustering_type: Option<String>,
    /// Cohort at the time of the report.
    #[serde(default)]
    pub education_level: Option<String>,
    /// When the report was created.
    #[serde(default, deserialize_with = "loose_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl EventReport {
    /// The stored geometry: the geometry itself, the feature's geometry,
    /// or the first feature geometry of a collection.
    #[must_use]
    pub fn geometry(&self) -> Option<&geojson::Geometry> {
        match &self.geojson {
            geojson::GeoJson::Geometry(geometry) => Some(geometry),
            geojson::GeoJson::Feature(feature) => feature.geometry.as_ref(),
            geojson::GeoJson::FeatureCollection(collection) => collection
                .features
                .iter()
                .find_map(|f| f.geometry.as_ref()),
        }
    }
}

/// Parses backend timestamps, which may or may not carry an offset.
///
/// Formats without an offset are assumed to be UTC.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
        }
    }
    None
}

fn loose_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.as_deref().and_then(parse_timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hazard_type_wire_names() {
        assert_eq!(
            serde_json::to_value(HazardType::MobilityRestriction).unwrap(),
            serde_json::json!("mobility restriction")
        );
        let parsed: HazardType = serde_json::from_value(serde_json::json!("restricted")).unwrap();
        assert_eq!(parsed, HazardType::MobilityRestriction);
        assert_eq!(HazardType::Flood.to_string(), "flood");
    }

    #[test]
    fn hazard_type_parses_from_str() {
        assert_eq!("fire".parse::<HazardType>().unwrap(), HazardType::Fire);
        assert_eq!(
            "restricted".parse::<HazardType>().unwrap(),
            HazardType::MobilityRestriction
        );
        assert_eq!(
            "mobility restriction".parse::<HazardType>().unwrap(),
            HazardType::MobilityRestriction
        );
        assert!("tornado".parse::<HazardType>().is_err());
    }

    #[test]
    fn event_report_geometry_from_feature() {
        let report: EventReport = serde_json::from_value(serde_json::json!({
            "id": 4,
            "type": "flood",
            "geojson": {
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[123.0, 10.0], [123.1, 10.0], [123.1, 10.1], [123.0, 10.0]]]
                }
            },
            "created_at": "2025-03-01T08:15:30.123456"
        }))
        .unwrap();
        assert_eq!(report.hazard_type, HazardType::Flood);
        assert!(matches!(
            report.geometry().unwrap().value,
            geojson::Value::Polygon(_)
        ));
        assert!(report.created_at.is_some());
    }

    #[test]
    fn event_report_tolerates_unknown_timestamp() {
        let report: EventReport = serde_json::from_value(serde_json::json!({
            "type": "strike",
            "geojson": { "type": "Point", "coordinates": [123.0, 10.0] },
            "created_at": "yesterday"
        }))
        .unwrap();
        assert!(report.created_at.is_none());
        assert!(report.id.is_none());
    }

    #[test]
    fn parses_timestamps_with_and_without_offset() {
        assert!(parse_timestamp("2025-03-01T08:15:30+08:00").is_some());
        assert!(parse_timestamp("2025-03-01 08:15:30").is_some());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn report_serializes_backend_field_names() {
        let report = AffectedAreaReport {
            hazard_type: HazardType::Fire,
            number_of_students_affected: 3,
            total_area: 1.5,
            geojson_data: geojson::Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::Point(vec![123.0, 10.0]))),
                id: None,
                properties: None,
                foreign_members: None,
            },
            clustering_type: Some(ClusterType::Cluster),
            education_level: Some(Cohort::College),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["type"], "fire");
        assert_eq!(value["number_of_students_affected"], 3);
        assert_eq!(value["clustering_type"], "cluster");
        assert_eq!(value["education_level"], "college");
        assert_eq!(value["geojson_data"]["type"], "Feature");
        assert!(value["created_at"].as_str().is_some_and(|t| parse_timestamp(t).is_some()));
    }
}
