//! Hazard shapes given on the command line.

use std::path::Path;
use std::str::FromStr;

use geo::{Geometry, Point};

/// A circle written as `lat,lng,radius_km`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleArg {
    pub center: Point<f64>,
    pub radius_km: f64,
}

impl FromStr for CircleArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [lat, lng, radius] = parts.as_slice() else {
            return Err(format!("Expected lat,lng,radius_km but got {s:?}"));
        };
        let parse = |label: &str, value: &str| {
            value
                .parse::<f64>()
                .map_err(|e| format!("Invalid {label} {value:?}: {e}"))
        };
        let lat = parse("latitude", lat)?;
        let lng = parse("longitude", lng)?;
        let radius_km = parse("radius", radius)?;
        Ok(Self {
            center: Point::new(lng, lat),
            radius_km,
        })
    }
}

/// Reads the first geometry from a GeoJSON file (a bare geometry, a
/// feature, or the first feature of a collection).
pub fn read_geometry(path: &Path) -> Result<Geometry<f64>, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    parse_geometry(&text)
}

fn parse_geometry(text: &str) -> Result<Geometry<f64>, Box<dyn std::error::Error>> {
    let geometry = match text.parse::<geojson::GeoJson>()? {
        geojson::GeoJson::Geometry(geometry) => Some(geometry),
        geojson::GeoJson::Feature(feature) => feature.geometry,
        geojson::GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .find_map(|feature| feature.geometry),
    };
    let geometry = geometry.ok_or("GeoJSON contains no geometry")?;
    Ok(Geometry::<f64>::try_from(geometry)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_circle() {
        let circle: CircleArg = "10.3, 123.9, 1.5".parse().unwrap();
        assert_eq!(circle.center, Point::new(123.9, 10.3));
        assert!((circle.radius_km - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_malformed_circle() {
        assert!("10.3,123.9".parse::<CircleArg>().is_err());
        assert!("10.3,east,1".parse::<CircleArg>().is_err());
    }

    #[test]
    fn reads_feature_collection() {
        let text = serde_json::json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[123.8, 10.2], [123.9, 10.2], [123.9, 10.3], [123.8, 10.2]]]
                }
            }]
        })
        .to_string();
        assert!(matches!(parse_geometry(&text).unwrap(), Geometry::Polygon(_)));
    }

    #[test]
    fn rejects_empty_feature() {
        let text = r#"{"type": "Feature", "properties": {}, "geometry": null}"#;
        assert!(parse_geometry(text).is_err());
    }
}
