//! OSRM routing client.
//!
//! See <https://project-osrm.org/docs/v5.24.0/api/#route-service>

use student_map_routing_models::Route;
use student_map_student_models::LatLng;

use crate::{RoutingError, RoutingService};

/// Public OSRM demo server.
pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org";

/// Default OSRM profile.
pub const DEFAULT_OSRM_PROFILE: &str = "driving";

/// Client for the OSRM `route` service.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    client: reqwest::Client,
    base_url: String,
    profile: String,
}

impl OsrmClient {
    /// Creates a client for the OSRM server at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            profile: profile.into(),
        }
    }

    /// Creates a client from `OSRM_URL` and `OSRM_PROFILE`, falling back
    /// to the public demo server and the driving profile.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = std::env::var("OSRM_URL").unwrap_or_else(|_| DEFAULT_OSRM_URL.to_string());
        let profile =
            std::env::var("OSRM_PROFILE").unwrap_or_else(|_| DEFAULT_OSRM_PROFILE.to_string());
        Self::new(base_url, profile)
    }

    fn route_url(&self, waypoints: &[LatLng]) -> String {
        let coordinates = waypoints
            .iter()
            .map(|w| format!("{},{}", w.lng, w.lat))
            .collect::<Vec<_>>()
            .join(";");
        format!("{}/route/v1/{}/{coordinates}", self.base_url, self.profile)
    }
}

#[async_trait::async_trait]
impl RoutingService for OsrmClient {
    async fn route(
        &self,
        waypoints: &[LatLng],
        alternatives: bool,
    ) -> Result<Vec<Route>, RoutingError> {
        if waypoints.len() < 2 {
            return Err(RoutingError::Parse {
                message: format!("Need at least 2 waypoints, got {}", waypoints.len()),
            });
        }

        let url = self.route_url(waypoints);
        log::debug!("OSRM request: {url}");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("overview", "full"),
                ("geometries", "geojson"),
                ("alternatives", if alternatives { "true" } else { "false" }),
            ])
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body: serde_json::Value = resp.json().await?;
        parse_response(status, &body)
    }
}

/// Parses an OSRM route response.
fn parse_response(status: u16, body: &serde_json::Value) -> Result<Vec<Route>, RoutingError> {
    match body["code"].as_str() {
        Some("Ok") => {}
        Some("NoRoute" | "NoSegment") => return Err(RoutingError::NoRoute),
        Some(code) => {
            return Err(RoutingError::Status {
                status,
                message: body["message"].as_str().unwrap_or(code).to_string(),
            });
        }
        None => {
            return Err(RoutingError::Parse {
                message: format!("OSRM response (status {status}) has no code"),
            });
        }
    }

    let routes = body["routes"].as_array().ok_or_else(|| RoutingError::Parse {
        message: "OSRM response has no routes array".to_string(),
    })?;

    let routes = routes.iter().map(parse_route).collect::<Result<Vec<_>, _>>()?;
    if routes.is_empty() {
        return Err(RoutingError::NoRoute);
    }
    Ok(routes)
}

fn parse_route(route: &serde_json::Value) -> Result<Route, RoutingError> {
    let positions = route["geometry"]["coordinates"]
        .as_array()
        .ok_or_else(|| RoutingError::Parse {
            message: "Route has no GeoJSON geometry".to_string(),
        })?;

    let coordinates = positions
        .iter()
        .map(|p| {
            let lng = p[0].as_f64();
            let lat = p[1].as_f64();
            LatLng::new(lat, lng).ok_or_else(|| RoutingError::Parse {
                message: format!("Invalid route coordinate {p}"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let distance_m = route["distance"].as_f64().ok_or_else(|| RoutingError::Parse {
        message: "Route has no distance".to_string(),
    })?;
    let duration_s = route["duration"].as_f64().ok_or_else(|| RoutingError::Parse {
        message: "Route has no duration".to_string(),
    })?;

    Ok(Route {
        coordinates,
        distance_m,
        duration_s,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_lng_lat_url() {
        let client = OsrmClient::new("http://localhost:5000/", "driving");
        let url = client.route_url(&[
            LatLng { lat: 10.30, lng: 123.88 },
            LatLng { lat: 10.29, lng: 123.89 },
        ]);
        assert_eq!(
            url,
            "http://localhost:5000/route/v1/driving/123.88,10.3;123.89,10.29"
        );
    }

    #[test]
    fn parses_routes_with_alternatives() {
        let body = serde_json::json!({
            "code": "Ok",
            "routes": [
                {
                    "geometry": { "type": "LineString", "coordinates": [[123.88, 10.30], [123.885, 10.295], [123.89, 10.29]] },
                    "distance": 1834.2,
                    "duration": 301.5
                },
                {
                    "geometry": { "type": "LineString", "coordinates": [[123.88, 10.30], [123.89, 10.29]] },
                    "distance": 2100.0,
                    "duration": 350.0
                }
            ],
            "waypoints": []
        });
        let routes = parse_response(200, &body).unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].coordinates.len(), 3);
        assert!((routes[0].coordinates[0].lat - 10.30).abs() < 1e-9);
        assert!((routes[0].distance_km() - 1.8342).abs() < 1e-9);
    }

    #[test]
    fn no_route_code_is_no_route() {
        let body = serde_json::json!({ "code": "NoRoute", "message": "Impossible route" });
        assert!(matches!(parse_response(400, &body), Err(RoutingError::NoRoute)));
    }

    #[test]
    fn empty_routes_is_no_route() {
        let body = serde_json::json!({ "code": "Ok", "routes": [] });
        assert!(matches!(parse_response(200, &body), Err(RoutingError::NoRoute)));
    }

    #[test]
    fn other_codes_are_status_errors() {
        let body = serde_json::json!({ "code": "InvalidQuery", "message": "Query string malformed" });
        match parse_response(400, &body) {
            Err(RoutingError::Status { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Query string malformed");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_geometry_is_parse_error() {
        let body = serde_json::json!({ "code": "Ok", "routes": [{ "distance": 1.0, "duration": 1.0 }] });
        assert!(matches!(
            parse_response(200, &body),
            Err(RoutingError::Parse { .. })
        ));
    }
}
