#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Route and route planner state types.

use geo::LineString;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use student_map_student_models::{Campus, LatLng, StudentId};

/// One route returned by the routing service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Path geometry, origin first.
    pub coordinates: Vec<LatLng>,
    /// Length in metres.
    pub distance_m: f64,
    /// Travel time in seconds.
    pub duration_s: f64,
}

impl Route {
    /// The path as a [`LineString`] (`x` = longitude).
    #[must_use]
    pub fn line_string(&self) -> LineString<f64> {
        self.coordinates.iter().map(|c| (c.lng, c.lat)).collect()
    }

    /// Length in kilometres.
    #[must_use]
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }

    /// Travel time in minutes.
    #[must_use]
    pub fn duration_min(&self) -> f64 {
        self.duration_s / 60.0
    }
}

/// How the exposed route relates to the active hazard zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RouteKind {
    /// The direct route, clear of any hazard zone.
    Direct,
    /// A detour through `via` that avoids the hazard zone.
    Detour {
        /// The accepted candidate waypoint.
        via: LatLng,
    },
    /// The direct route, shown although it crosses the hazard zone.
    HazardFallback,
}

/// What a route was requested for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RouteRequest {
    /// From a student's residence to the campus they attend.
    Student {
        /// The student.
        student: StudentId,
        /// The student's residence.
        origin: LatLng,
        /// The student's campus.
        campus: Campus,
    },
    /// From the nearest campus to a point in the affected area.
    CampusToAffected {
        /// The nearest campus.
        campus: Campus,
        /// The clicked point.
        target: LatLng,
    },
}

impl RouteRequest {
    /// Where the route starts.
    #[must_use]
    pub fn origin(&self) -> LatLng {
        match self {
            Self::Student { origin, .. } => *origin,
            Self::CampusToAffected { campus, .. } => LatLng {
                lat: campus.latitude,
                lng: campus.longitude,
            },
        }
    }

    /// Where the route ends.
    #[must_use]
    pub fn destination(&self) -> LatLng {
        match self {
            Self::Student { campus, .. } => LatLng {
                lat: campus.latitude,
                lng: campus.longitude,
            },
            Self::CampusToAffected { target, .. } => *target,
        }
    }

    /// The campus at either end of the route.
    #[must_use]
    pub const fn campus(&self) -> &Campus {
        match self {
            Self::Student { campus, .. } | Self::CampusToAffected { campus, .. } => campus,
        }
    }

    /// The student, for student routes.
    #[must_use]
    pub const fn student(&self) -> Option<StudentId> {
        match self {
            Self::Student { student, .. } => Some(*student),
            Self::CampusToAffected { .. } => None,
        }
    }
}

/// A resolved route with its alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    /// What was requested.
    pub request: RouteRequest,
    /// Waypoints the route was requested through, origin first.
    pub waypoints: Vec<LatLng>,
    /// The primary route.
    pub route: Route,
    /// Alternative routes offered by the service.
    pub alternatives: Vec<Route>,
    /// Relation to the hazard zone.
    pub kind: RouteKind,
}

impl RouteResult {
    /// Returns `true` if the route is known to cross the hazard zone and
    /// must be shown with a warning.
    #[must_use]
    pub const fn is_hazard_warning(&self) -> bool {
        matches!(self.kind, RouteKind::HazardFallback)
    }

    /// The primary route followed by the alternatives.
    pub fn all_routes(&self) -> impl Iterator<Item = &Route> {
        std::iter::once(&self.route).chain(&self.alternatives)
    }
}

/// Route planner state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RouteState {
    /// No route requested or shown.
    #[default]
    Idle,
    /// Waiting for the direct route.
    RouteRequested {
        /// The pending request.
        request: RouteRequest,
    },
    /// The direct route crossed the hazard zone; trying detours.
    DetourSearch {
        /// The pending request.
        request: RouteRequest,
        /// Number of candidate waypoints to try.
        candidates: usize,
    },
    /// A route is shown.
    RouteFound {
        /// The shown route.
        result: RouteResult,
    },
    /// The request failed. A hazard-crossing fallback route may still be
    /// shown.
    RouteFailed {
        /// The failed request.
        request: RouteRequest,
        /// Fallback route flagged [`RouteKind::HazardFallback`].
        fallback: Option<RouteResult>,
        /// Reason shown to the operator.
        message: String,
    },
}

impl RouteState {
    /// Short state name (e.g. `"route_found"`).
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::RouteRequested { .. } => "route_requested",
            Self::DetourSearch { .. } => "detour_search",
            Self::RouteFound { .. } => "route_found",
            Self::RouteFailed { .. } => "route_failed",
        }
    }

    /// The route currently shown, if any.
    #[must_use]
    pub const fn route(&self) -> Option<&RouteResult> {
        match self {
            Self::RouteFound { result } => Some(result),
            Self::RouteFailed {
                fallback: Some(result),
                ..
            } => Some(result),
            _ => None,
        }
    }

    /// The request being served or shown, if any.
    #[must_use]
    pub const fn request(&self) -> Option<&RouteRequest> {
        match self {
            Self::Idle => None,
            Self::RouteRequested { request }
            | Self::DetourSearch { request, .. }
            | Self::RouteFailed { request, .. } => Some(request),
            Self::RouteFound { result } => Some(&result.request),
        }
    }

    /// Returns `true` while a search is in flight.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::RouteRequested { .. } | Self::DetourSearch { .. })
    }

    /// Returns `true` in [`RouteState::Idle`].
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// A state change published to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteUpdate {
    /// Generation of the request that produced this state.
    pub generation: u64,
    /// The new state.
    pub state: RouteState,
}

/// Summary statistics over one metric of a route set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricStats {
    /// Raw values, primary route first.
    pub values: Vec<f64>,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// Arithmetic mean.
    pub avg: f64,
    /// Sample standard deviation (0 for fewer than two values).
    pub std_dev: f64,
    /// `max - min`.
    pub range: f64,
    /// 25th percentile.
    pub p25: f64,
    /// Median.
    pub p50: f64,
    /// 75th percentile.
    pub p75: f64,
    /// `std_dev / avg` (0 when the mean is 0).
    pub coefficient_of_variation: f64,
}

/// Comparison of a route and its alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteEvaluation {
    /// Number of routes evaluated.
    pub route_count: usize,
    /// Number of alternatives (`route_count - 1`).
    pub alternative_count: usize,
    /// `alternative_count / route_count`.
    pub diversity_score: f64,
    /// Distances in kilometres.
    pub distance_stats: MetricStats,
    /// Travel times in minutes.
    pub time_stats: MetricStats,
    /// Minutes per kilometre of each route with a positive distance.
    pub time_per_km: Vec<f64>,
    /// Mean of [`Self::time_per_km`].
    pub average_time_per_km: Option<f64>,
    /// Slowest over fastest minutes per kilometre.
    pub congestion_score: Option<f64>,
    /// Weighted efficiency score out of 10.
    pub quality_score: f64,
    /// Index of the fastest route.
    pub best_route_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campus() -> Campus {
        Campus {
            id: 1,
            name: "USJ-R Main Campus".to_string(),
            latitude: 10.29,
            longitude: 123.89,
        }
    }

    fn result(kind: RouteKind) -> RouteResult {
        let route = Route {
            coordinates: vec![
                LatLng { lat: 10.30, lng: 123.88 },
                LatLng { lat: 10.29, lng: 123.89 },
            ],
            distance_m: 1_500.0,
            duration_s: 240.0,
        };
        RouteResult {
            request: RouteRequest::Student {
                student: StudentId(1),
                origin: LatLng { lat: 10.30, lng: 123.88 },
                campus: campus(),
            },
            waypoints: route.coordinates.clone(),
            route,
            alternatives: Vec::new(),
            kind,
        }
    }

    #[test]
    fn line_string_uses_lng_as_x() {
        let line = result(RouteKind::Direct).route.line_string();
        assert!((line.0[0].x - 123.88).abs() < f64::EPSILON);
        assert!((line.0[0].y - 10.30).abs() < f64::EPSILON);
    }

    #[test]
    fn failed_state_exposes_fallback_route() {
        let state = RouteState::RouteFailed {
            request: result(RouteKind::HazardFallback).request,
            fallback: Some(result(RouteKind::HazardFallback)),
            message: "No detour avoids the hazard zone".to_string(),
        };
        assert!(state.route().unwrap().is_hazard_warning());
        assert_eq!(state.name(), "route_failed");
    }

    #[test]
    fn request_endpoints() {
        let request = RouteRequest::CampusToAffected {
            campus: campus(),
            target: LatLng { lat: 10.2, lng: 123.8 },
        };
        assert!((request.origin().lat - 10.29).abs() < f64::EPSILON);
        assert!((request.destination().lng - 123.8).abs() < f64::EPSILON);
        assert!(request.student().is_none());
    }

    #[test]
    fn state_serializes_with_tag() {
        let value = serde_json::to_value(RouteState::RouteFound {
            result: result(RouteKind::Detour {
                via: LatLng { lat: 10.0, lng: 123.0 },
            }),
        })
        .unwrap();
        assert_eq!(value["state"], "route_found");
        assert_eq!(value["result"]["kind"]["kind"], "detour");
        assert_eq!(value["result"]["request"]["mode"], "student");
    }
}
