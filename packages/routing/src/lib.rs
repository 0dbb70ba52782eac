#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Student-to-campus routing with hazard-zone detours.
//!
//! The [`RoutePlanner`] owns the route state machine and publishes every
//! transition on a `tokio::sync::watch` channel. Each request yields a
//! [`RouteTicket`] that runs the network part of the search against a
//! [`RoutingService`] (normally the [`OsrmClient`]) and applies its
//! result only while it is still the newest request.

pub mod detour;
pub mod evaluation;
pub mod osrm;
pub mod planner;

pub use osrm::OsrmClient;
pub use planner::{RoutePlanner, RouteTicket};

use student_map_routing_models::Route;
use student_map_student_models::LatLng;
use thiserror::Error;

/// Errors from routing requests.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// HTTP request to the routing service failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The routing service rejected the request.
    #[error("Routing service returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Service error message.
        message: String,
    },

    /// The routing service response could not be interpreted.
    #[error("Routing response parse error: {message}")]
    Parse {
        /// What went wrong.
        message: String,
    },

    /// The routing service found no route between the waypoints.
    #[error("No route found")]
    NoRoute,

    /// The student has no usable coordinates.
    #[error("Student has invalid coordinates")]
    InvalidCoordinates,

    /// No campus could be determined for the request.
    #[error("No campus available for this route")]
    NoCampus,

    /// Campus-to-affected routing needs an active hazard zone.
    #[error("No hazard zone is active")]
    NoHazardZone,

    /// A newer request or a hazard edit replaced this one.
    #[error("Route request was superseded")]
    Superseded,
}

/// A routing backend.
#[async_trait::async_trait]
pub trait RoutingService: Send + Sync {
    /// Requests routes through `waypoints` in order.
    ///
    /// Returns at least one route; the first is the primary route and
    /// the rest are alternatives (only when `alternatives` is set).
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::NoRoute`] if the service found no route,
    /// or a transport/parse error if the request failed.
    async fn route(
        &self,
        waypoints: &[LatLng],
        alternatives: bool,
    ) -> Result<Vec<Route>, RoutingError>;
}
