#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! One operator's map session.
//!
//! [`MapSession`] owns the student catalog, filters, hazard register,
//! affected-student resolver, and route planner, and exposes the
//! operations the map view drives: loading data, drawing hazards,
//! requesting routes, and reading back markers and affected sets.

mod session;

pub use session::MapSession;

use std::collections::BTreeMap;

use serde::Serialize;
use student_map_backend::BackendError;
use student_map_hazard::HazardError;
use student_map_hazard_models::HazardType;
use student_map_routing::RoutingError;
use student_map_student_models::{Campus, LatLng, StudentId};
use thiserror::Error;

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A backend request failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// A routing request failed.
    #[error("Routing error: {0}")]
    Routing(#[from] RoutingError),

    /// A hazard could not be stored.
    #[error("Hazard error: {0}")]
    Hazard(#[from] HazardError),

    /// The student is not in the loaded cohort.
    #[error("Unknown student {id}")]
    UnknownStudent {
        /// Requested student.
        id: StudentId,
    },

    /// The event report carries no geometry.
    #[error("Event report {id} has no geometry")]
    EmptyReport {
        /// Report id.
        id: u64,
    },
}

/// Session settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Whether confirmed hazards are posted to the backend.
    pub persist_reports: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            persist_reports: true,
        }
    }
}

impl SessionConfig {
    /// Reads `STUDENT_MAP_PERSIST_REPORTS` (default on; `0`, `false`,
    /// `no`, or `off` disable persistence).
    #[must_use]
    pub fn from_env() -> Self {
        let persist_reports = std::env::var("STUDENT_MAP_PERSIST_REPORTS").map_or(true, |v| {
            !matches!(
                v.trim().to_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            )
        });
        Self { persist_reports }
    }
}

/// What the map view needs to draw one student marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerView {
    /// Student id.
    pub id: StudentId,
    /// Marker location.
    pub location: LatLng,
    /// Cluster label.
    pub cluster: i32,
    /// Course or strand.
    pub track: Option<String>,
    /// Name of the assigned campus.
    pub campus: Option<String>,
    /// Inside at least one hazard shape (drives the marker colour).
    pub affected: bool,
    /// Hazard types containing the student (popup tags).
    pub hazards: Vec<HazardType>,
    /// The student's route is pending or shown.
    pub has_active_route: bool,
}

/// Result of confirming or restoring a hazard shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HazardSummary {
    /// The shape's hazard type.
    pub hazard_type: HazardType,
    /// The shape's area in km².
    pub area_km2: f64,
    /// Students inside the shape.
    pub affected_students: usize,
    /// Sum of all active shape areas in km².
    pub total_area_km2: f64,
    /// Affected students per active hazard type.
    pub counts: BTreeMap<HazardType, usize>,
}

/// Located students near one campus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampusProximity {
    /// The campus.
    pub campus: Campus,
    /// Search radius in metres.
    pub radius_m: f64,
    /// Located students within the radius.
    pub students: usize,
}
