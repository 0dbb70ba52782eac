#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Drawn hazard shapes, the incident zone, and which students they
//! affect.
//!
//! The [`HazardRegister`] holds at most one shape per [`HazardType`] plus
//! at most one circular [`HazardZone`]. The [`AffectedStudentsResolver`]
//! derives the [`AffectedSet`] from the register and the student
//! catalog, recomputing on read whenever either has changed.

pub mod register;
pub mod resolver;

pub use register::{HazardRegister, HazardShape, HazardZone};
pub use resolver::{AffectedSet, AffectedStudentsResolver, recompute};
pub use student_map_hazard_models::HazardType;

use thiserror::Error;

/// Errors from hazard register mutations.
#[derive(Debug, Error)]
pub enum HazardError {
    /// The GeoJSON could not be converted into a geometry.
    #[error("Invalid GeoJSON geometry: {message}")]
    InvalidGeoJson {
        /// Conversion failure details.
        message: String,
    },

    /// The incident zone center or radius is unusable.
    #[error("Invalid hazard zone: center ({lat}, {lng}), radius {radius_km} km")]
    InvalidZone {
        /// Center latitude.
        lat: f64,
        /// Center longitude.
        lng: f64,
        /// Requested radius.
        radius_km: f64,
    },
}
