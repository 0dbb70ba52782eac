//! The hazard register.

use std::collections::BTreeMap;

use geo::{Geometry, Point, Polygon};
use student_map_hazard_models::HazardType;
use student_map_spatial::{DEFAULT_CIRCLE_STEPS, circle_to_polygon, polygon_area_km2};

use crate::HazardError;

/// The active shape of one hazard type.
#[derive(Debug, Clone, PartialEq)]
pub struct HazardShape {
    hazard_type: HazardType,
    geometry: Geometry<f64>,
    polygons: Vec<Polygon<f64>>,
    area_km2: f64,
}

impl HazardShape {
    /// Builds a shape, deriving its area and membership polygons.
    ///
    /// Geometries that are not polygons, multipolygons, rectangles, or
    /// triangles have zero area and never contain a student.
    #[must_use]
    pub fn new(hazard_type: HazardType, geometry: Geometry<f64>) -> Self {
        let area_km2 = polygon_area_km2(&geometry);
        let polygons = areal_polygons(&geometry);
        Self {
            hazard_type,
            geometry,
            polygons,
            area_km2,
        }
    }

    /// The hazard type.
    #[must_use]
    pub const fn hazard_type(&self) -> HazardType {
        self.hazard_type
    }

    /// The drawn geometry.
    #[must_use]
    pub const fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    /// Polygons used for membership tests (empty for non-areal shapes).
    #[must_use]
    pub fn polygons(&self) -> &[Polygon<f64>] {
        &self.polygons
    }

    /// Geodesic area in km².
    #[must_use]
    pub const fn area_km2(&self) -> f64 {
        self.area_km2
    }

    /// The shape as a GeoJSON feature, as stored with affected-area
    /// reports.
    #[must_use]
    pub fn to_feature(&self) -> geojson::Feature {
        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&self.geometry))),
            id: None,
            properties: None,
            foreign_members: None,
        }
    }
}

fn areal_polygons(geometry: &Geometry<f64>) -> Vec<Polygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => vec![p.clone()],
        Geometry::MultiPolygon(mp) => mp.0.clone(),
        Geometry::Rect(r) => vec![r.to_polygon()],
        Geometry::Triangle(t) => vec![t.to_polygon()],
        _ => Vec::new(),
    }
}

/// The single circular incident zone used for detours.
#[derive(Debug, Clone, PartialEq)]
pub struct HazardZone {
    /// Circle center.
    pub center: Point<f64>,
    /// Circle radius in kilometres.
    pub radius_km: f64,
    /// 64-step polygon approximation of the circle.
    pub polygon: Polygon<f64>,
}

impl HazardZone {
    /// Builds a zone, approximating the circle with
    /// [`DEFAULT_CIRCLE_STEPS`] vertices.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError::InvalidZone`] if the center is not a valid
    /// coordinate or the radius is not a positive finite number.
    pub fn new(center: Point<f64>, radius_km: f64) -> Result<Self, HazardError> {
        let valid_center = center.x().is_finite()
            && center.y().is_finite()
            && center.x().abs() <= 180.0
            && center.y().abs() <= 90.0;
        if !valid_center || !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(HazardError::InvalidZone {
                lat: center.y(),
                lng: center.x(),
                radius_km,
            });
        }
        Ok(Self {
            center,
            radius_km,
            polygon: circle_to_polygon(center, radius_km, DEFAULT_CIRCLE_STEPS),
        })
    }
}

/// Active hazard shapes (at most one per type) and the optional zone.
///
/// Every mutation bumps [`Self::revision`].
#[derive(Debug, Clone, Default)]
pub struct HazardRegister {
    shapes: BTreeMap<HazardType, HazardShape>,
    zone: Option<HazardZone>,
    revision: u64,
}

impl HazardRegister {
    /// Creates an empty register.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `geometry` as the shape for `hazard_type`, replacing any
    /// previous one. Returns the new shape's area in km².
    pub fn set_shape(&mut self, hazard_type: HazardType, geometry: Geometry<f64>) -> f64 {
        let shape = HazardShape::new(hazard_type, geometry);
        let area = shape.area_km2();
        if shape.polygons().is_empty() {
            log::warn!("{hazard_type} shape is not a polygon; it affects no students");
        }
        if self.shapes.insert(hazard_type, shape).is_some() {
            log::debug!("Replaced previous {hazard_type} shape");
        }
        self.revision += 1;
        log::info!("Set {hazard_type} area: {area:.2} km²");
        area
    }

    /// Stores a circle drawn as a hazard shape, approximated with
    /// [`DEFAULT_CIRCLE_STEPS`] vertices.
    pub fn set_circle_shape(
        &mut self,
        hazard_type: HazardType,
        center: Point<f64>,
        radius_km: f64,
    ) -> f64 {
        let polygon = circle_to_polygon(center, radius_km, DEFAULT_CIRCLE_STEPS);
        self.set_shape(hazard_type, Geometry::Polygon(polygon))
    }

    /// Stores a GeoJSON geometry (e.g. a restored event report) as the
    /// shape for `hazard_type`.
    ///
    /// # Errors
    ///
    /// Returns [`HazardError::InvalidGeoJson`] if the GeoJSON cannot be
    /// converted; the register is left unchanged.
    pub fn set_shape_geojson(
        &mut self,
        hazard_type: HazardType,
        geometry: &geojson::Geometry,
    ) -> Result<f64, HazardError> {
        let geometry = Geometry::<f64>::try_from(geometry.clone()).map_err(|e| {
            HazardError::InvalidGeoJson {
                message: e.to_string(),
            }
        })?;
        Ok(self.set_shape(hazard_type, geometry))
    }

    /// Removes the shape for `hazard_type`. Returns whether one existed.
    pub fn remove_shape(&mut self, hazard_type: HazardType) -> bool {
        let removed = self.shapes.remove(&hazard_type).is_some();
        if removed {
            self.revision += 1;
            log::info!("Removed {hazard_type} shape");
        }
        removed
    }

    /// Sets the incident zone, replacing any previous one.
    ///
    /// # Errors
    ///
    /// See [`HazardZone::new`]; the register is left unchanged on error.
    pub fn set_zone(&mut self, center: Point<f64>, radius_km: f64) -> Result<&HazardZone, HazardError> {
        let zone = HazardZone::new(center, radius_km)?;
        log::info!(
            "Hazard zone set at ({}, {}) with radius {radius_km:.2} km",
            center.y(),
            center.x()
        );
        self.revision += 1;
        Ok(&*self.zone.insert(zone))
    }

    /// Removes the incident zone.
    pub fn clear_zone(&mut self) {
        if self.zone.take().is_some() {
            self.revision += 1;
            log::info!("Hazard zone cleared");
        }
    }

    /// Removes every shape and the zone.
    pub fn reset(&mut self) {
        self.shapes.clear();
        self.zone = None;
        self.revision += 1;
    }

    /// The active shape for `hazard_type`.
    #[must_use]
    pub fn shape(&self, hazard_type: HazardType) -> Option<&HazardShape> {
        self.shapes.get(&hazard_type)
    }

    /// Active shapes in hazard type order.
    pub fn shapes(&self) -> impl Iterator<Item = &HazardShape> {
        self.shapes.values()
    }

    /// The incident zone.
    #[must_use]
    pub const fn zone(&self) -> Option<&HazardZone> {
        self.zone.as_ref()
    }

    /// Sum of all active shape areas in km².
    #[must_use]
    pub fn total_area_km2(&self) -> f64 {
        self.shapes.values().map(HazardShape::area_km2).sum()
    }

    /// Change counter.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }
}
