#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Geometry utilities for the student map.
//!
//! Pure, synchronous spatial predicates used by every other crate:
//! great-circle distance, boundary-inclusive point-in-polygon, geodesic
//! polygon area, circle approximation, and route/polygon intersection.
//! Coordinates are [`geo::Point`]s with `x = longitude` and
//! `y = latitude` throughout.
//!
//! [`PointIndex`] wraps an R-tree over student residence points so that
//! polygon and radius queries only run the exact predicate against
//! candidates inside the query envelope.

mod index;

pub use index::PointIndex;

use geo::{
    BoundingRect, Coord, Destination, GeodesicArea, Geometry, Haversine, Intersects, LineString,
    Point, Polygon,
};
use rstar::AABB;

/// Earth radius used for haversine distances, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Number of vertices used to approximate a drawn circle. Changing this
/// changes every stored circle area.
pub const DEFAULT_CIRCLE_STEPS: usize = 64;

/// Great-circle distance between two points in kilometres.
///
/// NaN coordinates propagate to a NaN result.
#[must_use]
pub fn haversine_distance_km(a: Point<f64>, b: Point<f64>) -> f64 {
    let d_lat = (b.y() - a.y()).to_radians();
    let d_lng = (b.x() - a.x()).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.y().to_radians().cos() * b.y().to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Returns the point reached by travelling `distance_km` from `origin`
/// along `bearing_deg` (degrees clockwise from north) on a sphere of
/// mean Earth radius.
#[must_use]
pub fn destination_point(origin: Point<f64>, bearing_deg: f64, distance_km: f64) -> Point<f64> {
    Haversine.destination(origin, bearing_deg, distance_km * 1000.0)
}

/// Boundary-inclusive point-in-polygon test.
///
/// Holes are honoured. Rings with fewer than three distinct vertices
/// never contain anything.
#[must_use]
pub fn point_in_polygon(point: Point<f64>, polygon: &Polygon<f64>) -> bool {
    if !point.x().is_finite() || !point.y().is_finite() {
        return false;
    }
    if distinct_vertices(polygon.exterior()) < 3 {
        return false;
    }
    polygon.intersects(&point.0)
}

/// Geodesic area of a drawn geometry in square kilometres.
///
/// Only areal geometries (polygons, multipolygons, rectangles,
/// triangles) have an area; points, lines, degenerate rings, and
/// geometries with non-finite coordinates return 0.
#[must_use]
pub fn polygon_area_km2(geometry: &Geometry<f64>) -> f64 {
    let square_metres = match geometry {
        Geometry::Polygon(polygon) if distinct_vertices(polygon.exterior()) < 3 => 0.0,
        Geometry::Polygon(polygon) => polygon.geodesic_area_unsigned(),
        Geometry::MultiPolygon(multi) => multi.geodesic_area_unsigned(),
        Geometry::Rect(rect) => rect.to_polygon().geodesic_area_unsigned(),
        Geometry::Triangle(triangle) => triangle.to_polygon().geodesic_area_unsigned(),
        _ => 0.0,
    };
    if square_metres.is_finite() {
        square_metres / 1e6
    } else {
        0.0
    }
}

/// Approximates a circle with a closed polygon of `steps` vertices.
///
/// Vertices are generated counter-clockwise starting due north, so the
/// same inputs always produce the same ring (and the same area).
///
/// A non-finite center or a radius that is not a positive finite number
/// yields an empty polygon with zero area that contains nothing.
#[must_use]
pub fn circle_to_polygon(center: Point<f64>, radius_km: f64, steps: usize) -> Polygon<f64> {
    let valid_center = center.x().is_finite() && center.y().is_finite();
    if !valid_center || !radius_km.is_finite() || radius_km <= 0.0 {
        log::warn!("Invalid circle (center {center:?}, radius {radius_km} km); using an empty shape");
        return Polygon::new(LineString::new(vec![]), vec![]);
    }
    let steps = steps.max(3);

    #[allow(clippy::cast_precision_loss)]
    let mut ring: Vec<Coord<f64>> = (0..steps)
        .map(|i| {
            let bearing = (i as f64) * -360.0 / (steps as f64);
            destination_point(center, bearing, radius_km).0
        })
        .collect();
    ring.push(ring[0]);

    Polygon::new(LineString::from(ring), vec![])
}

/// Returns `true` if any segment of the route crosses the polygon or
/// lies inside it.
#[must_use]
pub fn route_intersects_polygon(route: &LineString<f64>, polygon: &Polygon<f64>) -> bool {
    match route.0.len() {
        0 => false,
        1 => point_in_polygon(Point::from(route.0[0]), polygon),
        _ => distinct_vertices(polygon.exterior()) >= 3 && polygon.intersects(route),
    }
}

/// Bounding envelope of a polygon as an R-tree query box.
#[must_use]
pub fn polygon_envelope(polygon: &Polygon<f64>) -> Option<AABB<[f64; 2]>> {
    polygon
        .bounding_rect()
        .map(|rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]))
}

/// Counts distinct vertices of a ring, ignoring the closing coordinate
/// and consecutive duplicates.
fn distinct_vertices(ring: &LineString<f64>) -> usize {
    let mut coords: Vec<Coord<f64>> = ring.0.clone();
    coords.dedup();
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    coords.len()
}
