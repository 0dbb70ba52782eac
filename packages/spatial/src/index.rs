//! R-tree point index over residence locations.

use geo::{Point, Polygon};
use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};

use crate::{EARTH_RADIUS_KM, haversine_distance_km, point_in_polygon, polygon_envelope};

type IndexedPoint<T> = GeomWithData<[f64; 2], T>;

/// Spatial index of points tagged with a payload (usually a catalog
/// position).
///
/// Built once per catalog load. Queries narrow candidates with the
/// R-tree envelope and then apply the exact predicate, so results are
/// identical to a linear scan.
pub struct PointIndex<T> {
    tree: RTree<IndexedPoint<T>>,
}

impl<T> PointIndex<T> {
    /// Bulk-loads an index from `(point, payload)` pairs.
    ///
    /// Points with non-finite coordinates are skipped.
    #[must_use]
    pub fn new(points: impl IntoIterator<Item = (Point<f64>, T)>) -> Self {
        let entries: Vec<IndexedPoint<T>> = points
            .into_iter()
            .filter(|(p, _)| p.x().is_finite() && p.y().is_finite())
            .map(|(p, data)| GeomWithData::new([p.x(), p.y()], data))
            .collect();
        log::debug!("Indexed {} points", entries.len());
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Returns `true` if no points are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Payloads of every point inside the polygon (boundary inclusive).
    #[must_use]
    pub fn within_polygon(&self, polygon: &Polygon<f64>) -> Vec<&T> {
        let Some(envelope) = polygon_envelope(polygon) else {
            return Vec::new();
        };

        self.tree
            .locate_in_envelope(&envelope)
            .filter(|entry| {
                let [x, y] = *entry.geom();
                point_in_polygon(Point::new(x, y), polygon)
            })
            .map(|entry| &entry.data)
            .collect()
    }

    /// Payloads of every point within `radius_km` (haversine) of `center`.
    #[must_use]
    pub fn within_radius_km(&self, center: Point<f64>, radius_km: f64) -> Vec<&T> {
        if radius_km.is_nan() || radius_km < 0.0 {
            return Vec::new();
        }

        // Degree envelope padded slightly so the haversine filter decides
        // the boundary, not the box.
        let lat_delta = (radius_km / EARTH_RADIUS_KM).to_degrees() * 1.01;
        let cos_lat = center.y().to_radians().cos().abs().max(1e-6);
        let lng_delta = (lat_delta / cos_lat).min(180.0);

        let envelope = AABB::from_corners(
            [center.x() - lng_delta, center.y() - lat_delta],
            [center.x() + lng_delta, center.y() + lat_delta],
        );

        self.tree
            .locate_in_envelope(&envelope)
            .filter(|entry| {
                let [x, y] = *entry.geom();
                haversine_distance_km(center, Point::new(x, y)) <= radius_km
            })
            .map(|entry| &entry.data)
            .collect()
    }
}

impl<T> std::fmt::Debug for PointIndex<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointIndex")
            .field("points", &self.tree.size())
            .finish()
    }
}
