//! Detour candidate waypoints around a hazard zone.

use geo::Point;
use student_map_spatial::destination_point;

/// Ring radii as multiples of the zone radius, innermost first.
pub const RING_MULTIPLIERS: [f64; 3] = [1.5, 2.0, 3.0];

/// Candidate waypoints per ring.
pub const CANDIDATES_PER_RING: usize = 16;

/// Candidate waypoints on concentric rings around `center`.
///
/// Inner rings come first; within a ring bearings start at north and
/// increase clockwise in equal steps.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn detour_candidates(center: Point<f64>, radius_km: f64) -> Vec<Point<f64>> {
    let step = 360.0 / CANDIDATES_PER_RING as f64;
    RING_MULTIPLIERS
        .iter()
        .flat_map(|multiplier| {
            let distance = radius_km * multiplier;
            (0..CANDIDATES_PER_RING)
                .map(move |i| destination_point(center, i as f64 * step, distance))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use student_map_spatial::haversine_distance_km;

    #[test]
    fn generates_rings_inner_first() {
        let center = Point::new(123.85, 10.0);
        let candidates = detour_candidates(center, 1.0);
        assert_eq!(candidates.len(), RING_MULTIPLIERS.len() * CANDIDATES_PER_RING);

        for (ring, multiplier) in RING_MULTIPLIERS.iter().enumerate() {
            for candidate in &candidates[ring * CANDIDATES_PER_RING..(ring + 1) * CANDIDATES_PER_RING] {
                let d = haversine_distance_km(center, *candidate);
                assert!((d - multiplier).abs() < 0.01, "ring {ring}: {d}");
            }
        }
    }

    #[test]
    fn first_candidate_is_due_north() {
        let center = Point::new(123.85, 10.0);
        let first = detour_candidates(center, 1.0)[0];
        assert!((first.x() - 123.85).abs() < 1e-9);
        assert!(first.y() > 10.0);
        // The fifth candidate is due east.
        let east = detour_candidates(center, 1.0)[4];
        assert!(east.x() > 123.85);
        assert!((east.y() - 10.0).abs() < 1e-3);
    }
}
