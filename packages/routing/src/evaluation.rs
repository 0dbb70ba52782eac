//! Comparison metrics for a route and its alternatives.

use student_map_routing_models::{MetricStats, RouteEvaluation, RouteResult};

/// Evaluates the primary route of `result` together with its
/// alternatives.
#[must_use]
pub fn evaluate_route(result: &RouteResult) -> RouteEvaluation {
    let distances: Vec<f64> = result.all_routes().map(|r| r.distance_km()).collect();
    let times: Vec<f64> = result.all_routes().map(|r| r.duration_min()).collect();
    evaluate(&distances, &times)
}

/// Evaluates routes given their distances (km) and times (minutes).
///
/// Both slices must be non-empty and of equal length; extra entries in
/// the longer slice are ignored.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn evaluate(distances_km: &[f64], times_min: &[f64]) -> RouteEvaluation {
    let count = distances_km.len().min(times_min.len());
    let distances = &distances_km[..count];
    let times = &times_min[..count];

    let alternative_count = count.saturating_sub(1);
    let diversity_score = safe_div(alternative_count as f64, count as f64, 0.0);

    let time_per_km: Vec<f64> = times
        .iter()
        .zip(distances)
        .filter(|(_, d)| **d > 0.0)
        .map(|(t, d)| t / d)
        .collect();
    let average_time_per_km = (!time_per_km.is_empty()).then(|| mean(&time_per_km));
    let congestion_score = (!time_per_km.is_empty()).then(|| {
        let min = time_per_km.iter().copied().fold(f64::INFINITY, f64::min);
        let max = time_per_km.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        safe_div(max, min, 1.0)
    });

    let distance_stats = stats(distances);
    let time_stats = stats(times);

    let time_eff = safe_div(time_stats.min, time_stats.avg, 1.0);
    let dist_eff = safe_div(distance_stats.min, distance_stats.avg, 1.0);
    let congestion_factor = congestion_score.map_or(1.0, |c| safe_div(1.0, c, 1.0));
    let quality_score = (time_eff * 0.5 + dist_eff * 0.3 + congestion_factor * 0.2) * 10.0;

    let best_route_index = times
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &t)| match best {
            Some((_, b)) if b <= t => best,
            _ => Some((i, t)),
        })
        .map_or(0, |(i, _)| i);

    RouteEvaluation {
        route_count: count,
        alternative_count,
        diversity_score,
        distance_stats,
        time_stats,
        time_per_km,
        average_time_per_km,
        congestion_score,
        quality_score,
        best_route_index,
    }
}

fn safe_div(numerator: f64, denominator: f64, default: f64) -> f64 {
    if denominator == 0.0 {
        default
    } else {
        numerator / denominator
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[allow(clippy::cast_precision_loss)]
fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Linear-interpolated percentile of sorted values.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let k = (sorted.len() - 1) as f64 * (p / 100.0);
    let floor = k.floor();
    let ceil = k.ceil();
    if (ceil - floor).abs() < f64::EPSILON {
        return sorted[k as usize];
    }
    sorted[floor as usize] * (ceil - k) + sorted[ceil as usize] * (k - floor)
}

fn stats(values: &[f64]) -> MetricStats {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let (min, max, avg) = if values.is_empty() {
        (0.0, 0.0, 0.0)
    } else {
        (sorted[0], sorted[sorted.len() - 1], mean(values))
    };
    let std_dev = sample_std_dev(values);

    MetricStats {
        values: values.to_vec(),
        min,
        max,
        avg,
        std_dev,
        range: max - min,
        p25: percentile(&sorted, 25.0),
        p50: percentile(&sorted, 50.0),
        p75: percentile(&sorted, 75.0),
        coefficient_of_variation: safe_div(std_dev, avg, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn single_route() {
        let e = evaluate(&[5.0], &[10.0]);
        assert_eq!(e.alternative_count, 0);
        assert!(close(e.diversity_score, 0.0));
        assert!(close(e.time_stats.std_dev, 0.0));
        assert!(close(e.congestion_score.unwrap(), 1.0));
        assert!(close(e.quality_score, 10.0));
        assert_eq!(e.best_route_index, 0);
    }

    #[test]
    fn three_routes() {
        let e = evaluate(&[4.0, 5.0, 6.0], &[12.0, 10.0, 15.0]);
        assert_eq!(e.route_count, 3);
        assert_eq!(e.alternative_count, 2);
        assert!(close(e.diversity_score, 2.0 / 3.0));
        assert!(close(e.distance_stats.avg, 5.0));
        assert!(close(e.distance_stats.std_dev, 1.0));
        assert!(close(e.distance_stats.p25, 4.5));
        assert!(close(e.distance_stats.p50, 5.0));
        assert!(close(e.distance_stats.range, 2.0));
        assert!(close(e.distance_stats.coefficient_of_variation, 0.2));
        // 12/4 = 3.0, 10/5 = 2.0, 15/6 = 2.5 minutes per km.
        assert!(close(e.congestion_score.unwrap(), 1.5));
        assert!(close(e.average_time_per_km.unwrap(), 2.5));
        assert_eq!(e.best_route_index, 1);

        let time_eff = 10.0 / (37.0 / 3.0);
        let dist_eff = 4.0 / 5.0;
        let expected = (time_eff * 0.5 + dist_eff * 0.3 + (1.0 / 1.5) * 0.2) * 10.0;
        assert!(close(e.quality_score, expected));
    }

    #[test]
    fn zero_distance_routes_are_excluded_from_congestion() {
        let e = evaluate(&[0.0, 2.0], &[1.0, 4.0]);
        assert_eq!(e.time_per_km, vec![2.0]);
        assert!(close(e.congestion_score.unwrap(), 1.0));
    }

    #[test]
    fn ties_pick_first_fastest() {
        let e = evaluate(&[3.0, 2.0], &[5.0, 5.0]);
        assert_eq!(e.best_route_index, 0);
    }
}
