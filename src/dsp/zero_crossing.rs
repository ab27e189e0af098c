//! Sub-sample zero-crossing detection on smoothed derivatives.

use crate::dsp::filters::{gaussian_filter1d, gradient, laplace};
use crate::types::ZeroCrossing;

/// Sigma used to pre-smooth data before differentiation.
const SMOOTH_SIGMA: f64 = 2.0;

/// Scan a derivative series for sign changes.
///
/// Returns `(position, index)` pairs where `position` is the linearly
/// interpolated sub-sample crossing point and `index` is the right-hand
/// sample of the crossing pair. Positions come out in ascending order.
fn sign_crossings(series: &[f64]) -> Vec<(f64, usize)> {
    let mut crossings = Vec::new();
    for i in 1..series.len() {
        let prev = series[i - 1];
        let curr = series[i];
        if (prev < 0.0 && curr >= 0.0) || (prev >= 0.0 && curr < 0.0) {
            let position = if curr != prev {
                (i - 1) as f64 + (-prev) / (curr - prev)
            } else {
                i as f64 - 0.5
            };
            crossings.push((position, i));
        }
    }
    crossings
}

/// Laplacian-of-Gaussian zero-crossing detection.
///
/// Returns the crossing count together with every crossing's sub-sample
/// position and weight. A crossing's weight is the maximum absolute
/// first derivative in a ten-sample window around it, normalized
/// against the largest weight found in this call — weights are only
/// meaningful relative to each other within one invocation.
pub fn log_zero_crossings(data: &[f64]) -> (usize, Vec<ZeroCrossing>) {
    if data.len() < 2 {
        return (0, Vec::new());
    }
    let smoothed = gaussian_filter1d(data, SMOOTH_SIGMA);
    let lap = laplace(&smoothed);
    let grad = gradient(&smoothed);

    let raw = sign_crossings(&lap);
    let weights: Vec<f64> = raw
        .iter()
        .map(|&(_, i)| {
            let lo = i.saturating_sub(5);
            let hi = (i + 5).min(grad.len());
            grad[lo..hi].iter().fold(0.0f64, |acc, g| acc.max(g.abs()))
        })
        .collect();

    let w_max = weights.iter().fold(0.0f64, |acc, &w| acc.max(w));
    let crossings: Vec<ZeroCrossing> = raw
        .into_iter()
        .zip(weights)
        .map(|((position, _), w)| ZeroCrossing {
            position,
            weight: w / (w_max + 1e-10),
        })
        .collect();
    (crossings.len(), crossings)
}

/// Zero crossings of the third derivative of the smoothed input, as
/// sub-sample positions relative to the start of `data`.
///
/// Returns an empty list when the derivative degenerates into
/// non-finite values, so callers treat failures as "no refinement
/// found" rather than aborting.
pub fn third_derivative_crossings(data: &[f64]) -> Vec<f64> {
    if data.len() < 2 {
        return Vec::new();
    }
    let smoothed = gaussian_filter1d(data, SMOOTH_SIGMA);
    let third = gradient(&gradient(&gradient(&smoothed)));
    if third.iter().any(|v| !v.is_finite()) {
        return Vec::new();
    }
    sign_crossings(&third)
        .into_iter()
        .map(|(position, _)| position)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_data_has_no_crossings() {
        let data = vec![3.0; 40];
        let (count, crossings) = log_zero_crossings(&data);
        assert_eq!(count, 0);
        assert!(crossings.is_empty());
        assert!(third_derivative_crossings(&data).is_empty());
    }

    #[test]
    fn too_short_data_is_empty() {
        assert_eq!(log_zero_crossings(&[1.0]).0, 0);
        assert!(third_derivative_crossings(&[1.0]).is_empty());
    }

    #[test]
    fn step_edge_produces_weighted_crossing() {
        let mut data = vec![0.0; 20];
        data.extend(vec![5.0; 20]);

        let (count, crossings) = log_zero_crossings(&data);
        assert!(count >= 1);
        assert_eq!(count, crossings.len());

        // The strongest crossing sits at the edge and carries the top
        // weight after normalization.
        let best = crossings
            .iter()
            .max_by(|a, b| a.weight.partial_cmp(&b.weight).unwrap())
            .unwrap();
        assert!(best.weight > 0.99);
        assert!(
            (best.position - 19.5).abs() < 3.0,
            "edge crossing at {}",
            best.position
        );

        for zc in &crossings {
            assert!(zc.weight >= 0.0 && zc.weight <= 1.0);
            assert!(zc.position >= 0.0 && zc.position <= data.len() as f64 - 1.0);
        }
    }

    #[test]
    fn crossings_are_ascending() {
        let data: Vec<f64> = (0..60)
            .map(|i| (i as f64 * std::f64::consts::PI / 10.0).sin())
            .collect();
        let (_, crossings) = log_zero_crossings(&data);
        assert!(crossings.len() >= 3);
        for pair in crossings.windows(2) {
            assert!(pair[0].position < pair[1].position);
        }
    }

    #[test]
    fn third_derivative_finds_edge_structure() {
        let mut data = vec![0.0; 25];
        data.extend(vec![5.0; 25]);
        let positions = third_derivative_crossings(&data);
        assert!(!positions.is_empty());
        for pair in positions.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        for p in &positions {
            assert!(*p >= 0.0 && *p <= data.len() as f64 - 1.0);
        }
    }
}
