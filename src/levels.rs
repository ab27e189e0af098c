//! Per-step level estimation and stable-region refinement.
//!
//! For each boundary pair the estimator looks for the sub-interval
//! where the step has settled: second-derivative zero crossings mark
//! where transition curvature dies out, and a third-derivative pass
//! narrows the interval further when enough structure is present.
//! Statistics (level, RMS, range) come from that stable region only.

use crate::dsp::mean;
use crate::dsp::zero_crossing::{log_zero_crossings, third_derivative_crossings};
use crate::types::{StepRecord, ZeroCrossing};

/// Steps shorter than this skip stable-region analysis entirely.
const MIN_ANALYSIS_LEN: usize = 10;
/// Weight above which a zero crossing counts as important.
const IMPORTANT_WEIGHT: f64 = 0.3;

/// Mean, mean-subtracted RMS, and max-min range of a data slice.
pub(crate) fn stable_stats(data: &[f64]) -> (f64, f64, f64) {
    let m = mean(data);
    let rms = (data.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / data.len() as f64).sqrt();
    let max = data.iter().fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
    let min = data.iter().fold(f64::INFINITY, |acc, &v| acc.min(v));
    (m, rms, max - min)
}

/// Build a step record for every consecutive boundary pair.
///
/// Degenerate pairs (`end <= start`, possible only when width filtering
/// is disabled) are skipped rather than producing empty records.
pub fn estimate_levels(signal: &[f64], boundaries: &[usize]) -> Vec<StepRecord> {
    let mut steps = Vec::new();
    for pair in boundaries.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        if end <= start {
            continue;
        }
        let full = &signal[start..end];
        let duration = end - start;

        let (zc_count, crossings) = log_zero_crossings(full);
        // Important crossings in absolute coordinates; the scan already
        // emits them in ascending position order.
        let important: Vec<ZeroCrossing> = crossings
            .iter()
            .filter(|zc| zc.weight > IMPORTANT_WEIGHT)
            .map(|zc| ZeroCrossing {
                position: start as f64 + zc.position,
                weight: zc.weight,
            })
            .collect();

        let (mut stable_start, mut stable_end) = if duration >= MIN_ANALYSIS_LEN {
            initial_stable_region(start, end, duration, &important)
        } else {
            (start, end - 1)
        };

        let mut refined = false;
        let mut third_crossings = Vec::new();
        if duration >= MIN_ANALYSIS_LEN && stable_end - stable_start + 1 > MIN_ANALYSIS_LEN {
            let initial = &signal[stable_start..=stable_end];
            if let Some((new_start, new_end, positions)) =
                refine_with_third_derivative(initial, stable_start, stable_end)
            {
                stable_start = new_start;
                stable_end = new_end;
                refined = true;
                third_crossings = positions;
            }
        }

        let stable = &signal[stable_start..=stable_end];
        let (level, rms, data_range) = stable_stats(stable);

        steps.push(StepRecord {
            start,
            end,
            stable_start,
            stable_end,
            level,
            rms,
            data_range,
            data: full.to_vec(),
            stable_data: stable.to_vec(),
            zero_crossings: zc_count,
            zero_positions: important,
            third_deriv_refined: refined,
            third_zero_crossings: third_crossings,
            confidence: None,
        });
    }
    steps
}

/// Pick the stable region from the important second-derivative
/// crossings of a step spanning `[start, end)`.
fn initial_stable_region(
    start: usize,
    end: usize,
    duration: usize,
    important: &[ZeroCrossing],
) -> (usize, usize) {
    match important.len() {
        // No settled structure found; keep the whole step.
        0 => (start, end - 1),
        // A single crossing anchors the region around itself.
        1 => {
            let center = important[0].position as usize;
            let half = duration / 4;
            let lo = center.saturating_sub(half).max(start);
            let hi = (center + half).min(end - 1);
            (lo, hi)
        }
        // Span from the first to the last important crossing, unless
        // they collapse onto the same sample.
        _ => {
            let first = important[0].position as usize;
            let last = important[important.len() - 1].position as usize;
            if first < last {
                (first.max(start), last.min(end - 1))
            } else {
                (start, end - 1)
            }
        }
    }
}

/// Narrow a stable region using zero crossings of the third derivative.
///
/// With four or more crossings the second and second-to-last bound the
/// new region; with two or three the first and last do. Fewer crossings
/// mean no refinement. Bounds never leave the original region.
fn refine_with_third_derivative(
    data: &[f64],
    start: usize,
    end: usize,
) -> Option<(usize, usize, Vec<f64>)> {
    let absolute: Vec<f64> = third_derivative_crossings(data)
        .into_iter()
        .map(|p| start as f64 + p)
        .collect();
    let (lo, hi) = match absolute.len() {
        0 | 1 => return None,
        2 | 3 => (absolute[0], absolute[absolute.len() - 1]),
        _ => (absolute[1], absolute[absolute.len() - 2]),
    };
    let new_start = (lo as usize).max(start);
    let new_end = (hi as usize).min(end);
    Some((new_start, new_end, absolute))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_trace() -> Vec<f64> {
        let mut signal = vec![0.0; 100];
        signal.extend(vec![5.0; 100]);
        signal.extend(vec![0.0; 100]);
        signal
    }

    #[test]
    fn flat_step_uses_whole_region() {
        let signal = vec![1.5; 100];
        let steps = estimate_levels(&signal, &[0, 100]);
        assert_eq!(steps.len(), 1);

        let step = &steps[0];
        assert_eq!((step.start, step.end), (0, 100));
        assert_eq!((step.stable_start, step.stable_end), (0, 99));
        assert_eq!(step.level, 1.5);
        assert_eq!(step.rms, 0.0);
        assert_eq!(step.data_range, 0.0);
        assert_eq!(step.zero_crossings, 0);
        assert!(step.zero_positions.is_empty());
        assert!(!step.third_deriv_refined);
        assert!(step.third_zero_crossings.is_empty());
        assert_eq!(step.data.len(), 100);
        assert_eq!(step.stable_data.len(), 100);
    }

    #[test]
    fn short_step_skips_analysis() {
        let signal: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let steps = estimate_levels(&signal, &[0, 5, 20]);
        assert_eq!(steps.len(), 2);
        assert_eq!((steps[0].stable_start, steps[0].stable_end), (0, 4));
        assert!(!steps[0].third_deriv_refined);
    }

    #[test]
    fn record_invariants_hold() {
        let signal = square_trace();
        let steps = estimate_levels(&signal, &[0, 95, 205, 299]);
        for step in &steps {
            assert!(step.start < step.end);
            assert!(step.start <= step.stable_start);
            assert!(step.stable_start <= step.stable_end);
            assert!(step.stable_end <= step.end - 1);
            assert_eq!(step.data.len(), step.duration());
            assert_eq!(step.stable_data.len(), step.stable_duration());
        }
    }

    #[test]
    fn records_tile_the_boundary_range() {
        let signal = square_trace();
        let boundaries = [0usize, 95, 205, 299];
        let steps = estimate_levels(&signal, &boundaries);
        assert_eq!(steps.len(), 3);
        for (step, pair) in steps.iter().zip(boundaries.windows(2)) {
            assert_eq!(step.start, pair[0]);
            assert_eq!(step.end, pair[1]);
        }

        let rebuilt: Vec<f64> = steps.iter().flat_map(|s| s.data.iter().copied()).collect();
        assert_eq!(rebuilt, signal[0..299].to_vec());
    }

    #[test]
    fn stable_region_avoids_transition_edges() {
        // Middle step carries both transition edges; its stable region
        // should settle on the flat plateau between them.
        let signal = square_trace();
        let steps = estimate_levels(&signal, &[0, 95, 205, 299]);
        let middle = &steps[1];
        assert!(
            (middle.level - 5.0).abs() < 1.0,
            "middle level {}",
            middle.level
        );
        assert!(middle.rms < 1.5, "middle rms {}", middle.rms);
        assert!(middle.zero_crossings >= 1);
        for zc in &middle.zero_positions {
            assert!(zc.position >= 95.0 && zc.position <= 204.0);
        }
    }

    #[test]
    fn degenerate_pairs_are_skipped() {
        let signal = vec![1.0; 50];
        let steps = estimate_levels(&signal, &[0, 20, 20, 49]);
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn zero_positions_use_absolute_coordinates() {
        let mut signal = vec![0.0; 60];
        signal.extend(vec![4.0; 60]);
        // Second step starts at 50, so its crossings must sit past 50.
        let steps = estimate_levels(&signal, &[0, 50, 119]);
        let second = &steps[1];
        assert!(!second.zero_positions.is_empty());
        for zc in &second.zero_positions {
            assert!(
                zc.position >= 50.0 && zc.position <= 118.0,
                "crossing at {}",
                zc.position
            );
        }
    }
}
