//! Step boundary detection from the smoothed signal gradient.

use crate::dsp::filters::{gradient, smooth};
use crate::dsp::std_dev;
use crate::types::DetectionParams;

/// Locate step boundaries in `signal`.
///
/// Returns an ascending index list starting at 0 and ending at the last
/// sample index; consecutive pairs delimit one step each. A signal with
/// no transitions above the threshold yields `[0, N-1]`, and a signal
/// shorter than `min_step_width` degrades to that same single step.
pub fn detect_boundaries(signal: &[f64], params: &DetectionParams) -> Vec<usize> {
    let n = signal.len();
    if n < 2 {
        return vec![0; n.min(1)];
    }

    let smoothed = smooth(signal, params.smoothing_width);
    let grad = gradient(&smoothed);

    // Threshold scales with how busy the gradient is overall; a flat
    // signal has zero spread and produces no candidates.
    let threshold = params.detection_threshold * std_dev(&grad);
    let candidates: Vec<usize> = grad
        .iter()
        .enumerate()
        .filter(|&(_, &g)| g > threshold || g < -threshold)
        .map(|(i, _)| i)
        .collect();
    log::debug!(
        "{} gradient candidates above threshold {:.6}",
        candidates.len(),
        threshold
    );

    // Collapse candidate runs closer than half the minimum step width
    // into one boundary at the run midpoint.
    let mut boundaries = vec![0usize];
    let mut i = 0;
    while i < candidates.len() {
        let mut j = i;
        while j + 1 < candidates.len()
            && 2 * (candidates[j + 1] - candidates[j]) < params.min_step_width
        {
            j += 1;
        }
        if j > i {
            boundaries.push(candidates[i] + (candidates[j] - candidates[i]) / 2);
            i = j + 1;
        } else {
            boundaries.push(candidates[i]);
            i += 1;
        }
    }

    if boundaries[boundaries.len() - 1] < n - 1 {
        boundaries.push(n - 1);
    }

    // Width filter: drop boundaries closer than min_step_width to the
    // last kept one, but never lose the final sample index.
    let mut filtered = vec![boundaries[0]];
    for &b in &boundaries[1..] {
        if b - filtered[filtered.len() - 1] >= params.min_step_width {
            filtered.push(b);
        }
    }
    let last = boundaries[boundaries.len() - 1];
    if filtered[filtered.len() - 1] != last {
        filtered.push(last);
    }
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(min_step_width: usize, smoothing_width: usize, threshold: f64) -> DetectionParams {
        DetectionParams {
            min_step_height: 0.1,
            min_step_width,
            smoothing_width,
            detection_threshold: threshold,
        }
    }

    fn square_trace() -> Vec<f64> {
        let mut signal = vec![0.0; 100];
        signal.extend(vec![5.0; 100]);
        signal.extend(vec![0.0; 100]);
        signal
    }

    #[test]
    fn flat_signal_is_one_step() {
        let signal = vec![1.0; 200];
        assert_eq!(detect_boundaries(&signal, &Default::default()), vec![0, 199]);
    }

    #[test]
    fn square_trace_boundaries() {
        let signal = square_trace();
        let boundaries = detect_boundaries(&signal, &params(30, 5, 3.0));
        assert_eq!(boundaries.len(), 4, "boundaries: {boundaries:?}");
        assert_eq!(boundaries[0], 0);
        assert!((boundaries[1] as i64 - 100).abs() <= 5, "boundaries: {boundaries:?}");
        assert!((boundaries[2] as i64 - 200).abs() <= 5, "boundaries: {boundaries:?}");
        assert_eq!(boundaries[3], 299);
    }

    #[test]
    fn boundaries_are_strictly_increasing() {
        let signal: Vec<f64> = (0..400)
            .map(|i| {
                let level = if i < 150 { 1.0 } else if i < 260 { 3.0 } else { 1.5 };
                level + 0.05 * (i as f64 * 0.7).sin()
            })
            .collect();
        let boundaries = detect_boundaries(&signal, &params(30, 5, 3.0));
        assert_eq!(boundaries[0], 0);
        assert_eq!(boundaries[boundaries.len() - 1], 399);
        for pair in boundaries.windows(2) {
            assert!(pair[0] < pair[1], "boundaries: {boundaries:?}");
        }
    }

    #[test]
    fn short_signal_degrades_to_single_step() {
        let signal: Vec<f64> = (0..20).map(|i| (i as f64 * 0.9).sin()).collect();
        assert_eq!(detect_boundaries(&signal, &Default::default()), vec![0, 19]);
    }

    #[test]
    fn tiny_inputs() {
        assert!(detect_boundaries(&[], &Default::default()).is_empty());
        assert_eq!(detect_boundaries(&[1.0], &Default::default()), vec![0]);
        assert_eq!(detect_boundaries(&[1.0, 1.0], &Default::default()), vec![0, 1]);
    }

    #[test]
    fn zero_width_disables_filtering() {
        let signal = square_trace();
        let boundaries = detect_boundaries(&signal, &params(0, 5, 3.0));
        assert_eq!(boundaries[0], 0);
        assert_eq!(boundaries[boundaries.len() - 1], 299);
        for pair in boundaries.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        // Without clustering or width filtering every candidate stands
        // on its own, so more boundaries survive than in the default
        // configuration.
        assert!(boundaries.len() >= 4);
    }
}
