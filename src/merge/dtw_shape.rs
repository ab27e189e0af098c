use crate::dsp::dtw::dtw_distance;
use crate::dsp::resample::resample;
use crate::merge::{length_ratio, merge_sequential, normalize, MAX_LENGTH_RATIO};
use crate::types::StepRecord;

/// Merge neighbors whose stable regions have similar shape under
/// dynamic time warping.
///
/// Both candidates are Fourier-resampled to a common length (capped at
/// `max_sample_points`), z-score normalized to strip level and scale,
/// and compared by DTW distance per sample point. Steps whose stable
/// lengths differ by more than a factor of five never merge, whatever
/// the threshold.
pub fn merge_dtw_shape(
    steps: &[StepRecord],
    similarity_threshold: f64,
    max_sample_points: usize,
) -> Vec<StepRecord> {
    let merged = merge_sequential(steps, |last, step| {
        shapes_similar(
            &last.stable_data,
            &step.stable_data,
            similarity_threshold,
            max_sample_points,
        )
    });
    log::debug!("dtw merge: {} -> {} steps", steps.len(), merged.len());
    merged
}

/// Compare two stable regions. Failures (empty data, non-finite
/// distance) are conservative: not similar, do not merge.
fn shapes_similar(a: &[f64], b: &[f64], threshold: f64, max_len: usize) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if length_ratio(a.len(), b.len()) > MAX_LENGTH_RATIO {
        return false;
    }

    let sample_len = max_len.min(a.len().max(b.len()));
    if sample_len == 0 {
        return false;
    }
    let a_norm = normalize(&resample(a, sample_len));
    let b_norm = normalize(&resample(b, sample_len));

    let distance = dtw_distance(&a_norm, &b_norm);
    if !distance.is_finite() {
        return false;
    }
    distance / (sample_len as f64) < threshold
}
