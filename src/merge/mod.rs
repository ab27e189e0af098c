//! Step merging strategies.
//!
//! Four alternatives for combining steps that represent the same
//! physical level. All strategies leave their input untouched and build
//! fresh records whose buffers never alias the inputs'.

mod adaptive;
mod adjacent;
mod clustering;
mod dtw_shape;

pub use adaptive::merge_adaptive;
pub use adjacent::merge_adjacent;
pub use clustering::merge_clustering;
pub use dtw_shape::merge_dtw_shape;

use crate::dsp::{mean, std_dev};
use crate::levels::stable_stats;
use crate::types::StepRecord;

/// Stable regions whose lengths differ by more than this factor never
/// merge on shape evidence alone.
pub(crate) const MAX_LENGTH_RATIO: f64 = 5.0;
/// Standard deviations below this are treated as zero during
/// normalization.
pub(crate) const STD_FLOOR: f64 = 1e-10;

/// Combine an ordered group of steps into one record.
///
/// Data buffers are concatenated in order and the level statistics
/// recomputed from the combined stable data. Zero-crossing information
/// is the union of the constituents'; third-derivative refinement
/// metadata describes single detected steps only and is reset.
pub(crate) fn combine_group(group: &[&StepRecord]) -> StepRecord {
    let first = group[0];
    let last = group[group.len() - 1];

    let data: Vec<f64> = group.iter().flat_map(|s| s.data.iter().copied()).collect();
    let stable_data: Vec<f64> = group
        .iter()
        .flat_map(|s| s.stable_data.iter().copied())
        .collect();
    let (level, rms, data_range) = stable_stats(&stable_data);

    StepRecord {
        start: first.start,
        end: last.end,
        stable_start: first.stable_start,
        stable_end: last.stable_end,
        level,
        rms,
        data_range,
        data,
        stable_data,
        zero_crossings: group.iter().map(|s| s.zero_crossings).sum(),
        zero_positions: group
            .iter()
            .flat_map(|s| s.zero_positions.iter().cloned())
            .collect(),
        third_deriv_refined: false,
        third_zero_crossings: Vec::new(),
        confidence: None,
    }
}

/// Left-to-right merge scan: each step either joins the group under
/// construction or starts a new one. The predicate sees the group
/// built so far (with recomputed statistics) and the next candidate.
pub(crate) fn merge_sequential<F>(steps: &[StepRecord], mut should_merge: F) -> Vec<StepRecord>
where
    F: FnMut(&StepRecord, &StepRecord) -> bool,
{
    if steps.len() < 2 {
        return steps.to_vec();
    }
    let mut merged = Vec::with_capacity(steps.len());
    let mut current = steps[0].clone();
    for step in &steps[1..] {
        if should_merge(&current, step) {
            current = combine_group(&[&current, step]);
        } else {
            merged.push(std::mem::replace(&mut current, step.clone()));
        }
    }
    merged.push(current);
    merged
}

/// Length ratio between two stable regions, saturating the denominator
/// at one sample.
pub(crate) fn length_ratio(len1: usize, len2: usize) -> f64 {
    let longest = len1.max(len2) as f64;
    let shortest = len1.min(len2).max(1) as f64;
    longest / shortest
}

/// Z-score normalize: subtract the mean, divide by the standard
/// deviation unless it is effectively zero.
pub(crate) fn normalize(data: &[f64]) -> Vec<f64> {
    let m = mean(data);
    let sd = std_dev(data);
    if sd > STD_FLOOR {
        data.iter().map(|v| (v - m) / sd).collect()
    } else {
        data.iter().map(|v| v - m).collect()
    }
}
