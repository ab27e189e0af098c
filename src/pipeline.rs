//! End-to-end analysis pipeline.

use crate::boundary::detect_boundaries;
use crate::error::StepError;
use crate::levels::estimate_levels;
use crate::merge::{merge_adaptive, merge_adjacent, merge_clustering, merge_dtw_shape};
use crate::types::{DetectionParams, MergeStrategy, StepAnalysis, StepRecord};

/// Run boundary detection, level estimation, and the selected merge
/// strategy over a raw signal.
///
/// Every call computes a fresh result; nothing carries over between
/// runs, and the returned buffers never alias `signal`. The only
/// reportable failure is an empty signal — numeric degeneracies inside
/// the stages recover locally.
pub fn analyze(
    signal: &[f64],
    params: &DetectionParams,
    strategy: &MergeStrategy,
) -> Result<StepAnalysis, StepError> {
    if signal.is_empty() {
        return Err(StepError::EmptySignal);
    }

    let boundaries = detect_boundaries(signal, params);
    let steps = estimate_levels(signal, &boundaries);
    log::debug!(
        "detected {} steps across {} samples",
        steps.len(),
        signal.len()
    );
    let merged = apply_merge(&steps, strategy);

    Ok(StepAnalysis {
        boundaries,
        steps,
        merged,
    })
}

/// Apply a merge strategy to an existing step list.
///
/// Returns `None` for `MergeStrategy::None`, so callers can tell "no
/// merging requested" apart from a merge that changed nothing.
pub fn apply_merge(steps: &[StepRecord], strategy: &MergeStrategy) -> Option<Vec<StepRecord>> {
    match strategy {
        MergeStrategy::None => None,
        MergeStrategy::AdjacentTolerance { level_tolerance } => {
            Some(merge_adjacent(steps, *level_tolerance))
        }
        MergeStrategy::Clustering { eps_factor } => Some(merge_clustering(steps, *eps_factor)),
        MergeStrategy::DtwShape {
            similarity_threshold,
            max_sample_points,
        } => Some(merge_dtw_shape(steps, *similarity_threshold, *max_sample_points)),
        MergeStrategy::AdaptiveHybrid {
            base_tolerance,
            noise_factor,
            min_confidence,
        } => Some(merge_adaptive(
            steps,
            *base_tolerance,
            *noise_factor,
            *min_confidence,
        )),
    }
}
