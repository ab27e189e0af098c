use crate::merge::merge_sequential;
use crate::types::StepRecord;

/// Merge neighbors whose levels are within `level_tolerance`, or where
/// either side has at most one zero crossing — an ambiguous boundary
/// that should not stand alone.
pub fn merge_adjacent(steps: &[StepRecord], level_tolerance: f64) -> Vec<StepRecord> {
    let merged = merge_sequential(steps, |last, step| {
        (step.level - last.level).abs() <= level_tolerance
            || step.zero_crossings <= 1
            || last.zero_crossings <= 1
    });
    log::debug!("adjacent merge: {} -> {} steps", steps.len(), merged.len());
    merged
}
