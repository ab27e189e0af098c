//! Per-step confidence scoring and local-noise estimation.

use crate::dsp::{mean, std_dev};
use crate::types::StepRecord;

/// Guard against division by effectively-zero levels and RMS values.
const EPS: f64 = 1e-10;

/// Estimate the local noise of a step as a value in [0, 1].
///
/// Takes the worst of three indicators: RMS relative to the level, data
/// range relative to the level, and the spread of the zero-crossing
/// weights. Falls back to 0.5 when nothing is computable.
pub fn local_noise(step: &StepRecord) -> f64 {
    let mut indicators = Vec::new();

    if step.level.abs() > EPS {
        indicators.push((step.rms / step.level.abs()).min(1.0));
    } else {
        indicators.push(step.rms.min(1.0));
    }

    if step.level.abs() > EPS {
        indicators.push((step.data_range / step.level.abs() / 2.0).min(1.0));
    }

    if !step.zero_positions.is_empty() {
        let weights: Vec<f64> = step.zero_positions.iter().map(|zc| zc.weight).collect();
        let m = mean(&weights);
        if m > 0.0 {
            indicators.push((std_dev(&weights) / m).min(1.0));
        }
    }

    if indicators.is_empty() {
        return 0.5;
    }
    indicators.into_iter().fold(0.0, f64::max)
}

/// Score how trustworthy a step's boundaries and level are, in [0, 1].
///
/// Five multiplicative factors: duration, zero-crossing count,
/// signal-to-noise ratio, range-to-level ratio, and stable-region
/// fraction. Each factor only ever lowers the score.
pub fn confidence(step: &StepRecord) -> f64 {
    let mut confidence = 1.0;

    let duration = step.duration() as f64;
    let duration_score = (duration / 100.0).min(1.0);
    confidence *= 0.5 + 0.5 * duration_score;

    // One crossing or fewer means the step never visibly settled.
    if step.zero_crossings <= 1 {
        confidence *= 0.5;
    } else {
        let zero_score = (step.zero_crossings as f64 / 5.0).min(1.0);
        confidence *= 0.7 + 0.3 * zero_score;
    }

    if step.rms > EPS {
        let snr_score = (step.level.abs() / step.rms / 10.0).min(1.0);
        confidence *= 0.6 + 0.4 * snr_score;
    }

    if step.level.abs() > EPS {
        let range_ratio = step.data_range / step.level.abs();
        let range_score = (1.0 - (range_ratio / 2.0).min(1.0)).max(0.0);
        confidence *= 0.8 + 0.2 * range_score;
    }

    if step.duration() > 0 {
        let stable_ratio = step.stable_duration() as f64 / duration;
        confidence *= 0.7 + 0.3 * stable_ratio;
    }

    confidence
}
