use crate::confidence::{confidence, local_noise};
use crate::dsp::resample::resample;
use crate::merge::{length_ratio, merge_sequential, normalize, MAX_LENGTH_RATIO};
use crate::types::StepRecord;

/// Weight above which a zero crossing marks a clearly defined boundary.
const IMPORTANT_WEIGHT: f64 = 0.4;
/// Steps longer than this qualify for the shape-similarity fallback.
const SHAPE_MIN_DURATION: usize = 50;
/// Resampling cap for the shape-similarity check.
const SHAPE_MAX_SAMPLES: usize = 50;

/// Confidence-weighted merge for noisy or poorly separated traces.
///
/// The level tolerance widens with the local noise estimate, and again
/// when either side scores below `min_confidence`. Steps whose
/// boundaries never settled (no important zero crossing on either
/// side) merge outright, as do long steps whose stable regions are
/// strongly correlated in shape. Confidence is recomputed for every
/// output record.
pub fn merge_adaptive(
    steps: &[StepRecord],
    base_tolerance: f64,
    noise_factor: f64,
    min_confidence: f64,
) -> Vec<StepRecord> {
    let mut merged = merge_sequential(steps, |last, step| {
        let noise = local_noise(step).max(local_noise(last));
        let mut tolerance = base_tolerance * (1.0 + noise_factor * noise);

        let confidence_factor = confidence(step).min(confidence(last));
        if confidence_factor < min_confidence {
            tolerance *= min_confidence / confidence_factor;
        }

        if (step.level - last.level).abs() <= tolerance {
            return true;
        }
        if lacks_important_crossing(last) && lacks_important_crossing(step) {
            return true;
        }
        step.duration() > SHAPE_MIN_DURATION
            && last.duration() > SHAPE_MIN_DURATION
            && shapes_correlate(last, step)
    });

    for record in &mut merged {
        record.confidence = Some(confidence(record));
    }
    log::debug!("adaptive merge: {} -> {} steps", steps.len(), merged.len());
    merged
}

fn lacks_important_crossing(step: &StepRecord) -> bool {
    !step
        .zero_positions
        .iter()
        .any(|zc| zc.weight > IMPORTANT_WEIGHT)
}

/// Correlation / MSE shape check on mean- and std-normalized stable
/// regions, both resampled to at most `SHAPE_MAX_SAMPLES` points.
/// Comparison failures count as dissimilar.
fn shapes_correlate(a: &StepRecord, b: &StepRecord) -> bool {
    let d1 = &a.stable_data;
    let d2 = &b.stable_data;
    if d1.is_empty() || d2.is_empty() {
        return false;
    }
    if length_ratio(d1.len(), d2.len()) > MAX_LENGTH_RATIO {
        return false;
    }

    let sample_len = SHAPE_MAX_SAMPLES.min(d1.len().max(d2.len()));
    let (longer, shorter) = if d1.len() >= d2.len() {
        (d1, d2)
    } else {
        (d2, d1)
    };
    let shorter_norm = normalize(&resample(shorter, sample_len));
    let longer_norm = normalize(&resample(longer, sample_len));

    let correlation = pearson(&shorter_norm, &longer_norm);
    let mse = shorter_norm
        .iter()
        .zip(&longer_norm)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        / sample_len as f64;

    (correlation.is_finite() && correlation > 0.7) || mse < 0.4
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        cov += (a - mx) * (b - my);
        var_x += (a - mx) * (a - mx);
        var_y += (b - my) * (b - my);
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}
