//! Numeric primitives shared by the detection and merge stages.

pub mod dtw;
pub mod filters;
pub mod resample;
pub mod zero_crossing;

/// Population mean. Zero for empty input.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        0.0
    } else {
        data.iter().sum::<f64>() / data.len() as f64
    }
}

/// Population standard deviation. Zero for empty input.
pub fn std_dev(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    (data.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / data.len() as f64).sqrt()
}
