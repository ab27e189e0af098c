use serde::{Deserialize, Serialize};

/// A sub-sample zero crossing of a smoothed derivative.
///
/// `weight` is normalized against the strongest crossing found in the
/// same detection pass, so weights from different passes are not
/// comparable with each other.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZeroCrossing {
    /// Sub-sample position in absolute signal coordinates.
    pub position: f64,
    /// Relative importance in [0, 1].
    pub weight: f64,
}

/// One detected step: a contiguous run of samples sitting at an
/// approximately constant level.
///
/// The step covers `signal[start..end]`. Level statistics are computed
/// over the stable region `signal[stable_start..=stable_end]`, which
/// excludes transition artifacts at the step edges.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub start: usize,
    pub end: usize,
    pub stable_start: usize,
    pub stable_end: usize,
    /// Mean of the stable-region data.
    pub level: f64,
    /// RMS of the stable-region data about its own mean.
    pub rms: f64,
    /// Max minus min over the stable-region data.
    pub data_range: f64,
    /// Owned copy of `signal[start..end]`.
    pub data: Vec<f64>,
    /// Owned copy of `signal[stable_start..=stable_end]`.
    pub stable_data: Vec<f64>,
    /// Count of second-derivative zero crossings over the full step.
    pub zero_crossings: usize,
    /// Crossings with weight above 0.3, in absolute coordinates.
    pub zero_positions: Vec<ZeroCrossing>,
    /// Whether third-derivative analysis narrowed the stable region.
    pub third_deriv_refined: bool,
    /// Absolute positions of the third-derivative crossings used for
    /// the refinement. Empty when no refinement was found.
    pub third_zero_crossings: Vec<f64>,
    /// Confidence score in [0, 1], populated by the adaptive merge path.
    pub confidence: Option<f64>,
}

impl StepRecord {
    /// Total step length in samples.
    pub fn duration(&self) -> usize {
        self.end - self.start
    }

    /// Stable-region length in samples.
    pub fn stable_duration(&self) -> usize {
        self.stable_end - self.stable_start + 1
    }
}

/// Boundary detection parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionParams {
    /// Part of the accepted parameter set, but not consulted by the
    /// boundary detection algorithm.
    pub min_step_height: f64,
    /// Minimum step width in samples. 0 disables width filtering.
    pub min_step_width: usize,
    /// Gaussian smoothing sigma in samples. 1 or less disables smoothing.
    pub smoothing_width: usize,
    /// Gradient threshold in units of the gradient standard deviation.
    pub detection_threshold: f64,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            min_step_height: 0.1,
            min_step_width: 30,
            smoothing_width: 10,
            detection_threshold: 3.0,
        }
    }
}

/// Strategy for merging adjacent steps that represent the same
/// physical level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MergeStrategy {
    /// Keep the detected steps as they are.
    None,
    /// Merge neighbors whose levels differ by at most `level_tolerance`,
    /// or where either side has an ambiguous boundary (at most one zero
    /// crossing).
    AdjacentTolerance { level_tolerance: f64 },
    /// Density-cluster the step levels and merge index-contiguous runs
    /// that share a cluster.
    Clustering { eps_factor: f64 },
    /// Merge neighbors whose stable regions have similar shape under
    /// dynamic time warping.
    DtwShape {
        similarity_threshold: f64,
        max_sample_points: usize,
    },
    /// Confidence-weighted tolerance merge with zero-crossing and shape
    /// fallbacks, for noisy or poorly separated traces.
    AdaptiveHybrid {
        base_tolerance: f64,
        noise_factor: f64,
        min_confidence: f64,
    },
}

impl MergeStrategy {
    /// Adjacent-tolerance merging with the customary 0.05 tolerance.
    pub fn adjacent() -> Self {
        Self::AdjacentTolerance {
            level_tolerance: 0.05,
        }
    }

    /// Level clustering with the customary 0.5 eps factor.
    pub fn clustering() -> Self {
        Self::Clustering { eps_factor: 0.5 }
    }

    /// DTW shape merging with the customary 0.3 threshold and 100-point
    /// resampling cap.
    pub fn dtw_shape() -> Self {
        Self::DtwShape {
            similarity_threshold: 0.3,
            max_sample_points: 100,
        }
    }

    /// Adaptive-hybrid merging with the customary 0.05/2.0/0.3 settings.
    pub fn adaptive() -> Self {
        Self::AdaptiveHybrid {
            base_tolerance: 0.05,
            noise_factor: 2.0,
            min_confidence: 0.3,
        }
    }
}

impl Default for MergeStrategy {
    fn default() -> Self {
        Self::None
    }
}

/// Result of one analysis run: the boundary list, the un-merged steps,
/// and the merged steps when a strategy was selected.
///
/// The merged list is derived from `steps` and coexists with it; both
/// tile the signal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepAnalysis {
    pub boundaries: Vec<usize>,
    pub steps: Vec<StepRecord>,
    pub merged: Option<Vec<StepRecord>>,
}

/// Band filter over step statistics. `None` bounds are inactive.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StepFilter {
    pub rms_min: Option<f64>,
    pub rms_max: Option<f64>,
    pub range_min: Option<f64>,
    pub range_max: Option<f64>,
}

impl StepFilter {
    /// Whether a step passes every active bound.
    pub fn matches(&self, step: &StepRecord) -> bool {
        if let Some(min) = self.rms_min {
            if step.rms < min {
                return false;
            }
        }
        if let Some(max) = self.rms_max {
            if step.rms > max {
                return false;
            }
        }
        if let Some(min) = self.range_min {
            if step.data_range < min {
                return false;
            }
        }
        if let Some(max) = self.range_max {
            if step.data_range > max {
                return false;
            }
        }
        true
    }

    /// Indices of the steps that pass every active bound.
    pub fn matching_indices(&self, steps: &[StepRecord]) -> Vec<usize> {
        steps
            .iter()
            .enumerate()
            .filter(|(_, step)| self.matches(step))
            .map(|(i, _)| i)
            .collect()
    }
}
