//! Step detection and merging for piecewise-constant signal traces.
//!
//! Partitions a single-channel recording — a nanopore ionic-current
//! trace, for instance — into contiguous steps, estimates a robust
//! level and stable sub-region for each, and optionally merges
//! adjacent steps that represent the same physical level.
//!
//! The crate is a pure computation core: it performs no I/O, keeps no
//! state between runs, and returns owned data that never aliases the
//! caller's signal buffer. Loading traces and rendering results are
//! the caller's concern, which also makes every entry point safe to
//! call from a worker thread.
//!
//! ```
//! use stepscan::{analyze, DetectionParams, MergeStrategy};
//!
//! let mut signal = vec![0.0; 100];
//! signal.extend(vec![5.0; 100]);
//! signal.extend(vec![0.0; 100]);
//!
//! let params = DetectionParams {
//!     smoothing_width: 5,
//!     ..Default::default()
//! };
//! let analysis = analyze(&signal, &params, &MergeStrategy::None).unwrap();
//! assert_eq!(analysis.steps.len(), 3);
//! ```

pub mod boundary;
pub mod confidence;
pub mod dsp;
pub mod error;
pub mod levels;
pub mod merge;
pub mod pipeline;
pub mod types;

pub use boundary::detect_boundaries;
pub use confidence::{confidence, local_noise};
pub use error::StepError;
pub use levels::estimate_levels;
pub use merge::{merge_adaptive, merge_adjacent, merge_clustering, merge_dtw_shape};
pub use pipeline::{analyze, apply_merge};
pub use types::{
    DetectionParams, MergeStrategy, StepAnalysis, StepFilter, StepRecord, ZeroCrossing,
};
