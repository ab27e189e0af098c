use thiserror::Error;

/// Failures that propagate out of the analysis pipeline.
///
/// Degenerate numeric conditions (flat gradients, zero level variance,
/// failed shape comparisons) are recovered where they occur and never
/// surface here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StepError {
    /// The input signal contained no samples.
    #[error("signal is empty")]
    EmptySignal,
}
