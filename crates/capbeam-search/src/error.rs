//! Errors raised by the decoders themselves.
//!
//! Failures of the step function are not wrapped: they travel through the
//! decoders as the `anyhow::Error` the step function produced.

/// Contract violations detected in step-function output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("step function returned {actual} {what} for a batch of {expected}")]
    BatchMismatch { what: &'static str, expected: usize, actual: usize },

    #[error("step function returned an empty log-probability row for example {row}")]
    EmptyLogProbs { row: usize },
}
