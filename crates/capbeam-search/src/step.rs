//! Contract between the decoders and the batched neural step function.

use anyhow::Result;

use crate::{RecurrentState, SearchError, TokenId};

/// Result of [`StepFunction::init`]: per-batch context plus one initial
/// recurrent state per example.
#[derive(Debug, Clone)]
pub struct StepInit<C> {
    pub context: C,
    pub states: Vec<RecurrentState>,
}

/// One batched step call. Row `k` always belongs to example `k` of the batch
/// passed to `init`.
#[derive(Debug, Clone)]
pub struct StepRequest<'a> {
    /// Zero-based timestep of the search.
    pub timestep: usize,
    /// `true` only on timestep 0, where every row carries the start token.
    pub is_first_step: bool,
    pub last_tokens: Vec<TokenId>,
    pub states: Vec<&'a RecurrentState>,
}

impl StepRequest<'_> {
    pub fn batch_size(&self) -> usize {
        self.last_tokens.len()
    }
}

/// Output of one batched step call, row-aligned with the request.
#[derive(Debug, Clone, Default)]
pub struct StepOutput {
    pub states: Vec<RecurrentState>,
    /// Next-token log-probabilities, one vocabulary-length row per example.
    pub log_probs: Vec<Vec<f32>>,
}

impl StepOutput {
    /// Check that the output has exactly `rows` states and non-empty
    /// log-probability rows.
    pub fn check_rows(&self, rows: usize) -> Result<(), SearchError> {
        if self.states.len() != rows {
            return Err(SearchError::BatchMismatch {
                what: "states",
                expected: rows,
                actual: self.states.len(),
            });
        }
        if self.log_probs.len() != rows {
            return Err(SearchError::BatchMismatch {
                what: "log-probability rows",
                expected: rows,
                actual: self.log_probs.len(),
            });
        }
        if let Some(row) = self.log_probs.iter().position(Vec::is_empty) {
            return Err(SearchError::EmptyLogProbs { row });
        }
        Ok(())
    }
}

/// Batched one-timestep inference, treated as a black box.
///
/// Implementations are called sequentially: `init` once per batch, then
/// `step` once per beam slot per timestep. Any error is fatal to the batch
/// and is returned to the caller of the decoder unchanged.
pub trait StepFunction {
    /// Per-example input (an image, a precomputed feature map, ...).
    type Input;
    /// Per-batch context computed by `init` and handed to every `step`.
    type Context;

    /// Encode `inputs` and return the initial state of every example.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot encode the batch.
    fn init(&mut self, inputs: &[Self::Input]) -> Result<StepInit<Self::Context>>;

    /// Advance every row of `request` by one token.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails (device or resource exhaustion).
    fn step(&mut self, context: &Self::Context, request: &StepRequest<'_>) -> Result<StepOutput>;
}
