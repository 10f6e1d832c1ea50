//! Table-driven step function.
//!
//! A [`TransitionTable`] scores the next word from the previous one only:
//! `first` on timestep 0, `next[last_token]` afterwards. Examples may carry an
//! additive `bias` row keyed by their id, which is how the table tells
//! examples apart.
//!
//! ```json
//! {
//!   "vocab_size": 3,
//!   "first": [2.0, 1.0, 0.0],
//!   "next": [[0.0, 2.0, 1.0], [0.0, 0.0, 2.0], [1.0, 1.0, 1.0]],
//!   "bias": { "img-7": [0.0, -1.0, 0.5] }
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use capbeam_common::TokenId;
use capbeam_logits::log_softmax_in_place;
use capbeam_search::{RecurrentState, StepFunction, StepInit, StepOutput, StepRequest};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("vocab_size must be positive")]
    EmptyVocabulary,

    #[error("{what} has {actual} entries, expected {expected}")]
    Shape { what: String, expected: usize, actual: usize },

    #[error("token {token} is outside the {vocab_size}-word table")]
    TokenOutOfRange { token: TokenId, vocab_size: usize },
}

fn default_normalize() -> bool {
    true
}

/// Serialized form of a [`TransitionModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionTable {
    pub vocab_size: usize,
    pub first: Vec<f32>,
    pub next: Vec<Vec<f32>>,
    #[serde(default)]
    pub bias: HashMap<String, Vec<f32>>,
    /// Apply log-softmax to every row. When `false` the rows must already be
    /// log-probabilities.
    #[serde(default = "default_normalize")]
    pub normalize: bool,
}

impl TransitionTable {
    pub fn validate(&self) -> Result<(), TransitionError> {
        let v = self.vocab_size;
        if v == 0 {
            return Err(TransitionError::EmptyVocabulary);
        }
        check_len("first", v, self.first.len())?;
        check_len("next", v, self.next.len())?;
        for (i, row) in self.next.iter().enumerate() {
            check_len(&format!("next[{i}]"), v, row.len())?;
        }
        for (id, row) in &self.bias {
            check_len(&format!("bias[{id:?}]"), v, row.len())?;
        }
        Ok(())
    }
}

fn check_len(what: &str, expected: usize, actual: usize) -> Result<(), TransitionError> {
    if expected == actual {
        Ok(())
    } else {
        Err(TransitionError::Shape { what: what.to_string(), expected, actual })
    }
}

/// Deterministic [`StepFunction`] over a [`TransitionTable`].
///
/// Inputs are example ids. The recurrent state is one-dimensional: `memory[0]`
/// counts the steps taken and `output[0]` holds the token fed on the latest
/// step.
#[derive(Debug, Clone)]
pub struct TransitionModel {
    table: TransitionTable,
}

impl TransitionModel {
    pub fn new(table: TransitionTable) -> Result<Self, TransitionError> {
        table.validate()?;
        Ok(Self { table })
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read transition table {}", path.display()))?;
        let table: TransitionTable = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse transition table {}", path.display()))?;
        Ok(Self::new(table)?)
    }

    pub fn vocab_size(&self) -> usize {
        self.table.vocab_size
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    fn row(&self, is_first_step: bool, token: TokenId, bias: Option<&[f32]>) -> Result<Vec<f32>> {
        let base = if is_first_step {
            &self.table.first
        } else {
            self.table.next.get(token as usize).ok_or(TransitionError::TokenOutOfRange {
                token,
                vocab_size: self.table.vocab_size,
            })?
        };
        let mut row = base.clone();
        if let Some(bias) = bias {
            for (v, b) in row.iter_mut().zip(bias) {
                *v += b;
            }
        }
        if self.table.normalize {
            log_softmax_in_place(&mut row);
        }
        Ok(row)
    }
}

impl StepFunction for TransitionModel {
    type Input = String;
    /// Per-example bias rows.
    type Context = Vec<Option<Vec<f32>>>;

    #[instrument(skip_all, fields(batch = inputs.len()))]
    fn init(&mut self, inputs: &[String]) -> Result<StepInit<Self::Context>> {
        let context: Vec<Option<Vec<f32>>> =
            inputs.iter().map(|id| self.table.bias.get(id).cloned()).collect();
        debug!(biased = context.iter().filter(|b| b.is_some()).count(), "transition context ready");
        Ok(StepInit { context, states: vec![RecurrentState::zeros(1); inputs.len()] })
    }

    fn step(&mut self, context: &Self::Context, request: &StepRequest<'_>) -> Result<StepOutput> {
        let mut states = Vec::with_capacity(request.batch_size());
        let mut log_probs = Vec::with_capacity(request.batch_size());
        for (k, (&token, state)) in request.last_tokens.iter().zip(&request.states).enumerate() {
            let bias = context.get(k).and_then(Option::as_deref);
            log_probs.push(self.row(request.is_first_step, token, bias)?);
            let steps = state.memory.first().copied().unwrap_or(0.0);
            states.push(RecurrentState::new(vec![steps + 1.0], vec![token as f32]));
        }
        Ok(StepOutput { states, log_probs })
    }
}
