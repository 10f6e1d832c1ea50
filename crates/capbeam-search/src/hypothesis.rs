//! Partial captions and the recurrent state they carry.

use serde::{Deserialize, Serialize};

use crate::TokenId;

/// Recurrent decoder state snapshot for one example.
///
/// Opaque to the search: it is handed back to the step function unchanged.
/// Every hypothesis owns its own copy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecurrentState {
    pub memory: Vec<f32>,
    pub output: Vec<f32>,
}

impl RecurrentState {
    pub fn new(memory: Vec<f32>, output: Vec<f32>) -> Self {
        Self { memory, output }
    }

    /// Zero-filled state with `dim` entries in both vectors.
    pub fn zeros(dim: usize) -> Self {
        Self { memory: vec![0.0; dim], output: vec![0.0; dim] }
    }
}

/// One candidate caption: tokens so far, the state after the last token, and
/// the cumulative log-probability of the tokens.
///
/// Hypotheses never change after construction; [`Hypothesis::extend`] builds
/// the child.
#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    tokens: Vec<TokenId>,
    state: RecurrentState,
    score: f32,
}

impl Hypothesis {
    pub fn new(tokens: Vec<TokenId>, state: RecurrentState, score: f32) -> Self {
        Self { tokens, state, score }
    }

    /// Empty caption with score `0.0`, the root of every search.
    pub fn seed(state: RecurrentState) -> Self {
        Self::new(Vec::new(), state, 0.0)
    }

    pub fn tokens(&self) -> &[TokenId] {
        &self.tokens
    }

    pub fn state(&self) -> &RecurrentState {
        &self.state
    }

    /// Sum of the log-probabilities of every token.
    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn last_token(&self) -> Option<TokenId> {
        self.tokens.last().copied()
    }

    /// Child hypothesis with `token` appended.
    #[must_use]
    pub fn extend(&self, token: TokenId, state: RecurrentState, token_log_prob: f32) -> Self {
        let mut tokens = Vec::with_capacity(self.tokens.len() + 1);
        tokens.extend_from_slice(&self.tokens);
        tokens.push(token);
        Self { tokens, state, score: self.score + token_log_prob }
    }

    pub fn into_parts(self) -> (Vec<TokenId>, RecurrentState, f32) {
        (self.tokens, self.state, self.score)
    }
}
