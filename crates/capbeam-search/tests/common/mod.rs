//! Synthetic step functions shared by the integration tests.

#![allow(dead_code)]

use anyhow::Result;
use capbeam_logits::log_softmax_in_place;
use capbeam_search::{RecurrentState, StepFunction, StepInit, StepOutput, StepRequest, TokenId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ── Table step ────────────────────────────────────────────────────────────────

/// Bigram table shared by every example: `first` on timestep 0, then
/// `next[last_token]`.
///
/// The state counts consumed steps in `memory[0]` and holds the token fed in
/// `output[0]`. Every call is recorded.
pub struct TableStep {
    pub first: Vec<f32>,
    pub next: Vec<Vec<f32>>,
    pub calls: Vec<RecordedCall>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub timestep: usize,
    pub is_first_step: bool,
    pub last_tokens: Vec<TokenId>,
}

impl TableStep {
    pub fn new(first: Vec<f32>, next: Vec<Vec<f32>>) -> Self {
        Self { first, next, calls: Vec::new() }
    }

    pub fn calls_at(&self, timestep: usize) -> usize {
        self.calls.iter().filter(|c| c.timestep == timestep).count()
    }
}

impl StepFunction for TableStep {
    type Input = ();
    type Context = ();

    fn init(&mut self, inputs: &[()]) -> Result<StepInit<()>> {
        Ok(StepInit { context: (), states: vec![RecurrentState::zeros(1); inputs.len()] })
    }

    fn step(&mut self, _: &(), request: &StepRequest<'_>) -> Result<StepOutput> {
        self.calls.push(RecordedCall {
            timestep: request.timestep,
            is_first_step: request.is_first_step,
            last_tokens: request.last_tokens.clone(),
        });
        let log_probs = request
            .last_tokens
            .iter()
            .map(|&t| {
                if request.is_first_step { self.first.clone() } else { self.next[t as usize].clone() }
            })
            .collect();
        let states = advance(request);
        Ok(StepOutput { states, log_probs })
    }
}

// ── Seeded step ───────────────────────────────────────────────────────────────

/// Random bigram tables, one per example, generated from the example's own
/// seed. The output row of example `k` depends only on seed `k` and the row's
/// own token, so results must not change with batch composition.
pub struct SeededStep {
    pub vocab_size: usize,
    /// Extra log-probability mass moved onto the stop token.
    pub stop_bias: f32,
    pub stop_token: TokenId,
}

pub struct SeededTable {
    first: Vec<f32>,
    next: Vec<Vec<f32>>,
}

impl SeededStep {
    pub fn new(vocab_size: usize, stop_token: TokenId) -> Self {
        Self { vocab_size, stop_bias: 0.0, stop_token }
    }

    fn table(&self, seed: u64) -> SeededTable {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let row = |rng: &mut ChaCha8Rng| {
            let mut row: Vec<f32> = (0..self.vocab_size).map(|_| rng.gen_range(-4.0..4.0)).collect();
            row[self.stop_token as usize] += self.stop_bias;
            log_softmax_in_place(&mut row);
            row
        };
        let first = row(&mut rng);
        let next = (0..self.vocab_size).map(|_| row(&mut rng)).collect();
        SeededTable { first, next }
    }
}

impl StepFunction for SeededStep {
    type Input = u64;
    type Context = Vec<SeededTable>;

    fn init(&mut self, inputs: &[u64]) -> Result<StepInit<Vec<SeededTable>>> {
        Ok(StepInit {
            context: inputs.iter().map(|&seed| self.table(seed)).collect(),
            states: vec![RecurrentState::zeros(1); inputs.len()],
        })
    }

    fn step(&mut self, tables: &Vec<SeededTable>, request: &StepRequest<'_>) -> Result<StepOutput> {
        let log_probs = request
            .last_tokens
            .iter()
            .zip(tables)
            .map(|(&t, table)| {
                if request.is_first_step {
                    table.first.clone()
                } else {
                    table.next[t as usize].clone()
                }
            })
            .collect();
        Ok(StepOutput { states: advance(request), log_probs })
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn advance(request: &StepRequest<'_>) -> Vec<RecurrentState> {
    request
        .states
        .iter()
        .zip(&request.last_tokens)
        .map(|(s, &t)| RecurrentState::new(vec![s.memory[0] + 1.0], vec![t as f32]))
        .collect()
}

pub fn ln(p: f32) -> f32 {
    p.ln()
}
