//! Single-hypothesis decoding: the best token at every step.

use std::time::Instant;

use anyhow::Result;
use capbeam_logits::argmax;
use tracing::{debug, instrument};

use crate::decoder::{DecodeResult, SearchOutcome, SearchStats};
use crate::{Hypothesis, StepFunction, StepInit, StepRequest, TokenId};

/// Argmax decoder. Agrees token for token with a width-1
/// [`BeamSearchDecoder`](crate::BeamSearchDecoder) but makes one step call
/// per timestep and stops as soon as every example has finished.
#[derive(Debug, Clone)]
pub struct GreedyDecoder {
    max_len: usize,
    start_token: TokenId,
    stop_token: TokenId,
}

impl GreedyDecoder {
    pub fn new(max_len: usize, start_token: TokenId, stop_token: TokenId) -> Self {
        Self { max_len, start_token, stop_token }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// # Errors
    ///
    /// Returns the step function's error unchanged, or a
    /// [`SearchError`](crate::SearchError) when its output is misshapen.
    #[instrument(skip_all, fields(batch = inputs.len(), max_len = self.max_len))]
    pub fn decode<S: StepFunction>(&self, step: &mut S, inputs: &[S::Input]) -> Result<SearchOutcome> {
        let start = Instant::now();
        let batch = inputs.len();
        let mut stats = SearchStats::default();
        if batch == 0 {
            return Ok(SearchOutcome { results: Vec::new(), stats });
        }

        let StepInit { context, states: initial } = step.init(inputs)?;
        crate::decoder::check_initial_states(batch, initial.len())?;

        let mut current: Vec<Hypothesis> = initial.iter().cloned().map(Hypothesis::seed).collect();
        let mut finished = vec![false; batch];

        for timestep in 0..self.max_len {
            if finished.iter().all(|&done| done) {
                debug!(timestep, "every example finished");
                break;
            }

            let mut last_tokens = Vec::with_capacity(batch);
            let mut states = Vec::with_capacity(batch);
            for ((hyp, done), initial_state) in current.iter().zip(&finished).zip(&initial) {
                if *done {
                    last_tokens.push(self.start_token);
                    states.push(initial_state);
                } else {
                    last_tokens.push(hyp.last_token().unwrap_or(self.start_token));
                    states.push(hyp.state());
                }
            }
            let request = StepRequest { timestep, is_first_step: timestep == 0, last_tokens, states };

            let output = step.step(&context, &request)?;
            output.check_rows(batch)?;
            stats.step_calls += 1;

            for (example, hyp) in current.iter_mut().enumerate() {
                if finished[example] {
                    continue;
                }
                let row = &output.log_probs[example];
                let token = argmax(row);
                *hyp = hyp.extend(token as TokenId, output.states[example].clone(), row[token]);
                stats.expansions += 1;
                if token as TokenId == self.stop_token {
                    finished[example] = true;
                    stats.completed_pushes += 1;
                } else {
                    stats.partial_pushes += 1;
                }
            }
            stats.timesteps += 1;
        }

        let results = current
            .into_iter()
            .zip(finished)
            .map(|(hyp, completed)| DecodeResult { ranked: vec![hyp], completed })
            .collect();

        stats.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        Ok(SearchOutcome { results, stats })
    }
}
