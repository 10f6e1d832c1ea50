//! Batched beam search.
//!
//! Every example of a batch owns two [`BoundedHypothesisSet`]s of width
//! `beam_size`: one for partial captions and one for captions that ended with
//! the stop token. Each timestep drains the partial sets, regroups the
//! drained hypotheses into beam *slots* (slot `b` holds the `b`-th best
//! partial caption of every example), calls the step function once per slot with the
//! whole batch as rows, and pushes the `beam_size` best continuations of
//! every row back into the matching set. Examples never interact.

use std::time::Instant;

use anyhow::Result;
use capbeam_logits::top_k_stable;
use tracing::{debug, instrument, trace};

use crate::decoder::{DecodeResult, SearchOutcome, SearchStats};
use crate::{
    BoundedHypothesisSet, Hypothesis, RecurrentState, StepFunction, StepInit, StepRequest,
    TokenId,
};

/// Beam-search decoder over a batch of independent examples.
#[derive(Debug, Clone)]
pub struct BeamSearchDecoder {
    beam_size: usize,
    max_len: usize,
    start_token: TokenId,
    stop_token: TokenId,
}

impl BeamSearchDecoder {
    /// # Panics
    ///
    /// Panics if `beam_size == 0`.
    pub fn new(beam_size: usize, max_len: usize, start_token: TokenId, stop_token: TokenId) -> Self {
        assert!(beam_size > 0, "beam_size must be positive");
        Self { beam_size, max_len, start_token, stop_token }
    }

    pub fn beam_size(&self) -> usize {
        self.beam_size
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Run exactly `max_len` timesteps over `inputs` and return, per example,
    /// its completed captions best-first, or its partial captions when none
    /// completed.
    ///
    /// # Errors
    ///
    /// Returns the step function's error unchanged, or a
    /// [`SearchError`](crate::SearchError) when its output is misshapen.
    #[instrument(skip_all, fields(batch = inputs.len(), beam = self.beam_size, max_len = self.max_len))]
    pub fn decode<S: StepFunction>(&self, step: &mut S, inputs: &[S::Input]) -> Result<SearchOutcome> {
        let start = Instant::now();
        let batch = inputs.len();
        let mut stats = SearchStats::default();
        if batch == 0 {
            return Ok(SearchOutcome { results: Vec::new(), stats });
        }

        let StepInit { context, states: initial } = step.init(inputs)?;
        crate::decoder::check_initial_states(batch, initial.len())?;

        let mut partial: Vec<BoundedHypothesisSet> = initial
            .iter()
            .map(|state| {
                let mut set = BoundedHypothesisSet::new(self.beam_size);
                set.push(Hypothesis::seed(state.clone()));
                set
            })
            .collect();
        let mut complete: Vec<BoundedHypothesisSet> =
            (0..batch).map(|_| BoundedHypothesisSet::new(self.beam_size)).collect();

        for timestep in 0..self.max_len {
            let frontier: Vec<Vec<Hypothesis>> = partial
                .iter_mut()
                .map(|set| {
                    let hyps = set.extract(true);
                    set.reset();
                    hyps
                })
                .collect();

            let num_slots = if timestep == 0 { 1 } else { self.beam_size };
            for slot in 0..num_slots {
                let live = frontier.iter().filter(|hyps| slot < hyps.len()).count();
                if live == 0 {
                    trace!(timestep, slot, "no live hypotheses in slot, skipping step call");
                    continue;
                }

                let request = self.slot_request(timestep, slot, &frontier, &initial);
                let output = step.step(&context, &request)?;
                output.check_rows(batch)?;
                stats.step_calls += 1;

                for (example, hyps) in frontier.iter().enumerate() {
                    let Some(parent) = hyps.get(slot) else {
                        continue;
                    };
                    for (token, log_prob) in top_k_stable(&output.log_probs[example], self.beam_size)
                    {
                        let child =
                            parent.extend(token, output.states[example].clone(), log_prob);
                        stats.expansions += 1;
                        if token == self.stop_token {
                            complete[example].push(child);
                            stats.completed_pushes += 1;
                        } else {
                            partial[example].push(child);
                            stats.partial_pushes += 1;
                        }
                    }
                }
            }

            stats.timesteps += 1;
            debug!(
                timestep,
                partial = partial.iter().map(BoundedHypothesisSet::size).sum::<usize>(),
                complete = complete.iter().map(BoundedHypothesisSet::size).sum::<usize>(),
                "beam step finished"
            );
        }

        let results = partial
            .iter_mut()
            .zip(complete.iter_mut())
            .map(|(partial, complete)| {
                if complete.size() == 0 {
                    DecodeResult { ranked: partial.extract(true), completed: false }
                } else {
                    DecodeResult { ranked: complete.extract(true), completed: true }
                }
            })
            .collect();

        stats.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        Ok(SearchOutcome { results, stats })
    }

    /// Gather slot `slot` of every example into one batched request.
    ///
    /// Examples without a hypothesis in this slot get a placeholder row (start
    /// token, initial state) whose output is ignored.
    fn slot_request<'a>(
        &self,
        timestep: usize,
        slot: usize,
        frontier: &'a [Vec<Hypothesis>],
        initial: &'a [RecurrentState],
    ) -> StepRequest<'a> {
        let mut last_tokens = Vec::with_capacity(frontier.len());
        let mut states = Vec::with_capacity(frontier.len());
        for (hyps, initial_state) in frontier.iter().zip(initial) {
            match hyps.get(slot) {
                Some(h) => {
                    last_tokens.push(h.last_token().unwrap_or(self.start_token));
                    states.push(h.state());
                }
                None => {
                    last_tokens.push(self.start_token);
                    states.push(initial_state);
                }
            }
        }
        StepRequest { timestep, is_first_step: timestep == 0, last_tokens, states }
    }
}
