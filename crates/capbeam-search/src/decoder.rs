//! Decoder results, statistics, and strategy dispatch.

use anyhow::Result;
use capbeam_common::{DecodeConfig, DecodeStrategy};
use serde::Serialize;

use crate::{BeamSearchDecoder, GreedyDecoder, Hypothesis, SearchError, StepFunction, TokenId};

/// Ranked captions for one example.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeResult {
    /// Best first. At most `beam_size` entries.
    pub ranked: Vec<Hypothesis>,
    /// `false` when the example never produced the stop token and `ranked`
    /// holds partial captions instead.
    pub completed: bool,
}

impl DecodeResult {
    pub fn best(&self) -> Option<&Hypothesis> {
        self.ranked.first()
    }
}

/// Counters collected over one decode call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchStats {
    pub timesteps: usize,
    pub step_calls: usize,
    /// Candidate continuations built from step output.
    pub expansions: usize,
    pub completed_pushes: usize,
    pub partial_pushes: usize,
    pub elapsed_ms: f64,
}

/// Per-example results, in input order, plus statistics.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub results: Vec<DecodeResult>,
    pub stats: SearchStats,
}

/// Greedy or beam decoder chosen from configuration.
#[derive(Debug, Clone)]
pub enum CaptionDecoder {
    Greedy(GreedyDecoder),
    Beam(BeamSearchDecoder),
}

impl CaptionDecoder {
    /// Greedy for `beam_size == 1`, beam search otherwise.
    pub fn from_config(config: &DecodeConfig, start_token: TokenId, stop_token: TokenId) -> Self {
        match config.strategy() {
            DecodeStrategy::Greedy => Self::Greedy(GreedyDecoder::new(
                config.max_caption_length,
                start_token,
                stop_token,
            )),
            DecodeStrategy::Beam { width } => Self::Beam(BeamSearchDecoder::new(
                width,
                config.max_caption_length,
                start_token,
                stop_token,
            )),
        }
    }

    pub fn strategy(&self) -> DecodeStrategy {
        match self {
            Self::Greedy(_) => DecodeStrategy::Greedy,
            Self::Beam(beam) => DecodeStrategy::Beam { width: beam.beam_size() },
        }
    }

    pub fn decode<S: StepFunction>(&self, step: &mut S, inputs: &[S::Input]) -> Result<SearchOutcome> {
        match self {
            Self::Greedy(greedy) => greedy.decode(step, inputs),
            Self::Beam(beam) => beam.decode(step, inputs),
        }
    }
}

pub(crate) fn check_initial_states(expected: usize, actual: usize) -> Result<(), SearchError> {
    if expected == actual {
        Ok(())
    } else {
        Err(SearchError::BatchMismatch { what: "initial states", expected, actual })
    }
}
