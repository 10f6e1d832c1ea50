//! Decode every batch of a source and collect rendered captions.

use std::time::Instant;

use anyhow::{Result, ensure};
use capbeam_common::{DecodeConfig, TokenId, TokenTable};
use capbeam_search::{CaptionDecoder, DecodeResult, StepFunction};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{Batch, BatchSource};

/// Best caption for one real example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionRecord {
    pub id: String,
    pub caption: String,
    /// Sum of the log-probabilities of the caption's tokens.
    pub score: f32,
    pub tokens: Vec<TokenId>,
    /// `false` when the caption is a partial fallback that never reached the
    /// stop token.
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub batches: usize,
    /// Real examples captioned; filler excluded.
    pub examples: usize,
    pub fallback_captions: usize,
    pub step_calls: usize,
    pub elapsed_ms: f64,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub records: Vec<CaptionRecord>,
    pub stats: RunStats,
}

/// Drives a [`CaptionDecoder`] over a [`BatchSource`].
pub struct CaptionRunner<S, V> {
    config: DecodeConfig,
    decoder: CaptionDecoder,
    step: S,
    vocab: V,
}

impl<S, V> CaptionRunner<S, V>
where
    S: StepFunction,
    V: TokenTable,
{
    /// Build a runner whose strategy follows `config.beam_size`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn new(config: DecodeConfig, step: S, vocab: V) -> Result<Self> {
        config.validate()?;
        let decoder = CaptionDecoder::from_config(&config, vocab.start_token(), vocab.stop_token());
        Ok(Self { config, decoder, step, vocab })
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    pub fn decoder(&self) -> &CaptionDecoder {
        &self.decoder
    }

    pub fn into_step(self) -> S {
        self.step
    }

    /// Caption every batch of `source`, then rewind it.
    ///
    /// # Errors
    ///
    /// Fails on the first batch that is malformed or whose decode fails;
    /// captions of earlier batches are discarded with it.
    #[instrument(skip_all, fields(strategy = ?self.decoder.strategy()))]
    pub fn run<B>(&mut self, source: &mut B) -> Result<RunReport>
    where
        B: BatchSource<Input = S::Input>,
    {
        let start = Instant::now();
        let total = source.num_batches();
        info!(batches = total, "captioning started");

        let mut records = Vec::new();
        let mut stats = RunStats::default();
        while let Some(batch) = source.next_batch() {
            check_batch(&batch)?;
            let outcome = self.decoder.decode(&mut self.step, &batch.inputs)?;
            stats.batches += 1;
            stats.step_calls += outcome.stats.step_calls;

            let real = batch.real_count();
            for (id, result) in batch.ids.into_iter().zip(outcome.results).take(real) {
                let record = self.record(id, &result);
                if !record.completed {
                    stats.fallback_captions += 1;
                }
                records.push(record);
            }
            stats.examples += real;
            debug!(
                batch = stats.batches,
                of = total,
                real,
                fake = batch.fake_count,
                step_calls = outcome.stats.step_calls,
                "batch decoded"
            );
        }
        source.reset();

        stats.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        info!(
            examples = stats.examples,
            fallbacks = stats.fallback_captions,
            elapsed_ms = stats.elapsed_ms,
            "captioning finished"
        );
        Ok(RunReport { records, stats })
    }

    fn record(&self, id: String, result: &DecodeResult) -> CaptionRecord {
        match result.best() {
            Some(best) => CaptionRecord {
                id,
                caption: self.vocab.render(best.tokens()).sentence,
                score: best.score(),
                tokens: best.tokens().to_vec(),
                completed: result.completed,
            },
            None => CaptionRecord {
                id,
                caption: String::new(),
                score: 0.0,
                tokens: Vec::new(),
                completed: false,
            },
        }
    }
}

fn check_batch<I>(batch: &Batch<I>) -> Result<()> {
    ensure!(
        batch.ids.len() == batch.inputs.len(),
        "batch has {} ids for {} inputs",
        batch.ids.len(),
        batch.inputs.len()
    );
    ensure!(
        batch.fake_count <= batch.len(),
        "batch of {} claims {} filler examples",
        batch.len(),
        batch.fake_count
    );
    Ok(())
}
