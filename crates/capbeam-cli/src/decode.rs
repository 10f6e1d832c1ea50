//! `capbeam decode`

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use capbeam_common::{CaptionConfig, TokenTable, Vocabulary};
use capbeam_engine::{CaptionRecord, CaptionRunner, RunStats, TransitionModel, VecBatchSource};
use clap::{Args, ValueEnum};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One tab-separated line per input
    #[default]
    Text,
    /// A single JSON document with captions and statistics
    Json,
}

#[derive(Args)]
pub struct DecodeCommand {
    /// Transition table (JSON)
    #[arg(short, long, value_name = "PATH")]
    model: PathBuf,

    /// Vocabulary file (JSON)
    #[arg(long, value_name = "PATH")]
    vocab: PathBuf,

    /// Input ids, comma separated
    #[arg(short, long, value_name = "ID", value_delimiter = ',', required = true)]
    inputs: Vec<String>,

    /// Hypotheses kept per input; 1 selects greedy decoding
    #[arg(short, long, value_name = "N")]
    beam_size: Option<usize>,

    /// Maximum caption length in tokens
    #[arg(long, value_name = "N")]
    max_len: Option<usize>,

    /// Inputs decoded together
    #[arg(long, value_name = "N")]
    batch_size: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Serialize)]
struct DecodeOutput<'a> {
    captions: &'a [CaptionRecord],
    stats: &'a RunStats,
}

impl DecodeCommand {
    pub fn execute(self, config: &CaptionConfig) -> Result<()> {
        let mut decode = config.decode.clone();
        if let Some(n) = self.beam_size {
            decode.beam_size = n;
        }
        if let Some(n) = self.max_len {
            decode.max_caption_length = n;
        }
        if let Some(n) = self.batch_size {
            decode.batch_size = n;
        }
        decode.validate().context("Invalid decode settings")?;

        let vocab = Vocabulary::from_json_file(&self.vocab)
            .with_context(|| format!("Failed to load vocabulary from {}", self.vocab.display()))?;
        let model = TransitionModel::from_json_file(&self.model)?;
        if model.vocab_size() != vocab.len() {
            bail!(
                "model scores {} words but the vocabulary has {}",
                model.vocab_size(),
                vocab.len()
            );
        }
        info!(
            inputs = self.inputs.len(),
            beam_size = decode.beam_size,
            max_len = decode.max_caption_length,
            "decoding"
        );

        let items = self.inputs.into_iter().map(|id| (id.clone(), id)).collect();
        let mut source = VecBatchSource::new(items, decode.batch_size);
        let mut runner = CaptionRunner::new(decode, model, vocab)?;
        let report = runner.run(&mut source)?;

        match self.format {
            OutputFormat::Text => {
                for record in &report.records {
                    let marker = if record.completed { "" } else { " (partial)" };
                    println!("{}\t{}\t{:.4}{}", record.id, record.caption, record.score, marker);
                }
            }
            OutputFormat::Json => {
                let output = DecodeOutput { captions: &report.records, stats: &report.stats };
                let json = serde_json::to_string_pretty(&output)
                    .context("Failed to serialize captions")?;
                println!("{}", json);
            }
        }
        Ok(())
    }
}
