//! Batch-level caption decoding.
//!
//! [`CaptionRunner`] pulls batches from a [`BatchSource`], decodes each with
//! the configured strategy, drops the filler examples that pad the final
//! batch, and renders the best caption of every real example through a
//! [`TokenTable`](capbeam_common::TokenTable).
//!
//! [`TransitionModel`] is a deterministic [`StepFunction`](capbeam_search::StepFunction)
//! backed by a JSON transition table. It stands in for a neural network in
//! demos and tests.

pub mod batch;
pub mod runner;
pub mod transition;

pub use batch::{Batch, BatchSource, VecBatchSource};
pub use runner::{CaptionRecord, CaptionRunner, RunReport, RunStats};
pub use transition::{TransitionError, TransitionModel, TransitionTable};
