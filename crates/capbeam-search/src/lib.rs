//! Caption search over a black-box step function.
//!
//! The neural network is reached only through [`StepFunction`]: given the
//! previous word and recurrent state of every example in a batch it returns
//! the next recurrent state and a log-probability row over the vocabulary.
//! [`BeamSearchDecoder`] keeps the `beam_size` best partial captions per
//! example in a [`BoundedHypothesisSet`], while [`GreedyDecoder`] follows the
//! single best token. [`CaptionDecoder`] picks between them from a
//! [`DecodeConfig`](capbeam_common::DecodeConfig).
//!
//! # Example
//!
//! ```
//! use anyhow::Result;
//! use capbeam_search::{
//!     BeamSearchDecoder, RecurrentState, StepFunction, StepInit, StepOutput, StepRequest,
//! };
//!
//! /// Always prefers token 1, then stops with token 2.
//! struct Toy;
//!
//! impl StepFunction for Toy {
//!     type Input = ();
//!     type Context = ();
//!
//!     fn init(&mut self, inputs: &[()]) -> Result<StepInit<()>> {
//!         Ok(StepInit { context: (), states: vec![RecurrentState::zeros(1); inputs.len()] })
//!     }
//!
//!     fn step(&mut self, _: &(), request: &StepRequest<'_>) -> Result<StepOutput> {
//!         let row = if request.is_first_step { vec![-3.0, -0.1, -4.0] } else { vec![-3.0, -2.0, -0.1] };
//!         Ok(StepOutput {
//!             states: request.states.iter().map(|s| (*s).clone()).collect(),
//!             log_probs: vec![row; request.batch_size()],
//!         })
//!     }
//! }
//!
//! let decoder = BeamSearchDecoder::new(2, 4, 0, 2);
//! let outcome = decoder.decode(&mut Toy, &[(), ()]).unwrap();
//! let best = outcome.results[0].best().unwrap();
//! assert_eq!(best.tokens(), &[1, 2]);
//! assert!(outcome.results[0].completed);
//! ```

pub mod beam;
pub mod decoder;
pub mod error;
pub mod greedy;
pub mod hypothesis;
pub mod step;
pub mod topn;

pub use beam::BeamSearchDecoder;
pub use decoder::{CaptionDecoder, DecodeResult, SearchOutcome, SearchStats};
pub use error::SearchError;
pub use greedy::GreedyDecoder;
pub use hypothesis::{Hypothesis, RecurrentState};
pub use step::{StepFunction, StepInit, StepOutput, StepRequest};
pub use topn::BoundedHypothesisSet;

pub use capbeam_common::TokenId;
