//! Scoring for early risk detection challenge runs.
//!
//! Participants process subjects' writings round by round and emit, for each
//! subject, a binary decision together with a ranking of all subjects at
//! selected rounds. This crate scores both views of a run against the
//! ground-truth qrels.

pub mod cli;
pub mod client;
pub mod error;
pub mod eval;
pub mod metrics;
pub mod qrels;

pub use error::{EvalError, EvalResult};
pub use qrels::{GroundTruth, Label};
