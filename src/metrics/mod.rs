//! Metric engine for early risk detection runs
//!
//! Decision-based scoring lives in [`decision`], rank-based scoring in
//! [`rank`]; both are pure functions of their inputs.

pub mod decision;
pub mod penalty;
pub mod rank;

pub use decision::{evaluate_decisions, DecisionEvent, DecisionMetrics};
pub use penalty::penalty;
pub use rank::{
    evaluate_round, IdealGainVector, RankEvaluator, RankedSnapshot, RankingEntry, RoundMetrics,
    DEFAULT_K, DEFAULT_ROUNDS,
};
