mod results;
mod runner;

pub use results::{format_metric, EvaluationReport, RoundFailure, RunSource};
pub use runner::{
    evaluate_snapshot, load_decisions, load_ranking, save_report, LocalEvalRunner,
    RemoteEvalRunner, RoundInput,
};
