use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ERISK-EVAL: scorer for early risk detection challenge runs
///
/// Evaluates a run's per-subject decisions (precision, recall, F1, ERDE,
/// latency-weighted F1) and its per-round rankings (P@10, NDCG@10, NDCG@100).
#[derive(Parser, Debug)]
#[command(name = "erisk-eval")]
#[command(version = "0.1.0")]
#[command(about = "Evaluate early risk detection runs")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch a run from the challenge server and evaluate it
    Run(RunArgs),

    /// Evaluate a run stored in local files
    Evaluate(EvaluateArgs),

    /// Generate a sample config file
    Init(InitArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Team token issued by the challenge server
    #[arg(short, long)]
    pub team_token: String,

    /// Run number (0, 1, 2, ...)
    #[arg(short, long)]
    pub run: u32,

    /// Path to the ground truth (qrels) file
    #[arg(short, long)]
    pub qrels: PathBuf,

    /// Path to the evaluation config file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory to write the JSON and Markdown reports to
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct EvaluateArgs {
    /// Path to the ground truth (qrels) file
    #[arg(short, long)]
    pub qrels: PathBuf,

    /// JSON file with the run's decisions
    #[arg(short, long)]
    pub decisions: PathBuf,

    /// Directory holding round_<n>.json ranking files
    #[arg(long)]
    pub rankings_dir: Option<PathBuf>,

    /// Path to the evaluation config file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory to write the JSON and Markdown reports to
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Output path for the config file
    #[arg(short, long, default_value = "erisk-eval.yaml")]
    pub output: PathBuf,
}
