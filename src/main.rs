use anyhow::Result;
use clap::Parser;
use erisk_eval::cli::{self, Args, Command, EvalConfig};
use erisk_eval::eval::{self, format_metric, EvaluationReport, LocalEvalRunner, RemoteEvalRunner};
use erisk_eval::GroundTruth;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    match args.command {
        Command::Run(run_args) => {
            run_remote(run_args).await?;
        }
        Command::Evaluate(evaluate_args) => {
            run_local(evaluate_args)?;
        }
        Command::Init(init_args) => {
            generate_sample_config(init_args)?;
        }
    }

    Ok(())
}

async fn run_remote(args: cli::RunArgs) -> Result<()> {
    let config = EvalConfig::load_or_default(args.config.as_deref())?;
    let truth = GroundTruth::load(&args.qrels)?;

    let runner = RemoteEvalRunner::new(config)?;
    let report = runner.run(&args.team_token, args.run, &truth).await?;

    finish(&report, args.output.as_deref())
}

fn run_local(args: cli::EvaluateArgs) -> Result<()> {
    let config = EvalConfig::load_or_default(args.config.as_deref())?;
    let truth = GroundTruth::load(&args.qrels)?;

    let runner = LocalEvalRunner::new(config);
    let report = runner.run(&truth, &args.decisions, args.rankings_dir.as_deref())?;

    finish(&report, args.output.as_deref())
}

fn finish(report: &EvaluationReport, output: Option<&std::path::Path>) -> Result<()> {
    print_results(report);

    if let Some(output_dir) = output {
        eval::save_report(report, output_dir)?;
        println!("\nResults saved to: {:?}", output_dir);
    }

    Ok(())
}

fn print_results(report: &EvaluationReport) {
    let d = &report.decision;

    println!("\n{}", "=".repeat(60));
    println!("DECISION-BASED EVALUATION");
    println!("{}", "=".repeat(60));
    println!("  Precision: {:.4}", d.precision);
    println!("  Recall: {:.4}", d.recall);
    println!("  F1: {:.4}", d.f1);
    println!("  ERDE_5: {}", format_metric(d.erde5));
    println!("  ERDE_50: {}", format_metric(d.erde50));
    println!("  Median latency TPs: {}", format_metric(d.median_latency_tp));
    println!("  Median penalty TPs: {}", format_metric(d.median_penalty_tp));
    println!("  Speed: {}", format_metric(d.speed));
    println!(
        "  Latency-weighted F1: {}",
        format_metric(d.latency_weighted_f1)
    );
    if !d.dropped_subjects.is_empty() {
        println!(
            "  Dropped decisions (unknown subjects): {}",
            d.dropped_subjects.len()
        );
    }

    println!("\n{}", "=".repeat(60));
    println!("RANK-BASED EVALUATION");
    println!("{}", "=".repeat(60));
    for round in &report.rounds {
        println!("  Round {} (rank size {})", round.round, round.ranking_size);
        println!("    P@{}: {:.4}", round.k, round.precision_at_k);
        println!("    NDCG@10: {}", format_metric(round.ndcg_at_10));
        println!("    NDCG@100: {}", format_metric(round.ndcg_at_100));
    }
    for failure in &report.failed_rounds {
        println!("  Round {} FAILED: {}", failure.round, failure.error);
    }
}

fn generate_sample_config(args: cli::InitArgs) -> Result<()> {
    let config = EvalConfig::sample();

    config.save(&args.output)?;
    info!("Generated sample config at: {:?}", args.output);
    println!("Generated sample config at: {:?}", args.output);

    Ok(())
}
