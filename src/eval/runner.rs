use crate::cli::EvalConfig;
use crate::client::ChallengeClient;
use crate::eval::{EvaluationReport, RoundFailure, RunSource};
use crate::metrics::{evaluate_decisions, DecisionEvent, RankEvaluator, RankedSnapshot};
use crate::qrels::GroundTruth;
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Outcome of obtaining one round's ranking
pub type RoundInput = (u32, Result<RankedSnapshot>);

/// Evaluate a full snapshot of a run.
///
/// Decision metrics are always produced. A round that cannot be fetched or
/// scored is logged and recorded in `failed_rounds`; the remaining rounds are
/// still evaluated.
pub fn evaluate_snapshot(
    truth: &GroundTruth,
    decisions: &[DecisionEvent],
    rankings: Vec<RoundInput>,
    k: usize,
    source: RunSource,
) -> EvaluationReport {
    info!("DECISION-BASED EVALUATION");
    let decision = evaluate_decisions(decisions, truth);

    info!("RANK-BASED EVALUATION");
    let mut rounds = Vec::new();
    let mut failed_rounds = Vec::new();

    match RankEvaluator::new(truth, k) {
        Ok(evaluator) => {
            for (round, ranking) in rankings {
                let scored = ranking.and_then(|snapshot| {
                    info!(
                        "Analyzing ranking at round {} (rank size {})",
                        round,
                        snapshot.len()
                    );
                    evaluator.evaluate(&snapshot).map_err(anyhow::Error::from)
                });

                match scored {
                    Ok(metrics) => rounds.push(metrics),
                    Err(e) => {
                        error!("Round {} could not be evaluated: {:#}", round, e);
                        failed_rounds.push(RoundFailure {
                            round,
                            error: format!("{:#}", e),
                        });
                    }
                }
            }
        }
        Err(e) => {
            error!("Rank-based evaluation skipped: {}", e);
            failed_rounds.extend(rankings.into_iter().map(|(round, _)| RoundFailure {
                round,
                error: e.to_string(),
            }));
        }
    }

    EvaluationReport {
        eval_id: Uuid::new_v4().to_string(),
        source,
        generated_at: Utc::now(),
        subjects: truth.len(),
        total_positives: truth.total_positives(),
        decisions_received: decisions.len(),
        decision,
        rounds,
        failed_rounds,
    }
}

/// Evaluates runs fetched from the challenge server
pub struct RemoteEvalRunner {
    client: ChallengeClient,
    config: EvalConfig,
}

impl RemoteEvalRunner {
    pub fn new(config: EvalConfig) -> Result<Self> {
        let client = ChallengeClient::new(config.server.clone())?;
        Ok(Self { client, config })
    }

    /// Fetch and evaluate one run
    pub async fn run(
        &self,
        team_token: &str,
        run: u32,
        truth: &GroundTruth,
    ) -> Result<EvaluationReport> {
        info!("Evaluating run {} for team {}", run, team_token);

        let decisions = self
            .client
            .fetch_run(team_token, run)
            .await
            .context("Failed to fetch run decisions")?;

        let rankings = self
            .client
            .fetch_rankings(team_token, run, &self.config.rounds)
            .await;

        Ok(evaluate_snapshot(
            truth,
            &decisions,
            rankings,
            self.config.k,
            RunSource::Remote {
                team_token: team_token.to_string(),
                run,
            },
        ))
    }
}

/// Evaluates runs stored on disk
pub struct LocalEvalRunner {
    config: EvalConfig,
}

impl LocalEvalRunner {
    pub fn new(config: EvalConfig) -> Self {
        Self { config }
    }

    /// Path of the ranking file for `round` inside `dir`
    pub fn ranking_path(dir: &Path, round: u32) -> PathBuf {
        dir.join(format!("round_{}.json", round))
    }

    /// Evaluate a decisions file and, optionally, a directory of rankings.
    ///
    /// Configured rounds without a ranking file are skipped with a warning.
    pub fn run(
        &self,
        truth: &GroundTruth,
        decisions_path: &Path,
        rankings_dir: Option<&Path>,
    ) -> Result<EvaluationReport> {
        let decisions = load_decisions(decisions_path)?;
        info!("{} entries in the run", decisions.len());

        let mut rankings = Vec::new();
        if let Some(dir) = rankings_dir {
            for &round in &self.config.rounds {
                let path = Self::ranking_path(dir, round);
                if !path.exists() {
                    warn!("No ranking file for round {} at {:?}", round, path);
                    continue;
                }
                rankings.push((round, load_ranking(&path, round)));
            }
        }

        Ok(evaluate_snapshot(
            truth,
            &decisions,
            rankings,
            self.config.k,
            RunSource::Local {
                decisions: decisions_path.display().to_string(),
            },
        ))
    }
}

/// Read a run's decisions from a JSON file
pub fn load_decisions(path: &Path) -> Result<Vec<DecisionEvent>> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read decisions file: {:?}", path))?;
    serde_json::from_str(&content).context(format!("Failed to parse decisions file: {:?}", path))
}

/// Read one round's ranking from a JSON file
pub fn load_ranking(path: &Path, round: u32) -> Result<RankedSnapshot> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read ranking file: {:?}", path))?;
    let entries = serde_json::from_str(&content)
        .context(format!("Failed to parse ranking file: {:?}", path))?;
    Ok(RankedSnapshot::from_entries(round, entries))
}

/// Write the JSON and Markdown reports into `output_dir`
pub fn save_report(report: &EvaluationReport, output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)?;

    let json_path = output_dir.join(format!("{}.json", report.eval_id));
    report.save_json(&json_path)?;
    info!("Saved results to {:?}", json_path);

    let report_path = output_dir.join(format!("{}_report.md", report.eval_id));
    std::fs::write(&report_path, report.generate_report())?;
    info!("Saved report to {:?}", report_path);

    Ok(())
}
