use crate::metrics::{DecisionMetrics, RoundMetrics};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the evaluated submissions came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RunSource {
    /// Fetched from the challenge server
    Remote { team_token: String, run: u32 },
    /// Read from local files
    Local { decisions: String },
}

/// A round whose ranking could not be scored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundFailure {
    pub round: u32,
    pub error: String,
}

/// Complete evaluation of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Unique evaluation ID
    pub eval_id: String,
    pub source: RunSource,
    pub generated_at: DateTime<Utc>,
    /// Number of judged subjects
    pub subjects: usize,
    /// Number of judged cases
    pub total_positives: usize,
    /// Number of decision entries received
    pub decisions_received: usize,
    pub decision: DecisionMetrics,
    /// Per-round rank metrics, in configured round order
    pub rounds: Vec<RoundMetrics>,
    /// Rounds that failed to score
    #[serde(default)]
    pub failed_rounds: Vec<RoundFailure>,
}

/// Render an optional metric, marking undefined values explicitly
pub fn format_metric(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None => "no data".to_string(),
    }
}

impl EvaluationReport {
    /// Save the report to a JSON file
    pub fn save_json(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load a report previously written with [`save_json`](Self::save_json)
    pub fn load_json(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Generate a human-readable Markdown report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();
        let d = &self.decision;

        report.push_str("# Early Risk Evaluation Report\n\n");
        report.push_str(&format!("Evaluation ID: {}\n", self.eval_id));
        match &self.source {
            RunSource::Remote { team_token, run } => {
                report.push_str(&format!("Team: {} / run {}\n", team_token, run));
            }
            RunSource::Local { decisions } => {
                report.push_str(&format!("Decisions file: {}\n", decisions));
            }
        }
        report.push_str(&format!("Generated: {}\n", self.generated_at));
        report.push_str(&format!(
            "Subjects: {} ({} positive)\n\n",
            self.subjects, self.total_positives
        ));

        report.push_str("## Decision-Based Evaluation\n\n");
        report.push_str(&format!(
            "- Decisions: {} received, {} dropped\n",
            self.decisions_received,
            d.dropped_subjects.len()
        ));
        report.push_str(&format!(
            "- TP/TN/FP/FN: {}/{}/{}/{}\n",
            d.true_positives, d.true_negatives, d.false_positives, d.false_negatives
        ));
        report.push_str(&format!("- Precision: {:.4}\n", d.precision));
        report.push_str(&format!("- Recall: {:.4}\n", d.recall));
        report.push_str(&format!("- F1: {:.4}\n", d.f1));
        report.push_str(&format!("- ERDE_5: {}\n", format_metric(d.erde5)));
        report.push_str(&format!("- ERDE_50: {}\n", format_metric(d.erde50)));
        report.push_str(&format!(
            "- Median latency TPs: {}\n",
            format_metric(d.median_latency_tp)
        ));
        report.push_str(&format!(
            "- Median penalty TPs: {}\n",
            format_metric(d.median_penalty_tp)
        ));
        report.push_str(&format!("- Speed: {}\n", format_metric(d.speed)));
        report.push_str(&format!(
            "- Latency-weighted F1: {}\n",
            format_metric(d.latency_weighted_f1)
        ));
        report.push('\n');

        report.push_str("## Rank-Based Evaluation\n\n");
        report.push_str("| Round | Rank size | P@k | NDCG@10 | NDCG@100 |\n");
        report.push_str("|-------|-----------|-----|---------|----------|\n");

        for round in &self.rounds {
            report.push_str(&format!(
                "| {} | {} | {:.4} | {} | {} |\n",
                round.round,
                round.ranking_size,
                round.precision_at_k,
                format_metric(round.ndcg_at_10),
                format_metric(round.ndcg_at_100)
            ));
        }

        if !self.failed_rounds.is_empty() {
            report.push_str("\n### Failed Rounds\n\n");
            for failure in &self.failed_rounds {
                report.push_str(&format!("- Round {}: {}\n", failure.round, failure.error));
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> EvaluationReport {
        EvaluationReport {
            eval_id: "eval-1".to_string(),
            source: RunSource::Remote {
                team_token: "team".to_string(),
                run: 0,
            },
            generated_at: Utc::now(),
            subjects: 120,
            total_positives: 10,
            decisions_received: 2,
            decision: DecisionMetrics {
                true_positives: 0,
                true_negatives: 1,
                false_positives: 0,
                false_negatives: 1,
                precision: 0.0,
                recall: 0.0,
                f1: 0.0,
                erde5: Some(0.5),
                erde50: Some(0.5),
                median_latency_tp: None,
                median_penalty_tp: None,
                speed: None,
                latency_weighted_f1: None,
                dropped_subjects: vec![],
            },
            rounds: vec![RoundMetrics {
                round: 1,
                ranking_size: 120,
                k: 10,
                precision_at_k: 0.3,
                ndcg_at_10: Some(0.25),
                ndcg_at_100: None,
            }],
            failed_rounds: vec![RoundFailure {
                round: 50,
                error: "connection refused".to_string(),
            }],
        }
    }

    #[test]
    fn test_format_metric() {
        assert_eq!(format_metric(Some(0.5)), "0.5000");
        assert_eq!(format_metric(None), "no data");
    }

    #[test]
    fn test_report_marks_undefined_values() {
        let report = sample_report().generate_report();
        assert!(report.contains("- Speed: no data"));
        assert!(report.contains("| 1 | 120 | 0.3000 | 0.2500 | no data |"));
        assert!(report.contains("- Round 50: connection refused"));
    }

    #[test]
    fn test_json_roundtrip_keeps_undefined_as_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = sample_report();

        report.save_json(&path).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"speed\": null"));

        let loaded = EvaluationReport::load_json(&path).unwrap();
        assert_eq!(loaded.decision, report.decision);
        assert_eq!(loaded.rounds, report.rounds);
    }
}
