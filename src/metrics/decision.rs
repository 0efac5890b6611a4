//! Decision-based evaluation
//!
//! Scores the final binary decision issued for each subject: confusion-matrix
//! metrics, Early Risk Detection Error (ERDE) at two target delays, and the
//! latency-weighted F1 built on the median penalty of true positives.

use super::penalty::{erde_true_positive, mean, median, penalty};
use crate::qrels::{GroundTruth, Label};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Target delays for the two reported ERDE variants
pub const ERDE_SHORT_TARGET: f64 = 5.0;
pub const ERDE_LONG_TARGET: f64 = 50.0;

/// A participant's decision about one subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionEvent {
    /// Subject identifier
    #[serde(rename = "nick")]
    pub subject_id: String,
    /// 0-based round at which the decision was issued
    #[serde(rename = "sequence")]
    pub round_index: u32,
    pub decision: Label,
}

impl DecisionEvent {
    pub fn new(subject_id: &str, round_index: u32, decision: Label) -> Self {
        Self {
            subject_id: subject_id.to_string(),
            round_index,
            decision,
        }
    }

    /// Rounds elapsed before the decision, 1-based
    pub fn latency(&self) -> u64 {
        u64::from(self.round_index) + 1
    }
}

/// Aggregate decision metrics for one run.
///
/// `None` marks a value that is undefined for the input, e.g. latency
/// statistics when there are no true positives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionMetrics {
    pub true_positives: u32,
    pub true_negatives: u32,
    pub false_positives: u32,
    pub false_negatives: u32,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub erde5: Option<f64>,
    pub erde50: Option<f64>,
    pub median_latency_tp: Option<f64>,
    pub median_penalty_tp: Option<f64>,
    pub speed: Option<f64>,
    pub latency_weighted_f1: Option<f64>,
    /// Subjects whose decisions were dropped because they are not in the qrels
    pub dropped_subjects: Vec<String>,
}

/// Confusion-matrix cell of a single decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    TruePositive,
    TrueNegative,
    FalsePositive,
    FalseNegative,
}

impl Outcome {
    fn classify(decision: Label, truth: Label) -> Self {
        match (decision, truth) {
            (Label::Positive, Label::Positive) => Outcome::TruePositive,
            (Label::Negative, Label::Negative) => Outcome::TrueNegative,
            (Label::Positive, Label::Negative) => Outcome::FalsePositive,
            (Label::Negative, Label::Positive) => Outcome::FalseNegative,
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    tp: u32,
    tn: u32,
    fp: u32,
    fn_: u32,
    erde5: Vec<f64>,
    erde50: Vec<f64>,
    latencies: Vec<f64>,
    penalties: Vec<f64>,
    dropped: Vec<String>,
}

impl Tally {
    fn record(mut self, event: &DecisionEvent, truth: &GroundTruth) -> Self {
        let Some(label) = truth.label(&event.subject_id) else {
            warn!(
                "Subject does not appear in the qrels, dropping decision: {}",
                event.subject_id
            );
            self.dropped.push(event.subject_id.clone());
            return self;
        };

        // Fixed cost of flagging a non-case
        let false_alarm_cost = truth.total_positives() as f64 / truth.len() as f64;

        let (cost5, cost50) = match Outcome::classify(event.decision, label) {
            Outcome::TruePositive => {
                self.tp += 1;
                let latency = event.latency();
                self.latencies.push(latency as f64);
                self.penalties.push(penalty(latency));
                (
                    erde_true_positive(latency, ERDE_SHORT_TARGET),
                    erde_true_positive(latency, ERDE_LONG_TARGET),
                )
            }
            Outcome::TrueNegative => {
                self.tn += 1;
                (0.0, 0.0)
            }
            Outcome::FalsePositive => {
                self.fp += 1;
                (false_alarm_cost, false_alarm_cost)
            }
            Outcome::FalseNegative => {
                self.fn_ += 1;
                (1.0, 1.0)
            }
        };

        self.erde5.push(cost5);
        self.erde50.push(cost50);
        self
    }

    fn finish(self, truth: &GroundTruth) -> DecisionMetrics {
        let (precision, recall, f1) = if self.tp == 0 {
            (0.0, 0.0, 0.0)
        } else {
            let tp = f64::from(self.tp);
            let precision = tp / f64::from(self.tp + self.fp);
            let recall = tp / truth.total_positives() as f64;
            let f1 = 2.0 * precision * recall / (precision + recall);
            (precision, recall, f1)
        };

        let median_penalty_tp = median(&self.penalties);
        let speed = median_penalty_tp.map(|p| 1.0 - p);

        DecisionMetrics {
            true_positives: self.tp,
            true_negatives: self.tn,
            false_positives: self.fp,
            false_negatives: self.fn_,
            precision,
            recall,
            f1,
            erde5: mean(&self.erde5),
            erde50: mean(&self.erde50),
            median_latency_tp: median(&self.latencies),
            median_penalty_tp,
            speed,
            latency_weighted_f1: speed.map(|s| f1 * s),
            dropped_subjects: self.dropped,
        }
    }
}

/// Score a run's decisions against the ground truth.
///
/// Events for subjects absent from `truth` are dropped with a warning and
/// contribute to no counter or ERDE average.
pub fn evaluate_decisions(events: &[DecisionEvent], truth: &GroundTruth) -> DecisionMetrics {
    debug!(
        "Evaluating {} decisions against {} subjects",
        events.len(),
        truth.len()
    );

    events
        .iter()
        .fold(Tally::default(), |tally, event| tally.record(event, truth))
        .finish(truth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    /// Counts WARN events seen while installed
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn truth_acb() -> GroundTruth {
        GroundTruth::from_pairs([
            ("a", Label::Positive),
            ("b", Label::Negative),
            ("c", Label::Positive),
        ])
    }

    #[test]
    fn test_perfect_run() {
        let events = vec![
            DecisionEvent::new("a", 0, Label::Positive),
            DecisionEvent::new("b", 0, Label::Negative),
            DecisionEvent::new("c", 2, Label::Positive),
        ];

        let m = evaluate_decisions(&events, &truth_acb());

        assert_eq!(
            (m.true_positives, m.true_negatives, m.false_positives, m.false_negatives),
            (2, 1, 0, 0)
        );
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1, 1.0);

        let erde_a = 1.0 - 1.0 / (1.0 + (1.0f64 - 5.0).exp());
        let erde_c = 1.0 - 1.0 / (1.0 + (3.0f64 - 5.0).exp());
        let expected = (erde_a + 0.0 + erde_c) / 3.0;
        assert!((m.erde5.unwrap() - expected).abs() < 1e-12);

        assert_eq!(m.median_latency_tp, Some(2.0));
        let expected_penalty = (penalty(1) + penalty(3)) / 2.0;
        assert!((m.median_penalty_tp.unwrap() - expected_penalty).abs() < 1e-12);
        assert!((m.speed.unwrap() - (1.0 - expected_penalty)).abs() < 1e-12);
        assert!((m.latency_weighted_f1.unwrap() - m.speed.unwrap()).abs() < 1e-12);
        assert!(m.dropped_subjects.is_empty());
    }

    #[test]
    fn test_false_alarm_and_miss_costs() {
        let events = vec![
            DecisionEvent::new("a", 4, Label::Negative),
            DecisionEvent::new("b", 1, Label::Positive),
        ];

        let m = evaluate_decisions(&events, &truth_acb());

        assert_eq!(m.false_negatives, 1);
        assert_eq!(m.false_positives, 1);
        // (1 + 2/3) / 2
        let expected = (1.0 + 2.0 / 3.0) / 2.0;
        assert!((m.erde5.unwrap() - expected).abs() < 1e-12);
        assert!((m.erde50.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_zero_true_positives_is_degenerate_not_fatal() {
        let events = vec![
            DecisionEvent::new("a", 0, Label::Negative),
            DecisionEvent::new("b", 0, Label::Positive),
        ];

        let m = evaluate_decisions(&events, &truth_acb());

        assert_eq!(m.true_positives, 0);
        assert_eq!((m.precision, m.recall, m.f1), (0.0, 0.0, 0.0));
        assert_eq!(m.median_latency_tp, None);
        assert_eq!(m.median_penalty_tp, None);
        assert_eq!(m.speed, None);
        assert_eq!(m.latency_weighted_f1, None);
        assert!(m.erde5.is_some());
    }

    #[test]
    fn test_unknown_subject_is_dropped_once() {
        let events = vec![
            DecisionEvent::new("a", 0, Label::Positive),
            DecisionEvent::new("ghost", 0, Label::Positive),
        ];

        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&warnings)));
        let m = tracing::subscriber::with_default(subscriber, || {
            evaluate_decisions(&events, &truth_acb())
        });

        assert_eq!(warnings.load(Ordering::SeqCst), 1);
        assert_eq!(m.dropped_subjects, vec!["ghost".to_string()]);
        assert_eq!(
            (m.true_positives, m.true_negatives, m.false_positives, m.false_negatives),
            (1, 0, 0, 0)
        );
        // Mean is over the surviving event only
        let erde_a = 1.0 - 1.0 / (1.0 + (1.0f64 - 5.0).exp());
        assert!((m.erde5.unwrap() - erde_a).abs() < 1e-12);
        assert_eq!(m.recall, 0.5);
    }

    #[test]
    fn test_last_possible_round_does_not_overflow() {
        let events = vec![DecisionEvent::new("a", u32::MAX, Label::Positive)];

        let m = evaluate_decisions(&events, &truth_acb());

        assert_eq!(events[0].latency(), u64::from(u32::MAX) + 1);
        assert_eq!(m.true_positives, 1);
        assert_eq!(m.median_latency_tp, Some(4_294_967_296.0));
        // A decision this late costs the full ERDE and is fully penalised
        assert!((m.erde5.unwrap() - 1.0).abs() < 1e-12);
        assert!((m.speed.unwrap() - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_events_leaves_erde_undefined() {
        let m = evaluate_decisions(&[], &truth_acb());
        assert_eq!(m.erde5, None);
        assert_eq!(m.erde50, None);
        assert_eq!(m.f1, 0.0);
    }

    #[test]
    fn test_repeat_evaluation_is_identical() {
        let events = vec![
            DecisionEvent::new("a", 7, Label::Positive),
            DecisionEvent::new("b", 3, Label::Positive),
            DecisionEvent::new("c", 11, Label::Positive),
        ];
        let truth = truth_acb();

        let first = evaluate_decisions(&events, &truth);
        let second = evaluate_decisions(&events, &truth);
        assert_eq!(first, second);
        assert_eq!(first.speed.unwrap().to_bits(), second.speed.unwrap().to_bits());
    }

    #[test]
    fn test_deserialize_run_entry() {
        let json = r#"[{"nick": "a", "decision": 1, "sequence": 4, "score": 0.9}]"#;
        let events: Vec<DecisionEvent> = serde_json::from_str(json).unwrap();
        assert_eq!(events[0], DecisionEvent::new("a", 4, Label::Positive));
        assert_eq!(events[0].latency(), 5);
    }
}
