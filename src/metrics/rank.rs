//! Rank-based evaluation
//!
//! At selected rounds every participant submits a ranking of all subjects,
//! most likely case first. Each ranking is scored with precision at `k` and
//! NDCG at two fixed cutoffs, normalised by the ideal cumulative gain of the
//! ground truth.
//!
//! Cumulative gain here leaves the first two ranks undiscounted and divides
//! the gain at 0-based index `i > 1` by `log2(i + 1)`. The ideal vector uses
//! the same discount, so a perfect ranking scores exactly 1.

use crate::error::{EvalError, EvalResult};
use crate::qrels::{GroundTruth, Label};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Default depth for precision at k
pub const DEFAULT_K: usize = 10;

/// NDCG cutoffs reported for every round
pub const NDCG_SHALLOW_CUTOFF: usize = 10;
pub const NDCG_DEEP_CUTOFF: usize = 100;

/// Rounds at which rankings are collected
pub const DEFAULT_ROUNDS: [u32; 6] = [1, 50, 100, 500, 1000, 2000];

/// One entry of a submitted ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    #[serde(rename = "nick")]
    pub subject_id: String,
}

/// The ranking submitted at one round, most likely case first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedSnapshot {
    pub round: u32,
    pub subjects: Vec<String>,
}

impl RankedSnapshot {
    pub fn new<I, S>(round: u32, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            round,
            subjects: subjects.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_entries(round: u32, entries: Vec<RankingEntry>) -> Self {
        Self::new(round, entries.into_iter().map(|e| e.subject_id))
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

/// Best achievable cumulative discounted gain at every rank position
#[derive(Debug, Clone, PartialEq)]
pub struct IdealGainVector(Vec<f64>);

impl IdealGainVector {
    /// Derive the ideal vector from the ground truth.
    ///
    /// Its length equals the number of judged subjects; the value plateaus
    /// once every positive has been placed.
    pub fn compute(truth: &GroundTruth) -> Self {
        let positives = truth.total_positives();

        let values = (0..truth.len())
            .scan(0.0, |acc, i| {
                if i < positives {
                    *acc += if i == 0 { 1.0 } else { 1.0 / ((i + 1) as f64).log2() };
                }
                Some(*acc)
            })
            .collect();

        Self(values)
    }

    /// Ideal gain at a 1-based cutoff
    pub fn at(&self, cutoff: usize) -> Option<f64> {
        cutoff.checked_sub(1).and_then(|i| self.0.get(i)).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Metrics for the ranking of one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundMetrics {
    pub round: u32,
    /// Number of subjects in the submitted ranking
    pub ranking_size: usize,
    pub k: usize,
    pub precision_at_k: f64,
    /// `None` when the ideal gain at the cutoff is zero (no positives)
    pub ndcg_at_10: Option<f64>,
    pub ndcg_at_100: Option<f64>,
}

/// Check that NDCG at the deepest cutoff can be computed for this ground truth
pub fn check_truth_size(truth: &GroundTruth) -> EvalResult<()> {
    if truth.len() < NDCG_DEEP_CUTOFF {
        return Err(EvalError::TruthTooSmall {
            required: NDCG_DEEP_CUTOFF,
            actual: truth.len(),
        });
    }
    Ok(())
}

/// Score one round's ranking.
///
/// The achieved-gain vector spans every judged subject. When the ranking is
/// shorter than the ground truth, positions past its end carry the last
/// cumulative value forward, i.e. unranked subjects add no gain.
///
/// Fails if a ranked subject is not judged or is ranked twice, if the ranking
/// is longer than the ground truth, or if the ground truth is smaller than the
/// deepest cutoff.
pub fn evaluate_round(
    ranked: &RankedSnapshot,
    truth: &GroundTruth,
    ideal: &IdealGainVector,
    k: usize,
) -> EvalResult<RoundMetrics> {
    check_truth_size(truth)?;
    if ideal.len() < NDCG_DEEP_CUTOFF {
        return Err(EvalError::TruthTooSmall {
            required: NDCG_DEEP_CUTOFF,
            actual: ideal.len(),
        });
    }

    if ranked.len() > truth.len() {
        return Err(EvalError::RankingTooLong {
            round: ranked.round,
            len: ranked.len(),
            subjects: truth.len(),
        });
    }

    let mut seen = HashSet::with_capacity(ranked.len());
    let labels = ranked
        .subjects
        .iter()
        .map(|subject| {
            if !seen.insert(subject.as_str()) {
                return Err(EvalError::DuplicateRankedSubject {
                    round: ranked.round,
                    subject: subject.clone(),
                });
            }
            truth
                .label(subject)
                .ok_or_else(|| EvalError::UnknownRankedSubject {
                    round: ranked.round,
                    subject: subject.clone(),
                })
        })
        .collect::<EvalResult<Vec<Label>>>()?;

    let rels_topk = labels.iter().take(k).filter(|l| l.is_positive()).count();

    let mut achieved: Vec<f64> = labels
        .iter()
        .enumerate()
        .scan(0.0, |acc, (i, label)| {
            let gain = label.gain();
            *acc += if i > 1 { gain / ((i + 1) as f64).log2() } else { gain };
            Some(*acc)
        })
        .collect();

    let carried = achieved.last().copied().unwrap_or(0.0);
    achieved.resize(truth.len(), carried);

    let ndcg = |cutoff: usize| -> Option<f64> {
        let ideal_gain = ideal.at(cutoff)?;
        if ideal_gain == 0.0 {
            None
        } else {
            Some(achieved[cutoff - 1] / ideal_gain)
        }
    };

    let metrics = RoundMetrics {
        round: ranked.round,
        ranking_size: ranked.len(),
        k,
        precision_at_k: if k == 0 {
            0.0
        } else {
            rels_topk as f64 / k as f64
        },
        ndcg_at_10: ndcg(NDCG_SHALLOW_CUTOFF),
        ndcg_at_100: ndcg(NDCG_DEEP_CUTOFF),
    };

    debug!(
        "Round {}: {} ranked, {} relevant in top {}",
        ranked.round,
        ranked.len(),
        rels_topk,
        k
    );

    Ok(metrics)
}

/// Ground truth paired with its ideal gain vector, computed once and reused
/// for every round.
#[derive(Debug, Clone)]
pub struct RankEvaluator<'a> {
    truth: &'a GroundTruth,
    ideal: IdealGainVector,
    k: usize,
}

impl<'a> RankEvaluator<'a> {
    pub fn new(truth: &'a GroundTruth, k: usize) -> EvalResult<Self> {
        check_truth_size(truth)?;
        Ok(Self {
            truth,
            ideal: IdealGainVector::compute(truth),
            k,
        })
    }

    pub fn ideal(&self) -> &IdealGainVector {
        &self.ideal
    }

    pub fn evaluate(&self, ranked: &RankedSnapshot) -> EvalResult<RoundMetrics> {
        evaluate_round(ranked, self.truth, &self.ideal, self.k)
    }
}
