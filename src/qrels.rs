//! Ground-truth relevance judgments (qrels)
//!
//! A qrels file holds one `subject label` pair per line, whitespace separated,
//! where the label is `1` for a case and `0` for a non-case.

use crate::error::{EvalError, EvalResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Binary relevance label, also used for participant decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Label {
    Negative,
    Positive,
}

impl Label {
    /// Relevance as a gain value (0.0 or 1.0)
    pub fn gain(self) -> f64 {
        match self {
            Label::Negative => 0.0,
            Label::Positive => 1.0,
        }
    }

    pub fn is_positive(self) -> bool {
        self == Label::Positive
    }
}

impl TryFrom<u8> for Label {
    type Error = EvalError;

    fn try_from(value: u8) -> EvalResult<Self> {
        match value {
            0 => Ok(Label::Negative),
            1 => Ok(Label::Positive),
            other => Err(EvalError::InvalidLabel(other)),
        }
    }
}

impl From<Label> for u8 {
    fn from(label: Label) -> Self {
        match label {
            Label::Negative => 0,
            Label::Positive => 1,
        }
    }
}

/// Immutable mapping from subject id to its true label
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroundTruth {
    labels: BTreeMap<String, Label>,
    total_positives: usize,
}

impl GroundTruth {
    /// Build from (subject, label) pairs; a repeated subject keeps its last label
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Label)>,
        S: Into<String>,
    {
        let labels: BTreeMap<String, Label> =
            pairs.into_iter().map(|(s, l)| (s.into(), l)).collect();
        let total_positives = labels.values().filter(|l| l.is_positive()).count();

        Self {
            labels,
            total_positives,
        }
    }

    /// Parse qrels text
    pub fn parse(content: &str) -> EvalResult<Self> {
        let mut pairs = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            let mut fields = line.split_whitespace();
            let Some(subject) = fields.next() else {
                continue;
            };

            let raw = fields.next().ok_or_else(|| EvalError::MalformedQrels {
                line: idx + 1,
                reason: format!("missing label for subject '{}'", subject),
            })?;

            let value: u8 = raw.parse().map_err(|_| EvalError::MalformedQrels {
                line: idx + 1,
                reason: format!("label '{}' is not an integer", raw),
            })?;

            let label = Label::try_from(value).map_err(|e| EvalError::MalformedQrels {
                line: idx + 1,
                reason: e.to_string(),
            })?;

            pairs.push((subject.to_string(), label));
        }

        let read = pairs.len();
        let truth = Self::from_pairs(pairs);
        if truth.len() != read {
            warn!(
                "qrels contain {} duplicate subject lines, last label wins",
                read - truth.len()
            );
        }

        Ok(truth)
    }

    /// Load a qrels file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .context(format!("Failed to read qrels file: {:?}", path.as_ref()))?;

        let truth = Self::parse(&content)
            .context(format!("Failed to parse qrels file: {:?}", path.as_ref()))?;

        info!(
            "{} lines read in qrels file ({} positives)",
            truth.len(),
            truth.total_positives()
        );

        Ok(truth)
    }

    pub fn label(&self, subject: &str) -> Option<Label> {
        self.labels.get(subject).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of subjects labelled as cases
    pub fn total_positives(&self) -> usize {
        self.total_positives
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_qrels() {
        let truth = GroundTruth::parse("subject1 1\nsubject2 0\n\nsubject3\t1\n").unwrap();
        assert_eq!(truth.len(), 3);
        assert_eq!(truth.total_positives(), 2);
        assert_eq!(truth.label("subject2"), Some(Label::Negative));
        assert_eq!(truth.label("missing"), None);
    }

    #[test]
    fn test_parse_rejects_bad_label() {
        let err = GroundTruth::parse("a 1\nb 2\n").unwrap_err();
        assert!(matches!(err, EvalError::MalformedQrels { line: 2, .. }));
    }

    #[test]
    fn test_parse_rejects_missing_label() {
        let err = GroundTruth::parse("a\n").unwrap_err();
        assert!(matches!(err, EvalError::MalformedQrels { line: 1, .. }));
    }

    #[test]
    fn test_label_deserialize() {
        let label: Label = serde_json::from_str("1").unwrap();
        assert_eq!(label, Label::Positive);
        assert!(serde_json::from_str::<Label>("3").is_err());
        assert_eq!(serde_json::to_string(&Label::Negative).unwrap(), "0");
    }
}
