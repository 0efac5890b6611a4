use thiserror::Error;

/// Errors raised by the metric engine and the qrels parser.
///
/// Skippable conditions (a decision for an unknown subject) never surface
/// here; they are reported through `DecisionMetrics::dropped_subjects`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A ranked subject has no ground-truth judgment
    #[error("round {round}: ranked subject '{subject}' does not appear in the qrels")]
    UnknownRankedSubject { round: u32, subject: String },

    /// A subject listed more than once in the same ranking
    #[error("round {round}: subject '{subject}' is ranked more than once")]
    DuplicateRankedSubject { round: u32, subject: String },

    /// Ground truth is too small for the deepest NDCG cutoff
    #[error("ground truth has {actual} subjects, at least {required} are needed for NDCG@{required}")]
    TruthTooSmall { required: usize, actual: usize },

    /// A ranking lists more subjects than the ground truth holds
    #[error("round {round}: ranking has {len} entries but only {subjects} subjects are judged")]
    RankingTooLong {
        round: u32,
        len: usize,
        subjects: usize,
    },

    /// A label or decision outside {0, 1}
    #[error("invalid binary label: {0}")]
    InvalidLabel(u8),

    /// A qrels line that could not be parsed
    #[error("malformed qrels line {line}: {reason}")]
    MalformedQrels { line: usize, reason: String },
}

pub type EvalResult<T> = Result<T, EvalError>;
