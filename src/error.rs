//! Error types

use std::fmt;

use crate::sim::FruitKind;

/// Why an outline (or a silhouette it was traced from) was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum OutlineError {
    /// Fewer than three vertices
    TooFewPoints { kind: Option<FruitKind>, count: usize },
    /// NaN or infinite coordinate
    NonFinite { kind: Option<FruitKind> },
    /// Edges cross each other
    SelfIntersecting { kind: Option<FruitKind> },
    /// Zero (or numerically zero) enclosed area
    Degenerate { kind: Option<FruitKind> },
    /// Alpha mask length does not match `width * height`
    MaskSize { expected: usize, actual: usize },
    /// No pixel of the mask crosses the threshold
    EmptySilhouette,
    /// An outline table is missing a kind, or has it out of order
    MissingKind(FruitKind),
    /// More outlines than catalog entries
    ExtraOutlines { count: usize },
}

impl fmt::Display for OutlineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = |kind: &Option<FruitKind>| match kind {
            Some(k) => k.name(),
            None => "outline",
        };
        match self {
            OutlineError::TooFewPoints { kind, count } => {
                write!(f, "{} has {} points, need at least 3", label(kind), count)
            }
            OutlineError::NonFinite { kind } => {
                write!(f, "{} has a non-finite coordinate", label(kind))
            }
            OutlineError::SelfIntersecting { kind } => {
                write!(f, "{} is self-intersecting", label(kind))
            }
            OutlineError::Degenerate { kind } => write!(f, "{} encloses no area", label(kind)),
            OutlineError::MaskSize { expected, actual } => {
                write!(f, "alpha mask has {} samples, expected {}", actual, expected)
            }
            OutlineError::EmptySilhouette => write!(f, "alpha mask has no opaque pixels"),
            OutlineError::MissingKind(kind) => write!(f, "no outline for {}", kind.name()),
            OutlineError::ExtraOutlines { count } => {
                write!(f, "{} outlines given for {} fruit kinds", count, FruitKind::COUNT)
            }
        }
    }
}

impl std::error::Error for OutlineError {}

/// Tuning document could not be loaded
#[derive(Debug)]
pub enum TuningError {
    Parse(serde_json::Error),
    /// A value is out of its allowed range
    Invalid { field: &'static str, reason: String },
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::Parse(e) => write!(f, "tuning parse error: {}", e),
            TuningError::Invalid { field, reason } => write!(f, "invalid {}: {}", field, reason),
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TuningError::Parse(e) => Some(e),
            TuningError::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(e: serde_json::Error) -> Self {
        TuningError::Parse(e)
    }
}
