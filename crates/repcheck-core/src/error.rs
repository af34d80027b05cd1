//! Error taxonomy for catalog loading and analysis.
//!
//! Catalog problems surface only at load time. Per-file read failures are
//! recovered inside the evaluators and never reach this level. What does
//! reach the caller is either a cancelled run or an invariant violation,
//! which indicates a wiring defect rather than an environmental condition.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A single problem found while validating a rule catalog.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    #[error("catalog defines no categories")]
    NoCategories,

    #[error("category weights sum to {sum}, expected 1.0")]
    WeightSum { sum: f64 },

    #[error("category `{category}` has weight {weight} outside [0, 1]")]
    WeightOutOfRange { category: String, weight: f64 },

    #[error("category name `{category}` is declared more than once")]
    DuplicateCategory { category: String },

    #[error("category `{category}` defines no rules")]
    EmptyCategory { category: String },

    #[error("rule id is empty in category `{category}`")]
    EmptyRuleId { category: String },

    #[error("rule id `{rule_id}` is declared more than once")]
    DuplicateRuleId { rule_id: String },

    #[error("rule `{rule_id}` must award a positive number of points, got {points}")]
    InvalidPoints { rule_id: String, points: i64 },

    #[error("rule `{rule_id}` has an empty `{field}` list")]
    EmptyList { rule_id: String, field: &'static str },

    #[error("rule `{rule_id}` has invalid regex `{pattern}`: {reason}")]
    InvalidRegex {
        rule_id: String,
        pattern: String,
        reason: String,
    },

    #[error("rule `{rule_id}` has invalid glob `{pattern}`: {reason}")]
    InvalidGlob {
        rule_id: String,
        pattern: String,
        reason: String,
    },

    #[error("rule `{rule_id}` has threshold {threshold} outside [0, 1]")]
    ThresholdOutOfRange { rule_id: String, threshold: f64 },
}

/// Every violation found in one validation pass over a catalog.
#[derive(Debug, Clone, PartialEq, Error)]
pub struct CatalogValidationError {
    pub violations: Vec<Violation>,
}

impl fmt::Display for CatalogValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rule catalog rejected with {} violation(s)",
            self.violations.len()
        )?;
        for v in &self.violations {
            write!(f, "\n  - {v}")?;
        }
        Ok(())
    }
}

/// Failure to turn a raw document into a validated catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse catalog document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] CatalogValidationError),
}

/// Why a single file read did not yield text.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("read budget exceeded")]
    BudgetExceeded,

    #[error("analysis cancelled")]
    Cancelled,

    #[error("`{path}` is not part of the repository view")]
    NotFound { path: String },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{path}` looks like binary content")]
    Undecodable { path: String },

    #[error("`{path}` links outside the repository root")]
    OutsideRoot { path: String },
}

/// Inconsistent intermediate state detected while assembling a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("check result for `{rule_id}` references unknown category `{category}`")]
    UnknownCategory { rule_id: String, category: String },

    #[error("check result references unknown rule `{rule_id}`")]
    UnknownRule { rule_id: String },

    #[error("rule `{rule_id}` earned {earned} of {possible} points")]
    PointsOverflow {
        rule_id: String,
        earned: u32,
        possible: u32,
    },
}

/// Hard failures of a single analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis cancelled by caller")]
    Cancelled,

    #[error("internal invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("failed to start evaluation workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
