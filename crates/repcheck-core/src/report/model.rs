use serde::{Deserialize, Serialize};

use crate::rules::catalog::CatalogInfo;
use crate::rules::eval::CheckResult;
use crate::scoring::aggregate::CategoryResult;
use crate::scoring::rating::{BadgeData, Rating};
use crate::scoring::recommend::Recommendation;

/// Result of one analysis.
///
/// This struct is the stable JSON contract consumed by callers. It must be
/// deterministic for identical repository trees, catalogs and provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub schema_version: String,
    pub tool: ToolInfo,
    pub catalog: CatalogInfo,
    pub source_identifier: String,
    pub evaluated_at: String,
    pub overall_score: f64,
    pub rating: Rating,
    /// Evaluation stopped early because a time or size budget ran out.
    pub truncated: bool,
    pub category_results: Vec<CategoryResult>,
    /// One entry per catalog rule, in catalog order.
    pub check_results: Vec<CheckResult>,
    /// Highest priority first.
    pub recommendations: Vec<Recommendation>,
}

impl AnalysisResult {
    pub fn badge(&self) -> BadgeData {
        BadgeData::new(self.overall_score)
    }

    pub fn passed_count(&self) -> usize {
        self.check_results.iter().filter(|c| c.passed).count()
    }
}

/// Tool metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

impl Default for ToolInfo {
    fn default() -> Self {
        Self {
            name: crate::TOOL_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Caller-supplied provenance. The engine copies it and never computes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Commit hash, repository URL or any other opaque identifier.
    pub source_identifier: String,
    pub evaluated_at: String,
}

impl Provenance {
    pub fn new(source_identifier: impl Into<String>, evaluated_at: impl Into<String>) -> Self {
        Self {
            source_identifier: source_identifier.into(),
            evaluated_at: evaluated_at.into(),
        }
    }
}
