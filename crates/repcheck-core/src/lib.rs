pub mod config;
pub mod engine;
pub mod error;
pub mod repo;
pub mod report;
pub mod rules;
pub mod scoring;
pub mod util;

use std::path::Path;

use anyhow::{Context, Result};

use crate::engine::Engine;
use crate::error::CatalogError;
use crate::repo::budget::{CancellationToken, ReadBudget};
use crate::repo::local::LocalRepository;
use crate::report::model::{AnalysisResult, Provenance};
use crate::rules::catalog::RuleCatalog;
use crate::scoring::recommend::RemediationTable;

pub const TOOL_NAME: &str = "repcheck";

/// JSON schema version of analysis results.
/// Bump only when the shape of `AnalysisResult` changes.
pub const SCHEMA_VERSION: &str = "1.0.0";

const DEFAULT_CATALOG: &str = include_str!("../catalog/default.json");
const DEFAULT_REMEDIATION: &str = include_str!("../catalog/remediation.json");

/// The bundled catalog of sixteen checks across five categories.
pub fn default_catalog() -> Result<RuleCatalog, CatalogError> {
    RuleCatalog::from_json_str(DEFAULT_CATALOG)
}

/// Remediation text for every rule of [`default_catalog`].
pub fn default_remediation() -> Result<RemediationTable, serde_json::Error> {
    RemediationTable::from_json_str(DEFAULT_REMEDIATION)
}

/// Indexes `root` and analyzes it with `engine`.
///
/// The read budget starts when the tree is opened, so indexing counts
/// against the time budget.
pub fn analyze_path(
    root: &Path,
    engine: &Engine,
    cancel: CancellationToken,
    provenance: Provenance,
) -> Result<AnalysisResult> {
    let budget = ReadBudget::from_config(engine.config(), cancel);
    let view = LocalRepository::open(root, budget)
        .with_context(|| format!("failed to open repository at {}", root.display()))?;

    let result = engine
        .analyze(&view, provenance)
        .with_context(|| format!("analysis of {} failed", root.display()))?;

    Ok(result)
}
