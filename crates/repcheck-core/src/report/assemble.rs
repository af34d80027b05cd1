//! Composition of scored results into an [`AnalysisResult`].
//!
//! Nothing is computed here. The assembler checks that the intermediate
//! state is consistent with the catalog and copies fields across.

use crate::SCHEMA_VERSION;
use crate::error::InvariantViolation;
use crate::report::model::{AnalysisResult, Provenance, ToolInfo};
use crate::rules::catalog::RuleCatalog;
use crate::rules::eval::CheckResult;
use crate::scoring::aggregate::ScoreSummary;
use crate::scoring::recommend::Recommendation;

pub struct AssemblyInput<'a> {
    pub catalog: &'a RuleCatalog,
    pub tool: ToolInfo,
    pub provenance: Provenance,
    pub checks: Vec<CheckResult>,
    pub summary: ScoreSummary,
    pub recommendations: Vec<Recommendation>,
    pub truncated: bool,
}

pub fn assemble(input: AssemblyInput<'_>) -> Result<AnalysisResult, InvariantViolation> {
    for check in &input.checks {
        verify(check, input.catalog)?;
    }

    Ok(AnalysisResult {
        schema_version: SCHEMA_VERSION.to_string(),
        tool: input.tool,
        catalog: input.catalog.info().clone(),
        source_identifier: input.provenance.source_identifier,
        evaluated_at: input.provenance.evaluated_at,
        overall_score: input.summary.overall_score,
        rating: input.summary.rating,
        truncated: input.truncated,
        category_results: input.summary.categories,
        check_results: input.checks,
        recommendations: input.recommendations,
    })
}

fn verify(check: &CheckResult, catalog: &RuleCatalog) -> Result<(), InvariantViolation> {
    if catalog.category(&check.category).is_none() {
        return Err(InvariantViolation::UnknownCategory {
            rule_id: check.rule_id.to_string(),
            category: check.category.clone(),
        });
    }

    let Some((category, rule)) = catalog.rule(&check.rule_id) else {
        return Err(InvariantViolation::UnknownRule {
            rule_id: check.rule_id.to_string(),
        });
    };

    if category.name != check.category {
        return Err(InvariantViolation::UnknownCategory {
            rule_id: check.rule_id.to_string(),
            category: check.category.clone(),
        });
    }

    if check.points_earned > check.points_possible || check.points_possible != rule.points {
        return Err(InvariantViolation::PointsOverflow {
            rule_id: check.rule_id.to_string(),
            earned: check.points_earned,
            possible: check.points_possible,
        });
    }

    Ok(())
}
