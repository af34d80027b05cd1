//! Analysis driver.
//!
//! An [`Engine`] owns a validated catalog, a remediation table and an
//! optional worker pool. It holds no per-analysis state, so one engine can
//! serve concurrent analyses against different views.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, info_span};

use crate::config::EngineConfig;
use crate::error::AnalysisError;
use crate::report::assemble::{AssemblyInput, assemble};
use crate::report::model::{AnalysisResult, Provenance, ToolInfo};
use crate::repo::view::RepositoryView;
use crate::rules::catalog::{Category, Rule, RuleCatalog};
use crate::rules::eval::{CheckResult, EvalContext, evaluate};
use crate::scoring::aggregate::aggregate;
use crate::scoring::recommend::{RemediationTable, recommend};

pub struct Engine {
    catalog: Arc<RuleCatalog>,
    remediation: Arc<RemediationTable>,
    config: EngineConfig,
    tool: ToolInfo,
    /// `None` evaluates on the calling thread.
    pool: Option<rayon::ThreadPool>,
}

impl Engine {
    pub fn new(
        catalog: Arc<RuleCatalog>,
        remediation: Arc<RemediationTable>,
        config: EngineConfig,
    ) -> Result<Self, AnalysisError> {
        let workers = config.effective_workers();
        let pool = if workers > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("repcheck-eval-{i}"))
                .build()?;
            Some(pool)
        } else {
            None
        };

        debug!(workers, rules = catalog.rule_count(), "engine ready");

        Ok(Self {
            catalog,
            remediation,
            config,
            tool: ToolInfo::default(),
            pool,
        })
    }

    /// Overrides the tool metadata stamped into results.
    pub fn with_tool(mut self, tool: ToolInfo) -> Self {
        self.tool = tool;
        self
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluates every catalog rule against `view` and assembles the result.
    ///
    /// Rules that have not started when the deadline passes are reported as
    /// budget exceeded and the result is marked truncated. Cancellation
    /// through the view's budget aborts the analysis instead.
    pub fn analyze(
        &self,
        view: &dyn RepositoryView,
        provenance: Provenance,
    ) -> Result<AnalysisResult, AnalysisError> {
        let span = info_span!(
            "analyze",
            source = %provenance.source_identifier,
            catalog = %self.catalog.info().version
        );
        let _enter = span.enter();

        let ctx = EvalContext {
            view,
            max_file_bytes: self.config.max_file_bytes,
        };
        let rules: Vec<(&Category, &Rule)> = self.catalog.rules().collect();

        let run = |&(category, rule): &(&Category, &Rule)| -> CheckResult {
            let budget = view.budget();
            if budget.is_cancelled() || budget.deadline_passed() {
                return CheckResult::budget_exceeded(rule, category);
            }
            evaluate(rule, category, &ctx)
        };

        // Indexed collection keeps catalog order regardless of scheduling.
        let checks: Vec<CheckResult> = match &self.pool {
            Some(pool) => pool.install(|| rules.par_iter().map(run).collect()),
            None => rules.iter().map(run).collect(),
        };

        if view.budget().is_cancelled() {
            info!("analysis cancelled");
            return Err(AnalysisError::Cancelled);
        }

        let truncated =
            view.budget().was_exceeded() || checks.iter().any(|c| c.is_budget_exceeded());
        let summary = aggregate(&checks, &self.catalog);
        let recommendations = recommend(&checks, &self.catalog, &self.remediation);

        info!(
            score = summary.overall_score,
            rating = %summary.rating,
            passed = checks.iter().filter(|c| c.passed).count(),
            total = checks.len(),
            truncated,
            bytes_read = view.budget().bytes_used(),
            "analysis complete"
        );

        let result = assemble(AssemblyInput {
            catalog: &self.catalog,
            tool: self.tool.clone(),
            provenance,
            checks,
            summary,
            recommendations,
            truncated,
        })?;

        Ok(result)
    }
}
