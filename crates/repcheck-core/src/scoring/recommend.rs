//! Remediation entries for failed checks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rules::catalog::{RuleCatalog, RuleId, Severity};
use crate::rules::eval::CheckResult;
use crate::util::deterministic::sort_recommendations;

pub const FALLBACK_FIX: &str = "No specific recommendation available";

/// Fix text for one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remediation {
    pub fix: String,
    #[serde(default)]
    pub example: String,
}

/// Remediation text keyed by rule id.
///
/// The table is maintained next to the catalog. A rule without an entry
/// still gets a recommendation, with generic text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemediationTable(BTreeMap<RuleId, Remediation>);

impl RemediationTable {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn get(&self, rule_id: &RuleId) -> Option<&Remediation> {
        self.0.get(rule_id)
    }

    pub fn insert(&mut self, rule_id: RuleId, remediation: Remediation) {
        self.0.insert(rule_id, remediation);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub rule_id: RuleId,
    pub category: String,
    pub severity: Severity,
    pub title: String,
    pub fix: String,
    pub example: String,
    /// Points recoverable by fixing the rule.
    pub points_impact: u32,
}

/// One recommendation per failed check, highest priority first.
///
/// Checks whose rule is not in `catalog` are skipped; the assembler
/// reports them as invariant violations.
pub fn recommend(
    checks: &[CheckResult],
    catalog: &RuleCatalog,
    table: &RemediationTable,
) -> Vec<Recommendation> {
    let mut out: Vec<Recommendation> = checks
        .iter()
        .filter(|c| !c.passed)
        .filter_map(|check| {
            let (_, rule) = catalog.rule(&check.rule_id)?;
            let (fix, example) = match table.get(&rule.id) {
                Some(r) => (r.fix.clone(), r.example.clone()),
                None => (FALLBACK_FIX.to_string(), String::new()),
            };

            Some(Recommendation {
                rule_id: rule.id.clone(),
                category: check.category.clone(),
                severity: rule.severity,
                title: rule.name.clone(),
                fix,
                example,
                points_impact: check.points_possible.saturating_sub(check.points_earned),
            })
        })
        .collect();

    sort_recommendations(&mut out, |name| catalog.category_weight(name));
    out
}
