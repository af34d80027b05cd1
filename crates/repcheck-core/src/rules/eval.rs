//! Predicate evaluation.
//!
//! Each evaluator is a pure function of one rule and a read-only
//! repository view. Evaluators share no mutable state; the only shared
//! resource is the view's read budget, which is atomic. A file that cannot
//! be read or decoded counts as a non-match and evaluation moves on.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ReadError;
use crate::repo::glob::{PathGlobs, PathPattern};
use crate::repo::view::RepositoryView;
use crate::rules::catalog::{Category, Predicate, Rule, RuleId};
use crate::rules::manifest;

/// Structured findings attached to a check result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evidence {
    /// First existing path matched by a candidate pattern.
    PathFound { path: String, candidate: String },
    /// First file whose content matched; the excerpt is not recorded.
    PatternFound { file: String, pattern: String },
    NoPatternMatch {
        files_scanned: usize,
        files_skipped: usize,
        /// Files scanned only up to the per-file cap.
        #[serde(default)]
        files_truncated: usize,
    },
    PinRatio {
        pinned: usize,
        total: usize,
        ratio: f64,
        manifests: Vec<String>,
    },
    NoDependenciesDeclared { manifests: Vec<String> },
    /// The rule was skipped or cut short by the read budget.
    BudgetExceeded,
}

/// Outcome of one rule for one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub rule_id: RuleId,
    pub category: String,
    pub passed: bool,
    pub points_earned: u32,
    pub points_possible: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
}

impl CheckResult {
    /// Result for a rule that was never started.
    pub fn budget_exceeded(rule: &Rule, category: &Category) -> Self {
        Self {
            rule_id: rule.id.clone(),
            category: category.name.clone(),
            passed: false,
            points_earned: 0,
            points_possible: rule.points,
            evidence: Some(Evidence::BudgetExceeded),
        }
    }

    pub fn is_budget_exceeded(&self) -> bool {
        matches!(self.evidence, Some(Evidence::BudgetExceeded))
    }
}

/// Inputs shared by every evaluator in one analysis.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    pub view: &'a dyn RepositoryView,
    /// Per-file cap passed to every content read.
    pub max_file_bytes: u64,
}

enum Credit {
    Binary,
    Ratio(f64),
}

struct Outcome {
    passed: bool,
    credit: Credit,
    evidence: Option<Evidence>,
}

impl Outcome {
    fn binary(passed: bool, evidence: Option<Evidence>) -> Self {
        Self {
            passed,
            credit: Credit::Binary,
            evidence,
        }
    }

    fn budget_exceeded() -> Self {
        Self::binary(false, Some(Evidence::BudgetExceeded))
    }

    fn into_check(self, rule: &Rule, category: &Category) -> CheckResult {
        let points_earned = match self.credit {
            Credit::Binary if self.passed => rule.points,
            Credit::Binary => 0,
            Credit::Ratio(ratio) => proportional_points(rule.points, ratio),
        };

        CheckResult {
            rule_id: rule.id.clone(),
            category: category.name.clone(),
            passed: self.passed,
            points_earned,
            points_possible: rule.points,
            evidence: self.evidence,
        }
    }
}

/// `round(points * ratio)`, never above `points`.
pub fn proportional_points(points: u32, ratio: f64) -> u32 {
    let ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
    ((points as f64 * ratio).round() as u32).min(points)
}

/// Evaluates one rule against the view.
pub fn evaluate(rule: &Rule, category: &Category, ctx: &EvalContext<'_>) -> CheckResult {
    let outcome = match &rule.predicate {
        Predicate::FileExists { candidates } => {
            find_first(candidates, |p| ctx.view.find_file(p))
        }
        Predicate::DirectoryExists { candidates } => {
            find_first(candidates, |p| ctx.view.find_directory(p))
        }
        Predicate::PatternMatch {
            patterns,
            file_globs,
        } => match_patterns(patterns, file_globs, ctx),
        Predicate::DependencyPinRatio {
            manifest_globs,
            threshold,
        } => pin_ratio(manifest_globs, *threshold, ctx),
    };

    let check = outcome.into_check(rule, category);
    tracing::debug!(
        rule = %check.rule_id,
        kind = rule.predicate.kind(),
        passed = check.passed,
        earned = check.points_earned,
        "rule evaluated"
    );
    check
}

fn find_first<'v>(
    candidates: &[PathPattern],
    mut find: impl FnMut(&PathPattern) -> Option<&'v str>,
) -> Outcome {
    let hit = candidates
        .iter()
        .find_map(|c| find(c).map(|path| (path, c.as_str())));

    match hit {
        Some((path, candidate)) => Outcome::binary(
            true,
            Some(Evidence::PathFound {
                path: path.to_string(),
                candidate: candidate.to_string(),
            }),
        ),
        None => Outcome::binary(false, None),
    }
}

fn match_patterns(patterns: &[Regex], file_globs: &PathGlobs, ctx: &EvalContext<'_>) -> Outcome {
    let mut scanned = 0;
    let mut skipped = 0;
    let mut truncated = 0;

    for path in ctx.view.list_files(file_globs) {
        let text = match ctx.view.read_text(path, ctx.max_file_bytes) {
            Ok(text) => text,
            Err(ReadError::BudgetExceeded | ReadError::Cancelled) => {
                return Outcome::budget_exceeded();
            }
            Err(err) => {
                tracing::debug!(path, error = %err, "skipping file");
                skipped += 1;
                continue;
            }
        };

        scanned += 1;
        if text.truncated {
            truncated += 1;
        }
        if let Some(re) = patterns.iter().find(|re| re.is_match(&text.content)) {
            return Outcome::binary(
                true,
                Some(Evidence::PatternFound {
                    file: path.to_string(),
                    pattern: re.as_str().to_string(),
                }),
            );
        }
    }

    Outcome::binary(
        false,
        Some(Evidence::NoPatternMatch {
            files_scanned: scanned,
            files_skipped: skipped,
            files_truncated: truncated,
        }),
    )
}

fn pin_ratio(manifest_globs: &PathGlobs, threshold: f64, ctx: &EvalContext<'_>) -> Outcome {
    let mut pinned = 0;
    let mut total = 0;
    let mut manifests = Vec::new();

    for path in ctx.view.list_files(manifest_globs) {
        let text = match ctx.view.read_text(path, ctx.max_file_bytes) {
            Ok(text) => text,
            Err(ReadError::BudgetExceeded | ReadError::Cancelled) => {
                return Outcome::budget_exceeded();
            }
            Err(err) => {
                tracing::debug!(path, error = %err, "skipping manifest");
                continue;
            }
        };

        let declarations = manifest::extract(path, &text.content);
        total += declarations.len();
        pinned += declarations.iter().filter(|d| d.pinned).count();
        manifests.push(path.to_string());
    }

    if total == 0 {
        return Outcome::binary(false, Some(Evidence::NoDependenciesDeclared { manifests }));
    }

    let ratio = pinned as f64 / total as f64;
    Outcome {
        passed: ratio >= threshold,
        credit: Credit::Ratio(ratio),
        evidence: Some(Evidence::PinRatio {
            pinned,
            total,
            ratio,
            manifests,
        }),
    }
}
