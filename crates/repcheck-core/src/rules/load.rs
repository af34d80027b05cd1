//! Rule catalog loading and validation.
//!
//! The raw document mirrors the JSON catalog format one-to-one. `load`
//! validates it in a single pass and compiles every regex and glob, so a
//! catalog that loads can never fail on a bad pattern mid-analysis.
//!
//! Validation never stops at the first problem: every violation found is
//! reported together.

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{CatalogError, CatalogValidationError, Violation};
use crate::repo::glob::{PathGlobs, PathPattern};
use crate::rules::catalog::{
    CatalogInfo, Category, Predicate, Rule, RuleCatalog, RuleId, Severity,
};

/// Allowed distance between the weight sum and 1.0.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RawCatalog {
    #[serde(default = "default_version")]
    pub version: String,
    pub categories: Vec<RawCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RawCategory {
    pub name: String,
    pub weight: f64,
    #[serde(default)]
    pub rules: Vec<RawRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RawRule {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub points: i64,
    #[serde(default)]
    pub severity: Severity,
    pub predicate: RawPredicate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawPredicate {
    FileExists {
        candidates: Vec<String>,
    },
    DirectoryExists {
        candidates: Vec<String>,
    },
    PatternMatch {
        patterns: Vec<String>,
        #[serde(default = "default_file_globs")]
        file_globs: Vec<String>,
        /// Matching is case-insensitive unless a rule opts out.
        #[serde(default)]
        case_sensitive: bool,
    },
    DependencyPinRatio {
        manifest_globs: Vec<String>,
        threshold: f64,
    },
}

fn default_version() -> String {
    "0".to_string()
}

fn default_file_globs() -> Vec<String> {
    vec!["*.py".to_string()]
}

impl RuleCatalog {
    /// Parses a JSON catalog document and validates it.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        Ok(load(&raw)?)
    }
}

/// Validates `raw` and compiles it into an immutable catalog.
pub fn load(raw: &RawCatalog) -> Result<RuleCatalog, CatalogValidationError> {
    let mut violations = Vec::new();

    if raw.categories.is_empty() {
        violations.push(Violation::NoCategories);
    }

    for c in &raw.categories {
        if !(0.0..=1.0).contains(&c.weight) {
            violations.push(Violation::WeightOutOfRange {
                category: c.name.clone(),
                weight: c.weight,
            });
        }
    }

    let sum: f64 = raw.categories.iter().map(|c| c.weight).sum();
    if !raw.categories.is_empty() && (sum.is_nan() || (sum - 1.0).abs() > WEIGHT_TOLERANCE) {
        violations.push(Violation::WeightSum { sum });
    }

    let mut category_names = HashSet::new();
    let mut rule_ids = HashSet::new();
    let mut categories = Vec::with_capacity(raw.categories.len());

    for raw_category in &raw.categories {
        if !category_names.insert(raw_category.name.as_str()) {
            violations.push(Violation::DuplicateCategory {
                category: raw_category.name.clone(),
            });
        }
        if raw_category.rules.is_empty() {
            violations.push(Violation::EmptyCategory {
                category: raw_category.name.clone(),
            });
        }

        let mut rules = Vec::with_capacity(raw_category.rules.len());
        for raw_rule in &raw_category.rules {
            if raw_rule.id.trim().is_empty() {
                violations.push(Violation::EmptyRuleId {
                    category: raw_category.name.clone(),
                });
            } else if !rule_ids.insert(raw_rule.id.as_str()) {
                violations.push(Violation::DuplicateRuleId {
                    rule_id: raw_rule.id.clone(),
                });
            }

            let points = match u32::try_from(raw_rule.points) {
                Ok(p) if p > 0 => p,
                _ => {
                    violations.push(Violation::InvalidPoints {
                        rule_id: raw_rule.id.clone(),
                        points: raw_rule.points,
                    });
                    0
                }
            };

            let predicate = compile_predicate(&raw_rule.id, &raw_rule.predicate, &mut violations);

            rules.push(Rule {
                id: RuleId(raw_rule.id.clone()),
                name: raw_rule.name.clone().unwrap_or_else(|| raw_rule.id.clone()),
                points,
                severity: raw_rule.severity,
                predicate,
            });
        }

        categories.push(Category {
            name: raw_category.name.clone(),
            weight: raw_category.weight,
            rules,
        });
    }

    if !violations.is_empty() {
        return Err(CatalogValidationError { violations });
    }

    tracing::debug!(
        version = %raw.version,
        categories = categories.len(),
        "rule catalog loaded"
    );

    Ok(RuleCatalog {
        info: CatalogInfo {
            version: raw.version.clone(),
            fingerprint: fingerprint(raw),
        },
        categories,
    })
}

/// Hex sha256 over the canonical JSON form of the document.
fn fingerprint(raw: &RawCatalog) -> String {
    // Plain data with string keys always serializes.
    let canonical = serde_json::to_vec(raw).unwrap_or_default();
    hex::encode(Sha256::digest(&canonical))
}

fn compile_predicate(
    rule_id: &str,
    raw: &RawPredicate,
    violations: &mut Vec<Violation>,
) -> Predicate {
    match raw {
        RawPredicate::FileExists { candidates } => Predicate::FileExists {
            candidates: compile_globs(rule_id, "candidates", candidates, violations),
        },
        RawPredicate::DirectoryExists { candidates } => Predicate::DirectoryExists {
            candidates: compile_globs(rule_id, "candidates", candidates, violations),
        },
        RawPredicate::PatternMatch {
            patterns,
            file_globs,
            case_sensitive,
        } => Predicate::PatternMatch {
            patterns: compile_regexes(rule_id, patterns, *case_sensitive, violations),
            file_globs: PathGlobs::from_patterns(compile_globs(
                rule_id,
                "file_globs",
                file_globs,
                violations,
            )),
        },
        RawPredicate::DependencyPinRatio {
            manifest_globs,
            threshold,
        } => {
            if !(0.0..=1.0).contains(threshold) {
                violations.push(Violation::ThresholdOutOfRange {
                    rule_id: rule_id.to_string(),
                    threshold: *threshold,
                });
            }
            Predicate::DependencyPinRatio {
                manifest_globs: PathGlobs::from_patterns(compile_globs(
                    rule_id,
                    "manifest_globs",
                    manifest_globs,
                    violations,
                )),
                threshold: *threshold,
            }
        }
    }
}

fn compile_globs(
    rule_id: &str,
    field: &'static str,
    sources: &[String],
    violations: &mut Vec<Violation>,
) -> Vec<PathPattern> {
    if sources.is_empty() {
        violations.push(Violation::EmptyList {
            rule_id: rule_id.to_string(),
            field,
        });
    }

    sources
        .iter()
        .filter_map(|s| match PathPattern::new(s) {
            Ok(p) => Some(p),
            Err(err) => {
                violations.push(Violation::InvalidGlob {
                    rule_id: rule_id.to_string(),
                    pattern: s.clone(),
                    reason: err.to_string(),
                });
                None
            }
        })
        .collect()
}

fn compile_regexes(
    rule_id: &str,
    sources: &[String],
    case_sensitive: bool,
    violations: &mut Vec<Violation>,
) -> Vec<Regex> {
    if sources.is_empty() {
        violations.push(Violation::EmptyList {
            rule_id: rule_id.to_string(),
            field: "patterns",
        });
    }

    sources
        .iter()
        .filter_map(|s| {
            match RegexBuilder::new(s)
                .case_insensitive(!case_sensitive)
                .build()
            {
                Ok(re) => Some(re),
                Err(err) => {
                    violations.push(Violation::InvalidRegex {
                        rule_id: rule_id.to_string(),
                        pattern: s.clone(),
                        reason: err.to_string(),
                    });
                    None
                }
            }
        })
        .collect()
}
