use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::repo::glob::{PathGlobs, PathPattern};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct RuleId(pub String);

impl RuleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Ordering is semantic: `Low < Medium < High < Critical`.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Condition a rule tests against a repository.
///
/// Regexes and globs are compiled when the catalog is loaded.
#[derive(Debug, Clone)]
pub enum Predicate {
    FileExists {
        candidates: Vec<PathPattern>,
    },
    DirectoryExists {
        candidates: Vec<PathPattern>,
    },
    PatternMatch {
        patterns: Vec<Regex>,
        file_globs: PathGlobs,
    },
    DependencyPinRatio {
        manifest_globs: PathGlobs,
        threshold: f64,
    },
}

impl Predicate {
    pub fn kind(&self) -> &'static str {
        match self {
            Predicate::FileExists { .. } => "file_exists",
            Predicate::DirectoryExists { .. } => "directory_exists",
            Predicate::PatternMatch { .. } => "pattern_match",
            Predicate::DependencyPinRatio { .. } => "dependency_pin_ratio",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub id: RuleId,
    /// Human-readable title; the id when the catalog gives none.
    pub name: String,
    pub points: u32,
    pub severity: Severity,
    pub predicate: Predicate,
}

#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub weight: f64,
    pub rules: Vec<Rule>,
}

impl Category {
    pub fn possible_points(&self) -> u32 {
        self.rules.iter().map(|r| r.points).sum()
    }
}

/// Catalog identity carried into every analysis result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CatalogInfo {
    pub version: String,
    /// Hex sha256 of the canonical catalog document.
    pub fingerprint: String,
}

/// A validated rule catalog.
///
/// Only [`crate::rules::load`] constructs one, so every instance satisfies
/// the load-time invariants: weights sum to 1.0, rule ids are unique, and
/// every category awards a positive number of points.
#[derive(Debug, Clone)]
pub struct RuleCatalog {
    pub(crate) info: CatalogInfo,
    pub(crate) categories: Vec<Category>,
}

impl RuleCatalog {
    pub fn info(&self) -> &CatalogInfo {
        &self.info
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn category_weight(&self, name: &str) -> Option<f64> {
        self.category(name).map(|c| c.weight)
    }

    /// Every rule with its category, in catalog order.
    pub fn rules(&self) -> impl Iterator<Item = (&Category, &Rule)> {
        self.categories
            .iter()
            .flat_map(|c| c.rules.iter().map(move |r| (c, r)))
    }

    pub fn rule(&self, id: &RuleId) -> Option<(&Category, &Rule)> {
        self.rules().find(|(_, r)| &r.id == id)
    }

    pub fn rule_count(&self) -> usize {
        self.categories.iter().map(|c| c.rules.len()).sum()
    }
}
