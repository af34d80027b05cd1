//! Weighted category scoring.
//!
//! Each category is normalized to 0-100 from its earned and possible
//! points, then scaled by its weight. A category with nothing to award is
//! excluded from both the numerator and the weight denominator, so the
//! remaining weights are re-normalized instead of dragging the score down.

use serde::{Deserialize, Serialize};

use crate::rules::catalog::RuleCatalog;
use crate::rules::eval::CheckResult;
use crate::scoring::rating::Rating;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub name: String,
    pub earned: u32,
    pub possible: u32,
    /// `100 * earned / possible`, or 0 when excluded.
    pub normalized_score: f64,
    pub weight: f64,
    pub weighted_contribution: f64,
    pub excluded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub overall_score: f64,
    pub rating: Rating,
    pub categories: Vec<CategoryResult>,
}

/// Scores `checks` against the category layout of `catalog`.
///
/// Checks whose category is not in the catalog are ignored here; the
/// assembler rejects them.
pub fn aggregate(checks: &[CheckResult], catalog: &RuleCatalog) -> ScoreSummary {
    let mut categories: Vec<CategoryResult> = catalog
        .categories()
        .iter()
        .map(|category| {
            let (earned, possible) = checks
                .iter()
                .filter(|c| c.category == category.name)
                .fold((0u32, 0u32), |(e, p), c| {
                    (e.saturating_add(c.points_earned), p.saturating_add(c.points_possible))
                });

            let excluded = possible == 0;
            let normalized_score = if excluded {
                0.0
            } else {
                100.0 * earned as f64 / possible as f64
            };

            CategoryResult {
                name: category.name.clone(),
                earned,
                possible,
                normalized_score,
                weight: category.weight,
                weighted_contribution: if excluded {
                    0.0
                } else {
                    normalized_score * category.weight
                },
                excluded,
            }
        })
        .collect();

    let applied_weight: f64 = categories
        .iter()
        .filter(|c| !c.excluded)
        .map(|c| c.weight)
        .sum();

    let any_excluded = categories.iter().any(|c| c.excluded);
    if any_excluded && applied_weight > 0.0 {
        for c in categories.iter_mut().filter(|c| !c.excluded) {
            c.weighted_contribution = c.normalized_score * c.weight / applied_weight;
        }
    }

    let overall_score = if applied_weight > 0.0 {
        categories
            .iter()
            .map(|c| c.weighted_contribution)
            .sum::<f64>()
            .clamp(0.0, 100.0)
    } else {
        0.0
    };

    ScoreSummary {
        overall_score,
        rating: Rating::from_score(overall_score),
        categories,
    }
}
