//! Deterministic ordering helpers.
//!
//! Result ordering is part of the output contract: identical inputs must
//! produce byte-identical reports, whatever order the workers finished in.

use std::cmp::Ordering;

use crate::scoring::recommend::Recommendation;

/// Sort recommendations by severity (critical first), then by category
/// weight descending, then by rule id ascending.
///
/// `weight_of` returns the weight of a category name; unknown categories
/// sort as weight 0.
pub fn sort_recommendations(
    recommendations: &mut [Recommendation],
    weight_of: impl Fn(&str) -> Option<f64>,
) {
    recommendations.sort_by(|a, b| {
        let wa = weight_of(&a.category).unwrap_or(0.0);
        let wb = weight_of(&b.category).unwrap_or(0.0);
        b.severity
            .cmp(&a.severity)
            .then_with(|| wb.partial_cmp(&wa).unwrap_or(Ordering::Equal))
            .then_with(|| a.rule_id.cmp(&b.rule_id))
    });
}
