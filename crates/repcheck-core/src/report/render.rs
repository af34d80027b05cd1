use crate::TOOL_NAME;
use crate::report::model::AnalysisResult;

pub fn render_text(result: &AnalysisResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", TOOL_NAME, result.tool.version));
    if !result.source_identifier.is_empty() {
        out.push_str(&format!("Source: {}\n", result.source_identifier));
    }
    out.push_str(&format!(
        "Score: {:.1}/100 ({})\n",
        result.overall_score, result.rating
    ));
    if result.truncated {
        out.push_str("Note: evaluation stopped early, budget exceeded\n");
    }

    out.push_str("Categories:\n");
    for c in &result.category_results {
        if c.excluded {
            out.push_str(&format!("  - {} excluded\n", c.name));
        } else {
            out.push_str(&format!(
                "  - {} {:.1} ({}/{} points, weight {:.2})\n",
                c.name, c.normalized_score, c.earned, c.possible, c.weight
            ));
        }
    }

    out.push_str(&format!(
        "Checks passed: {}/{}\n",
        result.passed_count(),
        result.check_results.len()
    ));

    out.push_str("Recommendations:\n");
    for r in &result.recommendations {
        out.push_str(&format!(
            "  - {} [{}] {}: {}\n",
            r.rule_id,
            r.severity.as_str(),
            r.title,
            r.fix
        ));
    }
    out
}

/// One-line badge summary, e.g. `reproducibility: 82/100 (Good, #97ca00)`.
pub fn render_badge(result: &AnalysisResult) -> String {
    let badge = result.badge();
    format!(
        "{}: {} ({}, {})\n",
        badge.label, badge.message, badge.status, badge.color
    )
}
