use std::fmt;

use serde::{Deserialize, Serialize};

/// Inclusive lower bounds of each band. Fixed so badge colors keep their
/// meaning across catalog revisions.
pub const EXCELLENT_THRESHOLD: f64 = 90.0;
pub const GOOD_THRESHOLD: f64 = 75.0;
pub const FAIR_THRESHOLD: f64 = 60.0;
pub const POOR_THRESHOLD: f64 = 40.0;

pub const BADGE_LABEL: &str = "reproducibility";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl Rating {
    pub fn from_score(score: f64) -> Self {
        if score >= EXCELLENT_THRESHOLD {
            Rating::Excellent
        } else if score >= GOOD_THRESHOLD {
            Rating::Good
        } else if score >= FAIR_THRESHOLD {
            Rating::Fair
        } else if score >= POOR_THRESHOLD {
            Rating::Poor
        } else {
            Rating::Critical
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Excellent => "excellent",
            Rating::Good => "good",
            Rating::Fair => "fair",
            Rating::Poor => "poor",
            Rating::Critical => "critical",
        }
    }

    /// Badge color as a hex triplet.
    pub fn color(self) -> &'static str {
        match self {
            Rating::Excellent => "#44cc11",
            Rating::Good => "#97ca00",
            Rating::Fair => "#dfb317",
            Rating::Poor => "#fe7d37",
            Rating::Critical => "#e05d44",
        }
    }

    /// Human-facing status shown next to the score.
    pub fn status(self) -> &'static str {
        match self {
            Rating::Excellent => "Excellent",
            Rating::Good => "Good",
            Rating::Fair => "Fair",
            Rating::Poor => "Needs Work",
            Rating::Critical => "Critical Issues",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a badge renderer needs. Rendering itself happens elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeData {
    pub label: String,
    pub message: String,
    pub status: String,
    pub color: String,
    pub score: f64,
}

impl BadgeData {
    pub fn new(score: f64) -> Self {
        let rating = Rating::from_score(score);
        Self {
            label: BADGE_LABEL.to_string(),
            message: format!("{score:.0}/100"),
            status: rating.status().to_string(),
            color: rating.color().to_string(),
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_inclusive_lower_bounds() {
        assert_eq!(Rating::from_score(100.0), Rating::Excellent);
        assert_eq!(Rating::from_score(90.0), Rating::Excellent);
        assert_eq!(Rating::from_score(89.99), Rating::Good);
        assert_eq!(Rating::from_score(75.0), Rating::Good);
        assert_eq!(Rating::from_score(74.9), Rating::Fair);
        assert_eq!(Rating::from_score(60.0), Rating::Fair);
        assert_eq!(Rating::from_score(59.9), Rating::Poor);
        assert_eq!(Rating::from_score(40.0), Rating::Poor);
        assert_eq!(Rating::from_score(39.9), Rating::Critical);
        assert_eq!(Rating::from_score(0.0), Rating::Critical);
    }

    #[test]
    fn badge_reflects_rating() {
        let badge = BadgeData::new(95.0);
        assert_eq!(badge.color, "#44cc11");
        assert_eq!(badge.status, "Excellent");
        assert_eq!(badge.message, "95/100");
        assert_eq!(badge.label, "reproducibility");

        let badge = BadgeData::new(65.0);
        assert_eq!(badge.color, "#dfb317");
        assert_eq!(badge.status, "Fair");

        let badge = BadgeData::new(50.0);
        assert_eq!(badge.color, "#fe7d37");
        assert_eq!(badge.status, "Needs Work");

        let badge = BadgeData::new(12.4);
        assert_eq!(badge.color, "#e05d44");
        assert_eq!(badge.message, "12/100");
    }

    #[test]
    fn rating_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Rating::Poor).unwrap(), "\"poor\"");
        assert_eq!(Rating::Good.to_string(), "good");
    }
}
