pub mod aggregate;
pub mod rating;
pub mod recommend;

pub use aggregate::{CategoryResult, ScoreSummary, aggregate};
pub use rating::{BadgeData, Rating};
pub use recommend::{Recommendation, Remediation, RemediationTable, recommend};
