pub mod catalog;
pub mod eval;
pub mod load;
pub mod manifest;

pub use catalog::{Category, CatalogInfo, Predicate, Rule, RuleCatalog, RuleId, Severity};
pub use eval::{CheckResult, EvalContext, Evidence, evaluate};
pub use load::{RawCatalog, load};
