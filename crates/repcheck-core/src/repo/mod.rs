pub mod budget;
pub mod glob;
pub mod local;
pub mod view;

pub use budget::{CancellationToken, ReadBudget};
pub use glob::{PathGlobs, PathPattern, PatternError};
pub use local::LocalRepository;
pub use view::{RepositoryView, TextRead};
