pub mod assemble;
pub mod model;
pub mod render;

pub use assemble::{AssemblyInput, assemble};
pub use model::{AnalysisResult, Provenance, ToolInfo};
