use crate::error::ReadError;
use crate::repo::budget::ReadBudget;
use crate::repo::glob::{PathGlobs, PathPattern};

/// Text content returned by a bounded read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRead {
    pub content: String,
    /// The file was longer than the requested cap.
    pub truncated: bool,
}

/// Read-only access to a materialized repository tree.
///
/// Paths are relative and `/`-separated. Listings are lexicographically
/// ordered so repeated analyses of the same tree see the same sequence.
/// The trait has no mutating operations.
pub trait RepositoryView: Send + Sync {
    /// Files matching any of `globs`, in path order.
    fn list_files<'a>(&'a self, globs: &'a PathGlobs) -> Box<dyn Iterator<Item = &'a str> + 'a>;

    /// First file, in path order, matching `pattern`.
    fn find_file(&self, pattern: &PathPattern) -> Option<&str>;

    /// First directory, in path order, matching `pattern`.
    fn find_directory(&self, pattern: &PathPattern) -> Option<&str>;

    /// Reads at most `max_bytes` of a file as text.
    fn read_text(&self, path: &str, max_bytes: u64) -> Result<TextRead, ReadError>;

    /// Budget shared by every read against this view.
    fn budget(&self) -> &ReadBudget;

    fn exists(&self, pattern: &PathPattern) -> bool {
        self.find_file(pattern).is_some() || self.find_directory(pattern).is_some()
    }

    fn is_directory(&self, pattern: &PathPattern) -> bool {
        self.find_directory(pattern).is_some()
    }
}
