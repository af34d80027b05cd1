//! Path patterns used by rule predicates.
//!
//! A pattern without `/` names a file or directory at any depth, so
//! `requirements.txt` also finds `envs/requirements.txt`. A pattern that
//! contains `/` is anchored at the repository root. A leading `/` forces
//! anchoring and a trailing `/` is ignored.

use globset::{GlobBuilder, GlobMatcher};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,

    #[error(transparent)]
    Glob(#[from] globset::Error),
}

/// A compiled path pattern, matched against `/`-separated relative paths.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    matcher: GlobMatcher,
}

impl PathPattern {
    pub fn new(source: &str) -> Result<Self, PatternError> {
        let normalized = normalize(source).ok_or(PatternError::Empty)?;
        let glob = GlobBuilder::new(&normalized)
            .literal_separator(true)
            .build()?;

        Ok(Self {
            source: source.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    /// The pattern as written in the catalog.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }
}

fn normalize(source: &str) -> Option<String> {
    let trimmed = source.trim().trim_end_matches('/');
    let normalized = if let Some(anchored) = trimmed.strip_prefix('/') {
        anchored.to_string()
    } else if trimmed.contains('/') {
        trimmed.to_string()
    } else {
        format!("**/{trimmed}")
    };

    if normalized.is_empty() || normalized == "**/" {
        None
    } else {
        Some(normalized)
    }
}

/// An ordered set of path patterns; a path matches if any member does.
#[derive(Debug, Clone, Default)]
pub struct PathGlobs {
    patterns: Vec<PathPattern>,
}

impl PathGlobs {
    pub fn from_patterns(patterns: Vec<PathPattern>) -> Self {
        Self { patterns }
    }

    /// Compiles every source, failing on the first invalid one.
    pub fn new<I, S>(sources: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = sources
            .into_iter()
            .map(|s| PathPattern::new(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_match(&self, rel_path: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(rel_path))
    }

    pub fn patterns(&self) -> &[PathPattern] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
