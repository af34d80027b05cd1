//! Repository view over a local, already checked-out directory.
//!
//! The tree is indexed once when the view is opened. Reads go through the
//! shared [`ReadBudget`] and are capped per file. Large files are cut at
//! the cap instead of failing. Text is decoded lossily; only content with
//! NUL bytes is treated as binary and reported as undecodable.
//!
//! Symlinks are indexed by the kind of their target but never descended
//! into. Reads through a link whose target lies outside the root are
//! refused.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::ReadError;
use crate::repo::budget::ReadBudget;
use crate::repo::glob::{PathGlobs, PathPattern};
use crate::repo::view::{RepositoryView, TextRead};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone)]
struct Entry {
    path: String,
    kind: EntryKind,
    via_link: bool,
}

#[derive(Debug)]
pub struct LocalRepository {
    root: PathBuf,
    canonical_root: PathBuf,
    entries: Vec<Entry>,
    budget: ReadBudget,
}

impl LocalRepository {
    /// Indexes the tree under `root`, skipping `.git/`.
    ///
    /// Entries that cannot be read while walking are left out of the index.
    pub fn open(root: impl Into<PathBuf>, budget: ReadBudget) -> Result<Self, ReadError> {
        let root = root.into();
        let meta = fs::metadata(&root).map_err(|source| ReadError::Io {
            path: root.clone(),
            source,
        })?;
        if !meta.is_dir() {
            return Err(ReadError::Io {
                path: root,
                source: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
            });
        }

        let canonical_root = root.canonicalize().map_err(|source| ReadError::Io {
            path: root.clone(),
            source,
        })?;

        let mut entries = Vec::new();
        let walker = WalkDir::new(&root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git");

        for item in walker {
            let entry = match item {
                Ok(e) => e,
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            let file_type = entry.file_type();
            let via_link = file_type.is_symlink();
            let kind = if via_link {
                match fs::metadata(entry.path()) {
                    Ok(meta) if meta.is_dir() => EntryKind::Directory,
                    Ok(meta) if meta.is_file() => EntryKind::File,
                    Ok(_) => continue,
                    Err(err) => {
                        tracing::debug!(
                            path = %entry.path().display(),
                            error = %err,
                            "skipping dangling symlink"
                        );
                        continue;
                    }
                }
            } else if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                continue;
            };

            if let Some(path) = relative_path(&root, entry.path()) {
                entries.push(Entry {
                    path,
                    kind,
                    via_link,
                });
            }
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::debug!(root = %root.display(), entries = entries.len(), "indexed repository");

        Ok(Self {
            root,
            canonical_root,
            entries,
            budget,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn find(&self, pattern: &PathPattern, kind: EntryKind) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.kind == kind && pattern.is_match(&e.path))
            .map(|e| e.path.as_str())
    }

    fn lookup(&self, path: &str) -> Option<&Entry> {
        self.entries
            .binary_search_by(|e| e.path.as_str().cmp(path))
            .ok()
            .map(|i| &self.entries[i])
    }
}

/// `/`-joined path relative to `root`; `None` for non UTF-8 names.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

/// Decodes bytes lossily; `None` for binary content.
///
/// Invalid sequences become U+FFFD. A multi-byte sequence cut by the cap
/// is dropped instead.
fn decode(mut bytes: Vec<u8>, truncated: bool) -> Option<String> {
    if bytes.contains(&0) {
        return None;
    }
    if truncated {
        let keep = complete_prefix_len(&bytes);
        bytes.truncate(keep);
    }
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Length of `bytes` without a trailing incomplete UTF-8 sequence.
fn complete_prefix_len(bytes: &[u8]) -> usize {
    let len = bytes.len();
    for back in 1..=len.min(4) {
        let i = len - back;
        let b = bytes[i];
        if b & 0xC0 == 0x80 {
            continue;
        }
        let width = match b {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if back < width { i } else { len };
    }
    len
}

impl RepositoryView for LocalRepository {
    fn list_files<'a>(&'a self, globs: &'a PathGlobs) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        Box::new(
            self.entries
                .iter()
                .filter(move |e| e.kind == EntryKind::File && globs.is_match(&e.path))
                .map(|e| e.path.as_str()),
        )
    }

    fn find_file(&self, pattern: &PathPattern) -> Option<&str> {
        self.find(pattern, EntryKind::File)
    }

    fn find_directory(&self, pattern: &PathPattern) -> Option<&str> {
        self.find(pattern, EntryKind::Directory)
    }

    fn read_text(&self, path: &str, max_bytes: u64) -> Result<TextRead, ReadError> {
        let entry = match self.lookup(path) {
            Some(e) if e.kind == EntryKind::File => e,
            _ => {
                return Err(ReadError::NotFound {
                    path: path.to_string(),
                });
            }
        };

        self.budget.check()?;

        let full = self.root.join(path);
        let io_err = |source: io::Error| ReadError::Io {
            path: full.clone(),
            source,
        };

        if entry.via_link {
            let target = full.canonicalize().map_err(io_err)?;
            if !target.starts_with(&self.canonical_root) {
                return Err(ReadError::OutsideRoot {
                    path: path.to_string(),
                });
            }
        }

        let file = File::open(&full).map_err(io_err)?;
        let len = file.metadata().map_err(io_err)?.len();
        let planned = len.min(max_bytes);
        self.budget.charge(planned)?;

        let mut buf = Vec::with_capacity(planned as usize);
        file.take(planned).read_to_end(&mut buf).map_err(io_err)?;

        let truncated = len > max_bytes;
        let content = decode(buf, truncated).ok_or_else(|| ReadError::Undecodable {
            path: path.to_string(),
        })?;

        Ok(TextRead { content, truncated })
    }

    fn budget(&self) -> &ReadBudget {
        &self.budget
    }
}
