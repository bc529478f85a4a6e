//! Typed records produced by the output parsers.
//!
//! Records are immutable once built. Façades hand them out behind [`Arc`] so
//! the same parse result can be shared between several readers.

use std::sync::Arc;

/// Represents a commit from git log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    hash: String,
    date: String,
    author: String,
    summary: String,
    details: String,
}

impl Commit {
    pub(crate) fn new(
        hash: String,
        date: String,
        author: String,
        summary: String,
        details: String,
    ) -> Self {
        Self {
            hash,
            date,
            author,
            summary,
            details,
        }
    }

    /// Full 40 character object name
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Abbreviated object name, as shown in short logs
    pub fn short_hash(&self) -> &str {
        &self.hash[..7]
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    /// `Name <email>`
    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Full message with wrapped lines joined back into paragraphs
    pub fn details(&self) -> &str {
        &self.details
    }
}

/// Represents a branch from git branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub is_current: bool,
}

/// Result of listing branches, in the order git printed them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchList {
    pub branches: Vec<Branch>,
}

impl BranchList {
    /// The checked out branch, if any line was marked with `*`
    pub fn current(&self) -> Option<&Branch> {
        self.branches.iter().find(|b| b.is_current)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.branches.iter().map(|b| b.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

/// Line counts for one file touched by a revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFileEntry {
    /// The revision these changes apply to
    pub hash: String,
    pub path: String,
    /// 0 when git reports `-` (binary file)
    pub added: usize,
    pub removed: usize,
}

/// Origin of one line of a blamed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlameEntry {
    /// 1-based line number in the blamed revision
    pub line: usize,
    pub hash: String,
    pub author: String,
}

/// Wrap parsed records for sharing
pub(crate) fn share<T>(records: Vec<T>) -> Vec<Arc<T>> {
    records.into_iter().map(Arc::new).collect()
}
