// src/model.rs

use serde::Serialize;

/// Dense, run-local id for a developer identity
pub type UserId = u32;

/// Dense, run-local id for a file path
pub type FileId = u32;

/// Dense, run-local id for a commit hash
pub type CommitId = u32;

/// A raw (name, email) author spelling as read from a commit header.
///
/// Canonicalization (alias folding, email normalization) happens in the
/// registry, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserIdentity {
    pub name: String,
    pub email: String,
}

impl UserIdentity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        UserIdentity {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Normalized per-commit event fed to every data processor.
#[derive(Debug, Clone)]
pub struct CommitEvent {
    pub id: CommitId,
    pub author: UserId,
    /// Committer timestamp, seconds since the epoch, UTC
    pub timestamp: i64,
    /// Parent commit ids in parent order; empty for a root commit
    pub parents: Vec<CommitId>,
    /// Whether the commit message matched the configured fix keywords
    pub is_fix: bool,
}

/// Classification of one changed block of code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditKind {
    /// No pre-lines, some post-lines
    Insertion,
    /// Some pre-lines, no post-lines
    Deletion,
    /// Both pre- and post-lines
    Modification,
    /// A file moved between paths; content hunks follow as separate edits
    Rename,
    /// Binary file change, content metrics are zeroed
    Binary,
}

/// One changed block inside one file of one commit.
///
/// Line ranges are kept in both pre- and post-image coordinates; which pair
/// an output format reports depends on the edit kind. Pure insertions carry
/// `pre_start` = line *after which* the block was inserted (git hunk
/// convention, may be 0), and symmetrically for `post_start` of deletions.
#[derive(Debug, Clone)]
pub struct Edit {
    pub commit: CommitId,
    pub author: UserId,
    pub timestamp: i64,
    pub pre_path: FileId,
    pub post_path: FileId,
    pub pre_start: u32,
    pub pre_lines: u32,
    pub post_start: u32,
    pub post_lines: u32,
    /// Characters in the changed block (post-image, or pre-image for deletions)
    pub char_count: usize,
    /// Shannon entropy, base 2, over the changed block's byte frequencies
    pub entropy: f64,
    /// Levenshtein distance between pre- and post-block text
    pub edit_distance: usize,
    pub kind: EditKind,
}

impl Edit {
    /// The (start, length) pair the co-edit output reports for this kind.
    pub fn reported_range(&self) -> (u32, u32) {
        match self.kind {
            EditKind::Deletion => (self.pre_start, self.pre_lines),
            EditKind::Insertion | EditKind::Modification => (self.post_start, self.post_lines),
            EditKind::Rename | EditKind::Binary => (0, 0),
        }
    }

    /// Lines removed plus lines added; the ownership edit weight.
    pub fn lines_touched(&self) -> u32 {
        self.pre_lines + self.post_lines
    }
}

/// A fixing commit traced back to a commit that wrote the fixed lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct InfluenceEdge {
    pub fixing: CommitId,
    pub introducing: CommitId,
}
