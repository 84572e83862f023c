// src/processors/file_dependency.rs

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ProcessorError;
use crate::model::{CommitEvent, CommitId, Edit, FileId};
use crate::registry::IdRemap;

use super::DataProcessor;

/// Symmetric `fileId -> fileId -> count` of how often two files changed
/// within the same commit.
#[derive(Debug, Default)]
pub struct FileDependencyProcessor {
    pub matrix: BTreeMap<FileId, BTreeMap<FileId, u64>>,
    current_commit: Option<CommitId>,
    current_files: BTreeSet<FileId>,
}

impl DataProcessor for FileDependencyProcessor {
    fn on_commit(&mut self, commit: &CommitEvent) -> Result<(), ProcessorError> {
        self.current_commit = Some(commit.id);
        self.current_files.clear();
        Ok(())
    }

    fn on_edit(&mut self, edit: &Edit) -> Result<(), ProcessorError> {
        if self.current_commit != Some(edit.commit) {
            self.current_commit = Some(edit.commit);
            self.current_files.clear();
        }
        if self.current_files.insert(edit.post_path) {
            for &other in self.current_files.iter().filter(|&&f| f != edit.post_path) {
                *self
                    .matrix
                    .entry(other)
                    .or_default()
                    .entry(edit.post_path)
                    .or_insert(0) += 1;
                *self
                    .matrix
                    .entry(edit.post_path)
                    .or_default()
                    .entry(other)
                    .or_insert(0) += 1;
            }
        }
        Ok(())
    }

    fn absorb(&mut self, other: Self, remap: &IdRemap) {
        for (file, row) in other.matrix {
            let target = self.matrix.entry(remap.file(file)).or_default();
            for (co_file, count) in row {
                *target.entry(remap.file(co_file)).or_insert(0) += count;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EditKind;

    fn edit(commit: CommitId, file: FileId) -> Edit {
        Edit {
            commit,
            author: 0,
            timestamp: 0,
            pre_path: file,
            post_path: file,
            pre_start: 1,
            pre_lines: 1,
            post_start: 1,
            post_lines: 1,
            char_count: 0,
            entropy: 0.0,
            edit_distance: 0,
            kind: EditKind::Modification,
        }
    }

    #[test]
    fn pairs_files_changed_in_same_commit() {
        let mut proc = FileDependencyProcessor::default();
        proc.on_edit(&edit(0, 1)).unwrap();
        proc.on_edit(&edit(0, 2)).unwrap();
        proc.on_edit(&edit(0, 2)).unwrap(); // second hunk, no double count
        proc.on_edit(&edit(1, 1)).unwrap(); // different commit, alone
        assert_eq!(proc.matrix[&1][&2], 1);
        assert_eq!(proc.matrix[&2][&1], 1);
        assert_eq!(proc.matrix.get(&1).map(|r| r.len()), Some(1));
    }
}
