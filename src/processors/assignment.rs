// src/processors/assignment.rs

use std::collections::BTreeMap;

use crate::error::ProcessorError;
use crate::model::{CommitId, Edit, FileId, UserId};
use crate::registry::IdRemap;

use super::DataProcessor;

/// `userId -> fileId -> edit count`, counting each file once per commit
/// that touched it.
#[derive(Debug, Default)]
pub struct AssignmentMatrixProcessor {
    pub matrix: BTreeMap<UserId, BTreeMap<FileId, u64>>,
    /// Hunk edits for one file arrive contiguously, so one remembered pair
    /// is enough to dedupe them into a single count.
    last: Option<(CommitId, FileId)>,
}

impl DataProcessor for AssignmentMatrixProcessor {
    fn on_edit(&mut self, edit: &Edit) -> Result<(), ProcessorError> {
        let pair = (edit.commit, edit.post_path);
        if self.last != Some(pair) {
            self.last = Some(pair);
            *self
                .matrix
                .entry(edit.author)
                .or_default()
                .entry(edit.post_path)
                .or_insert(0) += 1;
        }
        Ok(())
    }

    fn absorb(&mut self, other: Self, remap: &IdRemap) {
        for (user, row) in other.matrix {
            let target = self.matrix.entry(remap.user(user)).or_default();
            for (file, count) in row {
                *target.entry(remap.file(file)).or_insert(0) += count;
            }
        }
    }
}
