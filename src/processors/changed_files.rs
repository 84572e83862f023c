// src/processors/changed_files.rs

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ProcessorError;
use crate::model::{Edit, FileId, UserId};
use crate::registry::IdRemap;

use super::DataProcessor;

/// `userId -> set of fileIds` the user has ever edited.
#[derive(Debug, Default)]
pub struct ChangedFilesProcessor {
    pub changed_files: BTreeMap<UserId, BTreeSet<FileId>>,
}

impl DataProcessor for ChangedFilesProcessor {
    fn on_edit(&mut self, edit: &Edit) -> Result<(), ProcessorError> {
        self.changed_files
            .entry(edit.author)
            .or_default()
            .insert(edit.post_path);
        Ok(())
    }

    fn absorb(&mut self, other: Self, remap: &IdRemap) {
        for (user, files) in other.changed_files {
            let target = self.changed_files.entry(remap.user(user)).or_default();
            target.extend(files.into_iter().map(|f| remap.file(f)));
        }
    }
}
