// src/processors/co_edit.rs

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::ProcessorError;
use crate::model::{CommitId, Edit, EditKind, FileId};
use crate::registry::IdRemap;

use super::DataProcessor;

/// One edit as reported in the co-edit network output.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EditRecord {
    pub pre_path: FileId,
    pub post_path: FileId,
    pub start_line: u32,
    pub length: u32,
    pub char_count: usize,
    pub entropy: f64,
    pub edit_distance: usize,
    pub edit_type: EditKind,
}

impl EditRecord {
    fn from_edit(edit: &Edit) -> Self {
        let (start_line, length) = edit.reported_range();
        EditRecord {
            pre_path: edit.pre_path,
            post_path: edit.post_path,
            start_line,
            length,
            char_count: edit.char_count,
            entropy: edit.entropy,
            edit_distance: edit.edit_distance,
            edit_type: edit.kind,
        }
    }
}

/// `commitId -> edits`, each edit scored with entropy and edit distance so
/// consumers can weigh how strongly regions changed together.
#[derive(Debug, Default)]
pub struct CoEditNetworkProcessor {
    pub co_edits: BTreeMap<CommitId, Vec<EditRecord>>,
}

impl DataProcessor for CoEditNetworkProcessor {
    fn on_edit(&mut self, edit: &Edit) -> Result<(), ProcessorError> {
        self.co_edits
            .entry(edit.commit)
            .or_default()
            .push(EditRecord::from_edit(edit));
        Ok(())
    }

    fn absorb(&mut self, other: Self, remap: &IdRemap) {
        for (commit, records) in other.co_edits {
            let target = self.co_edits.entry(remap.commit(commit)).or_default();
            target.extend(records.into_iter().map(|mut r| {
                r.pre_path = remap.file(r.pre_path);
                r.post_path = remap.file(r.post_path);
                r
            }));
        }
    }
}
