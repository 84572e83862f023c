// src/processors/ownership.rs

use crate::error::ProcessorError;
use crate::model::Edit;
use crate::ownership::{OwnershipConfig, OwnershipModel};
use crate::registry::IdRemap;

use super::DataProcessor;

/// Feeds edits into the knowledge/ownership model. The three ownership
/// outputs (developer knowledge, files ownership, potential authorship)
/// are read straight off the merged model.
#[derive(Debug, Default)]
pub struct OwnershipProcessor {
    pub model: OwnershipModel,
}

impl OwnershipProcessor {
    pub fn new(config: OwnershipConfig) -> Self {
        OwnershipProcessor {
            model: OwnershipModel::new(config),
        }
    }
}

impl DataProcessor for OwnershipProcessor {
    fn on_edit(&mut self, edit: &Edit) -> Result<(), ProcessorError> {
        self.model.apply(edit);
        Ok(())
    }

    fn absorb(&mut self, other: Self, remap: &IdRemap) {
        self.model.absorb(other.model, remap);
    }
}
