// src/processors/influence.rs

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ProcessorError;
use crate::model::{CommitId, InfluenceEdge};
use crate::registry::IdRemap;

use super::DataProcessor;

/// `fixingCommitId -> commits that wrote the lines the fix changed`.
#[derive(Debug, Default)]
pub struct CommitInfluenceProcessor {
    pub graph: BTreeMap<CommitId, BTreeSet<CommitId>>,
}

impl DataProcessor for CommitInfluenceProcessor {
    fn on_influence_edge(&mut self, edge: &InfluenceEdge) -> Result<(), ProcessorError> {
        self.graph
            .entry(edge.fixing)
            .or_default()
            .insert(edge.introducing);
        Ok(())
    }

    fn absorb(&mut self, other: Self, remap: &IdRemap) {
        for (fixing, introducing) in other.graph {
            let target = self.graph.entry(remap.commit(fixing)).or_default();
            target.extend(introducing.into_iter().map(|c| remap.commit(c)));
        }
    }
}
