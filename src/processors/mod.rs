// src/processors/mod.rs

//! Pluggable analysis sinks. The engine feeds every processor the same
//! normalized event stream (commits, edits, influence edges); each variant
//! keeps its own aggregate and knows how to merge a partial built by
//! another worker.

mod assignment;
mod changed_files;
mod co_edit;
mod file_dependency;
mod influence;
mod ownership;
mod work_time;

pub use assignment::AssignmentMatrixProcessor;
pub use changed_files::ChangedFilesProcessor;
pub use co_edit::{CoEditNetworkProcessor, EditRecord};
pub use file_dependency::FileDependencyProcessor;
pub use influence::CommitInfluenceProcessor;
pub use ownership::OwnershipProcessor;
pub use work_time::WorkTimeProcessor;

use crate::error::ProcessorError;
use crate::model::{CommitEvent, Edit, InfluenceEdge};
use crate::registry::IdRemap;

/// Capability interface every analysis implements.
///
/// Events for one branch arrive in strict parent-before-child commit order;
/// nothing is guaranteed across branches. A processor fails only by
/// returning a [`ProcessorError`], which aborts aggregation for the branch
/// that produced the event.
pub trait DataProcessor: Send {
    fn on_commit(&mut self, commit: &CommitEvent) -> Result<(), ProcessorError> {
        let _ = commit;
        Ok(())
    }

    fn on_edit(&mut self, edit: &Edit) -> Result<(), ProcessorError> {
        let _ = edit;
        Ok(())
    }

    fn on_influence_edge(&mut self, edge: &InfluenceEdge) -> Result<(), ProcessorError> {
        let _ = edge;
        Ok(())
    }

    /// Fold a partial of the same type into this aggregate, translating the
    /// partial's ids through `remap` first. Must be commutative and
    /// associative per key so the merged result is independent of thread
    /// scheduling.
    fn absorb(&mut self, other: Self, remap: &IdRemap)
    where
        Self: Sized;
}
