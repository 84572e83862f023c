// src/error.rs

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised before any worker starts. The whole run is aborted.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("cannot open repository at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("branch '{name}' not found in repository")]
    MissingBranch {
        name: String,
        #[source]
        source: git2::Error,
    },

    #[error("cannot walk history of branch '{branch}': {source}")]
    Walk {
        branch: String,
        #[source]
        source: git2::Error,
    },

    #[error("thread budget must be at least 1")]
    InvalidThreadBudget,

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// A data processor rejected an event. Aborts aggregation for the branch
/// that produced the event; other branches continue.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ProcessorError(pub String);

impl ProcessorError {
    pub fn new(msg: impl Into<String>) -> Self {
        ProcessorError(msg.into())
    }
}

/// Errors isolated to a single branch walk. The engine records them and
/// lets the remaining branches finish.
#[derive(Debug, Error)]
pub enum BranchWalkError {
    #[error("corrupt data at commit {commit} on branch '{branch}': {source}")]
    Corrupt {
        branch: String,
        commit: String,
        #[source]
        source: git2::Error,
    },

    #[error("processor failed at commit {commit} on branch '{branch}': {source}")]
    Processor {
        branch: String,
        commit: String,
        #[source]
        source: ProcessorError,
    },
}

impl BranchWalkError {
    /// Branch the failure is attributed to.
    pub fn branch(&self) -> &str {
        match self {
            BranchWalkError::Corrupt { branch, .. } => branch,
            BranchWalkError::Processor { branch, .. } => branch,
        }
    }

    /// Commit hash the walk was at when it failed.
    pub fn commit(&self) -> &str {
        match self {
            BranchWalkError::Corrupt { commit, .. } => commit,
            BranchWalkError::Processor { commit, .. } => commit,
        }
    }
}
