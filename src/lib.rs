// src/lib.rs

//! Concurrent git history mining.
//!
//! Walks the commits of one or more branches in parallel, classifies and
//! scores every edit against the parent revision, traces bug-fixing commits
//! back to the commits that wrote the fixed lines, and folds the event
//! stream into pluggable per-analysis aggregates (assignment matrix,
//! co-edit networks, file ownership, work-time histograms, commit influence
//! graphs). Entities are interned into dense run-local ids; worker partials
//! merge deterministically, so equal inputs always produce equal output.

pub mod blame;
pub mod diff;
pub mod engine;
pub mod error;
pub mod model;
pub mod output;
pub mod ownership;
pub mod partition;
pub mod pool;
pub mod processors;
pub mod registry;
