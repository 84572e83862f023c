// src/partition.rs

use std::collections::HashSet;

use git2::{BranchType, Oid, Repository, Sort};
use tracing::debug;

use crate::error::RepositoryError;

/// The commits one worker will walk for one branch, parent-before-child.
#[derive(Debug)]
pub struct BranchTask {
    pub name: String,
    /// Position of the branch in the caller-supplied branch list. Partial
    /// results are merged in this order, which keeps final ids stable.
    pub order: usize,
    pub commits: Vec<Oid>,
}

/// Branch tasks grouped by worker slot.
#[derive(Debug)]
pub struct Partition {
    pub slots: Vec<Vec<BranchTask>>,
}

impl Partition {
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn total_commits(&self) -> usize {
        self.slots
            .iter()
            .flat_map(|tasks| tasks.iter())
            .map(|t| t.commits.len())
            .sum()
    }
}

/// Deterministic branch -> worker-slot assignment.
///
/// A branch is never split across slots: every downstream analysis relies on
/// strictly ordered per-branch history. When several branches share history,
/// the first branch in the caller's list claims each shared commit and the
/// others skip it, so no commit is processed twice and the claim does not
/// depend on worker scheduling.
pub struct BranchPartitioner<'r> {
    repo: &'r Repository,
}

impl<'r> BranchPartitioner<'r> {
    pub fn new(repo: &'r Repository) -> Self {
        BranchPartitioner { repo }
    }

    pub fn partition(
        &self,
        branches: &[String],
        thread_budget: usize,
    ) -> Result<Partition, RepositoryError> {
        let mut tasks = Vec::with_capacity(branches.len());
        let mut claimed: HashSet<Oid> = HashSet::new();

        for (order, name) in branches.iter().enumerate() {
            let branch = self
                .repo
                .find_branch(name, BranchType::Local)
                .map_err(|source| RepositoryError::MissingBranch {
                    name: name.clone(),
                    source,
                })?;
            let tip = branch.get().peel_to_commit().map_err(|source| {
                RepositoryError::MissingBranch {
                    name: name.clone(),
                    source,
                }
            })?;

            let walk_failed = |source| RepositoryError::Walk {
                branch: name.clone(),
                source,
            };
            let mut revwalk = self.repo.revwalk().map_err(walk_failed)?;
            revwalk.push(tip.id()).map_err(walk_failed)?;
            revwalk
                .set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)
                .map_err(walk_failed)?;

            let mut commits = Vec::new();
            for oid in revwalk {
                let oid = oid.map_err(walk_failed)?;
                if claimed.insert(oid) {
                    commits.push(oid);
                }
            }
            debug!(branch = %name, commits = commits.len(), "partitioned branch");
            tasks.push(BranchTask {
                name: name.clone(),
                order,
                commits,
            });
        }

        let slot_count = thread_budget.min(tasks.len()).max(1);
        let weights: Vec<usize> = tasks.iter().map(|t| t.commits.len()).collect();
        let assignment = assign_slots(&weights, slot_count);

        let mut slots: Vec<Vec<BranchTask>> = (0..slot_count).map(|_| Vec::new()).collect();
        for (task, slot) in tasks.into_iter().zip(assignment) {
            slots[slot].push(task);
        }
        Ok(Partition { slots })
    }
}

/// Greedy largest-first bin packing: heaviest branch goes to the currently
/// lightest slot. Ties break on list position and slot index, never on
/// timing, so equal inputs always produce an equal partition.
fn assign_slots(weights: &[usize], slot_count: usize) -> Vec<usize> {
    let mut by_weight: Vec<usize> = (0..weights.len()).collect();
    by_weight.sort_by_key(|&i| (std::cmp::Reverse(weights[i]), i));

    let mut load = vec![0usize; slot_count];
    let mut assignment = vec![0usize; weights.len()];
    for i in by_weight {
        let slot = (0..slot_count).min_by_key(|&s| (load[s], s)).unwrap_or(0);
        load[slot] += weights[i];
        assignment[i] = slot;
    }
    assignment
}
