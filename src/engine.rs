// src/engine.rs

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use git2::{Oid, Repository};
use tracing::{debug, warn};

use crate::blame::BlameTracer;
use crate::diff::{CommitCtx, DiffAnalyzer, DiffConfig};
use crate::error::{BranchWalkError, RepositoryError};
use crate::model::{CommitEvent, CommitId, UserIdentity};
use crate::partition::{BranchPartitioner, BranchTask};
use crate::pool::RepoPool;
use crate::processors::DataProcessor;
use crate::registry::{Registry, RegistrySnapshot};

/// Everything a mining run needs to know up front.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub repo_path: PathBuf,
    /// Local branches to mine, in the order partial results are merged.
    pub branches: Vec<String>,
    /// Upper bound on parallel workers; must be at least 1.
    pub thread_budget: usize,
    pub diff: DiffConfig,
    /// Case-insensitive substrings marking a commit message as a bug fix.
    pub fix_keywords: Vec<String>,
    /// Run blame tracing on fix commits and emit influence edges.
    pub trace_fixes: bool,
    /// Identity aliases, raw email -> canonical email.
    pub aliases: HashMap<String, String>,
}

impl EngineConfig {
    pub fn new(repo_path: impl Into<PathBuf>, branches: Vec<String>) -> Self {
        EngineConfig {
            repo_path: repo_path.into(),
            branches,
            thread_budget: 1,
            diff: DiffConfig::default(),
            fix_keywords: vec!["fix".to_string()],
            trace_fixes: false,
            aliases: HashMap::new(),
        }
    }
}

/// Final state of one mining run: the merged processor aggregate, the
/// reverse id maps, and whatever branches failed along the way.
#[derive(Debug)]
pub struct MineResult<P> {
    pub state: P,
    pub registry: RegistrySnapshot,
    pub failures: Vec<BranchWalkError>,
    pub commit_count: usize,
}

/// One branch's worker-local output before the merge step.
struct BranchPartial<P> {
    order: usize,
    outcome: Result<(RegistrySnapshot, P), BranchWalkError>,
}

/// Orchestrates a run: partitions branches over a bounded worker pool,
/// walks each branch's commits in parent-before-child order against a
/// checked-out repository handle, and merges the worker-local partials
/// into one deterministic final state.
pub struct MiningEngine {
    config: EngineConfig,
    analyzer: DiffAnalyzer,
    tracer: BlameTracer,
}

impl MiningEngine {
    pub fn new(config: EngineConfig) -> Self {
        let analyzer = DiffAnalyzer::new(config.diff.clone());
        MiningEngine {
            config,
            analyzer,
            tracer: BlameTracer::new(),
        }
    }

    /// Mine the configured branches, building one processor per branch via
    /// `factory` and merging the partials in branch order.
    ///
    /// An unreadable repository or missing branch fails the whole run; a
    /// branch that breaks mid-walk only lands in [`MineResult::failures`].
    pub fn run<P, F>(&self, factory: F) -> Result<MineResult<P>, RepositoryError>
    where
        P: DataProcessor,
        F: Fn() -> P + Sync,
    {
        if self.config.thread_budget == 0 {
            return Err(RepositoryError::InvalidThreadBudget);
        }
        let repo =
            Repository::open(&self.config.repo_path).map_err(|source| RepositoryError::Open {
                path: self.config.repo_path.clone(),
                source,
            })?;
        let partition = BranchPartitioner::new(&repo)
            .partition(&self.config.branches, self.config.thread_budget)?;
        drop(repo);

        let commit_count = partition.total_commits();
        debug!(
            branches = self.config.branches.len(),
            slots = partition.slot_count(),
            commits = commit_count,
            "partitioned repository"
        );

        let pool = RepoPool::open(&self.config.repo_path, partition.slot_count())?;
        let partials: Mutex<Vec<BranchPartial<P>>> = Mutex::new(Vec::new());

        let workers = rayon::ThreadPoolBuilder::new()
            .num_threads(partition.slot_count())
            .build()?;
        workers.scope(|scope| {
            for tasks in &partition.slots {
                let pool = &pool;
                let partials = &partials;
                let factory = &factory;
                scope.spawn(move |_| {
                    let repo = pool.checkout();
                    for task in tasks {
                        let outcome = self.walk_branch(&repo, task, factory());
                        partials.lock().unwrap().push(BranchPartial {
                            order: task.order,
                            outcome,
                        });
                    }
                });
            }
        });

        // Single-threaded reduction in branch order: ids become dense,
        // first-discovery-in-merge-order, and independent of scheduling.
        let mut partials = partials.into_inner().unwrap();
        partials.sort_by_key(|p| p.order);

        let registry = Registry::new(HashMap::new());
        let mut state = factory();
        let mut failures = Vec::new();
        for partial in partials {
            match partial.outcome {
                Ok((snapshot, branch_state)) => {
                    let remap = registry.absorb(&snapshot);
                    state.absorb(branch_state, &remap);
                }
                Err(error) => {
                    warn!(branch = error.branch(), commit = error.commit(), %error, "branch walk failed");
                    failures.push(error);
                }
            }
        }

        Ok(MineResult {
            state,
            registry: registry.into_snapshot(),
            failures,
            commit_count,
        })
    }

    fn walk_branch<P: DataProcessor>(
        &self,
        repo: &Repository,
        task: &BranchTask,
        mut processor: P,
    ) -> Result<(RegistrySnapshot, P), BranchWalkError> {
        let registry = Registry::new(self.config.aliases.clone());
        let corrupt = |oid: &Oid, source: git2::Error| BranchWalkError::Corrupt {
            branch: task.name.clone(),
            commit: oid.to_string(),
            source,
        };

        for oid in &task.commits {
            let commit = repo.find_commit(*oid).map_err(|e| corrupt(oid, e))?;
            let signature = commit.author();
            let identity = UserIdentity::new(
                signature.name().unwrap_or(""),
                signature.email().unwrap_or(""),
            );
            let event = CommitEvent {
                id: registry.intern_commit(&oid.to_string()),
                author: registry.intern_user(&identity),
                timestamp: commit.time().seconds(),
                parents: commit
                    .parent_ids()
                    .map(|p| registry.intern_commit(&p.to_string()))
                    .collect::<Vec<CommitId>>(),
                is_fix: is_fix(commit.message(), &self.config.fix_keywords),
            };
            processor
                .on_commit(&event)
                .map_err(|source| BranchWalkError::Processor {
                    branch: task.name.clone(),
                    commit: oid.to_string(),
                    source,
                })?;

            // Merge commits are diffed against their first parent; the
            // other parents' content arrives through their own branches.
            let parent = commit.parent(0).ok();
            let ctx = CommitCtx {
                commit: event.id,
                author: event.author,
                timestamp: event.timestamp,
            };
            let edits = self
                .analyzer
                .analyze(repo, parent.as_ref(), &commit, &registry, ctx)
                .map_err(|e| corrupt(oid, e))?;
            for edit in &edits {
                processor
                    .on_edit(edit)
                    .map_err(|source| BranchWalkError::Processor {
                        branch: task.name.clone(),
                        commit: oid.to_string(),
                        source,
                    })?;
            }

            if event.is_fix && self.config.trace_fixes {
                let edges = self
                    .tracer
                    .trace(repo, &commit, event.id, &registry)
                    .map_err(|e| corrupt(oid, e))?;
                for edge in &edges {
                    processor
                        .on_influence_edge(edge)
                        .map_err(|source| BranchWalkError::Processor {
                            branch: task.name.clone(),
                            commit: oid.to_string(),
                            source,
                        })?;
                }
            }
        }
        Ok((registry.into_snapshot(), processor))
    }
}

fn is_fix(message: Option<&str>, keywords: &[String]) -> bool {
    let Some(message) = message else {
        return false;
    };
    let message = message.to_lowercase();
    keywords
        .iter()
        .any(|keyword| message.contains(&keyword.to_lowercase()))
}
