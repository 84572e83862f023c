// tests/engine.rs
//
// End-to-end tests against throwaway bare repositories built directly from
// git objects, so no working tree or git binary is involved.

use git2::{Commit, ObjectType, Oid, Repository, Signature, Time};
use tempfile::TempDir;

use git_quarry::engine::{EngineConfig, MiningEngine};
use git_quarry::error::{ProcessorError, RepositoryError};
use git_quarry::model::{CommitEvent, EditKind};
use git_quarry::ownership::OwnershipConfig;
use git_quarry::processors::{
    AssignmentMatrixProcessor, CoEditNetworkProcessor, CommitInfluenceProcessor, DataProcessor,
    OwnershipProcessor, WorkTimeProcessor,
};
use git_quarry::registry::IdRemap;

struct TestRepo {
    dir: TempDir,
    repo: Repository,
}

impl TestRepo {
    fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let repo = Repository::init_bare(dir.path()).expect("init repo");
        TestRepo { dir, repo }
    }

    fn path(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// Commit a full tree snapshot (flat paths) onto `branch`.
    fn commit(
        &self,
        branch: &str,
        parents: &[Oid],
        author: (&str, &str),
        timestamp: i64,
        message: &str,
        files: &[(&str, &str)],
    ) -> Oid {
        let parent_commits: Vec<Commit> = parents
            .iter()
            .map(|oid| self.repo.find_commit(*oid).unwrap())
            .collect();
        let parent_refs: Vec<&Commit> = parent_commits.iter().collect();

        let mut builder = self.repo.treebuilder(None).unwrap();
        for (path, content) in files {
            let blob = self.repo.blob(content.as_bytes()).unwrap();
            builder.insert(*path, blob, 0o100_644).unwrap();
        }
        let tree = self.repo.find_tree(builder.write().unwrap()).unwrap();

        let signature =
            Signature::new(author.0, author.1, &Time::new(timestamp, 0)).unwrap();
        self.repo
            .commit(
                Some(&format!("refs/heads/{branch}")),
                &signature,
                &signature,
                message,
                &tree,
                &parent_refs,
            )
            .unwrap()
    }
}

fn config(repo: &TestRepo, branches: &[&str], threads: usize) -> EngineConfig {
    let mut config = EngineConfig::new(
        repo.path(),
        branches.iter().map(|b| b.to_string()).collect(),
    );
    config.thread_budget = threads;
    config
}

const ALICE: (&str, &str) = ("Alice", "alice@example.com");
const BOB: (&str, &str) = ("Bob", "bob@example.com");

#[test]
fn two_branch_assignment_matrix_is_worker_order_independent() {
    let repo = TestRepo::new();
    repo.commit("main", &[], ALICE, 1_000, "add f1", &[("f1.rs", "fn one() {}\n")]);
    repo.commit("dev", &[], BOB, 2_000, "add f2", &[("f2.rs", "fn two() {}\n")]);

    for threads in [1, 2, 4] {
        let engine = MiningEngine::new(config(&repo, &["main", "dev"], threads));
        let result = engine.run(AssignmentMatrixProcessor::default).unwrap();

        assert!(result.failures.is_empty());
        // Merge order is branch order: main's entities come first.
        assert_eq!(result.registry.users, vec!["alice@example.com", "bob@example.com"]);
        assert_eq!(result.registry.files, vec!["f1.rs", "f2.rs"]);
        assert_eq!(result.state.matrix[&0][&0], 1);
        assert_eq!(result.state.matrix[&1][&1], 1);
        assert_eq!(result.state.matrix.len(), 2);
    }
}

#[test]
fn repeated_runs_are_byte_identical() {
    let repo = TestRepo::new();
    let c1 = repo.commit("main", &[], ALICE, 1_000, "base", &[("a.rs", "one\ntwo\n")]);
    repo.commit(
        "main",
        &[c1],
        BOB,
        2_000,
        "extend",
        &[("a.rs", "one\ntwo\nthree\n"), ("b.rs", "x\n")],
    );
    // A feature branch sharing c1.
    repo.commit(
        "feature",
        &[c1],
        ALICE,
        3_000,
        "branch work",
        &[("a.rs", "one\ntwo\n"), ("c.rs", "y\n")],
    );

    let snapshot = |threads: usize| {
        let engine = MiningEngine::new(config(&repo, &["main", "feature"], threads));
        let result = engine.run(CoEditNetworkProcessor::default).unwrap();
        assert!(result.failures.is_empty());
        (
            serde_json::to_string(&result.state.co_edits).unwrap(),
            result.registry.users,
            result.registry.files,
            result.registry.commits,
        )
    };

    let first = snapshot(2);
    assert_eq!(first, snapshot(2));
    // Stronger than required: the merge order makes the output independent
    // of the thread budget as well.
    assert_eq!(first, snapshot(1));
}

#[test]
fn fix_commit_traces_back_to_introducing_commit() {
    let repo = TestRepo::new();
    let c1 = repo.commit("main", &[], ALICE, 1_000, "add lines", &[("f.txt", "a\nb\nc\n")]);
    repo.commit(
        "main",
        &[c1],
        BOB,
        2_000,
        "fix: drop broken line",
        &[("f.txt", "a\nc\n")],
    );

    let mut config = config(&repo, &["main"], 1);
    config.trace_fixes = true;
    let engine = MiningEngine::new(config);
    let result = engine.run(CommitInfluenceProcessor::default).unwrap();

    // Commit ids follow walk order: c1 = 0, the fix = 1.
    let introducing: Vec<_> = result.state.graph[&1].iter().copied().collect();
    assert_eq!(introducing, vec![0]);
    assert_eq!(result.state.graph.len(), 1);
}

#[test]
fn co_edit_records_classify_and_score_blocks() {
    let repo = TestRepo::new();
    let c1 = repo.commit("main", &[], ALICE, 1_000, "add", &[("f.txt", "abc\n")]);
    repo.commit("main", &[c1], ALICE, 2_000, "tweak", &[("f.txt", "abd\n")]);

    let engine = MiningEngine::new(config(&repo, &["main"], 1));
    let result = engine.run(CoEditNetworkProcessor::default).unwrap();

    let insertion = &result.state.co_edits[&0][0];
    assert_eq!(insertion.edit_type, EditKind::Insertion);
    assert_eq!(insertion.start_line, 1);
    assert_eq!(insertion.length, 1);
    assert_eq!(insertion.char_count, 4);

    let modification = &result.state.co_edits[&1][0];
    assert_eq!(modification.edit_type, EditKind::Modification);
    assert_eq!(modification.edit_distance, 1);
    assert!(modification.entropy > 0.0);
}

#[test]
fn unchanged_rename_folds_into_one_rename_edit() {
    let repo = TestRepo::new();
    let content = "a reasonably long line so similarity is clear\nsecond line\n";
    let c1 = repo.commit("main", &[], ALICE, 1_000, "add", &[("old.txt", content)]);
    repo.commit("main", &[c1], ALICE, 2_000, "move", &[("new.txt", content)]);

    let engine = MiningEngine::new(config(&repo, &["main"], 1));
    let result = engine.run(CoEditNetworkProcessor::default).unwrap();

    let records = &result.state.co_edits[&1];
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].edit_type, EditKind::Rename);
    assert_ne!(records[0].pre_path, records[0].post_path);
}

#[test]
fn ownership_tracks_lines_knowledge_and_potential() {
    let repo = TestRepo::new();
    let day = 86_400;
    let c1 = repo.commit("main", &[], ALICE, 0, "add", &[("f.txt", "a\nb\nc\n")]);
    repo.commit("main", &[c1], BOB, 30 * day, "rewrite b", &[("f.txt", "a\nB\nc\n")]);

    let engine = MiningEngine::new(config(&repo, &["main"], 1));
    let result = engine
        .run(|| OwnershipProcessor::new(OwnershipConfig::default()))
        .unwrap();
    let model = &result.state.model;

    let ownership = model.files_ownership();
    assert_eq!(ownership[&0][&0].owned_lines, 2); // alice
    assert_eq!(ownership[&0][&1].owned_lines, 1); // bob
    assert_eq!(ownership[&0][&0].authorship, 3);
    assert_eq!(ownership[&0][&1].authorship, 1);

    let knowledge = model.developer_knowledge();
    // Alice wrote 3 lines, decayed over 30 days of a 90-day half-life.
    assert!(knowledge[&0][&0] < 3.0);
    assert!(knowledge[&0][&0] > 2.0);
    let potential = model.potential_authorship()[&0];
    assert!((potential - (knowledge[&0][&0] + knowledge[&1][&0])).abs() < 1e-9);
}

#[test]
fn work_time_buckets_commits_by_minute_of_week() {
    let repo = TestRepo::new();
    // Epoch is Thursday 00:00 UTC; offset by 61 minutes.
    repo.commit("main", &[], ALICE, 61 * 60, "work", &[("f.txt", "x\n")]);

    let engine = MiningEngine::new(config(&repo, &["main"], 1));
    let result = engine.run(WorkTimeProcessor::default).unwrap();
    assert_eq!(result.state.distribution[&0][&(4 * 1440 + 61)], 1);
}

/// Counts commits but rejects anything committed at or after a cutoff.
#[derive(Default)]
struct EpochCounter {
    commits: u64,
}

impl DataProcessor for EpochCounter {
    fn on_commit(&mut self, commit: &CommitEvent) -> Result<(), ProcessorError> {
        if commit.timestamp >= 2_000 {
            return Err(ProcessorError::new("commit past supported epoch"));
        }
        self.commits += 1;
        Ok(())
    }

    fn absorb(&mut self, other: Self, _remap: &IdRemap) {
        self.commits += other.commits;
    }
}

#[test]
fn failing_branch_is_isolated_from_the_rest() {
    let repo = TestRepo::new();
    repo.commit("main", &[], ALICE, 1_000, "good", &[("f1.rs", "fn one() {}\n")]);
    repo.commit("dev", &[], BOB, 2_000, "bad", &[("f2.rs", "fn two() {}\n")]);

    let engine = MiningEngine::new(config(&repo, &["main", "dev"], 2));
    let result = engine.run(EpochCounter::default).unwrap();

    // dev's walk aborts, main's aggregate still merges.
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].branch(), "dev");
    assert!(!result.failures[0].commit().is_empty());
    assert_eq!(result.state.commits, 1);
}

#[test]
fn binary_blob_yields_one_tagged_edit_with_zero_metrics() {
    let repo = TestRepo::new();
    repo.commit("main", &[], ALICE, 1_000, "add blob", &[("data.bin", "\x00\x01\x02")]);

    let engine = MiningEngine::new(config(&repo, &["main"], 1));
    let result = engine.run(CoEditNetworkProcessor::default).unwrap();

    assert!(result.failures.is_empty());
    let records = &result.state.co_edits[&0];
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].edit_type, EditKind::Binary);
    assert_eq!(records[0].char_count, 0);
    assert_eq!(records[0].entropy, 0.0);
    assert_eq!(records[0].edit_distance, 0);
}

#[test]
fn broken_history_reports_a_walk_error() {
    let repo = TestRepo::new();

    // Hand-write a commit object whose parent does not exist; the revwalk
    // fails when it tries to load it.
    let builder = repo.repo.treebuilder(None).unwrap();
    let tree = builder.write().unwrap();
    let raw = format!(
        "tree {tree}\n\
         parent {missing}\n\
         author Alice <alice@example.com> 1000 +0000\n\
         committer Alice <alice@example.com> 1000 +0000\n\n\
         broken\n",
        missing = "a".repeat(40),
    );
    let oid = repo
        .repo
        .odb()
        .unwrap()
        .write(ObjectType::Commit, raw.as_bytes())
        .unwrap();
    repo.repo
        .reference("refs/heads/broken", oid, true, "dangling parent")
        .unwrap();

    let engine = MiningEngine::new(config(&repo, &["broken"], 1));
    let err = engine.run(AssignmentMatrixProcessor::default).unwrap_err();
    match err {
        RepositoryError::Walk { branch, .. } => assert_eq!(branch, "broken"),
        other => panic!("expected walk error, got {other}"),
    }
}

#[test]
fn missing_branch_fails_before_workers_start() {
    let repo = TestRepo::new();
    repo.commit("main", &[], ALICE, 1_000, "add", &[("f.txt", "x\n")]);

    let engine = MiningEngine::new(config(&repo, &["main", "nope"], 2));
    let err = engine.run(AssignmentMatrixProcessor::default).unwrap_err();
    assert!(matches!(err, RepositoryError::MissingBranch { .. }));
}

#[test]
fn zero_thread_budget_is_rejected() {
    let repo = TestRepo::new();
    repo.commit("main", &[], ALICE, 1_000, "add", &[("f.txt", "x\n")]);

    let engine = MiningEngine::new(config(&repo, &["main"], 0));
    let err = engine.run(AssignmentMatrixProcessor::default).unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidThreadBudget));
}

#[test]
fn alias_table_folds_identities() {
    let repo = TestRepo::new();
    let c1 = repo.commit("main", &[], ALICE, 1_000, "one", &[("f.txt", "x\n")]);
    repo.commit(
        "main",
        &[c1],
        ("Alice at work", "a.lias@corp.example"),
        2_000,
        "two",
        &[("f.txt", "x\ny\n")],
    );

    let mut config = config(&repo, &["main"], 1);
    config.aliases.insert(
        "a.lias@corp.example".to_string(),
        "alice@example.com".to_string(),
    );
    let engine = MiningEngine::new(config);
    let result = engine.run(AssignmentMatrixProcessor::default).unwrap();

    assert_eq!(result.registry.users, vec!["alice@example.com"]);
    assert_eq!(result.state.matrix[&0][&0], 2);
}
