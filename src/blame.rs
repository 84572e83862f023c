// src/blame.rs

use std::collections::BTreeSet;

use git2::{BlameOptions, Commit, DiffOptions, Patch, Repository};
use tracing::debug;

use crate::model::{CommitId, InfluenceEdge};
use crate::registry::Registry;

/// Traces the lines a fixing commit deletes or rewrites back to the commits
/// that last wrote them (fix-inducing-change tracing).
pub struct BlameTracer;

impl BlameTracer {
    pub fn new() -> Self {
        BlameTracer
    }

    /// Returns one deduplicated edge per (fixing, introducing) commit pair.
    ///
    /// Attribution is pinned at the fixing commit's first parent, so a line
    /// last touched by a merge commit is attributed to the merge itself.
    /// Lines whose blame cannot be resolved are omitted, never an error.
    pub fn trace(
        &self,
        repo: &Repository,
        fixing: &Commit,
        fixing_id: CommitId,
        registry: &Registry,
    ) -> Result<Vec<InfluenceEdge>, git2::Error> {
        let parent = match fixing.parent(0) {
            Ok(p) => p,
            // A root commit fixes nothing that came before it.
            Err(_) => return Ok(Vec::new()),
        };

        let mut opts = DiffOptions::new();
        opts.context_lines(0);
        opts.ignore_filemode(true);
        let diff = repo.diff_tree_to_tree(
            Some(&parent.tree()?),
            Some(&fixing.tree()?),
            Some(&mut opts),
        )?;

        let mut introducing: BTreeSet<String> = BTreeSet::new();
        for idx in 0..diff.deltas().len() {
            let delta = match diff.get_delta(idx) {
                Some(d) => d,
                None => continue,
            };
            let old_path = match delta.old_file().path() {
                Some(p) => p.to_path_buf(),
                None => continue,
            };

            let touched = deleted_lines(&diff, idx)?;
            if touched.is_empty() {
                continue;
            }

            let mut blame_opts = BlameOptions::new();
            blame_opts.newest_commit(parent.id());
            let blame = match repo.blame_file(&old_path, Some(&mut blame_opts)) {
                Ok(b) => b,
                Err(err) => {
                    // Unresolvable attribution is omission, not failure.
                    debug!(path = %old_path.display(), %err, "blame unresolved");
                    continue;
                }
            };
            for line in touched {
                if let Some(hunk) = blame.get_line(line as usize) {
                    let commit_id = hunk.final_commit_id();
                    if !commit_id.is_zero() {
                        introducing.insert(commit_id.to_string());
                    }
                }
            }
        }

        Ok(introducing
            .iter()
            .map(|hash| InfluenceEdge {
                fixing: fixing_id,
                introducing: registry.intern_commit(hash),
            })
            .collect())
    }
}

impl Default for BlameTracer {
    fn default() -> Self {
        BlameTracer::new()
    }
}

/// Pre-image line numbers removed by delta `idx`; with zero context these
/// are exactly the deleted and rewritten lines.
fn deleted_lines(diff: &git2::Diff<'_>, idx: usize) -> Result<Vec<u32>, git2::Error> {
    let patch = match Patch::from_diff(diff, idx)? {
        Some(p) => p,
        None => return Ok(Vec::new()),
    };
    let mut lines = Vec::new();
    for h in 0..patch.num_hunks() {
        let count = patch.num_lines_in_hunk(h)?;
        for l in 0..count {
            let line = patch.line_in_hunk(h, l)?;
            if line.origin() == '-' {
                if let Some(no) = line.old_lineno() {
                    lines.push(no);
                }
            }
        }
    }
    Ok(lines)
}
