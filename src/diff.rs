// src/diff.rs

use git2::{Commit, Delta, DiffFindOptions, DiffOptions, Oid, Patch, Repository};

use crate::model::{CommitId, Edit, EditKind, UserId};
use crate::registry::Registry;

/// Tuning knobs for diff computation.
#[derive(Debug, Clone)]
pub struct DiffConfig {
    /// Fold (delete, add) pairs into renames when git's similarity score
    /// crosses the threshold.
    pub detect_renames: bool,
    /// Similarity score 0..100 required to call a pair a rename. 50 is
    /// git's own default.
    pub rename_threshold: u16,
}

impl Default for DiffConfig {
    fn default() -> Self {
        DiffConfig {
            detect_renames: true,
            rename_threshold: 50,
        }
    }
}

/// Identity of the commit whose diff is being analyzed; stamped onto every
/// produced edit.
#[derive(Debug, Clone, Copy)]
pub struct CommitCtx {
    pub commit: CommitId,
    pub author: UserId,
    pub timestamp: i64,
}

/// Computes typed, scored edits between a commit and one of its parents.
pub struct DiffAnalyzer {
    config: DiffConfig,
}

impl DiffAnalyzer {
    pub fn new(config: DiffConfig) -> Self {
        DiffAnalyzer { config }
    }

    /// Diff `commit` against `parent` (the empty tree when `None`) and
    /// return one edit per changed block, in delta-then-hunk order.
    pub fn analyze(
        &self,
        repo: &Repository,
        parent: Option<&Commit>,
        commit: &Commit,
        registry: &Registry,
        ctx: CommitCtx,
    ) -> Result<Vec<Edit>, git2::Error> {
        let parent_tree = match parent {
            Some(p) => Some(p.tree()?),
            None => None,
        };
        let tree = commit.tree()?;

        let mut opts = DiffOptions::new();
        opts.context_lines(0);
        opts.ignore_filemode(true);

        let mut diff =
            repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut opts))?;
        if self.config.detect_renames {
            let mut find = DiffFindOptions::new();
            find.renames(true);
            find.rename_threshold(self.config.rename_threshold);
            diff.find_similar(Some(&mut find))?;
        }

        let mut edits = Vec::new();
        let delta_count = diff.deltas().len();
        for idx in 0..delta_count {
            let delta = match diff.get_delta(idx) {
                Some(d) => d,
                None => continue,
            };
            match delta.status() {
                Delta::Added
                | Delta::Deleted
                | Delta::Modified
                | Delta::Renamed
                | Delta::Copied
                | Delta::Typechange => {}
                _ => continue,
            }

            let old_path = delta
                .old_file()
                .path()
                .map(|p| p.to_string_lossy().into_owned());
            let new_path = delta
                .new_file()
                .path()
                .map(|p| p.to_string_lossy().into_owned());
            let (pre_path, post_path) = match (&old_path, &new_path) {
                (Some(o), Some(n)) => (o.as_str(), n.as_str()),
                (Some(o), None) => (o.as_str(), o.as_str()),
                (None, Some(n)) => (n.as_str(), n.as_str()),
                (None, None) => continue,
            };
            let pre_id = registry.intern_file(pre_path);
            let post_id = registry.intern_file(post_path);

            if is_binary(repo, delta.old_file().id(), delta.new_file().id())? {
                edits.push(blockless_edit(ctx, pre_id, post_id, EditKind::Binary));
                continue;
            }

            if delta.status() == Delta::Renamed {
                edits.push(blockless_edit(ctx, pre_id, post_id, EditKind::Rename));
            }

            let patch = match Patch::from_diff(&diff, idx)? {
                Some(p) => p,
                None => {
                    edits.push(blockless_edit(ctx, pre_id, post_id, EditKind::Binary));
                    continue;
                }
            };
            for h in 0..patch.num_hunks() {
                let (old_start, new_start, line_count) = {
                    let (hunk, line_count) = patch.hunk(h)?;
                    (hunk.old_start(), hunk.new_start(), line_count)
                };

                let mut pre_block = String::new();
                let mut post_block = String::new();
                let mut pre_lines = 0u32;
                let mut post_lines = 0u32;
                for l in 0..line_count {
                    let line = patch.line_in_hunk(h, l)?;
                    let content = String::from_utf8_lossy(line.content());
                    match line.origin() {
                        '-' => {
                            pre_block.push_str(&content);
                            pre_lines += 1;
                        }
                        '+' => {
                            post_block.push_str(&content);
                            post_lines += 1;
                        }
                        _ => {}
                    }
                }

                let kind = classify(pre_lines, post_lines);
                let scored = if post_block.is_empty() {
                    &pre_block
                } else {
                    &post_block
                };
                edits.push(Edit {
                    commit: ctx.commit,
                    author: ctx.author,
                    timestamp: ctx.timestamp,
                    pre_path: pre_id,
                    post_path: post_id,
                    pre_start: old_start,
                    pre_lines,
                    post_start: new_start,
                    post_lines,
                    char_count: scored.chars().count(),
                    entropy: shannon_entropy(scored.as_bytes()),
                    edit_distance: levenshtein(&pre_block, &post_block),
                    kind,
                });
            }
        }
        Ok(edits)
    }
}

fn blockless_edit(ctx: CommitCtx, pre_path: u32, post_path: u32, kind: EditKind) -> Edit {
    Edit {
        commit: ctx.commit,
        author: ctx.author,
        timestamp: ctx.timestamp,
        pre_path,
        post_path,
        pre_start: 0,
        pre_lines: 0,
        post_start: 0,
        post_lines: 0,
        char_count: 0,
        entropy: 0.0,
        edit_distance: 0,
        kind,
    }
}

/// Hunk classification: no pre-lines is an insertion, no post-lines a
/// deletion, anything else a modification.
pub fn classify(pre_lines: u32, post_lines: u32) -> EditKind {
    match (pre_lines, post_lines) {
        (0, _) => EditKind::Insertion,
        (_, 0) => EditKind::Deletion,
        _ => EditKind::Modification,
    }
}

/// git stores no binary flag in trees, so check the blobs the way git does:
/// a NUL byte in the first 8000 bytes means binary.
fn is_binary(repo: &Repository, old_id: Oid, new_id: Oid) -> Result<bool, git2::Error> {
    for id in [old_id, new_id] {
        if id.is_zero() {
            continue;
        }
        let blob = repo.find_blob(id)?;
        let head = &blob.content()[..blob.content().len().min(8000)];
        if head.contains(&0) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Shannon entropy, base 2, of the byte frequency distribution.
pub fn shannon_entropy(bytes: &[u8]) -> f64 {
    if bytes.is_empty() {
        return 0.0;
    }
    let mut counts = [0u64; 256];
    for &b in bytes {
        counts[b as usize] += 1;
    }
    let total = bytes.len() as f64;
    let mut entropy = 0.0;
    for &count in counts.iter().filter(|&&c| c > 0) {
        let p = count as f64 / total;
        entropy -= p * p.log2();
    }
    entropy
}

/// Levenshtein distance over characters, unit cost for insert, delete and
/// substitute. Two-row dynamic program.
pub fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitute = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitute.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_matches_hunk_shape() {
        assert_eq!(classify(0, 3), EditKind::Insertion);
        assert_eq!(classify(2, 0), EditKind::Deletion);
        assert_eq!(classify(1, 1), EditKind::Modification);
    }

    #[test]
    fn entropy_of_uniform_block_is_zero() {
        assert_eq!(shannon_entropy(b"aaaa"), 0.0);
        assert_eq!(shannon_entropy(b""), 0.0);
    }

    #[test]
    fn entropy_of_two_equal_symbols_is_one_bit() {
        let e = shannon_entropy(b"abab");
        assert!((e - 1.0).abs() < 1e-12);
    }

    #[test]
    fn levenshtein_unit_costs() {
        assert_eq!(levenshtein("abc", "abd"), 1);
        assert_eq!(levenshtein("abc", "abc"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }
}
