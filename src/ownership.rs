// src/ownership.rs

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{CommitId, Edit, EditKind, FileId, UserId};
use crate::registry::IdRemap;

/// Knowledge decay tuning.
#[derive(Debug, Clone, Copy)]
pub struct OwnershipConfig {
    /// Exponential decay rate per elapsed day. The default gives knowledge
    /// a 90-day half-life.
    pub decay_per_day: f64,
}

impl Default for OwnershipConfig {
    fn default() -> Self {
        OwnershipConfig {
            decay_per_day: std::f64::consts::LN_2 / 90.0,
        }
    }
}

/// Owned-lines and raw authorship for one user on one file.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserOwnership {
    /// Lines of the current content last written by this user
    pub owned_lines: u64,
    /// Lines this user has written over the file's history, undecayed
    pub authorship: u64,
}

#[derive(Debug, Default, Clone)]
struct FileState {
    /// Last writer of each line of the current content.
    lines: Vec<UserId>,
    knowledge: BTreeMap<UserId, f64>,
    authored: BTreeMap<UserId, u64>,
    /// Owned-line counts folded in from merged partials; the live vector
    /// only tracks this model's own edits.
    owned_carry: BTreeMap<UserId, u64>,
    potential: f64,
    last_update: Option<i64>,
    /// Running post-minus-pre line offset while applying one commit's hunks.
    cursor: Option<(CommitId, i64)>,
}

impl FileState {
    fn decay_to(&mut self, timestamp: i64, decay_per_day: f64) {
        if let Some(last) = self.last_update {
            let dt_days = (timestamp - last) as f64 / 86_400.0;
            if dt_days > 0.0 {
                let factor = (-decay_per_day * dt_days).exp();
                for score in self.knowledge.values_mut() {
                    *score *= factor;
                }
                self.potential *= factor;
            }
        }
        // Commit timestamps can go backward; never let the clock rewind.
        self.last_update = Some(timestamp.max(self.last_update.unwrap_or(timestamp)));
    }

    fn splice(&mut self, edit: &Edit) {
        let offset = match self.cursor {
            Some((commit, offset)) if commit == edit.commit => offset,
            _ => 0,
        };
        // For pure insertions git reports the line *before* the block, so
        // the insert index is pre_start itself; otherwise pre_start is the
        // first removed line (1-based).
        let base = if edit.pre_lines == 0 {
            edit.pre_start as i64
        } else {
            edit.pre_start as i64 - 1
        };
        let at = (base + offset).clamp(0, self.lines.len() as i64) as usize;
        let removed = (edit.pre_lines as usize).min(self.lines.len() - at);
        let replacement = std::iter::repeat(edit.author).take(edit.post_lines as usize);
        let _ = self.lines.splice(at..at + removed, replacement);
        self.cursor = Some((
            edit.commit,
            offset + edit.post_lines as i64 - edit.pre_lines as i64,
        ));
    }

    fn owned_counts(&self) -> BTreeMap<UserId, u64> {
        let mut counts = self.owned_carry.clone();
        for &user in &self.lines {
            *counts.entry(user).or_insert(0) += 1;
        }
        counts
    }
}

/// Per-(user, file) knowledge accumulation with exponential time decay,
/// plus line-level attribution for owned-lines and raw authorship.
///
/// Scores grow with every edit and shrink with elapsed time between edits;
/// the potential-authorship track follows the same decayed recurrence over
/// *all* edits to a file and normalizes per-developer knowledge into a
/// share. Meaningful ordering requires the strict per-branch history the
/// partitioner guarantees; merging partials from branches that touch the
/// same files sums their contributions.
#[derive(Debug, Default)]
pub struct OwnershipModel {
    config: OwnershipConfig,
    files: BTreeMap<FileId, FileState>,
}

impl OwnershipModel {
    pub fn new(config: OwnershipConfig) -> Self {
        OwnershipModel {
            config,
            files: BTreeMap::new(),
        }
    }

    pub fn apply(&mut self, edit: &Edit) {
        match edit.kind {
            EditKind::Binary => return,
            EditKind::Rename => {
                self.rename(edit.pre_path, edit.post_path);
                return;
            }
            _ => {}
        }

        let state = self.files.entry(edit.post_path).or_default();
        state.decay_to(edit.timestamp, self.config.decay_per_day);

        let weight = f64::from(edit.lines_touched());
        *state.knowledge.entry(edit.author).or_insert(0.0) += weight;
        state.potential += weight;
        if edit.post_lines > 0 {
            *state.authored.entry(edit.author).or_insert(0) += u64::from(edit.post_lines);
        }
        state.splice(edit);
    }

    fn rename(&mut self, from: FileId, to: FileId) {
        if from == to {
            return;
        }
        let Some(moved) = self.files.remove(&from) else {
            return;
        };
        let target = self.files.entry(to).or_default();
        if target.lines.is_empty() {
            target.lines = moved.lines;
        }
        for (user, score) in moved.knowledge {
            *target.knowledge.entry(user).or_insert(0.0) += score;
        }
        for (user, lines) in moved.authored {
            *target.authored.entry(user).or_insert(0) += lines;
        }
        for (user, lines) in moved.owned_carry {
            *target.owned_carry.entry(user).or_insert(0) += lines;
        }
        target.potential += moved.potential;
        target.last_update = match (target.last_update, moved.last_update) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    /// Commutative merge of a partial built against another registry.
    pub fn absorb(&mut self, other: OwnershipModel, remap: &IdRemap) {
        for (file, state) in other.files {
            let target = self.files.entry(remap.file(file)).or_default();
            for (user, score) in &state.knowledge {
                *target.knowledge.entry(remap.user(*user)).or_insert(0.0) += score;
            }
            for (user, lines) in &state.authored {
                *target.authored.entry(remap.user(*user)).or_insert(0) += lines;
            }
            for (user, lines) in state.owned_counts() {
                *target.owned_carry.entry(remap.user(user)).or_insert(0) += lines;
            }
            target.potential += state.potential;
            target.last_update = match (target.last_update, state.last_update) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            };
        }
    }

    /// `userId -> fileId -> knowledge score`.
    pub fn developer_knowledge(&self) -> BTreeMap<UserId, BTreeMap<FileId, f64>> {
        let mut result: BTreeMap<UserId, BTreeMap<FileId, f64>> = BTreeMap::new();
        for (&file, state) in &self.files {
            for (&user, &score) in &state.knowledge {
                result.entry(user).or_default().insert(file, score);
            }
        }
        result
    }

    /// `fileId -> userId -> {ownedLines, authorship}`.
    pub fn files_ownership(&self) -> BTreeMap<FileId, BTreeMap<UserId, UserOwnership>> {
        let mut result = BTreeMap::new();
        for (&file, state) in &self.files {
            let mut per_user: BTreeMap<UserId, UserOwnership> = BTreeMap::new();
            for (user, owned) in state.owned_counts() {
                per_user.entry(user).or_default().owned_lines = owned;
            }
            for (&user, &authored) in &state.authored {
                per_user.entry(user).or_default().authorship = authored;
            }
            result.insert(file, per_user);
        }
        result
    }

    /// `fileId -> potential authorship` across all developers.
    pub fn potential_authorship(&self) -> BTreeMap<FileId, f64> {
        self.files
            .iter()
            .map(|(&file, state)| (file, state.potential))
            .collect()
    }
}
