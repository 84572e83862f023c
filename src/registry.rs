// src/registry.rs

use std::collections::HashMap;
use std::sync::Mutex;

use crate::model::{CommitId, FileId, UserId, UserIdentity};

/// Interning table for one key space: string key -> dense zero-based id.
#[derive(Debug, Default)]
struct Table {
    ids: HashMap<String, u32>,
    keys: Vec<String>,
}

impl Table {
    fn intern(&mut self, key: &str) -> u32 {
        if let Some(&id) = self.ids.get(key) {
            return id;
        }
        let id = self.keys.len() as u32;
        self.ids.insert(key.to_owned(), id);
        self.keys.push(key.to_owned());
        id
    }
}

/// Thread-safe registry assigning dense run-local ids to user identities,
/// file paths and commit hashes.
///
/// Ids are assigned monotonically in first-discovery order. The same key
/// always maps to the same id within one registry; ids are not stable
/// across runs or across registries (see [`Registry::absorb`]).
#[derive(Debug)]
pub struct Registry {
    users: Mutex<Table>,
    files: Mutex<Table>,
    commits: Mutex<Table>,
    /// Externally supplied identity aliases: raw email -> canonical email.
    aliases: HashMap<String, String>,
}

impl Registry {
    pub fn new(aliases: HashMap<String, String>) -> Self {
        Registry {
            users: Mutex::new(Table::default()),
            files: Mutex::new(Table::default()),
            commits: Mutex::new(Table::default()),
            aliases,
        }
    }

    /// Canonical user key: trimmed, lower-cased email, folded through the
    /// alias table. Author names are spelling, not identity.
    fn canonical_email(&self, identity: &UserIdentity) -> String {
        let email = identity.email.trim().to_lowercase();
        match self.aliases.get(&email) {
            Some(canonical) => canonical.clone(),
            None => email,
        }
    }

    pub fn intern_user(&self, identity: &UserIdentity) -> UserId {
        let key = self.canonical_email(identity);
        self.users.lock().unwrap().intern(&key)
    }

    pub fn intern_file(&self, path: &str) -> FileId {
        self.files.lock().unwrap().intern(path)
    }

    pub fn intern_commit(&self, hash: &str) -> CommitId {
        self.commits.lock().unwrap().intern(hash)
    }

    /// Fold another registry's key tables into this one, in the other's id
    /// order, and return the old-id -> new-id translation. This is the
    /// single-threaded reduction step that makes final ids independent of
    /// worker scheduling.
    pub fn absorb(&self, other: &RegistrySnapshot) -> IdRemap {
        IdRemap {
            users: other
                .users
                .iter()
                .map(|k| self.users.lock().unwrap().intern(k))
                .collect(),
            files: other
                .files
                .iter()
                .map(|k| self.files.lock().unwrap().intern(k))
                .collect(),
            commits: other
                .commits
                .iter()
                .map(|k| self.commits.lock().unwrap().intern(k))
                .collect(),
        }
    }

    /// Freeze into plain reverse maps (index = id) for output.
    pub fn into_snapshot(self) -> RegistrySnapshot {
        RegistrySnapshot {
            users: self.users.into_inner().unwrap().keys,
            files: self.files.into_inner().unwrap().keys,
            commits: self.commits.into_inner().unwrap().keys,
        }
    }
}

/// Frozen reverse maps of one registry: `users[id]` is the canonical email
/// assigned id `id`, and so on.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    pub users: Vec<String>,
    pub files: Vec<String>,
    pub commits: Vec<String>,
}

/// Old-id -> new-id translation produced when one registry absorbs another.
#[derive(Debug, Clone)]
pub struct IdRemap {
    users: Vec<UserId>,
    files: Vec<FileId>,
    commits: Vec<CommitId>,
}

impl IdRemap {
    pub fn user(&self, old: UserId) -> UserId {
        self.users[old as usize]
    }

    pub fn file(&self, old: FileId) -> FileId {
        self.files[old as usize]
    }

    pub fn commit(&self, old: CommitId) -> CommitId {
        self.commits[old as usize]
    }

    /// Identity remap over explicit table sizes; useful in tests.
    #[cfg(test)]
    pub fn identity(users: u32, files: u32, commits: u32) -> Self {
        IdRemap {
            users: (0..users).collect(),
            files: (0..files).collect(),
            commits: (0..commits).collect(),
        }
    }
}
