// src/pool.rs

use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex};

use git2::Repository;

use crate::error::RepositoryError;

/// Bounded pool of read-only repository handles.
///
/// `git2::Repository` is `Send` but not `Sync`, so concurrent workers cannot
/// share one handle. The pool pre-opens a fixed number of handles; a worker
/// blocks in [`RepoPool::checkout`] until one is free and returns it by
/// dropping the guard, on every exit path.
pub struct RepoPool {
    handles: Mutex<Vec<Repository>>,
    available: Condvar,
}

impl RepoPool {
    /// Open `size` handles onto the repository at `path`.
    pub fn open(path: &Path, size: usize) -> Result<Self, RepositoryError> {
        let mut handles = Vec::with_capacity(size);
        for _ in 0..size.max(1) {
            let repo = Repository::open(path).map_err(|source| RepositoryError::Open {
                path: PathBuf::from(path),
                source,
            })?;
            handles.push(repo);
        }
        Ok(RepoPool {
            handles: Mutex::new(handles),
            available: Condvar::new(),
        })
    }

    /// Block until a handle is free and take it.
    pub fn checkout(&self) -> RepoHandle<'_> {
        let mut handles = self.handles.lock().unwrap();
        loop {
            if let Some(repo) = handles.pop() {
                return RepoHandle {
                    repo: Some(repo),
                    pool: self,
                };
            }
            handles = self.available.wait(handles).unwrap();
        }
    }

    fn restore(&self, repo: Repository) {
        self.handles.lock().unwrap().push(repo);
        self.available.notify_one();
    }
}

/// Scoped checkout of one repository handle.
pub struct RepoHandle<'p> {
    repo: Option<Repository>,
    pool: &'p RepoPool,
}

impl std::ops::Deref for RepoHandle<'_> {
    type Target = Repository;

    fn deref(&self) -> &Repository {
        self.repo.as_ref().expect("handle taken")
    }
}

impl Drop for RepoHandle<'_> {
    fn drop(&mut self) {
        if let Some(repo) = self.repo.take() {
            self.pool.restore(repo);
        }
    }
}
