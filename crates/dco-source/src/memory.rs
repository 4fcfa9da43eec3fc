use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use dco_core::{CommitOrigin, Repository};

use crate::types::{CommitSource, RepoCatalog, RepoSnapshot};

/// In-memory catalog and source for tests. Repositories are listed in
/// insertion order.
#[derive(Default)]
pub struct InMemorySource {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    repos: Vec<Repository>,
    snapshots: HashMap<String, RepoSnapshot>,
    failing: Vec<String>,
    fetched: Vec<String>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_repo(&self, repo: Repository, snapshot: RepoSnapshot) {
        let mut inner = self.inner.lock().unwrap();
        inner.snapshots.insert(repo.name.clone(), snapshot);
        inner.repos.push(repo);
    }

    /// Make `fetch` fail for this repository.
    pub fn fail_repo(&self, name: &str) {
        self.inner.lock().unwrap().failing.push(name.to_string());
    }

    /// Names passed to `fetch`, in call order.
    pub fn fetched(&self) -> Vec<String> {
        self.inner.lock().unwrap().fetched.clone()
    }
}

impl RepoCatalog for InMemorySource {
    fn list_repositories(&self, _org: &str) -> Result<Vec<Repository>> {
        Ok(self.inner.lock().unwrap().repos.clone())
    }
}

impl CommitSource for InMemorySource {
    fn origin(&self) -> CommitOrigin {
        CommitOrigin::Clone
    }

    fn fetch(&self, repo: &Repository, _attestation_dirs: &[String]) -> Result<RepoSnapshot> {
        let mut inner = self.inner.lock().unwrap();
        inner.fetched.push(repo.name.clone());
        if inner.failing.contains(&repo.name) {
            return Err(anyhow!("simulated retrieval failure for {}", repo.name));
        }
        Ok(inner.snapshots.get(&repo.name).cloned().unwrap_or_default())
    }
}
