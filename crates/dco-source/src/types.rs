use anyhow::Result;
use dco_core::{AttestationRecord, Commit, CommitOrigin, Repository};

/// Everything the scanner needs from one repository.
#[derive(Clone, Debug, Default)]
pub struct RepoSnapshot {
    pub attestations: Vec<AttestationRecord>,
    /// In history order from the default branch tip.
    pub commits: Vec<Commit>,
}

/// Lists the repositories of an organization.
pub trait RepoCatalog {
    fn list_repositories(&self, org: &str) -> Result<Vec<Repository>>;
}

/// Retrieves commits and attestation documents for one repository.
pub trait CommitSource {
    fn origin(&self) -> CommitOrigin;

    /// `attestation_dirs` are top-level directory names; only files directly
    /// inside them are returned.
    fn fetch(&self, repo: &Repository, attestation_dirs: &[String]) -> Result<RepoSnapshot>;
}
