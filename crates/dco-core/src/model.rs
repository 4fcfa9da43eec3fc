use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::{commit_locator, parse_locator, LocatorError};

/// Which upstream representation a commit was built from.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommitOrigin {
    Clone,
    Api,
}

/// One commit as read from `git log` in a local clone.
#[derive(Clone, Debug)]
pub struct GitLogEntry {
    pub sha: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub authored_at: DateTime<FixedOffset>,
    pub parent_count: usize,
}

/// One commit as returned by the hosting API, already flattened.
#[derive(Clone, Debug)]
pub struct ApiCommitEntry {
    pub sha: String,
    pub html_url: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub authored_at: DateTime<FixedOffset>,
    pub parent_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    pub sha: String,
    pub html_url: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub authored_at: DateTime<FixedOffset>,
    pub parent_count: usize,
    /// Empty when `html_url` is not a recognised commit locator.
    pub repo_name: String,
    pub org_name: String,
    pub origin: CommitOrigin,
}

impl Commit {
    pub fn from_git(entry: GitLogEntry, repo_html_url: &str) -> Self {
        let html_url = commit_locator(repo_html_url, &entry.sha);
        Self::assemble(
            entry.sha,
            html_url,
            entry.message,
            entry.author_name,
            entry.author_email,
            entry.authored_at,
            entry.parent_count,
            CommitOrigin::Clone,
        )
    }

    pub fn from_api(entry: ApiCommitEntry) -> Self {
        Self::assemble(
            entry.sha,
            entry.html_url,
            entry.message,
            entry.author_name,
            entry.author_email,
            entry.authored_at,
            entry.parent_count,
            CommitOrigin::Api,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        sha: String,
        html_url: String,
        message: String,
        author_name: String,
        author_email: String,
        authored_at: DateTime<FixedOffset>,
        parent_count: usize,
        origin: CommitOrigin,
    ) -> Self {
        let (org_name, repo_name) = match parse_locator(&html_url) {
            Ok(loc) => (loc.org, loc.repo),
            Err(_) => (String::new(), String::new()),
        };
        Self {
            sha,
            html_url,
            message,
            author_name,
            author_email,
            authored_at,
            parent_count,
            repo_name,
            org_name,
            origin,
        }
    }

    pub fn is_merge(&self) -> bool {
        self.parent_count > 1
    }

    /// Err when the locator did not parse and repository matching is disabled.
    pub fn check_locator(&self) -> Result<(), LocatorError> {
        if self.repo_name.is_empty() {
            return Err(LocatorError::Malformed(self.html_url.clone()));
        }
        Ok(())
    }

    /// Timestamp as it appears in the report, e.g. `2021-03-04 05:06:07+00:00`.
    pub fn authored_display(&self) -> String {
        self.authored_at.format("%Y-%m-%d %H:%M:%S%:z").to_string()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    /// `<owner>/<name>`, as the hosting API addresses it.
    pub full_name: String,
    pub html_url: String,
    pub clone_url: String,
    pub archived: bool,
    pub default_branch: Option<String>,
}

/// One blanket-attestation document found in a repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttestationRecord {
    pub repo_name: String,
    pub path: String,
    pub content: Vec<u8>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ClassificationOutcome {
    Compliant,
    MergeExempt,
    PriorAttested,
    NonCompliant,
}

impl ClassificationOutcome {
    pub fn is_reportable(&self) -> bool {
        matches!(self, ClassificationOutcome::NonCompliant)
    }
}
