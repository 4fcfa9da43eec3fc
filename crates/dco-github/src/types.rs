use chrono::{DateTime, FixedOffset, Utc};
use dco_core::{ApiCommitEntry, Repository};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct ApiRepo {
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    pub clone_url: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub default_branch: Option<String>,
}

impl From<ApiRepo> for Repository {
    fn from(r: ApiRepo) -> Self {
        Repository {
            name: r.name,
            full_name: r.full_name,
            html_url: r.html_url,
            clone_url: r.clone_url,
            archived: r.archived,
            default_branch: r.default_branch,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApiSignature {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub date: DateTime<FixedOffset>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApiCommitDetail {
    pub message: String,
    #[serde(default)]
    pub author: Option<ApiSignature>,
    #[serde(default)]
    pub committer: Option<ApiSignature>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApiParent {
    pub sha: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApiCommit {
    pub sha: String,
    pub html_url: String,
    pub commit: ApiCommitDetail,
    #[serde(default)]
    pub parents: Vec<ApiParent>,
}

impl From<ApiCommit> for ApiCommitEntry {
    fn from(c: ApiCommit) -> Self {
        let parent_count = c.parents.len();
        let (author_name, author_email, authored_at) = match c.commit.author.or(c.commit.committer) {
            Some(sig) => (sig.name, sig.email, sig.date),
            None => (String::new(), String::new(), DateTime::<Utc>::UNIX_EPOCH.fixed_offset()),
        };
        ApiCommitEntry {
            sha: c.sha,
            html_url: c.html_url,
            message: c.commit.message,
            author_name,
            author_email,
            authored_at,
            parent_count,
        }
    }
}

/// One entry of a contents-API directory listing.
#[derive(Clone, Debug, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}
