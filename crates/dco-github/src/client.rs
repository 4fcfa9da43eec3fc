use std::time::Duration;

use anyhow::{Context, Result};
use dco_core::{
    retry_backoff_seconds, ApiCommitEntry, AttestationRecord, Commit, CommitOrigin, Repository, MAX_ATTEMPTS,
};
use dco_source::{CommitSource, RepoCatalog, RepoSnapshot};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::retry::{now_unix, retry_action, RateLimitHeaders, RetryAction};
use crate::types::{ApiCommit, ApiRepo, ContentEntry};
use crate::GithubError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const PER_PAGE: usize = 100;
const JSON_MEDIA: &str = "application/vnd.github+json";
const RAW_MEDIA: &str = "application/vnd.github.raw+json";

/// Blocking GitHub REST client. Every request goes through the same
/// rate-limit / transient-error retry loop.
pub struct GithubClient {
    http: Client,
    api_url: Url,
    pub max_attempts: u32,
    sleeper: fn(Duration),
}

impl GithubClient {
    pub fn new(token: &str) -> Result<Self> {
        Self::with_api_url(token, DEFAULT_API_URL)
    }

    pub fn with_api_url(token: &str, api_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token)).context("token is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(USER_AGENT, HeaderValue::from_static("dco-org-check"));
        headers.insert("x-github-api-version", HeaderValue::from_static("2022-11-28"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .context("build http client")?;
        let api_url = Url::parse(api_url).with_context(|| format!("invalid api url {}", api_url))?;
        if api_url.cannot_be_a_base() {
            anyhow::bail!("api url {} cannot take a path", api_url);
        }
        Ok(Self {
            http,
            api_url,
            max_attempts: MAX_ATTEMPTS,
            sleeper: std::thread::sleep,
        })
    }

    /// `api_url` plus `segments`, each percent-encoded as one path segment.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> String {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.into()
    }

    fn send(&self, url: &str, accept: &'static str, query: &[(&str, String)]) -> Result<Response, GithubError> {
        let mut attempt = 1;
        loop {
            let (action, detail) = match self.http.get(url).header(ACCEPT, accept).query(query).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let headers = RateLimitHeaders::from_headers(resp.headers());
                    match retry_action(status, &headers, now_unix()) {
                        RetryAction::Done => return Ok(resp),
                        RetryAction::Fatal => {
                            let body = resp.text().unwrap_or_default();
                            return Err(GithubError::Status { url: url.to_string(), status, body });
                        }
                        other => (other, format!("HTTP {}", status)),
                    }
                }
                Err(e) if e.is_timeout() || e.is_connect() || e.is_request() => (RetryAction::Transient, e.to_string()),
                Err(e) => return Err(GithubError::Http { url: url.to_string(), source: e }),
            };

            if attempt >= self.max_attempts {
                return Err(match action {
                    RetryAction::RateLimited { .. } => GithubError::RateLimited { url: url.to_string(), attempts: attempt },
                    _ => GithubError::Transient { url: url.to_string(), attempts: attempt, detail },
                });
            }
            attempt += 1;
            let wait_secs = match action {
                RetryAction::RateLimited { wait_secs } => {
                    warn!(url, wait_secs, "sleeping until we get past the API rate limit");
                    wait_secs
                }
                _ => {
                    let wait_secs = retry_backoff_seconds(attempt);
                    warn!(url, attempt, wait_secs, detail = %detail, "server error, retrying");
                    wait_secs
                }
            };
            (self.sleeper)(Duration::from_secs(wait_secs));
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T, GithubError> {
        let resp = self.send(url, JSON_MEDIA, query)?;
        let text = resp.text().map_err(|e| GithubError::Http { url: url.to_string(), source: e })?;
        serde_json::from_str(&text).map_err(|e| GithubError::Decode { url: url.to_string(), source: e })
    }

    /// Follow `page=N` until a short page. Pages already fetched are kept
    /// across retries of a later page.
    fn get_paginated<T: DeserializeOwned>(&self, url: &str, extra: &[(&str, String)]) -> Result<Vec<T>, GithubError> {
        let mut all = vec![];
        let mut page = 1usize;
        loop {
            let mut query: Vec<(&str, String)> = extra.to_vec();
            query.push(("per_page", PER_PAGE.to_string()));
            query.push(("page", page.to_string()));
            let items: Vec<T> = self.get_json(url, &query)?;
            let len = items.len();
            all.extend(items);
            if len < PER_PAGE {
                return Ok(all);
            }
            page += 1;
        }
    }

    pub fn list_org_repos(&self, org: &str) -> Result<Vec<Repository>, GithubError> {
        let url = self.endpoint(["orgs", org, "repos"]);
        let repos: Vec<ApiRepo> = self.get_paginated(&url, &[("type", "all".to_string())])?;
        Ok(repos.into_iter().map(Repository::from).collect())
    }

    /// Commits reachable from the default branch tip, newest first.
    pub fn list_commits(&self, repo: &Repository) -> Result<Vec<ApiCommit>, GithubError> {
        let url = self.endpoint(repo_segments(repo).chain(["commits"]));
        let mut extra = vec![];
        if let Some(branch) = &repo.default_branch {
            extra.push(("sha", branch.clone()));
        }
        match self.get_paginated(&url, &extra) {
            // 409: repository has no commits yet
            Err(e) if e.status() == Some(409) => Ok(vec![]),
            other => other,
        }
    }

    /// Files directly inside `dir` at the default branch tip; empty when the
    /// directory does not exist.
    pub fn list_directory(&self, repo: &Repository, dir: &str) -> Result<Vec<ContentEntry>, GithubError> {
        let url = self.endpoint(repo_segments(repo).chain(["contents"]).chain(dir.split('/')));
        let mut query = vec![];
        if let Some(branch) = &repo.default_branch {
            query.push(("ref", branch.clone()));
        }
        let entries: Vec<ContentEntry> = match self.get_json(&url, &query) {
            Err(e) if e.status() == Some(404) => return Ok(vec![]),
            // A file (not a directory) at this path decodes as an object.
            Err(GithubError::Decode { .. }) => return Ok(vec![]),
            other => other?,
        };
        let mut files: Vec<ContentEntry> = entries.into_iter().filter(|e| e.kind == "file").collect();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    pub fn file_bytes(&self, repo: &Repository, path: &str) -> Result<Vec<u8>, GithubError> {
        let url = self.endpoint(repo_segments(repo).chain(["contents"]).chain(path.split('/')));
        let mut query = vec![];
        if let Some(branch) = &repo.default_branch {
            query.push(("ref", branch.clone()));
        }
        let resp = self.send(&url, RAW_MEDIA, &query)?;
        let bytes = resp.bytes().map_err(|e| GithubError::Http { url: url.clone(), source: e })?;
        Ok(bytes.to_vec())
    }
}

/// `repos/<owner>/<name>`; `full_name` already carries the slash.
fn repo_segments(repo: &Repository) -> impl Iterator<Item = &str> {
    std::iter::once("repos").chain(repo.full_name.split('/'))
}

impl RepoCatalog for GithubClient {
    fn list_repositories(&self, org: &str) -> Result<Vec<Repository>> {
        let repos = self.list_org_repos(org).with_context(|| format!("list repositories of {}", org))?;
        debug!(org, count = repos.len(), "listed repositories");
        Ok(repos)
    }
}

/// API retrieval mode: no clone, commits and attestation files come from REST.
impl CommitSource for GithubClient {
    fn origin(&self) -> CommitOrigin {
        CommitOrigin::Api
    }

    fn fetch(&self, repo: &Repository, attestation_dirs: &[String]) -> Result<RepoSnapshot> {
        let mut attestations = vec![];
        for dir in attestation_dirs {
            for entry in self.list_directory(repo, dir).with_context(|| format!("list {}/{}", repo.name, dir))? {
                let content = self
                    .file_bytes(repo, &entry.path)
                    .with_context(|| format!("read {}/{}", repo.name, entry.path))?;
                attestations.push(AttestationRecord { repo_name: repo.name.clone(), path: entry.path, content });
            }
        }
        let commits = self
            .list_commits(repo)
            .with_context(|| format!("list commits of {}", repo.name))?
            .into_iter()
            .map(|c| Commit::from_api(ApiCommitEntry::from(c)))
            .collect();
        Ok(RepoSnapshot { attestations, commits })
    }
}
