use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use base64::Engine;
use chrono::DateTime;
use dco_core::{retry_backoff_seconds, AttestationRecord, Commit, CommitOrigin, GitLogEntry, Repository, MAX_ATTEMPTS};
use dco_source::{CommitSource, RepoSnapshot};
use tracing::{debug, warn};

// Records are NUL-terminated (`git log -z`); git never emits NUL inside a
// commit message, so any other byte may appear in `%B`.
const RECORD_SEP: char = '\0';
const FIELD_SEP: char = '\u{1f}';
const LOG_FORMAT: &str = "--format=%H%x1f%an%x1f%ae%x1f%aI%x1f%P%x1f%B";

// A clone slower than LOW_SPEED_LIMIT bytes/sec for LOW_SPEED_TIME seconds is aborted.
const LOW_SPEED_LIMIT: &str = "1000";
const LOW_SPEED_TIME: &str = "60";

/// Clones each repository into a scratch directory and reads history with the git CLI.
#[derive(Clone)]
pub struct GitSource {
    pub scratch_root: PathBuf,
    pub max_attempts: u32,
    token: Option<String>,
}

impl fmt::Debug for GitSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitSource")
            .field("scratch_root", &self.scratch_root)
            .field("max_attempts", &self.max_attempts)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl GitSource {
    pub fn new(scratch_root: impl Into<PathBuf>) -> Self {
        Self { scratch_root: scratch_root.into(), max_attempts: MAX_ATTEMPTS, token: None }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Authenticate HTTPS clones with an API token, so private repositories
    /// listed by the catalog can be cloned without a credential prompt.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.is_empty()).then_some(token);
        self
    }

    /// Per-invocation git config for clones. Passed through the environment
    /// so the token never shows up in argv or in error messages.
    fn clone_config(&self) -> Vec<(&'static str, String)> {
        let mut config = vec![
            ("http.lowSpeedLimit", LOW_SPEED_LIMIT.to_string()),
            ("http.lowSpeedTime", LOW_SPEED_TIME.to_string()),
        ];
        if let Some(token) = &self.token {
            let basic = base64::engine::general_purpose::STANDARD.encode(format!("x-access-token:{}", token));
            config.push(("http.extraHeader", format!("Authorization: Basic {}", basic)));
        }
        config
    }

    fn run(dir: &Path, args: &[&str], config: &[(&str, String)]) -> Result<String> {
        let out = git_command(dir, args, config)
            .output()
            .with_context(|| format!("run git {:?}", args))?;
        if !out.status.success() {
            return Err(anyhow!(
                "command failed: git {:?}\nstdout:{}\nstderr:{}",
                args,
                String::from_utf8_lossy(&out.stdout),
                String::from_utf8_lossy(&out.stderr)
            ));
        }
        // Untrimmed: commit bodies keep their trailing newlines.
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    fn clone_repo(&self, repo: &Repository) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.scratch_root)
            .with_context(|| format!("create scratch dir {}", self.scratch_root.display()))?;
        let dest = self.scratch_root.join(&repo.name);
        let dest_str = dest.to_str().ok_or_else(|| anyhow!("non-utf8 clone path {}", dest.display()))?;
        let config = self.clone_config();

        let mut attempt = 1;
        loop {
            if dest.exists() {
                std::fs::remove_dir_all(&dest).with_context(|| format!("clear {}", dest.display()))?;
            }
            match Self::run(&self.scratch_root, &["clone", "--quiet", &repo.clone_url, dest_str], &config) {
                Ok(_) => return Ok(dest),
                Err(e) if attempt < self.max_attempts => {
                    attempt += 1;
                    let wait = retry_backoff_seconds(attempt);
                    warn!(repo = %repo.name, attempt, wait_secs = wait, error = %e, "clone failed, retrying");
                    std::thread::sleep(Duration::from_secs(wait));
                }
                Err(e) => return Err(e.context(format!("clone {} after {} attempts", repo.name, attempt))),
            }
        }
    }

    fn has_head(checkout: &Path) -> bool {
        Self::run(checkout, &["rev-parse", "--verify", "--quiet", "HEAD"], &[]).is_ok()
    }

    pub fn read_history(checkout: &Path) -> Result<Vec<GitLogEntry>> {
        if !Self::has_head(checkout) {
            return Ok(vec![]);
        }
        let out = Self::run(checkout, &["log", "-z", LOG_FORMAT, "HEAD"], &[])?;
        parse_log(&out)
    }
}

/// A git invocation that never waits on a human: terminal and credential
/// manager prompts are off, ssh runs in batch mode. `config` entries are
/// applied as `-c key=value` through `GIT_CONFIG_*`.
fn git_command(dir: &Path, args: &[&str], config: &[(&str, String)]) -> Command {
    let mut cmd = Command::new("git");
    cmd.args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("GCM_INTERACTIVE", "never")
        .env("GIT_SSH_COMMAND", "ssh -o BatchMode=yes")
        .env("GIT_CONFIG_COUNT", config.len().to_string());
    for (i, (key, value)) in config.iter().enumerate() {
        cmd.env(format!("GIT_CONFIG_KEY_{}", i), key).env(format!("GIT_CONFIG_VALUE_{}", i), value);
    }
    cmd
}

/// Files directly inside each attestation directory of a checked-out tree,
/// ordered by directory (as configured) and then by file name.
pub fn read_attestations(checkout: &Path, repo_name: &str, dirs: &[String]) -> Result<Vec<AttestationRecord>> {
    let mut records = vec![];
    for dir in dirs {
        let root = checkout.join(dir);
        if !root.is_dir() {
            continue;
        }
        let mut files = vec![];
        for entry in std::fs::read_dir(&root).with_context(|| format!("read dir {}", root.display()))? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.file_name());
            }
        }
        files.sort();
        for name in files {
            let path = root.join(&name);
            let content = std::fs::read(&path).with_context(|| format!("read {}", path.display()))?;
            records.push(AttestationRecord {
                repo_name: repo_name.to_string(),
                path: format!("{}/{}", dir, name.to_string_lossy()),
                content,
            });
        }
    }
    Ok(records)
}

/// Parse `git log -z` output produced with `LOG_FORMAT`.
pub fn parse_log(out: &str) -> Result<Vec<GitLogEntry>> {
    let mut entries = vec![];
    for record in out.split(RECORD_SEP).filter(|r| !r.is_empty()) {
        let fields: Vec<&str> = record.splitn(6, FIELD_SEP).collect();
        if fields.len() != 6 {
            return Err(anyhow!("unexpected git log record: {:?}", record));
        }
        let authored_at = DateTime::parse_from_rfc3339(fields[3])
            .with_context(|| format!("parse author date {:?} of {}", fields[3], fields[0]))?;
        entries.push(GitLogEntry {
            sha: fields[0].to_string(),
            author_name: fields[1].to_string(),
            author_email: fields[2].to_string(),
            authored_at,
            parent_count: fields[4].split_whitespace().count(),
            message: fields[5].to_string(),
        });
    }
    Ok(entries)
}

impl CommitSource for GitSource {
    fn origin(&self) -> CommitOrigin {
        CommitOrigin::Clone
    }

    fn fetch(&self, repo: &Repository, attestation_dirs: &[String]) -> Result<RepoSnapshot> {
        let checkout = self.clone_repo(repo)?;
        let attestations = read_attestations(&checkout, &repo.name, attestation_dirs)?;
        let commits = Self::read_history(&checkout)?
            .into_iter()
            .map(|entry| Commit::from_git(entry, &repo.html_url))
            .collect::<Vec<_>>();
        debug!(repo = %repo.name, commits = commits.len(), attestations = attestations.len(), "read clone");

        // Best effort; the whole scratch dir goes away at the end of the run.
        let _ = std::fs::remove_dir_all(&checkout);
        Ok(RepoSnapshot { attestations, commits })
    }
}
