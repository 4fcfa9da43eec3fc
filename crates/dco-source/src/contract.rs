use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use dco_core::Repository;

/// Repository record pointing at a local fixture, as a catalog would return it.
pub fn fixture_repository(name: &str, clone_url: &Path) -> Repository {
    Repository {
        name: name.to_string(),
        full_name: format!("fixture-org/{}", name),
        html_url: format!("https://github.com/fixture-org/{}", name),
        clone_url: clone_url.display().to_string(),
        archived: false,
        default_branch: None,
    }
}

/// Initialize a minimal git repo fixture with one unsigned commit.
pub fn init_git_repo(dir: &Path) -> Result<()> {
    git(dir, &["init"])?;
    git(dir, &["config", "user.email", "dco@example.com"])?;
    git(dir, &["config", "user.name", "dco"])?;
    commit_file(dir, "README.md", "fixture", "init")?;
    Ok(())
}

/// Write `rel` and commit it with `message`; returns the new HEAD sha.
pub fn commit_file(dir: &Path, rel: &str, content: &str, message: &str) -> Result<String> {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, content)?;
    git(dir, &["add", "."])?;
    git(dir, &["commit", "-m", message])?;
    git(dir, &["rev-parse", "HEAD"])
}

pub fn git(dir: &Path, args: &[&str]) -> Result<String> {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
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
    Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use dco_core::{Commit, GitLogEntry};
    use tempfile::tempdir;

    use crate::{CommitSource, InMemorySource, RepoCatalog, RepoSnapshot};

    #[test]
    fn fixture_repo_has_one_commit() {
        let dir = tempdir().unwrap();
        init_git_repo(dir.path()).unwrap();
        let count = git(dir.path(), &["rev-list", "--count", "HEAD"]).unwrap();
        assert_eq!(count, "1");
    }

    #[test]
    fn in_memory_source_replays_snapshots() {
        let src = InMemorySource::new();
        let repo = fixture_repository("a", Path::new("/nowhere"));
        let commit = Commit::from_git(
            GitLogEntry {
                sha: "abc".into(),
                message: "m".into(),
                author_name: "n".into(),
                author_email: "e".into(),
                authored_at: DateTime::parse_from_rfc3339("2020-01-01T00:00:00Z").unwrap(),
                parent_count: 1,
            },
            &repo.html_url,
        );
        src.add_repo(repo.clone(), RepoSnapshot { attestations: vec![], commits: vec![commit] });
        src.fail_repo("b");

        assert_eq!(src.list_repositories("org").unwrap().len(), 1);
        assert_eq!(src.fetch(&repo, &[]).unwrap().commits.len(), 1);
        assert!(src.fetch(&fixture_repository("b", Path::new("/nowhere")), &[]).is_err());
        assert_eq!(src.fetched(), vec!["a".to_string(), "b".to_string()]);
    }
}
