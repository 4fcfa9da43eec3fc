pub mod attestation;
pub mod report;

pub use crate::attestation::*;
pub use crate::report::*;

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::DateTime;
    use dco_core::{Commit, GitLogEntry};

    pub fn commit(sha: &str, author: &str, repo_url: &str, message: &str) -> Commit {
        Commit::from_git(
            GitLogEntry {
                sha: sha.to_string(),
                message: message.to_string(),
                author_name: author.to_string(),
                author_email: format!("{}@example.com", author.to_lowercase().replace(' ', ".")),
                authored_at: DateTime::parse_from_rfc3339("2019-05-06T07:08:09-04:00").unwrap(),
                parent_count: 1,
            },
            repo_url,
        )
    }
}
