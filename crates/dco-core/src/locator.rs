use std::sync::LazyLock;

use regex::Regex;

use crate::LocatorError;

/// Greedy, unanchored: the last two path segments before `/commit/` win.
static COMMIT_LOCATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https://github\.com/(.*)/(.*)/commit/.*").expect("static regex"));

/// Organization and repository named by a commit locator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Locator {
    pub org: String,
    pub repo: String,
}

pub fn parse_locator(url: &str) -> Result<Locator, LocatorError> {
    let caps = COMMIT_LOCATOR
        .captures(url)
        .ok_or_else(|| LocatorError::Malformed(url.to_string()))?;
    Ok(Locator {
        org: caps[1].to_string(),
        repo: caps[2].to_string(),
    })
}

pub fn commit_locator(repo_html_url: &str, sha: &str) -> String {
    format!("{}/commit/{}", repo_html_url.trim_end_matches('/'), sha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_org_and_repo() {
        let loc = parse_locator("https://github.com/org/repo/commit/abc123").unwrap();
        assert_eq!(loc.org, "org");
        assert_eq!(loc.repo, "repo");
    }

    #[test]
    fn rejects_foreign_shapes() {
        assert!(parse_locator("https://gitlab.com/org/repo/-/commit/abc").is_err());
        assert!(parse_locator("not a url").is_err());
        assert!(parse_locator("https://github.com/org/repo").is_err());
    }

    #[test]
    fn builds_locator_from_repo_url() {
        assert_eq!(
            commit_locator("https://github.com/org/repo/", "abc"),
            "https://github.com/org/repo/commit/abc"
        );
    }
}
