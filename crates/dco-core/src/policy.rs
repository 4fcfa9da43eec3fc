use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    NotAllowListed,
    DenyListed,
    Archived,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inclusion {
    Scan,
    Skip(SkipReason),
}

/// Repository selection and output settings for one run.
#[derive(Clone, Debug, Default)]
pub struct ScanPolicy {
    /// When non-empty, only these repositories are scanned.
    pub only_repos: Vec<String>,
    pub ignore_repos: Vec<String>,
    pub skip_archives: bool,
    pub create_prior_commits_file: bool,
    pub create_prior_commits_dir: PathBuf,
    pub csvfile: PathBuf,
}

impl ScanPolicy {
    /// Allow-list first, then deny-list, then the archived check.
    /// An explicitly allow-listed name is not subject to the deny-list.
    pub fn evaluate(&self, name: &str, archived: bool) -> Inclusion {
        if !self.only_repos.is_empty() {
            if !self.only_repos.iter().any(|r| r == name) {
                return Inclusion::Skip(SkipReason::NotAllowListed);
            }
        } else if self.ignore_repos.iter().any(|r| r == name) {
            return Inclusion::Skip(SkipReason::DenyListed);
        }
        if self.skip_archives && archived {
            return Inclusion::Skip(SkipReason::Archived);
        }
        Inclusion::Scan
    }
}
