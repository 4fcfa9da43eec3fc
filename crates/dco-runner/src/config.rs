use std::path::{Path, PathBuf};

use dco_core::ScanPolicy;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "dco_org_check.yaml";
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{} config file could not be read: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} config file is not valid YAML: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("'org' is not defined in {}", .path.display())]
    MissingOrg { path: PathBuf },
    #[error("Github token is not defined. Set 'token' in {} or set GITHUB_TOKEN environment variable to a valid Github token", .path.display())]
    MissingToken { path: PathBuf },
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommitSourceKind {
    /// Clone each repository and walk `git log`.
    #[default]
    Clone,
    /// Read commits and attestation files from the REST API.
    Api,
}

/// The YAML document as written by the operator.
#[derive(Clone, Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    org: Option<String>,
    #[serde(default)]
    csvfile: Option<String>,
    #[serde(default)]
    dco_signoffs_directories: Option<Vec<String>>,
    #[serde(default, deserialize_with = "flag")]
    create_prior_commits_file: bool,
    #[serde(default)]
    create_prior_commits_dir: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    skip_archives: bool,
    #[serde(default)]
    ignore_repos: Option<Vec<String>>,
    #[serde(default)]
    only_repos: Option<Vec<String>>,
    #[serde(default)]
    temp_dir: Option<String>,
    #[serde(default)]
    commit_source: Option<CommitSourceKind>,
}

/// Booleans are also accepted as 0/1.
fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }
    Ok(match Option::<Flag>::deserialize(d)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(i)) => i != 0,
        None => false,
    })
}

#[derive(Clone, Debug)]
pub struct Config {
    pub token: String,
    pub org: String,
    pub csvfile: PathBuf,
    pub dco_signoffs_directories: Vec<String>,
    pub create_prior_commits_file: bool,
    pub create_prior_commits_dir: PathBuf,
    pub skip_archives: bool,
    pub ignore_repos: Vec<String>,
    pub only_repos: Vec<String>,
    pub temp_dir: PathBuf,
    pub commit_source: CommitSourceKind,
}

impl Config {
    /// Load `path`, taking the token from `GITHUB_TOKEN` when the file has none.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_env(path, std::env::var(TOKEN_ENV).ok())
    }

    pub fn load_with_env(path: &Path, env_token: Option<String>) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::parse(path, &s, env_token)
    }

    fn parse(path: &Path, s: &str, env_token: Option<String>) -> Result<Self, ConfigError> {
        let raw: RawConfig = if s.trim().is_empty() {
            RawConfig::default()
        } else {
            serde_yaml::from_str(s).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?
        };

        let token = raw
            .token
            .filter(|t| !t.is_empty())
            .or(env_token.filter(|t| !t.is_empty()))
            .ok_or_else(|| ConfigError::MissingToken { path: path.to_path_buf() })?;
        let org = raw
            .org
            .filter(|o| !o.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingOrg { path: path.to_path_buf() })?;

        Ok(Self {
            token,
            org,
            csvfile: expand(raw.csvfile.as_deref().unwrap_or("dco-issues.csv")),
            dco_signoffs_directories: raw.dco_signoffs_directories.unwrap_or_else(|| vec!["dco-signoffs".to_string()]),
            create_prior_commits_file: raw.create_prior_commits_file,
            create_prior_commits_dir: expand(raw.create_prior_commits_dir.as_deref().unwrap_or("dco-signoffs")),
            skip_archives: raw.skip_archives,
            ignore_repos: raw.ignore_repos.unwrap_or_default(),
            only_repos: raw.only_repos.unwrap_or_default(),
            temp_dir: expand(raw.temp_dir.as_deref().unwrap_or("tmp")),
            commit_source: raw.commit_source.unwrap_or_default(),
        })
    }

    pub fn policy(&self) -> ScanPolicy {
        ScanPolicy {
            only_repos: self.only_repos.clone(),
            ignore_repos: self.ignore_repos.clone(),
            skip_archives: self.skip_archives,
            create_prior_commits_file: self.create_prior_commits_file,
            create_prior_commits_dir: self.create_prior_commits_dir.clone(),
            csvfile: self.csvfile.clone(),
        }
    }
}

fn expand(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str, env: Option<&str>) -> Result<Config, ConfigError> {
        Config::parse(Path::new("test.yaml"), s, env.map(str::to_string))
    }

    #[test]
    fn defaults_fill_optional_keys() {
        let cfg = parse("org: acme\ntoken: abc\n", None).unwrap();
        assert_eq!(cfg.org, "acme");
        assert_eq!(cfg.csvfile, PathBuf::from("dco-issues.csv"));
        assert_eq!(cfg.dco_signoffs_directories, vec!["dco-signoffs".to_string()]);
        assert_eq!(cfg.create_prior_commits_dir, PathBuf::from("dco-signoffs"));
        assert_eq!(cfg.temp_dir, PathBuf::from("tmp"));
        assert!(!cfg.create_prior_commits_file);
        assert!(!cfg.skip_archives);
        assert!(cfg.only_repos.is_empty());
        assert_eq!(cfg.commit_source, CommitSourceKind::Clone);
    }

    #[test]
    fn token_falls_back_to_environment() {
        let cfg = parse("org: acme\n", Some("from-env")).unwrap();
        assert_eq!(cfg.token, "from-env");
        let cfg = parse("org: acme\ntoken: from-file\n", Some("from-env")).unwrap();
        assert_eq!(cfg.token, "from-file");
    }

    #[test]
    fn missing_token_is_fatal() {
        assert!(matches!(parse("org: acme\n", None), Err(ConfigError::MissingToken { .. })));
    }

    #[test]
    fn missing_org_is_fatal() {
        assert!(matches!(parse("token: abc\n", None), Err(ConfigError::MissingOrg { .. })));
        assert!(matches!(parse("", Some("t")), Err(ConfigError::MissingOrg { .. })));
    }

    #[test]
    fn integer_flags_and_lists() {
        let yaml = "org: acme\ntoken: t\ncreate_prior_commits_file: 1\nskip_archives: true\n\
                    only_repos: [a]\nignore_repos:\n  - a\n  - b\ndco_signoffs_directories: [dco, signoffs]\n\
                    commit_source: api\n";
        let cfg = parse(yaml, None).unwrap();
        assert!(cfg.create_prior_commits_file);
        assert!(cfg.skip_archives);
        assert_eq!(cfg.only_repos, vec!["a"]);
        assert_eq!(cfg.ignore_repos, vec!["a", "b"]);
        assert_eq!(cfg.dco_signoffs_directories, vec!["dco", "signoffs"]);
        assert_eq!(cfg.commit_source, CommitSourceKind::Api);
        let policy = cfg.policy();
        assert!(policy.create_prior_commits_file);
        assert_eq!(policy.only_repos, vec!["a"]);
    }

    #[test]
    fn zero_disables_flag() {
        let cfg = parse("org: acme\ntoken: t\nskip_archives: 0\n", None).unwrap();
        assert!(!cfg.skip_archives);
    }

    #[test]
    fn invalid_yaml_is_a_parse_error() {
        assert!(matches!(parse("org: [unterminated", Some("t")), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn unreadable_file_is_a_read_error() {
        let err = Config::load_with_env(Path::new("/definitely/not/here.yaml"), Some("t".into())).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("config file could not be read"));
    }
}
