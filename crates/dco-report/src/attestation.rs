use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use dco_core::{Commit, StorageError};

/// Writes forward attestation files, one per (author, repository):
/// `<base>/<repo>/<author>-<repo>.txt`.
#[derive(Clone, Debug)]
pub struct AttestationWriter {
    pub base: PathBuf,
}

impl AttestationWriter {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn path_for(&self, repo_name: &str, author_name: &str) -> PathBuf {
        let author = author_name.replace(['/', '\\'], "_");
        self.base.join(repo_name).join(format!("{}-{}.txt", author, repo_name))
    }

    pub fn preamble(author_name: &str, author_email: &str) -> String {
        format!(
            "I, {} hereby sign-off-by all of my past commits to this repo subject to the Developer Certificate of Origin (DCO), Version 1.1. In the past I have used emails: {}\n\n",
            author_name, author_email
        )
    }

    /// Append `<sha> <message>` to the author's file, creating it with the
    /// preamble when absent. Nothing is deduplicated.
    pub fn record(&self, commit: &Commit) -> Result<PathBuf, StorageError> {
        let path = self.path_for(&commit.repo_name, &commit.author_name);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| StorageError::new(dir, e))?;
        }
        let mut file = Self::open(&path, commit)?;
        writeln!(file, "{} {}", commit.sha, commit.message).map_err(|e| StorageError::new(&path, e))?;
        Ok(path)
    }

    fn open(path: &Path, commit: &Commit) -> Result<File, StorageError> {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                file.write_all(Self::preamble(&commit.author_name, &commit.author_email).as_bytes())
                    .map_err(|e| StorageError::new(path, e))?;
                Ok(file)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                OpenOptions::new().append(true).open(path).map_err(|e| StorageError::new(path, e))
            }
            Err(e) => Err(StorageError::new(path, e)),
        }
    }
}
