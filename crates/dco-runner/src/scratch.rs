use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

/// Scratch space for clones. Cleared on acquire and removed on drop, so
/// every exit path of a run leaves nothing behind.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        remove_if_present(&path)?;
        std::fs::create_dir_all(&path).with_context(|| format!("create scratch dir {}", path.display()))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "could not remove scratch dir");
            }
        }
    }
}

/// Remove a file or directory tree; absent paths are fine.
pub fn remove_if_present(path: &Path) -> Result<()> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).with_context(|| format!("stat {}", path.display())),
    };
    if meta.is_dir() {
        std::fs::remove_dir_all(path).with_context(|| format!("remove {}", path.display()))
    } else {
        std::fs::remove_file(path).with_context(|| format!("remove {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn acquire_clears_and_drop_removes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tmp");
        std::fs::create_dir_all(path.join("leftover")).unwrap();

        let scratch = ScratchDir::acquire(&path).unwrap();
        assert!(path.exists());
        assert!(!path.join("leftover").exists());
        std::fs::write(scratch.path().join("clone"), "x").unwrap();
        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn removed_even_when_the_run_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tmp");
        let result: Result<()> = (|| {
            let _scratch = ScratchDir::acquire(&path)?;
            anyhow::bail!("boom")
        })();
        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn remove_if_present_handles_files_and_absence() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("report.csv");
        std::fs::write(&file, "x").unwrap();
        remove_if_present(&file).unwrap();
        assert!(!file.exists());
        remove_if_present(&file).unwrap();
    }
}
