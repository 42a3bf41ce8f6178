//! Trace artifact files in the session's artifact directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::core::artifacts::ArtifactKind;

/// Resolves and manages artifact files for one session.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: ArtifactKind, index: u32, command: &[String]) -> PathBuf {
        self.dir.join(kind.file_name(index, command))
    }

    /// Create the artifact directory if needed.
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create artifact dir {}", self.dir.display()))
    }

    /// Write an artifact, replacing any file left by an earlier session.
    pub fn persist(&self, path: &Path, contents: &str) -> Result<()> {
        fs::write(path, contents).with_context(|| format!("write {}", path.display()))
    }

    /// Write an artifact, logging instead of failing.
    pub fn persist_or_warn(&self, path: &Path, contents: &str) -> bool {
        match self.persist(path, contents) {
            Ok(()) => true,
            Err(err) => {
                warn!(err = %format!("{err:#}"), "failed to write trace artifact");
                false
            }
        }
    }

    /// Remove an artifact. A file that does not exist is not an error.
    pub fn discard(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "discarded trace artifact");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("remove {}", path.display())),
        }
    }

    /// Remove an artifact, logging instead of failing.
    pub fn discard_or_warn(&self, path: &Path) {
        if let Err(err) = self.discard(path) {
            warn!(err = %format!("{err:#}"), "failed to discard trace artifact");
        }
    }
}
