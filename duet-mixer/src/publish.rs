//! Atomic artifact publishing
//!
//! Publishing happens in two steps:
//! 1. [`stage`] writes every artifact into a hidden staging directory inside
//!    the output folder. It runs on a blocking thread and stops as soon as
//!    the operation's cancellation token fires.
//! 2. [`StagedArtifacts::commit`] moves the staged files into place. It is
//!    called only once the operation has succeeded. Files it replaces are
//!    parked in the staging directory, so a failed rename restores them.
//!
//! Dropping [`StagedArtifacts`] without committing removes the staging
//! directory and leaves the output folder as it was.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

const STAGING_PREFIX: &str = ".duet-staging-";

/// Holds replaced files during a commit; artifact names never start with '.'
const PREVIOUS_DIR: &str = ".previous";

/// One named output file held in memory until publishing
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Staging directory removed on drop
struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    fn create(out_dir: &Path) -> Result<Self> {
        let path = out_dir.join(format!("{}{}", STAGING_PREFIX, Uuid::new_v4()));
        std::fs::create_dir(&path).map_err(|e| {
            Error::Encode(format!("Failed to create staging directory {}: {}", path.display(), e))
        })?;
        Ok(Self { path })
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove staging directory {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Artifacts written to staging, waiting to be committed
pub struct StagedArtifacts {
    out_dir: PathBuf,
    staging: StagingDir,
    names: Vec<String>,
}

/// Write `artifacts` into a staging directory inside `out_dir`
///
/// Nothing outside the staging directory is touched.
///
/// # Errors
/// - `ExternalService` if `cancel_token` fires before staging completes
/// - `Encode` if the output folder cannot be created or any artifact
///   cannot be written
pub fn stage(
    out_dir: &Path,
    artifacts: &[Artifact],
    cancel_token: &CancellationToken,
) -> Result<StagedArtifacts> {
    for artifact in artifacts {
        validate_name(&artifact.name)?;
    }
    check_cancelled(cancel_token)?;

    std::fs::create_dir_all(out_dir).map_err(|e| {
        Error::Encode(format!("Failed to create output folder {}: {}", out_dir.display(), e))
    })?;

    let staging = StagingDir::create(out_dir)?;

    for artifact in artifacts {
        check_cancelled(cancel_token)?;
        let path = staging.path.join(&artifact.name);
        std::fs::write(&path, &artifact.bytes).map_err(|e| {
            Error::Encode(format!("Failed to write {}: {}", artifact.name, e))
        })?;
        debug!("Staged {} ({} bytes)", artifact.name, artifact.bytes.len());
    }
    check_cancelled(cancel_token)?;

    Ok(StagedArtifacts {
        out_dir: out_dir.to_path_buf(),
        staging,
        names: artifacts.iter().map(|a| a.name.clone()).collect(),
    })
}

fn check_cancelled(cancel_token: &CancellationToken) -> Result<()> {
    if cancel_token.is_cancelled() {
        return Err(Error::ExternalService(
            "Operation cancelled before publishing".to_string(),
        ));
    }
    Ok(())
}

/// One completed replacement, kept for rollback
struct Replaced {
    target: PathBuf,
    previous: Option<PathBuf>,
}

impl StagedArtifacts {
    /// Move every staged file into the output folder
    ///
    /// Existing files of the same name are replaced. If any move fails, the
    /// ones already done are undone and the previous files restored.
    ///
    /// # Returns
    /// Final paths of the published files, in staging order
    ///
    /// # Errors
    /// `Encode` if a file cannot be moved into place, or if a directory
    /// occupies an artifact's name.
    pub fn commit(self) -> Result<Vec<PathBuf>> {
        let previous_dir = self.staging.path.join(PREVIOUS_DIR);
        std::fs::create_dir(&previous_dir).map_err(|e| {
            Error::Encode(format!("Failed to prepare publish of {}: {}", self.out_dir.display(), e))
        })?;

        let mut done: Vec<Replaced> = Vec::with_capacity(self.names.len());
        for name in &self.names {
            match self.replace(name, &previous_dir) {
                Ok(replaced) => done.push(replaced),
                Err(e) => {
                    roll_back(done);
                    return Err(e);
                }
            }
        }

        info!("Published {} files to {}", done.len(), self.out_dir.display());
        Ok(done.into_iter().map(|r| r.target).collect())
    }

    fn replace(&self, name: &str, previous_dir: &Path) -> Result<Replaced> {
        let target = self.out_dir.join(name);
        let publish_err =
            |e: std::io::Error| Error::Encode(format!("Failed to publish {}: {}", target.display(), e));

        let previous = match std::fs::symlink_metadata(&target) {
            Ok(meta) if meta.is_dir() => {
                return Err(Error::Encode(format!(
                    "Failed to publish {}: a directory is in the way",
                    target.display()
                )))
            }
            Ok(_) => {
                let parked = previous_dir.join(name);
                std::fs::rename(&target, &parked).map_err(publish_err)?;
                Some(parked)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(publish_err(e)),
        };

        if let Err(e) = std::fs::rename(self.staging.path.join(name), &target) {
            if let Some(parked) = &previous {
                restore(parked, &target);
            }
            return Err(publish_err(e));
        }

        Ok(Replaced { target, previous })
    }
}

fn roll_back(done: Vec<Replaced>) {
    for replaced in done.into_iter().rev() {
        if let Err(e) = std::fs::remove_file(&replaced.target) {
            warn!("Failed to withdraw {}: {}", replaced.target.display(), e);
        }
        if let Some(parked) = &replaced.previous {
            restore(parked, &replaced.target);
        }
    }
}

fn restore(parked: &Path, target: &Path) {
    if let Err(e) = std::fs::rename(parked, target) {
        warn!("Failed to restore previous {}: {}", target.display(), e);
    }
}

fn validate_name(name: &str) -> Result<()> {
    let plain = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains('/')
        && !name.contains('\\');
    if plain {
        Ok(())
    } else {
        Err(Error::Encode(format!("Invalid artifact name '{}'", name)))
    }
}
