//! Gzip-compressed tar packages and per-request scratch space.

use crate::error::SignError;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};
use tar::EntryType;
use tempfile::TempDir;

const TEMP_PREFIX: &str = "signer-";

/// Extracts uploaded packages and re-packs signed apps under a workspace directory.
#[derive(Debug, Clone)]
pub struct ArchiveService {
    workspace: PathBuf,
}

impl ArchiveService {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Fresh scratch directory for one request, removed when dropped.
    pub fn temp_dir(&self) -> Result<TempDir, SignError> {
        fs::create_dir_all(&self.workspace)?;
        let dir = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir_in(&self.workspace)?;
        Ok(dir)
    }

    /// Unpack a `.tar.gz` package into `target`.
    ///
    /// Only regular files and directories with relative paths are accepted.
    /// Links, absolute paths and `..` components fail the whole package.
    pub fn extract(&self, package: &[u8], target: &Path) -> Result<(), SignError> {
        fs::create_dir_all(target)?;
        let mut archive = tar::Archive::new(GzDecoder::new(package));
        archive.set_preserve_permissions(false);

        let entries = archive.entries().map_err(invalid_archive)?;
        for entry in entries {
            let mut entry = entry.map_err(invalid_archive)?;
            let entry_type = entry.header().entry_type();
            let path = entry.path().map_err(invalid_archive)?.into_owned();

            match entry_type {
                EntryType::XGlobalHeader => continue,
                EntryType::Regular | EntryType::Directory => {}
                EntryType::Symlink | EntryType::Link => {
                    return Err(SignError::InvalidArchive(format!(
                        "links are not allowed: {}",
                        path.display()
                    )));
                }
                other => {
                    return Err(SignError::InvalidArchive(format!(
                        "unsupported entry type {:?}: {}",
                        other,
                        path.display()
                    )));
                }
            }

            if !is_contained(&path) {
                return Err(SignError::InvalidArchive(format!(
                    "entry escapes the package: {}",
                    path.display()
                )));
            }

            if !entry.unpack_in(target).map_err(invalid_archive)? {
                return Err(SignError::InvalidArchive(format!(
                    "entry could not be placed: {}",
                    path.display()
                )));
            }
        }

        tracing::debug!(target = %target.display(), bytes = package.len(), "Extracted package");
        Ok(())
    }

    /// Pack `app_dir` into a `.tar.gz` named `name` next to it.
    ///
    /// The archive holds the app directory as its single top-level entry.
    pub fn compress(&self, app_dir: &Path, name: &str) -> Result<PathBuf, SignError> {
        let dir_name = app_dir
            .file_name()
            .ok_or_else(|| SignError::Infrastructure(format!("cannot archive {}", app_dir.display())))?;
        let parent = app_dir.parent().unwrap_or(Path::new("."));
        let destination = parent.join(name);

        let file = File::create(&destination)?;
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        builder.follow_symlinks(false);
        builder.mode(tar::HeaderMode::Deterministic);
        builder.append_dir_all(dir_name, app_dir)?;
        builder.into_inner()?.finish()?;

        tracing::debug!(archive = %destination.display(), "Compressed app");
        Ok(destination)
    }
}

fn invalid_archive(err: std::io::Error) -> SignError {
    SignError::InvalidArchive(format!("archive could not be extracted: {}", err))
}

fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
