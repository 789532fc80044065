//! Content digests over an app directory.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use signer_core::SIGNATURE_FILE;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io;
use std::path::Path;

/// Relative path (forward slashes) to lowercase hex SHA-512 digest.
///
/// Backed by an ordered map, so serialization is sorted by key regardless
/// of the order files were visited in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashManifest(BTreeMap<String, String>);

impl HashManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, digest: impl Into<String>) {
        self.0.insert(path.into(), digest.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for HashManifest {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Hash every regular file under `root`, skipping symlinks and the
/// signature record itself.
pub fn compute_manifest(root: &Path) -> io::Result<HashManifest> {
    let mut manifest = HashManifest::new();
    walk(root, root, &mut manifest)?;
    tracing::debug!(root = %root.display(), files = manifest.len(), "Computed hash manifest");
    Ok(manifest)
}

fn walk(base: &Path, dir: &Path, manifest: &mut HashManifest) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_symlink() {
            tracing::debug!(path = %path.display(), "Skipping symlink");
            continue;
        }

        if file_type.is_dir() {
            walk(base, &path, manifest)?;
        } else if file_type.is_file() {
            let relative = relative_path(base, &path)?;
            if relative == SIGNATURE_FILE {
                continue;
            }
            let digest = hash_file(&path)?;
            manifest.insert(relative, digest);
        }
    }
    Ok(())
}

fn relative_path(base: &Path, path: &Path) -> io::Result<String> {
    let relative = path
        .strip_prefix(base)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    let mut parts = Vec::new();
    for component in relative.components() {
        let part = component.as_os_str().to_str().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("path is not valid UTF-8: {}", path.display()),
            )
        })?;
        parts.push(part);
    }
    Ok(parts.join("/"))
}

/// Lowercase hex SHA-512 of a file's bytes.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha512::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
