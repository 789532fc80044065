//! Locating an extracted app and reading its `appinfo/info.xml`.

use crate::error::SignError;
use serde::Deserialize;
use signer_core::APP_INFO_FILE;
use std::fs;
use std::path::{Path, PathBuf};

/// Identity of an extracted app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    pub id: String,
    pub version: String,
    /// The app directory inside the extraction root.
    pub path: PathBuf,
}

impl AppInfo {
    /// The action a token must grant to sign this app.
    pub fn sign_action(&self) -> String {
        format!("sign:{}", self.id)
    }

    /// File name of the signed package.
    pub fn archive_name(&self) -> String {
        format!("{}-{}.tar.gz", self.id, self.version)
    }
}

// Only the identity is read. Other elements, localized ones included, may repeat.
#[derive(Debug, Deserialize)]
struct InfoXml {
    id: Option<String>,
    version: Option<String>,
}

/// Read the single app directory under `root`.
pub fn read_app(root: &Path) -> Result<AppInfo, SignError> {
    let path = app_directory(root)?;

    let info_path = path.join(APP_INFO_FILE);
    if !info_path.is_file() {
        return Err(SignError::InvalidApp("info.xml not found".into()));
    }
    let xml = fs::read_to_string(&info_path)
        .map_err(|e| SignError::InvalidApp(format!("invalid info.xml: {}", e)))?;

    let info: InfoXml = quick_xml::de::from_str(&xml)
        .map_err(|e| SignError::InvalidApp(format!("invalid info.xml: {}", e)))?;

    let id = required(info.id, "id")?;
    let version = required(info.version, "version")?;

    let app = AppInfo {
        id,
        version,
        path,
    };
    tracing::debug!(app_id = %app.id, version = %app.version, "Read app info");
    Ok(app)
}

fn app_directory(root: &Path) -> Result<PathBuf, SignError> {
    let entries = fs::read_dir(root)?.collect::<Result<Vec<_>, _>>()?;

    let [entry] = entries.as_slice() else {
        return Err(SignError::InvalidApp(
            "could not determine app directory".into(),
        ));
    };
    if !entry.file_type()?.is_dir() {
        return Err(SignError::InvalidApp(
            "could not determine app directory".into(),
        ));
    }
    Ok(entry.path())
}

// Both values end up in file names and action strings.
fn required(value: Option<String>, field: &str) -> Result<String, SignError> {
    let value = value.map(|v| v.trim().to_string()).unwrap_or_default();
    if value.is_empty() {
        return Err(SignError::InvalidApp(format!("info.xml is missing {}", field)));
    }
    if value.starts_with('.')
        || value.contains(['/', '\\', ':'])
        || value.chars().any(char::is_whitespace)
    {
        return Err(SignError::InvalidApp(format!("info.xml has an invalid {}", field)));
    }
    Ok(value)
}
