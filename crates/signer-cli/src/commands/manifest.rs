//! `signer manifest` - Print the hash manifest of an app directory.

use anyhow::Context;
use signer_codesign::canonical::to_pretty_json;
use signer_codesign::compute_manifest;
use std::path::Path;

pub fn render(dir: &Path) -> anyhow::Result<String> {
    let manifest = compute_manifest(dir)
        .with_context(|| format!("Failed to hash {}", dir.display()))?;
    let json = to_pretty_json(&manifest)?;
    Ok(String::from_utf8(json)?)
}
