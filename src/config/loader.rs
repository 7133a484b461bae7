//! Manifest discovery and loading.
//!
//! A manifest location is either a path or an `http(s)` URL. Without one,
//! `checkup.yml` in the working directory is used.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::schema::Manifest;
use crate::config::validator::validate;
use crate::error::{CheckupError, Result};

/// Manifest file looked up when no location is given.
pub const DEFAULT_MANIFEST: &str = "checkup.yml";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

fn is_url(location: &str) -> bool {
    let lower = location.to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Load, parse and validate a manifest.
///
/// Relative paths resolve against `cwd`.
pub fn load_manifest(location: Option<&str>, cwd: &Path) -> Result<Manifest> {
    match location {
        Some(url) if is_url(url) => fetch_manifest(url),
        Some(path) => load_manifest_file(&cwd.join(path)),
        None => load_manifest_file(&cwd.join(DEFAULT_MANIFEST)),
    }
}

/// Load a manifest from disk.
pub fn load_manifest_file(path: &Path) -> Result<Manifest> {
    if !path.is_file() {
        return Err(CheckupError::ManifestNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)?;
    parse_manifest(&path.display().to_string(), &content)
}

/// Download a manifest over HTTP.
pub fn fetch_manifest(url: &str) -> Result<Manifest> {
    let parse_error = |message: String| CheckupError::ManifestParse {
        source_name: url.to_string(),
        message,
    };

    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("checkup/", env!("CARGO_PKG_VERSION")))
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| parse_error(e.to_string()))?;

    tracing::debug!("Fetching manifest from {}", url);
    let response = client
        .get(url)
        .send()
        .map_err(|e| parse_error(e.to_string()))?;
    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(CheckupError::ManifestNotFound {
            path: PathBuf::from(url),
        });
    }
    if !status.is_success() {
        return Err(parse_error(format!("HTTP {}", status)));
    }
    let content = response.text().map_err(|e| parse_error(e.to_string()))?;
    parse_manifest(url, &content)
}

/// Parse manifest text and validate it.
pub fn parse_manifest(source_name: &str, content: &str) -> Result<Manifest> {
    // An empty document is an empty manifest.
    let manifest: Manifest = if content.trim().is_empty() {
        Manifest::default()
    } else {
        serde_yaml::from_str(content).map_err(|e| CheckupError::ManifestParse {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?
    };
    validate(&manifest)?;
    Ok(manifest)
}
