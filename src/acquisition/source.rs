//! Package sources and the repository abstraction.

use std::io::Write;
use std::path::PathBuf;

use crate::cancel::CancelToken;
use crate::error::Result;

use super::fault::FetchError;
use super::http::HttpRepository;
use super::identity::PackageIdentity;
use super::local::LocalRepository;

/// Ordered list of repository locations consulted for packages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSource {
    urls: Vec<String>,
}

impl PackageSource {
    /// Build a source list. Duplicates (case-insensitive, ignoring a trailing
    /// `/`) are dropped; the first occurrence keeps its position.
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut kept: Vec<String> = Vec::new();
        for url in urls {
            let url = url.into().trim().to_string();
            if url.is_empty() {
                continue;
            }
            let key = normalize(&url);
            if !kept.iter().any(|u| normalize(u) == key) {
                kept.push(url);
            }
        }
        Self { urls: kept }
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Open a repository for every location, in order.
    ///
    /// `http(s)://` locations speak the feed protocol; anything else is a
    /// local directory (`file://` prefix optional).
    pub fn open(&self) -> Result<Vec<Box<dyn PackageRepository>>> {
        self.urls
            .iter()
            .map(|url| -> Result<Box<dyn PackageRepository>> {
                let lower = url.to_lowercase();
                if lower.starts_with("http://") || lower.starts_with("https://") {
                    Ok(Box::new(HttpRepository::new(url)?))
                } else {
                    let path = url.strip_prefix("file://").unwrap_or(url);
                    Ok(Box::new(LocalRepository::new(PathBuf::from(path))))
                }
            })
            .collect()
    }
}

fn normalize(url: &str) -> String {
    url.trim_end_matches('/').to_lowercase()
}

/// Answer to an exact-version existence query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found,
    NotFound,
    /// The repository could not answer; the next source is tried.
    TransientError(String),
}

/// A place packages can be downloaded from.
pub trait PackageRepository: Send + Sync {
    /// Display name, usually the source location.
    fn name(&self) -> &str;

    /// Does this exact version exist here?
    fn lookup(&self, identity: &PackageIdentity, cancel: &CancelToken) -> Lookup;

    /// Stream the package archive into `sink`.
    fn download(
        &self,
        identity: &PackageIdentity,
        sink: &mut dyn Write,
        cancel: &CancelToken,
    ) -> std::result::Result<(), FetchError>;
}
