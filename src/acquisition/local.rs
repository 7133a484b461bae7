//! Directory-backed package repository.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cancel::CancelToken;

use super::fault::FetchError;
use super::identity::PackageIdentity;
use super::source::{Lookup, PackageRepository};

/// Serves `<id>.<version>.nupkg` files from a directory.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
    name: String,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root.display().to_string();
        Self { root, name }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Archive path for an identity, matching the file name case-insensitively.
    fn locate(&self, identity: &PackageIdentity) -> std::io::Result<Option<PathBuf>> {
        let wanted = identity.file_name();
        let exact = self.root.join(&wanted);
        if exact.is_file() {
            return Ok(Some(exact));
        }
        if !self.root.is_dir() {
            return Ok(None);
        }
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().to_lowercase() == wanted {
                return Ok(Some(entry.path()));
            }
        }
        Ok(None)
    }
}

impl PackageRepository for LocalRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&self, identity: &PackageIdentity, _cancel: &CancelToken) -> Lookup {
        match self.locate(identity) {
            Ok(Some(_)) => Lookup::Found,
            Ok(None) => Lookup::NotFound,
            Err(e) => Lookup::TransientError(e.to_string()),
        }
    }

    fn download(
        &self,
        identity: &PackageIdentity,
        sink: &mut dyn Write,
        cancel: &CancelToken,
    ) -> Result<(), FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::cancelled());
        }
        let path = self
            .locate(identity)?
            .ok_or_else(|| FetchError::fatal(format!("{} vanished from {}", identity, self.name)))?;
        let mut file = File::open(&path)?;
        std::io::copy(&mut file, sink)?;
        Ok(())
    }
}
