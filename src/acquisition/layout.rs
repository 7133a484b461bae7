//! Where extracted packages land.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::identity::PackageIdentity;

/// Install path policy for extracted packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackageLayout {
    /// `<root>/<id>`
    IdOnly,
    /// `<root>/<id>/<version>`
    #[default]
    IdVersion,
}

impl PackageLayout {
    /// Directory a package is extracted into. The id is lower-cased.
    pub fn install_path(&self, root: &Path, identity: &PackageIdentity) -> PathBuf {
        let base = root.join(identity.id().to_lowercase());
        match self {
            Self::IdOnly => base,
            Self::IdVersion => base.join(identity.version_string().to_lowercase()),
        }
    }
}

impl FromStr for PackageLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "id" | "id-only" => Ok(Self::IdOnly),
            "id-version" => Ok(Self::IdVersion),
            _ => Err(format!("unknown layout '{}' (expected id or id-version)", s)),
        }
    }
}

impl fmt::Display for PackageLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdOnly => write!(f, "id"),
            Self::IdVersion => write!(f, "id-version"),
        }
    }
}
