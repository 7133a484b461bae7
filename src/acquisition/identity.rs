//! Package identities, versions and version ranges.

use anyhow::{anyhow, bail, Context, Result};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parse a package version leniently.
///
/// Missing minor/patch components are filled with zero (`6.0` is `6.0.0`).
/// A fourth numeric component is kept as build metadata when non-zero and
/// dropped otherwise, so `1.0.0.0` equals `1.0.0`.
pub fn parse_version(input: &str) -> Result<Version> {
    let input = input.trim();
    if input.is_empty() {
        bail!("empty version");
    }

    let split_at = input.find(['-', '+']).unwrap_or(input.len());
    let (core, suffix) = input.split_at(split_at);
    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 4 || parts.iter().any(|p| p.is_empty()) {
        bail!("invalid version '{}'", input);
    }

    let mut numbers = [0u64; 4];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .with_context(|| format!("invalid version '{}'", input))?;
    }

    // Build metadata never takes part in package identity.
    let prerelease = suffix
        .strip_prefix('-')
        .map(|rest| rest.split('+').next().unwrap_or(rest));
    let mut text = format!("{}.{}.{}", numbers[0], numbers[1], numbers[2]);
    if let Some(pre) = prerelease {
        text.push('-');
        text.push_str(pre);
    }
    if numbers[3] != 0 {
        text.push('+');
        text.push_str(&numbers[3].to_string());
    }

    Version::parse(&text).map_err(|e| anyhow!("invalid version '{}': {}", input, e))
}

/// Render a version the way package feeds spell it.
pub fn format_version(version: &Version) -> String {
    let mut text = format!("{}.{}.{}", version.major, version.minor, version.patch);
    if !version.build.is_empty() {
        text.push('.');
        text.push_str(version.build.as_str());
    }
    if !version.pre.is_empty() {
        text.push('-');
        text.push_str(version.pre.as_str());
    }
    text
}

/// An exact package id and version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageIdentity {
    id: String,
    version: Version,
}

impl PackageIdentity {
    pub fn new(id: impl Into<String>, version: Version) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }

    /// Build an identity from a textual version.
    pub fn parse(id: &str, version: &str) -> Result<Self> {
        if id.trim().is_empty() {
            bail!("empty package id");
        }
        Ok(Self::new(id.trim(), parse_version(version)?))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Feed spelling of the version.
    pub fn version_string(&self) -> String {
        format_version(&self.version)
    }

    /// Case-insensitive key used to de-duplicate work.
    pub fn key(&self) -> String {
        format!("{}@{}", self.id.to_lowercase(), self.version_string())
    }

    /// Conventional archive file name, `<id>.<version>.nupkg` in lower case.
    pub fn file_name(&self) -> String {
        format!(
            "{}.{}.nupkg",
            self.id.to_lowercase(),
            self.version_string().to_lowercase()
        )
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version_string())
    }
}

/// A version interval in package-feed notation.
///
/// Accepted forms: `1.0` (at least 1.0), `[1.0]` (exactly 1.0),
/// `[1.0,2.0)`, `(1.0,)` and `(,2.0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    min: Option<Version>,
    min_inclusive: bool,
    max: Option<Version>,
    max_inclusive: bool,
}

impl VersionRange {
    pub fn parse(input: &str) -> Result<Self> {
        let text = input.trim();
        if text.is_empty() {
            bail!("empty version range");
        }

        let first = text.chars().next().unwrap_or(' ');
        if first != '[' && first != '(' {
            return Ok(Self {
                min: Some(parse_version(text)?),
                min_inclusive: true,
                max: None,
                max_inclusive: false,
            });
        }

        let last = text.chars().last().unwrap_or(' ');
        if text.len() < 2 || (last != ']' && last != ')') {
            bail!("unterminated version range '{}'", text);
        }
        let min_inclusive = first == '[';
        let max_inclusive = last == ']';
        let inner = &text[1..text.len() - 1];

        match inner.split_once(',') {
            None => {
                if !(min_inclusive && max_inclusive) {
                    bail!("exact version range '{}' must use brackets", text);
                }
                let exact = parse_version(inner)?;
                Ok(Self {
                    min: Some(exact.clone()),
                    min_inclusive: true,
                    max: Some(exact),
                    max_inclusive: true,
                })
            }
            Some((low, high)) => {
                let min = optional_version(low)?;
                let max = optional_version(high)?;
                if min.is_none() && max.is_none() {
                    bail!("version range '{}' has no bounds", text);
                }
                if let (Some(min), Some(max)) = (&min, &max) {
                    if min > max {
                        bail!("version range '{}' is empty", text);
                    }
                }
                Ok(Self {
                    min,
                    min_inclusive,
                    max,
                    max_inclusive,
                })
            }
        }
    }

    /// Lowest version named by the range, regardless of inclusivity.
    pub fn min_version(&self) -> Option<&Version> {
        self.min.as_ref()
    }

    pub fn contains(&self, version: &Version) -> bool {
        let above = match &self.min {
            Some(min) if self.min_inclusive => version >= min,
            Some(min) => version > min,
            None => true,
        };
        let below = match &self.max {
            Some(max) if self.max_inclusive => version <= max,
            Some(max) => version < max,
            None => true,
        };
        above && below
    }
}

fn optional_version(text: &str) -> Result<Option<Version>> {
    let text = text.trim();
    if text.is_empty() {
        Ok(None)
    } else {
        parse_version(text).map(Some)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.min, &self.max) {
            (Some(min), None) if self.min_inclusive => write!(f, "{}", format_version(min)),
            (Some(min), Some(max)) if min == max => write!(f, "[{}]", format_version(min)),
            _ => write!(
                f,
                "{}{},{}{}",
                if self.min_inclusive { '[' } else { '(' },
                self.min.as_ref().map(format_version).unwrap_or_default(),
                self.max.as_ref().map(format_version).unwrap_or_default(),
                if self.max_inclusive { ']' } else { ')' },
            ),
        }
    }
}
