//! Recursive package acquisition.
//!
//! [`Acquirer`] walks sources in order for every identity, downloads the
//! first hit with a bounded retry, extracts it under the configured layout
//! and then recurses into the floor version of every declared dependency.
//! Siblings are fetched in parallel.

use rayon::prelude::*;
use semver::Version;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::NamedTempFile;
use zip::ZipArchive;

use crate::cancel::CancelToken;
use crate::error::{CheckupError, Result};

use super::descriptor::{read_descriptor, DescriptorParser, NuspecParser, PackageDescriptor};
use super::fault::{FaultKind, FetchError, RetryPolicy};
use super::identity::{parse_version, PackageIdentity, VersionRange};
use super::layout::PackageLayout;
use super::source::{Lookup, PackageRepository, PackageSource};

/// Written into an install directory once extraction has finished.
pub const MARKER_FILE: &str = ".checkup-package.json";

/// Archive entries that belong to the packaging format, not the payload.
fn is_packaging_metadata(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower == "[content_types].xml" || lower.starts_with("_rels/") || lower.starts_with("package/")
}

/// A node of the dependency tree that could not be acquired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcquisitionFailure {
    /// `Id version`, or `Id range` when no version could be chosen.
    pub package: String,
    pub reason: String,
}

/// Outcome of a tree acquisition.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AcquisitionReport {
    /// Downloaded and extracted during this call.
    pub acquired: Vec<PackageIdentity>,
    /// Already present with a valid completion marker.
    pub reused: Vec<PackageIdentity>,
    pub failed: Vec<AcquisitionFailure>,
}

impl AcquisitionReport {
    /// True when every node of the tree is present.
    pub fn success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Whether an identity is present after the call, acquired or reused.
    pub fn contains(&self, identity: &PackageIdentity) -> bool {
        let key = identity.key();
        self.acquired
            .iter()
            .chain(self.reused.iter())
            .any(|p| p.key() == key)
    }

    fn sort(&mut self) {
        self.acquired.sort_by_key(|p| p.key());
        self.reused.sort_by_key(|p| p.key());
        self.failed
            .sort_by(|a, b| a.package.to_lowercase().cmp(&b.package.to_lowercase()));
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CompletionMarker {
    id: String,
    version: String,
    sha256: String,
    descriptor: PackageDescriptor,
}

/// A downloaded artifact that opened as an archive and carried a descriptor.
struct Fetched {
    file: NamedTempFile,
    sha256: String,
    descriptor: PackageDescriptor,
}

enum Installed {
    Acquired(PackageDescriptor),
    Reused(PackageDescriptor),
    Failed(String),
}

/// State shared by every branch of one tree walk.
struct Walk<'a> {
    dest: &'a Path,
    cancel: &'a CancelToken,
    visited: Mutex<HashSet<String>>,
    report: Mutex<AcquisitionReport>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Downloads packages and their dependency closure from ordered sources.
pub struct Acquirer {
    repositories: Vec<Box<dyn PackageRepository>>,
    parser: Box<dyn DescriptorParser>,
    layout: PackageLayout,
    retry: RetryPolicy,
}

impl Acquirer {
    pub fn new(repositories: Vec<Box<dyn PackageRepository>>) -> Self {
        Self {
            repositories,
            parser: Box::new(NuspecParser),
            layout: PackageLayout::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Open every location of a source list.
    pub fn from_source(source: &PackageSource) -> Result<Self> {
        Ok(Self::new(source.open()?))
    }

    pub fn with_layout(mut self, layout: PackageLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_parser(mut self, parser: Box<dyn DescriptorParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn layout(&self) -> PackageLayout {
        self.layout
    }

    /// Acquire a package and every dependency it declares into `dest`.
    ///
    /// Per-node failures are collected in the report. Cancellation and fatal
    /// transfer faults abort the whole call.
    pub fn acquire_tree(
        &self,
        dest: &Path,
        id: &str,
        version: &Version,
        cancel: &CancelToken,
    ) -> Result<AcquisitionReport> {
        self.acquire_many(dest, &[PackageIdentity::new(id, version.clone())], cancel)
    }

    /// Acquire several roots and their dependencies in one walk.
    ///
    /// Roots are fetched in parallel. A dependency shared by several roots
    /// is installed once, so no two branches extract into the same directory.
    pub fn acquire_many(
        &self,
        dest: &Path,
        roots: &[PackageIdentity],
        cancel: &CancelToken,
    ) -> Result<AcquisitionReport> {
        let walk = Walk {
            dest,
            cancel,
            visited: Mutex::new(HashSet::new()),
            report: Mutex::new(AcquisitionReport::default()),
        };
        roots
            .par_iter()
            .try_for_each(|root| self.visit(&walk, root.clone()))?;

        let mut report = walk.report.into_inner().unwrap_or_else(|e| e.into_inner());
        report.sort();
        let names: Vec<String> = roots.iter().map(ToString::to_string).collect();
        tracing::debug!(
            "Acquired {}: {} downloaded, {} reused, {} failed",
            names.join(", "),
            report.acquired.len(),
            report.reused.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// [`acquire_tree`](Self::acquire_tree), reduced to a verdict.
    pub fn acquire(
        &self,
        dest: &Path,
        id: &str,
        version: &Version,
        cancel: &CancelToken,
    ) -> Result<bool> {
        Ok(self.acquire_tree(dest, id, version, cancel)?.success())
    }

    /// Save the raw artifact as `<dest_dir>/<id>.<version>.nupkg`.
    ///
    /// No extraction and no dependency walk. Returns false when no source
    /// could supply the package.
    pub fn acquire_file(
        &self,
        dest_dir: &Path,
        id: &str,
        version: &Version,
        cancel: &CancelToken,
    ) -> Result<bool> {
        let identity = PackageIdentity::new(id, version.clone());
        let Some(fetched) = self.fetch(&identity, cancel)? else {
            return Ok(false);
        };
        fs::create_dir_all(dest_dir)?;
        let path = dest_dir.join(identity.file_name());
        fs::copy(fetched.file.path(), &path)?;
        tracing::info!("Saved {} to {}", identity, path.display());
        Ok(true)
    }

    /// Bytes of the first archive entry whose name ends with `entry_suffix`
    /// (case-insensitive). `None` when the package or the entry is missing.
    pub fn find_descriptor(
        &self,
        id: &str,
        version: &Version,
        entry_suffix: &str,
        cancel: &CancelToken,
    ) -> Result<Option<Vec<u8>>> {
        let identity = PackageIdentity::new(id, version.clone());
        let Some(fetched) = self.fetch(&identity, cancel)? else {
            return Ok(None);
        };
        read_entry(&fetched, entry_suffix).map_err(|e| CheckupError::Acquisition {
            package: identity.to_string(),
            message: e.to_string(),
        })
    }

    /// Write the entry found by [`find_descriptor`](Self::find_descriptor)
    /// to `dest_file`, creating parent directories.
    pub fn extract_descriptor(
        &self,
        dest_file: &Path,
        id: &str,
        version: &Version,
        entry_suffix: &str,
        cancel: &CancelToken,
    ) -> Result<bool> {
        let Some(bytes) = self.find_descriptor(id, version, entry_suffix, cancel)? else {
            return Ok(false);
        };
        if let Some(parent) = dest_file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest_file, bytes)?;
        tracing::info!("Wrote {} from {} {}", dest_file.display(), id, version);
        Ok(true)
    }

    fn visit(&self, walk: &Walk<'_>, identity: PackageIdentity) -> Result<()> {
        walk.cancel.check()?;
        if !lock(&walk.visited).insert(identity.key()) {
            return Ok(());
        }

        let descriptor = match self.install(walk.dest, &identity, walk.cancel)? {
            Installed::Acquired(descriptor) => {
                lock(&walk.report).acquired.push(identity.clone());
                descriptor
            }
            Installed::Reused(descriptor) => {
                lock(&walk.report).reused.push(identity.clone());
                descriptor
            }
            Installed::Failed(reason) => {
                tracing::warn!("Could not acquire {}: {}", identity, reason);
                lock(&walk.report).failed.push(AcquisitionFailure {
                    package: identity.to_string(),
                    reason,
                });
                return Ok(());
            }
        };

        let mut children = Vec::new();
        for dependency in &descriptor.dependencies {
            let floor = VersionRange::parse(&dependency.range)
                .map_err(|e| e.to_string())
                .and_then(|range| {
                    range
                        .min_version()
                        .cloned()
                        .ok_or_else(|| format!("range {} has no lower bound", range))
                });
            match floor {
                Ok(version) => children.push(PackageIdentity::new(&dependency.id, version)),
                Err(reason) => lock(&walk.report).failed.push(AcquisitionFailure {
                    package: format!("{} {}", dependency.id, dependency.range),
                    reason,
                }),
            }
        }

        children
            .into_par_iter()
            .try_for_each(|child| self.visit(walk, child))
    }

    fn install(
        &self,
        dest: &Path,
        identity: &PackageIdentity,
        cancel: &CancelToken,
    ) -> Result<Installed> {
        let target = self.layout.install_path(dest, identity);
        if let Some(marker) = read_marker(&target, identity) {
            tracing::debug!("{} already present at {}", identity, target.display());
            return Ok(Installed::Reused(marker.descriptor));
        }

        let Some(fetched) = self.fetch(identity, cancel)? else {
            return Ok(Installed::Failed(format!(
                "not available from any of {} source(s)",
                self.repositories.len()
            )));
        };

        match extract(&fetched, identity, &target) {
            Ok(()) => {
                tracing::info!("Acquired {} into {}", identity, target.display());
                Ok(Installed::Acquired(fetched.descriptor))
            }
            Err(e) => {
                let _ = fs::remove_dir_all(&target);
                Ok(Installed::Failed(format!("extraction failed: {}", e)))
            }
        }
    }

    /// First successful transfer across the sources, in order.
    fn fetch(&self, identity: &PackageIdentity, cancel: &CancelToken) -> Result<Option<Fetched>> {
        for repo in &self.repositories {
            cancel.check()?;
            match repo.lookup(identity, cancel) {
                Lookup::Found => {}
                Lookup::NotFound => {
                    tracing::debug!("{} not in {}", identity, repo.name());
                    continue;
                }
                Lookup::TransientError(message) => {
                    tracing::warn!("Skipping {} for {}: {}", repo.name(), identity, message);
                    continue;
                }
            }

            let label = format!("Download of {} from {}", identity, repo.name());
            match self
                .retry
                .run(cancel, &label, |_| self.transfer(repo.as_ref(), identity, cancel))
            {
                Ok(fetched) => return Ok(Some(fetched)),
                Err(_) if cancel.is_cancelled() => return Err(CheckupError::Cancelled),
                Err(e) if e.kind == FaultKind::Fatal => {
                    return Err(CheckupError::Acquisition {
                        package: identity.to_string(),
                        message: format!("{} ({})", e, repo.name()),
                    });
                }
                Err(e) => {
                    tracing::warn!("{} gave up: {}", label, e);
                }
            }
        }
        Ok(None)
    }

    fn transfer(
        &self,
        repo: &dyn PackageRepository,
        identity: &PackageIdentity,
        cancel: &CancelToken,
    ) -> std::result::Result<Fetched, FetchError> {
        let mut file = NamedTempFile::new()?;
        repo.download(identity, file.as_file_mut(), cancel)?;
        file.as_file_mut().flush()?;
        let sha256 = sha256_file(file.as_file_mut())?;

        let mut archive = ZipArchive::new(file.reopen()?)?;
        let descriptor = read_descriptor(&mut archive, self.parser.as_ref())?;
        if !descriptor.id.eq_ignore_ascii_case(identity.id()) {
            return Err(FetchError::corrupt(format!(
                "expected {} but the archive describes {}",
                identity.id(),
                descriptor.id
            )));
        }

        Ok(Fetched {
            file,
            sha256,
            descriptor,
        })
    }
}

fn sha256_file(file: &mut File) -> std::io::Result<String> {
    file.seek(SeekFrom::Start(0))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn read_entry(
    fetched: &Fetched,
    entry_suffix: &str,
) -> std::result::Result<Option<Vec<u8>>, FetchError> {
    let suffix = entry_suffix.to_lowercase();
    let mut archive = ZipArchive::new(fetched.file.reopen()?)?;
    let index = (0..archive.len()).find(|&i| {
        archive
            .name_for_index(i)
            .is_some_and(|name| name.to_lowercase().ends_with(&suffix))
    });
    let Some(index) = index else {
        return Ok(None);
    };
    let mut entry = archive.by_index(index)?;
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes)?;
    Ok(Some(bytes))
}

/// Clobber `target` and unpack the payload, writing the marker last.
fn extract(
    fetched: &Fetched,
    identity: &PackageIdentity,
    target: &Path,
) -> std::result::Result<(), FetchError> {
    if target.exists() {
        fs::remove_dir_all(target)?;
    }
    fs::create_dir_all(target)?;

    let mut archive = ZipArchive::new(fetched.file.reopen()?)?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();
        if is_packaging_metadata(&name) {
            continue;
        }
        let relative: PathBuf = entry.enclosed_name().ok_or_else(|| {
            FetchError::corrupt(format!("entry '{}' escapes the install directory", name))
        })?;
        let out = target.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&out)?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&out)?;
        std::io::copy(&mut entry, &mut file)?;
    }

    let marker = CompletionMarker {
        id: identity.id().to_string(),
        version: identity.version_string(),
        sha256: fetched.sha256.clone(),
        descriptor: fetched.descriptor.clone(),
    };
    let json = serde_json::to_vec_pretty(&marker)
        .map_err(|e| FetchError::io(format!("writing marker: {}", e)))?;
    fs::write(target.join(MARKER_FILE), json)?;
    Ok(())
}

/// A marker that parses and names this identity.
fn read_marker(target: &Path, identity: &PackageIdentity) -> Option<CompletionMarker> {
    let bytes = fs::read(target.join(MARKER_FILE)).ok()?;
    let marker: CompletionMarker = serde_json::from_slice(&bytes).ok()?;
    let same_version = parse_version(&marker.version).ok()? == *identity.version();
    (marker.id.eq_ignore_ascii_case(identity.id()) && same_version).then_some(marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn nupkg(id: &str, version: &str, deps: &[(&str, &str)]) -> Vec<u8> {
        let deps: String = deps
            .iter()
            .map(|(d, v)| format!(r#"<dependency id="{}" version="{}" />"#, d, v))
            .collect();
        let nuspec = format!(
            "<package><metadata><id>{}</id><version>{}</version>\
             <dependencies>{}</dependencies></metadata></package>",
            id, version, deps
        );
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer
            .start_file(format!("{}.nuspec", id), options)
            .unwrap();
        writer.write_all(nuspec.as_bytes()).unwrap();
        writer.start_file("lib/payload.txt", options).unwrap();
        writer.write_all(id.as_bytes()).unwrap();
        writer.start_file("[Content_Types].xml", options).unwrap();
        writer.write_all(b"<Types/>").unwrap();
        writer.start_file("_rels/.rels", options).unwrap();
        writer.write_all(b"<Relationships/>").unwrap();
        writer.finish().unwrap().into_inner()
    }

    /// In-memory repository with call counters and scripted faults.
    #[derive(Default)]
    struct FakeRepo {
        name: String,
        packages: Vec<(String, Vec<u8>)>,
        faults: Mutex<Vec<FaultKind>>,
        lookups: Arc<AtomicUsize>,
        downloads: Arc<AtomicUsize>,
    }

    impl FakeRepo {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                ..Default::default()
            }
        }

        fn with(mut self, id: &str, version: &str, deps: &[(&str, &str)]) -> Self {
            let identity = PackageIdentity::parse(id, version).unwrap();
            self.packages.push((identity.key(), nupkg(id, version, deps)));
            self
        }

        fn failing(self, faults: &[FaultKind]) -> Self {
            *self.faults.lock().unwrap() = faults.to_vec();
            self
        }
    }

    impl PackageRepository for FakeRepo {
        fn name(&self) -> &str {
            &self.name
        }

        fn lookup(&self, identity: &PackageIdentity, _cancel: &CancelToken) -> Lookup {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.packages.iter().any(|(k, _)| *k == identity.key()) {
                Lookup::Found
            } else {
                Lookup::NotFound
            }
        }

        fn download(
            &self,
            identity: &PackageIdentity,
            sink: &mut dyn Write,
            _cancel: &CancelToken,
        ) -> std::result::Result<(), FetchError> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            let mut faults = self.faults.lock().unwrap();
            if !faults.is_empty() {
                let kind = faults.remove(0);
                return Err(FetchError::new(kind, "scripted"));
            }
            let (_, bytes) = self
                .packages
                .iter()
                .find(|(k, _)| *k == identity.key())
                .ok_or_else(|| FetchError::fatal("missing"))?;
            sink.write_all(bytes)?;
            Ok(())
        }
    }

    fn v(s: &str) -> Version {
        parse_version(s).unwrap()
    }

    #[test]
    fn first_success_short_circuits() {
        let s1 = FakeRepo::new("s1");
        let s2 = FakeRepo::new("s2").with("P", "1.0", &[]);
        let s3 = FakeRepo::new("s3").with("P", "1.0", &[]);
        let (s2_downloads, s3_lookups) = (s2.downloads.clone(), s3.lookups.clone());
        let s1_lookups = s1.lookups.clone();

        let temp = TempDir::new().unwrap();
        let acquirer = Acquirer::new(vec![Box::new(s1), Box::new(s2), Box::new(s3)]);
        let ok = acquirer
            .acquire(temp.path(), "P", &v("1.0"), &CancelToken::new())
            .unwrap();

        assert!(ok);
        assert_eq!(s1_lookups.load(Ordering::SeqCst), 1);
        assert_eq!(s2_downloads.load(Ordering::SeqCst), 1);
        assert_eq!(s3_lookups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn extracts_payload_without_packaging_metadata() {
        let repo = FakeRepo::new("feed").with("Contoso.Core", "1.2.0", &[]);
        let temp = TempDir::new().unwrap();
        Acquirer::new(vec![Box::new(repo)])
            .acquire(temp.path(), "Contoso.Core", &v("1.2.0"), &CancelToken::new())
            .unwrap();

        let dir = temp.path().join("contoso.core").join("1.2.0");
        assert_eq!(
            fs::read_to_string(dir.join("lib/payload.txt")).unwrap(),
            "Contoso.Core"
        );
        assert!(dir.join("Contoso.Core.nuspec").exists());
        assert!(dir.join(MARKER_FILE).exists());
        assert!(!dir.join("[Content_Types].xml").exists());
        assert!(!dir.join("_rels").exists());
    }

    #[test]
    fn walks_dependency_floors() {
        let repo = FakeRepo::new("feed")
            .with("P", "1.0", &[("Q", "[1.0,2.0)"), ("R", "2.0")])
            .with("Q", "1.0", &[("R", "2.0")])
            .with("R", "2.0", &[]);
        let downloads = repo.downloads.clone();
        let temp = TempDir::new().unwrap();

        let report = Acquirer::new(vec![Box::new(repo)])
            .with_layout(PackageLayout::IdOnly)
            .acquire_tree(temp.path(), "P", &v("1.0"), &CancelToken::new())
            .unwrap();

        assert!(report.success());
        let names: Vec<String> = report.acquired.iter().map(|p| p.to_string()).collect();
        assert_eq!(names, vec!["P 1.0.0", "Q 1.0.0", "R 2.0.0"]);
        assert_eq!(downloads.load(Ordering::SeqCst), 3);
        assert!(temp.path().join("r").join(MARKER_FILE).exists());
    }

    #[test]
    fn shared_dependency_is_installed_once_across_roots() {
        let mut repo = FakeRepo::new("feed").with("Shared", "1.0", &[]);
        let roots: Vec<PackageIdentity> = (0..8)
            .map(|i| PackageIdentity::parse(&format!("Root{}", i), "1.0").unwrap())
            .collect();
        for root in &roots {
            repo = repo.with(root.id(), "1.0", &[("Shared", "1.0")]);
        }
        let downloads = repo.downloads.clone();
        let temp = TempDir::new().unwrap();

        let report = Acquirer::new(vec![Box::new(repo)])
            .acquire_many(temp.path(), &roots, &CancelToken::new())
            .unwrap();

        assert!(report.success());
        assert_eq!(report.acquired.len(), 9);
        assert_eq!(downloads.load(Ordering::SeqCst), 9);
        assert!(temp.path().join("shared/1.0.0").join(MARKER_FILE).exists());
    }

    #[test]
    fn dependency_cycles_terminate() {
        let repo = FakeRepo::new("feed")
            .with("A", "1.0", &[("B", "1.0")])
            .with("B", "1.0", &[("A", "1.0")]);
        let temp = TempDir::new().unwrap();
        let report = Acquirer::new(vec![Box::new(repo)])
            .acquire_tree(temp.path(), "A", &v("1.0"), &CancelToken::new())
            .unwrap();
        assert_eq!(report.acquired.len(), 2);
    }

    #[test]
    fn partial_failure_keeps_siblings() {
        let repo = FakeRepo::new("feed")
            .with("P", "1.0", &[("Q", "1.0"), ("R", "2.0"), ("S", "(,3.0]")])
            .with("Q", "1.0", &[]);
        let temp = TempDir::new().unwrap();

        let report = Acquirer::new(vec![Box::new(repo)])
            .acquire_tree(temp.path(), "P", &v("1.0"), &CancelToken::new())
            .unwrap();

        assert!(!report.success());
        assert!(report.contains(&PackageIdentity::parse("P", "1.0").unwrap()));
        assert!(report.contains(&PackageIdentity::parse("Q", "1.0").unwrap()));
        let failed: Vec<&str> = report.failed.iter().map(|f| f.package.as_str()).collect();
        assert_eq!(failed, vec!["R 2.0.0", "S (,3.0]"]);
    }

    #[test]
    fn transient_faults_are_retried() {
        let repo = FakeRepo::new("feed")
            .with("P", "1.0", &[])
            .failing(&[FaultKind::Io, FaultKind::CorruptData, FaultKind::ResourceDisposed]);
        let downloads = repo.downloads.clone();
        let temp = TempDir::new().unwrap();

        let ok = Acquirer::new(vec![Box::new(repo)])
            .acquire(temp.path(), "P", &v("1.0"), &CancelToken::new())
            .unwrap();
        assert!(ok);
        assert_eq!(downloads.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn exhausted_retries_move_to_next_source() {
        let flaky = FakeRepo::new("flaky")
            .with("P", "1.0", &[])
            .failing(&[FaultKind::Io; 4]);
        let backup = FakeRepo::new("backup").with("P", "1.0", &[]);
        let (flaky_downloads, backup_downloads) =
            (flaky.downloads.clone(), backup.downloads.clone());
        let temp = TempDir::new().unwrap();

        let ok = Acquirer::new(vec![Box::new(flaky), Box::new(backup)])
            .acquire(temp.path(), "P", &v("1.0"), &CancelToken::new())
            .unwrap();
        assert!(ok);
        assert_eq!(flaky_downloads.load(Ordering::SeqCst), 4);
        assert_eq!(backup_downloads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fatal_fault_aborts_acquisition() {
        let broken = FakeRepo::new("broken")
            .with("P", "1.0", &[])
            .failing(&[FaultKind::Fatal]);
        let backup = FakeRepo::new("backup").with("P", "1.0", &[]);
        let backup_lookups = backup.lookups.clone();
        let temp = TempDir::new().unwrap();

        let err = Acquirer::new(vec![Box::new(broken), Box::new(backup)])
            .acquire(temp.path(), "P", &v("1.0"), &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, CheckupError::Acquisition { .. }));
        assert_eq!(backup_lookups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn second_call_reuses_marker() {
        let repo = FakeRepo::new("feed")
            .with("P", "1.0", &[("Q", "1.0")])
            .with("Q", "1.0", &[]);
        let downloads = repo.downloads.clone();
        let temp = TempDir::new().unwrap();
        let acquirer = Acquirer::new(vec![Box::new(repo)]);

        assert!(acquirer
            .acquire(temp.path(), "P", &v("1.0"), &CancelToken::new())
            .unwrap());
        let again = acquirer
            .acquire_tree(temp.path(), "P", &v("1.0"), &CancelToken::new())
            .unwrap();

        assert!(again.success());
        assert_eq!(again.reused.len(), 2);
        assert!(again.acquired.is_empty());
        assert_eq!(downloads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn stale_content_is_clobbered() {
        let repo = FakeRepo::new("feed").with("P", "1.0", &[]);
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("p").join("1.0.0");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("leftover.txt"), "old").unwrap();

        Acquirer::new(vec![Box::new(repo)])
            .acquire(temp.path(), "P", &v("1.0"), &CancelToken::new())
            .unwrap();
        assert!(!dir.join("leftover.txt").exists());
        assert!(dir.join("lib/payload.txt").exists());
    }

    #[test]
    fn cancelled_before_start() {
        let repo = FakeRepo::new("feed").with("P", "1.0", &[]);
        let cancel = CancelToken::new();
        cancel.cancel();
        let temp = TempDir::new().unwrap();
        let err = Acquirer::new(vec![Box::new(repo)])
            .acquire(temp.path(), "P", &v("1.0"), &cancel)
            .unwrap_err();
        assert!(matches!(err, CheckupError::Cancelled));
    }

    #[test]
    fn raw_file_and_descriptor_forms() {
        let repo = FakeRepo::new("feed").with("Contoso.Manifest", "6.0.100", &[]);
        let temp = TempDir::new().unwrap();
        let acquirer = Acquirer::new(vec![Box::new(repo)]);
        let cancel = CancelToken::new();

        assert!(acquirer
            .acquire_file(temp.path(), "Contoso.Manifest", &v("6.0.100"), &cancel)
            .unwrap());
        assert!(temp.path().join("contoso.manifest.6.0.100.nupkg").exists());

        let bytes = acquirer
            .find_descriptor("Contoso.Manifest", &v("6.0.100"), "PAYLOAD.TXT", &cancel)
            .unwrap()
            .unwrap();
        assert_eq!(bytes, b"Contoso.Manifest");

        assert!(acquirer
            .find_descriptor("Contoso.Manifest", &v("6.0.100"), "missing.json", &cancel)
            .unwrap()
            .is_none());

        let out = temp.path().join("manifests/contoso/payload.txt");
        assert!(acquirer
            .extract_descriptor(&out, "Contoso.Manifest", &v("6.0.100"), "payload.txt", &cancel)
            .unwrap());
        assert_eq!(fs::read(out).unwrap(), b"Contoso.Manifest");

        assert!(!acquirer
            .acquire_file(temp.path(), "Absent", &v("1.0"), &cancel)
            .unwrap());
    }
}
