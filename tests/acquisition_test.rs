//! Acquisition against a directory feed through the public API.

use std::fs;
use std::io::Write;
use std::path::Path;

use checkup::acquisition::{
    parse_version, Acquirer, PackageIdentity, PackageLayout, PackageSource, MARKER_FILE,
};
use checkup::cancel::CancelToken;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

fn publish(feed: &Path, id: &str, version: &str, deps: &[(&str, &str)]) {
    let deps: String = deps
        .iter()
        .map(|(d, v)| format!(r#"<dependency id="{}" version="{}" />"#, d, v))
        .collect();
    let nuspec = format!(
        r#"<?xml version="1.0"?>
<package xmlns="http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd">
  <metadata>
    <id>{}</id>
    <version>{}</version>
    <dependencies><group targetFramework="net6.0">{}</group></dependencies>
  </metadata>
</package>"#,
        id, version, deps
    );
    let file = fs::File::create(feed.join(format!("{}.{}.nupkg", id, version))).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    writer.start_file(format!("{}.nuspec", id), options).unwrap();
    writer.write_all(nuspec.as_bytes()).unwrap();
    writer.start_file("lib/net6.0/content.txt", options).unwrap();
    writer.write_all(format!("{} {}", id, version).as_bytes()).unwrap();
    writer.start_file("[Content_Types].xml", options).unwrap();
    writer.write_all(b"<Types/>").unwrap();
    writer.finish().unwrap();
}

struct Feeds {
    _temp: TempDir,
    first: std::path::PathBuf,
    second: std::path::PathBuf,
    dest: std::path::PathBuf,
}

fn feeds() -> Feeds {
    let temp = TempDir::new().unwrap();
    let first = temp.path().join("first");
    let second = temp.path().join("second");
    let dest = temp.path().join("packs");
    fs::create_dir_all(&first).unwrap();
    fs::create_dir_all(&second).unwrap();
    Feeds {
        first,
        second,
        dest,
        _temp: temp,
    }
}

fn acquirer(feeds: &Feeds) -> Acquirer {
    let source = PackageSource::new([
        feeds.first.display().to_string(),
        feeds.second.display().to_string(),
    ]);
    Acquirer::from_source(&source).unwrap()
}

#[test]
fn tree_spans_sources_and_ranges() {
    let feeds = feeds();
    publish(&feeds.first, "App", "1.0.0", &[("Lib", "[2.1.0, 3.0.0)")]);
    publish(&feeds.second, "Lib", "2.1.0", &[("Core", "1.0.0")]);
    publish(&feeds.second, "Core", "1.0.0", &[]);

    let report = acquirer(&feeds)
        .acquire_tree(
            &feeds.dest,
            "App",
            &parse_version("1.0.0").unwrap(),
            &CancelToken::new(),
        )
        .unwrap();

    assert!(report.success(), "{:?}", report.failed);
    assert_eq!(report.acquired.len(), 3);
    assert!(report.contains(&PackageIdentity::parse("lib", "2.1.0").unwrap()));

    let content = fs::read_to_string(feeds.dest.join("core/1.0.0/lib/net6.0/content.txt")).unwrap();
    assert_eq!(content, "Core 1.0.0");
    assert!(!feeds.dest.join("app/1.0.0/[Content_Types].xml").exists());
    assert!(feeds.dest.join("app/1.0.0").join(MARKER_FILE).is_file());
}

#[test]
fn second_run_reuses_everything() {
    let feeds = feeds();
    publish(&feeds.first, "App", "1.0.0", &[("Lib", "2.0.0")]);
    publish(&feeds.first, "Lib", "2.0.0", &[]);
    let acquirer = acquirer(&feeds);
    let version = parse_version("1.0.0").unwrap();

    let first = acquirer
        .acquire_tree(&feeds.dest, "App", &version, &CancelToken::new())
        .unwrap();
    assert_eq!(first.acquired.len(), 2);

    let second = acquirer
        .acquire_tree(&feeds.dest, "App", &version, &CancelToken::new())
        .unwrap();
    assert!(second.acquired.is_empty());
    assert_eq!(second.reused.len(), 2);
}

#[test]
fn id_only_layout_drops_version_directory() {
    let feeds = feeds();
    publish(&feeds.first, "Tool", "0.3.0", &[]);

    let ok = acquirer(&feeds)
        .with_layout(PackageLayout::IdOnly)
        .acquire(
            &feeds.dest,
            "Tool",
            &parse_version("0.3.0").unwrap(),
            &CancelToken::new(),
        )
        .unwrap();

    assert!(ok);
    assert!(feeds.dest.join("tool/lib/net6.0/content.txt").is_file());
}

#[test]
fn missing_dependency_is_partial_failure() {
    let feeds = feeds();
    publish(&feeds.first, "App", "1.0.0", &[("Gone", "1.0.0"), ("Here", "1.0.0")]);
    publish(&feeds.first, "Here", "1.0.0", &[]);

    let report = acquirer(&feeds)
        .acquire_tree(
            &feeds.dest,
            "App",
            &parse_version("1.0.0").unwrap(),
            &CancelToken::new(),
        )
        .unwrap();

    assert!(!report.success());
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].package.starts_with("Gone"));
    assert!(report.contains(&PackageIdentity::parse("Here", "1.0.0").unwrap()));
}

#[test]
fn cancelled_token_aborts() {
    let feeds = feeds();
    publish(&feeds.first, "App", "1.0.0", &[]);
    let cancel = CancelToken::new();
    cancel.cancel();

    let result = acquirer(&feeds).acquire_tree(
        &feeds.dest,
        "App",
        &parse_version("1.0.0").unwrap(),
        &cancel,
    );
    assert!(matches!(result, Err(checkup::CheckupError::Cancelled)));
}

#[test]
fn duplicate_sources_are_collapsed() {
    let source = PackageSource::new([
        "https://feed.example.com/v3/index.json",
        "HTTPS://FEED.EXAMPLE.COM/v3/index.json/",
        "/srv/feed",
    ]);
    assert_eq!(source.urls().len(), 2);
}
