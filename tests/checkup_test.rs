//! End-to-end runs of manifest-driven checks through the runner.
#![cfg(unix)]

use std::fs;
use std::io::Write;
use std::path::Path;

use checkup::checks::build_registry;
use checkup::checkup::Platform;
use checkup::config::parse_manifest;
use checkup::runner::{CheckupGraph, CheckupRunner, FixMode, OutcomeStatus, RemediationOutcome, RunOptions, RunReport};
use checkup::state::SharedState;
use checkup::ui::MockUI;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

fn run(manifest: &str, options: RunOptions) -> (RunReport, MockUI) {
    let manifest = parse_manifest("inline", manifest).unwrap();
    let registry = build_registry(&manifest).unwrap();
    let graph = CheckupGraph::build(&registry, Platform::Linux).unwrap();
    let mut ui = MockUI::new();
    let mut state = SharedState::new();
    let report = CheckupRunner::new(&graph, options)
        .with_platform(Platform::Linux)
        .with_elevated(false)
        .run(&mut state, &mut ui)
        .unwrap();
    (report, ui)
}

fn feed_package(feed: &Path, id: &str, version: &str, entries: &[(&str, &str)]) {
    let nuspec = format!(
        "<package><metadata><id>{}</id><version>{}</version></metadata></package>",
        id, version
    );
    let file = fs::File::create(feed.join(format!("{}.{}.nupkg", id, version))).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    writer.start_file(format!("{}.nuspec", id), options).unwrap();
    writer.write_all(nuspec.as_bytes()).unwrap();
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

fn sdk_manifest(temp: &Path, listing: &Path, feed: &Path) -> String {
    format!(
        r#"
sources:
  - {feed}
sdks:
  - id: dotnet
    title: .NET SDK
    list_command: cat {listing}
    install: "echo '{{version}} [{root}/sdk]' >> {listing}"
    versions:
      - version: 6.0.100
        packages:
          - id: Contoso.Pack
            version: 1.0.0
        descriptors:
          - id: Contoso.Manifest-6.0.100
            version: 6.0.0
env:
  - id: sdk-root
    name: CHECKUP_TEST_UNSET_VARIABLE
    depends_on: [packages-dotnet]
"#,
        feed = feed.display(),
        listing = listing.display(),
        root = temp.join("dotnet").display(),
    )
}

#[test]
fn missing_sdk_without_fix_fails() {
    let temp = TempDir::new().unwrap();
    let listing = temp.path().join("sdks.txt");
    fs::write(&listing, "5.0.100 [/usr/share/dotnet/sdk]\n").unwrap();
    let feed = temp.path().join("feed");
    fs::create_dir_all(&feed).unwrap();

    let options = RunOptions {
        fix: FixMode::from_flags(false, false),
        ..Default::default()
    };
    let (report, ui) = run(&sdk_manifest(temp.path(), &listing, &feed), options);

    assert!(!report.success());
    assert_eq!(report.exit_code(), 1);

    let sdk = report.outcome("dotnet").unwrap();
    assert_eq!(sdk.status, OutcomeStatus::Error);
    assert_eq!(sdk.remediation, RemediationOutcome::Declined);
    assert!(sdk.message.as_deref().unwrap().contains("6.0.100"));

    let packages = report.outcome("packages-dotnet-6.0.100").unwrap();
    assert_eq!(packages.status, OutcomeStatus::NotApplicable);
    assert!(ui.prompts_shown().is_empty());
}

#[test]
fn fix_installs_sdk_then_packages() {
    let temp = TempDir::new().unwrap();
    let listing = temp.path().join("sdks.txt");
    let sdk_dir = temp.path().join("dotnet/sdk");
    fs::write(&listing, format!("5.0.100 [{}]\n", sdk_dir.display())).unwrap();
    let feed = temp.path().join("feed");
    fs::create_dir_all(&feed).unwrap();
    feed_package(&feed, "Contoso.Pack", "1.0.0", &[("tools/pack.txt", "pack")]);
    feed_package(
        &feed,
        "Contoso.Manifest-6.0.100",
        "6.0.0",
        &[("data/WorkloadManifest.json", "{\"version\": \"6.0.0\"}")],
    );

    let options = RunOptions {
        fix: FixMode::Always,
        ..Default::default()
    };
    let (report, _) = run(&sdk_manifest(temp.path(), &listing, &feed), options);

    let sdk = report.outcome("dotnet").unwrap();
    assert_eq!(sdk.status, OutcomeStatus::Ok);
    assert_eq!(sdk.remediation, RemediationOutcome::Applied);
    assert_eq!(sdk.attempts, 2);

    let packages = report.outcome("packages-dotnet-6.0.100").unwrap();
    assert_eq!(packages.status, OutcomeStatus::Ok, "{:?}", packages.message);

    let root = temp.path().join("dotnet");
    assert!(root.join("packs/contoso.pack/1.0.0/tools/pack.txt").is_file());
    let descriptor = root.join("sdk-manifests/6.0.100/contoso/WorkloadManifest.json");
    assert_eq!(
        fs::read_to_string(descriptor).unwrap(),
        "{\"version\": \"6.0.0\"}"
    );

    // The env check only warns, so the run passes
    assert_eq!(
        report.outcome("sdk-root").unwrap().status,
        OutcomeStatus::Warning
    );
    assert!(report.success());
}

#[test]
fn failed_tool_skips_dependents() {
    let manifest = r#"
tools:
  - id: missing-tool
    command: definitely-not-a-real-command-4242 --version
files:
  - id: config
    path: /nonexistent/checkup/config
    depends_on: [missing-tool]
"#;
    let (report, _) = run(manifest, RunOptions::default());

    assert_eq!(
        report.outcome("missing-tool").unwrap().status,
        OutcomeStatus::Error
    );
    let config = report.outcome("config").unwrap();
    assert_eq!(config.status, OutcomeStatus::Skipped);
    assert_eq!(config.attempts, 0);
}

#[test]
fn skip_list_matches_type_names() {
    let manifest = r#"
tools:
  - id: missing-tool
    command: definitely-not-a-real-command-4242 --version
env:
  - id: home
    name: HOME
"#;
    let options = RunOptions {
        skip: vec!["ToolCheck".to_string()],
        ..Default::default()
    };
    let (report, _) = run(manifest, options);

    assert_eq!(
        report.outcome("missing-tool").unwrap().status,
        OutcomeStatus::Skipped
    );
    assert!(report.success());
}
