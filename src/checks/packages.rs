//! Packages installed into an SDK.
//!
//! [`SdkPackagesContributor`] adds one [`PackagesCheck`] per declared SDK
//! version that lists packages or descriptors. The check requires the SDK
//! check itself and reads the install root it published.

use std::path::{Path, PathBuf};

use super::remedies::{descriptor_path, sdk_root, AcquirePackagesRemediation};
use crate::acquisition::{format_version, parse_version, PackageSource};
use crate::checkup::{
    Check, CheckContext, CheckContributor, CheckDependency, Diagnosis, Platform, StatusUpdate,
    Suggestion,
};
use crate::config::{DescriptorConfig, PackageConfig, SdkConfig, SdkVersionConfig};
use crate::error::Result;
use crate::state::SharedState;

/// Contributes package checks for every version of one SDK.
pub struct SdkPackagesContributor {
    sdk: SdkConfig,
    sources: PackageSource,
}

impl SdkPackagesContributor {
    pub fn new(sdk: SdkConfig, sources: PackageSource) -> Self {
        Self { sdk, sources }
    }
}

impl CheckContributor for SdkPackagesContributor {
    fn contribute(&self) -> Vec<Box<dyn Check>> {
        self.sdk
            .versions
            .iter()
            .filter(|v| !v.packages.is_empty() || !v.descriptors.is_empty())
            .map(|v| Box::new(PackagesCheck::new(&self.sdk, v, self.sources.clone())) as Box<dyn Check>)
            .collect()
    }
}

/// Verifies the packages and descriptors declared for one SDK version.
pub struct PackagesCheck {
    id: String,
    title: String,
    sdk_id: String,
    sdk_version: String,
    packs_dir: Option<PathBuf>,
    packages: Vec<PackageConfig>,
    descriptors: Vec<DescriptorConfig>,
    sources: PackageSource,
    platforms: Vec<Platform>,
    requires_admin: bool,
}

impl PackagesCheck {
    pub fn new(sdk: &SdkConfig, version: &SdkVersionConfig, sources: PackageSource) -> Self {
        let title = sdk.title.as_deref().unwrap_or(&sdk.id);
        Self {
            id: format!("packages-{}-{}", sdk.id, version.version),
            title: format!("{} {} packages", title, version.version),
            sdk_id: sdk.id.clone(),
            sdk_version: version.version.clone(),
            packs_dir: sdk.packs_dir.clone(),
            packages: version.packages.clone(),
            descriptors: version.descriptors.clone(),
            sources,
            platforms: sdk.platforms.clone(),
            requires_admin: sdk.requires_admin,
        }
    }

    fn packs_dir(&self, state: &SharedState) -> Option<PathBuf> {
        self.packs_dir
            .clone()
            .or_else(|| sdk_root(state, &self.sdk_id).map(|root| root.join("packs")))
    }
}

/// A package directory, matched with the id as declared or lower-cased.
fn package_present(packs_dir: &Path, package: &PackageConfig) -> bool {
    let version = parse_version(&package.version)
        .map(|v| format_version(&v))
        .unwrap_or_else(|_| package.version.clone());
    [package.id.clone(), package.id.to_lowercase()]
        .iter()
        .any(|id| {
            let dir = packs_dir.join(id);
            dir.join(&version).is_dir() || dir.join(version.to_lowercase()).is_dir()
        })
}

impl Check for PackagesCheck {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn type_name(&self) -> &'static str {
        "PackagesCheck"
    }

    fn dependencies(&self, _all_ids: &[String]) -> Vec<CheckDependency> {
        vec![CheckDependency::required(self.sdk_id.as_str())]
    }

    fn is_platform_supported(&self, platform: Platform) -> bool {
        platform.is_in(&self.platforms)
    }

    /// Only SDK versions the SDK check saw installed are inspected.
    fn should_examine(&self, state: &SharedState) -> bool {
        let installed: Vec<String> = state
            .try_get_state(&self.sdk_id, "installed_versions")
            .unwrap_or_default();
        let Ok(wanted) = parse_version(&self.sdk_version) else {
            return false;
        };
        installed
            .iter()
            .filter_map(|v| parse_version(v).ok())
            .any(|v| v == wanted)
    }

    fn examine(&self, ctx: &mut CheckContext<'_>) -> Result<Diagnosis> {
        let Some(packs_dir) = self.packs_dir(ctx.state) else {
            return Ok(Diagnosis::error(
                self.id(),
                format!("Install root of {} is unknown", self.sdk_id),
            ));
        };
        let root = sdk_root(ctx.state, &self.sdk_id);

        let mut missing = Vec::new();
        for descriptor in &self.descriptors {
            let present = root
                .as_deref()
                .is_some_and(|root| descriptor_path(root, &self.sdk_version, descriptor).is_file());
            if !present {
                missing.push(format!("{} {}", descriptor.id, descriptor.version));
            }
        }
        for package in &self.packages {
            ctx.report(StatusUpdate::info(format!("Looking for {}", package.id)));
            if !package_present(&packs_dir, package) {
                missing.push(format!("{} {}", package.id, package.version));
            }
        }

        if missing.is_empty() {
            let count = self.packages.len() + self.descriptors.len();
            return Ok(Diagnosis::ok(self.id()).with_message(format!("{} installed", count)));
        }

        let remediation = AcquirePackagesRemediation::new(
            &self.sdk_id,
            &self.sdk_version,
            self.sources.clone(),
        )
        .with_packs_dir(self.packs_dir.clone())
        .with_packages(self.packages.clone())
        .with_descriptors(self.descriptors.clone())
        .with_admin(self.requires_admin);

        Ok(Diagnosis::error(self.id(), format!("Missing {}", missing.join(", ")))
            .with_suggestion(
                Suggestion::new(format!("Install {}", self.title()))
                    .with_remediation(Box::new(remediation)),
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::checkup::{NullProgress, Status};
    use std::fs;
    use tempfile::TempDir;

    fn sdk() -> SdkConfig {
        SdkConfig {
            id: "dotnet".to_string(),
            title: Some(".NET SDK".to_string()),
            list_command: "dotnet --list-sdks".to_string(),
            versions: vec![
                SdkVersionConfig {
                    version: "6.0.100".to_string(),
                    packages: vec![PackageConfig {
                        id: "Contoso.Pack".to_string(),
                        version: "1.0".to_string(),
                    }],
                    descriptors: vec![DescriptorConfig {
                        id: "Contoso.Workload.Manifest-6.0.100".to_string(),
                        version: "6.0.0".to_string(),
                        entry: "WorkloadManifest.json".to_string(),
                    }],
                },
                SdkVersionConfig {
                    version: "7.0.100".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    fn examine(check: &PackagesCheck, state: &mut SharedState) -> Diagnosis {
        let mut progress = NullProgress;
        let cancel = CancelToken::new();
        let mut ctx = CheckContext::new(state, &mut progress, &cancel, Platform::current());
        check.examine(&mut ctx).unwrap()
    }

    #[test]
    fn contributes_one_check_per_version_with_packages() {
        let contributor = SdkPackagesContributor::new(sdk(), PackageSource::default());
        let checks = contributor.contribute();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].id(), "packages-dotnet-6.0.100");
        assert_eq!(checks[0].title(), ".NET SDK 6.0.100 packages");

        let deps = checks[0].dependencies(&[]);
        assert_eq!(deps, vec![CheckDependency::required("dotnet")]);
        assert!(deps[0].matches("dotnet"));
        assert!(!deps[0].matches("packages-dotnet-6.0.100"));
    }

    #[test]
    fn only_examined_for_installed_sdk_version() {
        let check = PackagesCheck::new(&sdk(), &sdk().versions[0], PackageSource::default());
        let mut state = SharedState::new();
        assert!(!check.should_examine(&state));
        state.contribute("dotnet", "installed_versions", vec!["6.0.100"]);
        assert!(check.should_examine(&state));
    }

    #[test]
    fn missing_packages_offer_acquisition() {
        let temp = TempDir::new().unwrap();
        let mut state = SharedState::new();
        state.contribute("dotnet", "root", temp.path().display().to_string());

        let check = PackagesCheck::new(&sdk(), &sdk().versions[0], PackageSource::default());
        let diagnosis = examine(&check, &mut state);

        assert_eq!(diagnosis.status(), Status::Error);
        assert!(diagnosis.message().unwrap().contains("Contoso.Pack 1.0"));
        assert!(diagnosis.has_remediation());
    }

    #[test]
    fn present_packages_pass() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("packs/Contoso.Pack/1.0.0")).unwrap();
        let manifest_dir = temp
            .path()
            .join("sdk-manifests/6.0.100/contoso.workload");
        fs::create_dir_all(&manifest_dir).unwrap();
        fs::write(manifest_dir.join("WorkloadManifest.json"), "{}").unwrap();

        let mut state = SharedState::new();
        state.contribute("dotnet", "root", temp.path().display().to_string());
        let check = PackagesCheck::new(&sdk(), &sdk().versions[0], PackageSource::default());

        assert_eq!(examine(&check, &mut state).status(), Status::Ok);
    }

    #[test]
    fn unknown_root_is_error() {
        let check = PackagesCheck::new(&sdk(), &sdk().versions[0], PackageSource::default());
        let diagnosis = examine(&check, &mut SharedState::new());
        assert_eq!(diagnosis.status(), Status::Error);
        assert!(!diagnosis.has_remediation());
    }
}
