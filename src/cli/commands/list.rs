//! List command implementation.
//!
//! The `checkup list` command prints the manifest's checks in execution
//! order with their dependencies. Checks not supported on this platform are
//! listed last.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::checks::build_registry;
use crate::checkup::Platform;
use crate::cli::args::ListArgs;
use crate::config::load_manifest;
use crate::error::{CheckupError, Result};
use crate::registry::CheckRegistry;
use crate::runner::CheckupGraph;
use crate::ui::theme::CheckupTheme;
use crate::ui::{should_use_colors, UserInterface};

use super::dispatcher::{Command, CommandResult};

/// One line of the listing.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ListedCheck {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub depends_on: Vec<String>,
    pub supported: bool,
}

/// Checks in execution order, then unsupported ones in registration order.
pub fn list_checks(registry: &CheckRegistry, platform: Platform) -> Result<Vec<ListedCheck>> {
    let graph = CheckupGraph::build(registry, platform)?;
    let ids = registry.ids();

    let mut listed: Vec<ListedCheck> = graph
        .nodes()
        .iter()
        .map(|node| ListedCheck {
            id: node.check().id().to_string(),
            title: node.check().title().to_string(),
            type_name: node.check().type_name().to_string(),
            depends_on: node.resolved_dependencies().to_vec(),
            supported: true,
        })
        .collect();

    for check in registry.checks() {
        if graph.node(check.id()).is_none() {
            listed.push(ListedCheck {
                id: check.id().to_string(),
                title: check.title().to_string(),
                type_name: check.type_name().to_string(),
                depends_on: check
                    .dependencies(&ids)
                    .into_iter()
                    .map(|d| d.check_id)
                    .collect(),
                supported: false,
            });
        }
    }
    Ok(listed)
}

/// The list command implementation.
pub struct ListCommand {
    working_dir: PathBuf,
    manifest: Option<String>,
    args: ListArgs,
}

impl ListCommand {
    /// Create a new list command.
    pub fn new(working_dir: &Path, manifest: Option<&str>, args: ListArgs) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            manifest: manifest.map(String::from),
            args,
        }
    }
}

impl Command for ListCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let manifest = load_manifest(self.manifest.as_deref(), &self.working_dir)?;
        let registry = build_registry(&manifest)?;
        let platform = Platform::current();
        let listed = list_checks(&registry, platform)?;

        if self.args.json {
            let json = serde_json::to_string_pretty(&listed)
                .map_err(|e| CheckupError::Other(e.into()))?;
            println!("{}", json);
            return Ok(CommandResult::success());
        }

        let theme = if should_use_colors() {
            CheckupTheme::new()
        } else {
            CheckupTheme::plain()
        };

        ui.message(&format!("  {}", theme.header.apply_to("Checks:")));
        for check in &listed {
            let detail = if check.supported {
                theme.dim.apply_to(format!("({})", check.type_name))
            } else {
                theme.dim.apply_to(format!("(not on {})", platform))
            };
            ui.message(&format!(
                "    {} {} {}",
                theme.highlight.apply_to(&check.id),
                check.title,
                detail
            ));
            if !check.depends_on.is_empty() {
                ui.message(&format!(
                    "      {} {}",
                    theme.dim.apply_to("└── depends on:"),
                    theme.dim.apply_to(check.depends_on.join(", "))
                ));
            }
        }

        Ok(CommandResult::success())
    }
}
