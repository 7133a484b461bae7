//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::acquisition::PackageLayout;

/// Checkup - verify a development environment and fix what is missing.
#[derive(Debug, Parser)]
#[command(name = "checkup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Manifest path or URL (default: checkup.yml)
    #[arg(short, long, global = true, env = "CHECKUP_MANIFEST")]
    pub manifest: Option<String>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run every check (default if no command specified)
    Check(CheckArgs),

    /// List checks in execution order
    List(ListArgs),

    /// Download a package and its dependencies
    Acquire(AcquireArgs),

    /// Print the manifest JSON schema
    Schema,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `check` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CheckArgs {
    /// Apply available fixes without asking
    #[arg(long)]
    pub fix: bool,

    /// Never prompt
    #[arg(long)]
    pub non_interactive: bool,

    /// CI mode (implies --non-interactive)
    #[arg(long)]
    pub ci: bool,

    /// Skip checks by id or type name (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

impl CheckArgs {
    /// Whether prompts may be shown.
    pub fn interactive(&self) -> bool {
        !self.non_interactive && !self.ci
    }
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `acquire` command.
#[derive(Debug, Clone, clap::Args)]
pub struct AcquireArgs {
    /// Package id
    pub id: String,

    /// Exact package version
    #[arg(id = "package_version", value_name = "VERSION")]
    pub version: String,

    /// Destination directory
    #[arg(short, long)]
    pub dest: PathBuf,

    /// Package source, tried in order (repeatable; default: the manifest's sources)
    #[arg(short, long = "source")]
    pub sources: Vec<String>,

    /// Install layout: id or id-version
    #[arg(long, default_value_t = PackageLayout::IdVersion)]
    pub layout: PackageLayout,

    /// Save the raw package file without extracting or walking dependencies
    #[arg(long)]
    pub raw: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_verb_means_check() {
        let cli = Cli::try_parse_from(["checkup"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_check_flags() {
        let cli = Cli::try_parse_from([
            "checkup",
            "check",
            "--fix",
            "--ci",
            "--skip",
            "git,node",
            "--skip",
            "ToolCheck",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Check(args)) => {
                assert!(args.fix);
                assert!(!args.interactive());
                assert_eq!(args.skip, vec!["git", "node", "ToolCheck"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn manifest_is_global() {
        let cli = Cli::try_parse_from(["checkup", "list", "--manifest", "ci.yml"]).unwrap();
        assert_eq!(cli.manifest.as_deref(), Some("ci.yml"));
    }

    #[test]
    fn parses_acquire() {
        let cli = Cli::try_parse_from([
            "checkup",
            "acquire",
            "Contoso.Core",
            "1.2.0",
            "--dest",
            "/tmp/packs",
            "--source",
            "./feed",
            "--source",
            "https://api.nuget.org/v3/index.json",
            "--layout",
            "id",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Acquire(args)) => {
                assert_eq!(args.id, "Contoso.Core");
                assert_eq!(args.sources.len(), 2);
                assert_eq!(args.layout, PackageLayout::IdOnly);
                assert!(!args.raw);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
