//! Checkup - environment verification and self-repair.
//!
//! A manifest (`checkup.yml`) declares the tools, SDKs, packages, files and
//! environment variables a machine needs. Checkup turns each declaration
//! into a check, orders the checks by their dependencies, runs them, and
//! applies remediations for the ones that fail.
//!
//! # Modules
//!
//! - [`acquisition`] - Fetching packages and their dependency trees from feeds
//! - [`cancel`] - Cooperative cancellation
//! - [`checks`] - Built-in checks driven by the manifest
//! - [`checkup`] - Check, diagnosis and remediation abstractions
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Manifest loading, parsing and validation
//! - [`error`] - Error types and result aliases
//! - [`registry`] - Check registration
//! - [`runner`] - Dependency ordering and the run loop
//! - [`shell`] - Shell command execution
//! - [`state`] - State shared between checks during a run
//! - [`ui`] - Prompts, spinners and terminal output
//!
//! # Example
//!
//! ```
//! use checkup::checks::build_registry;
//! use checkup::checkup::Platform;
//! use checkup::config::parse_manifest;
//! use checkup::runner::CheckupGraph;
//!
//! let manifest = parse_manifest(
//!     "inline",
//!     "env:\n  - id: home\n    name: HOME\n  - id: path\n    name: PATH\n    depends_on: [home]\n",
//! )
//! .unwrap();
//! let registry = build_registry(&manifest).unwrap();
//! let graph = CheckupGraph::build(&registry, Platform::current()).unwrap();
//! assert_eq!(graph.order(), vec!["home", "path"]);
//! ```

pub mod acquisition;
pub mod cancel;
pub mod checks;
pub mod checkup;
pub mod cli;
pub mod config;
pub mod error;
pub mod registry;
pub mod runner;
pub mod shell;
pub mod state;
pub mod ui;

pub use error::{CheckupError, Result};
