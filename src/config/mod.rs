//! Manifest loading, parsing and validation.
//!
//! - Schema definitions in [`schema`]
//! - Discovery and loading in [`loader`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use checkup::config::parse_manifest;
//!
//! let manifest = parse_manifest("inline", "tools:\n  - id: git\n    command: git --version\n").unwrap();
//! assert_eq!(manifest.tools[0].id, "git");
//! ```

pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::{fetch_manifest, load_manifest, load_manifest_file, parse_manifest, DEFAULT_MANIFEST};
pub use schema::{
    manifest_schema, DescriptorConfig, EnvConfig, FileConfig, Manifest, PackageConfig, SdkConfig,
    SdkVersionConfig, ToolConfig,
};
pub use validator::{validate, validate_manifest, ValidationError};
