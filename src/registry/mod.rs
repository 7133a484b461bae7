//! Check registry.
//!
//! The host builds a [`CheckRegistry`] at startup (static checks, then
//! checks contributed from manifest data) and hands it to the runner. There
//! is no global registration list, so tests can build isolated registries
//! with disjoint check sets.
//!
//! # Example
//!
//! ```
//! use checkup::registry::CheckRegistry;
//!
//! let registry = CheckRegistry::new();
//! assert!(registry.is_empty());
//! ```

pub mod checks;

pub use checks::CheckRegistry;
