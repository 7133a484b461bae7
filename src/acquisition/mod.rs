//! Artifact acquisition.
//!
//! Resolves a package identity against an ordered list of sources, downloads
//! the first hit with a bounded retry for transient faults, extracts it, and
//! walks the floor version of every declared dependency until the closure is
//! present at the destination.

pub mod acquirer;
pub mod descriptor;
pub mod fault;
pub mod http;
pub mod identity;
pub mod layout;
pub mod local;
pub mod source;

pub use acquirer::{Acquirer, AcquisitionFailure, AcquisitionReport, MARKER_FILE};
pub use descriptor::{DependencySpec, DescriptorParser, NuspecParser, PackageDescriptor};
pub use fault::{FaultKind, FetchError, RetryPolicy};
pub use http::HttpRepository;
pub use identity::{format_version, parse_version, PackageIdentity, VersionRange};
pub use layout::PackageLayout;
pub use local::LocalRepository;
pub use source::{Lookup, PackageRepository, PackageSource};
