//! Versioned npm package cache.
//!
//! Resolves published versions from an npm registry, installs packages into
//! a deterministic cache layout and locates a cached package's entry file
//! through its `package.json`.
//!
//! ```text
//! <store_dir>/_<name with '/' replaced by '_'>@<version>@<name>/
//! ```
//!
//! The registry, the installer and the manifest lookup sit behind the
//! [`VersionSource`], [`Installer`] and [`ManifestResolver`] traits so the
//! cache logic in [`Package`] can run against in-memory fakes.

pub mod error;
pub mod install;
pub mod manifest;
pub mod npm;
pub mod package;

pub use error::{Error, InstallError, Result};
pub use install::{InstallRequest, Installer, PackageSpec, TarballInstaller};
pub use manifest::{FsManifestResolver, ManifestResolver};
pub use npm::{NpmClient, VersionSource, default_registry};
pub use package::{LATEST, Package, PackageOptions, ResolvedPackage, cache_location};
