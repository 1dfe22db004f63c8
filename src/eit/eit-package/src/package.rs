//! A package in the local cache.

use crate::error::{Error, Result};
use crate::install::{InstallRequest, Installer, PackageSpec, TarballInstaller};
use crate::manifest::{FsManifestResolver, ManifestResolver};
use crate::npm::{NpmClient, VersionSource};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Version placeholder resolved against the registry by [`Package::prepare`].
pub const LATEST: &str = "latest";

/// Cache directory for `name@version` under `store_dir`.
///
/// The `/` of a scoped name is replaced in the prefix only, so
/// `@scope/tpl@1.0.0` maps to `_@scope_tpl@1.0.0@@scope/tpl`.
pub fn cache_location(store_dir: &Path, name: &str, version: &str) -> PathBuf {
    store_dir.join(format!(
        "_{}@{}@{}",
        name.replacen('/', "_", 1),
        version,
        name
    ))
}

/// Construction parameters for [`Package`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOptions {
    /// Install root, or the package itself when there is no store.
    pub target_path: PathBuf,
    /// Multi-version cache directory. `None` means the package lives
    /// directly at `target_path`.
    pub store_dir: Option<PathBuf>,
    pub package_name: String,
    /// A concrete version or [`LATEST`].
    pub package_version: String,
}

/// Where a package sits on disk and its declared entry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub cache_location: PathBuf,
    pub entry_file: Option<PathBuf>,
}

/// A package that may or may not be installed yet.
pub struct Package {
    target_path: PathBuf,
    store_dir: Option<PathBuf>,
    package_name: String,
    package_version: String,
    versions: Box<dyn VersionSource>,
    installer: Box<dyn Installer>,
    manifests: Box<dyn ManifestResolver>,
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("target_path", &self.target_path)
            .field("store_dir", &self.store_dir)
            .field("package_name", &self.package_name)
            .field("package_version", &self.package_version)
            .field("registry", &self.versions.registry())
            .finish()
    }
}

impl Package {
    /// Package backed by the npm registry at `registry` (the default mirror
    /// when `None`), the tarball installer and the filesystem manifest lookup.
    pub fn new(options: PackageOptions, registry: Option<&str>) -> Result<Self> {
        Self::with_collaborators(
            options,
            Box::new(NpmClient::new(registry)?),
            Box::new(TarballInstaller::new()?),
            Box::new(FsManifestResolver),
        )
    }

    pub fn with_collaborators(
        options: PackageOptions,
        versions: Box<dyn VersionSource>,
        installer: Box<dyn Installer>,
        manifests: Box<dyn ManifestResolver>,
    ) -> Result<Self> {
        if options.package_name.is_empty() {
            return Err(Error::InvalidArgument("package name must not be empty"));
        }
        if options.target_path.as_os_str().is_empty() {
            return Err(Error::InvalidArgument("target path must not be empty"));
        }

        Ok(Self {
            target_path: options.target_path,
            store_dir: options.store_dir,
            package_name: options.package_name,
            package_version: options.package_version,
            versions,
            installer,
            manifests,
        })
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Current version; [`LATEST`] until [`prepare`](Self::prepare) ran.
    pub fn package_version(&self) -> &str {
        &self.package_version
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    pub fn store_dir(&self) -> Option<&Path> {
        self.store_dir.as_deref()
    }

    /// Whether versions are kept in a store (`true`) or the package lives at
    /// `target_path` (`false`).
    pub fn is_cached(&self) -> bool {
        self.store_dir.is_some()
    }

    /// Cache location of the current version. `None` without a store.
    pub fn cache_file_path(&self) -> Option<PathBuf> {
        self.specific_cache_file_path(&self.package_version)
    }

    /// Cache location of `version` of this package. `None` without a store.
    pub fn specific_cache_file_path(&self, version: &str) -> Option<PathBuf> {
        self.store_dir
            .as_deref()
            .map(|store_dir| cache_location(store_dir, &self.package_name, version))
    }

    /// Directory holding the package contents: the cache location, or
    /// `target_path` without a store.
    pub fn package_dir(&self) -> PathBuf {
        self.cache_file_path()
            .unwrap_or_else(|| self.target_path.clone())
    }

    /// Create the store directory and pin [`LATEST`] to a concrete version.
    pub fn prepare(&mut self) -> Result<()> {
        if let Some(store_dir) = &self.store_dir {
            if !store_dir.exists() {
                std::fs::create_dir_all(store_dir).map_err(|source| Error::FileSystem {
                    action: "creating",
                    path: store_dir.clone(),
                    source,
                })?;
            }
        }

        if self.package_version == LATEST {
            self.package_version = self.resolve_latest()?;
            debug!(
                "resolved {}@{} to {}",
                self.package_name, LATEST, self.package_version
            );
        }
        Ok(())
    }

    pub fn exists(&mut self) -> Result<bool> {
        if self.is_cached() {
            self.prepare()?;
            Ok(self.package_dir().exists())
        } else {
            Ok(self.target_path.exists())
        }
    }

    pub fn install(&mut self) -> Result<()> {
        self.prepare()?;
        let version = self.package_version.clone();
        self.install_version(&version)
    }

    /// Make sure the newest published version is installed and switch to it.
    ///
    /// A version whose cache location already exists is not reinstalled.
    /// Without a store there is nothing to update.
    pub fn update(&mut self) -> Result<()> {
        self.prepare()?;
        if !self.is_cached() {
            debug!("{} is used in place, not updating", self.target_path.display());
            return Ok(());
        }

        let latest = self.resolve_latest()?;
        let latest_path = self.package_dir_for(&latest);
        if latest_path.exists() {
            debug!("{}@{} already cached", self.package_name, latest);
        } else {
            self.install_version(&latest)?;
        }
        self.package_version = latest;
        Ok(())
    }

    /// Entry file declared by the nearest manifest at or above
    /// [`package_dir`](Self::package_dir).
    pub fn root_path(&self) -> Option<PathBuf> {
        self.manifests.entry_file(&self.package_dir())
    }

    pub fn resolve(&self) -> ResolvedPackage {
        ResolvedPackage {
            cache_location: self.package_dir(),
            entry_file: self.root_path(),
        }
    }

    fn package_dir_for(&self, version: &str) -> PathBuf {
        self.specific_cache_file_path(version)
            .unwrap_or_else(|| self.target_path.clone())
    }

    fn resolve_latest(&self) -> Result<String> {
        self.versions
            .latest_version(&self.package_name)?
            .ok_or_else(|| Error::NoVersions {
                name: self.package_name.clone(),
            })
    }

    fn install_version(&self, version: &str) -> Result<()> {
        let request = InstallRequest {
            root: self.target_path.clone(),
            store_dir: self.store_dir.clone(),
            registry: self.versions.registry().to_string(),
            packages: vec![PackageSpec {
                name: self.package_name.clone(),
                version: version.to_string(),
            }],
        };
        self.installer.install(&request)?;
        Ok(())
    }
}
