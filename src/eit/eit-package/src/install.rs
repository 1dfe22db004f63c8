//! Installing packages into the cache.
//!
//! [`Installer`] is the seam [`Package`](crate::Package) delegates to.
//! [`TarballInstaller`] is the production implementation: it reads the
//! version document from the registry, downloads `dist.tarball` and unpacks
//! it into the package's cache location.

use crate::error::InstallError;
use crate::package::cache_location;
use flate2::read::GzDecoder;
use serde::Deserialize;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tar::{Archive, EntryType};
use tracing::{debug, info};

const USER_AGENT: &str = concat!("eit/", env!("CARGO_PKG_VERSION"));

/// One package to install, pinned to a concrete version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub name: String,
    pub version: String,
}

impl PackageSpec {
    /// `name@version`, used in logs and errors.
    pub fn id(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// Everything an installer needs to place packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub root: PathBuf,
    pub store_dir: Option<PathBuf>,
    pub registry: String,
    pub packages: Vec<PackageSpec>,
}

impl InstallRequest {
    /// Directory `package` ends up in: its cache location when a store is
    /// configured, `root/node_modules/<name>` otherwise.
    pub fn destination(&self, package: &PackageSpec) -> PathBuf {
        match &self.store_dir {
            Some(store_dir) => cache_location(store_dir, &package.name, &package.version),
            None => self.root.join("node_modules").join(&package.name),
        }
    }
}

/// Installs the packages of an [`InstallRequest`].
pub trait Installer {
    fn install(&self, request: &InstallRequest) -> Result<(), InstallError>;
}

// ============================================================================
// Tarball installer
// ============================================================================

#[derive(Debug, Deserialize)]
struct VersionDocument {
    dist: Option<Dist>,
}

#[derive(Debug, Deserialize)]
struct Dist {
    tarball: Option<String>,
}

/// Registry URL of the version document of `package`.
///
/// The scope separator of a scoped name is escaped (`@scope%2fname`), the
/// form every npm-compatible registry serves.
pub fn version_url(registry: &str, package: &PackageSpec) -> String {
    let name = if package.name.starts_with('@') {
        package.name.replacen('/', "%2f", 1)
    } else {
        package.name.clone()
    };
    format!(
        "{}/{}/{}",
        registry.trim_end_matches('/'),
        name,
        package.version
    )
}

/// Downloads npm tarballs over HTTP and unpacks them in place.
pub struct TarballInstaller {
    client: reqwest::blocking::Client,
}

impl TarballInstaller {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    fn tarball_url(&self, registry: &str, package: &PackageSpec) -> Result<String, InstallError> {
        let url = version_url(registry, package);
        let document: VersionDocument = self
            .get(&url, package)?
            .json()
            .map_err(|source| InstallError::Http {
                package: package.id(),
                url: url.clone(),
                source,
            })?;

        document
            .dist
            .and_then(|d| d.tarball)
            .ok_or_else(|| InstallError::MissingTarball {
                package: package.id(),
            })
    }

    fn get(
        &self,
        url: &str,
        package: &PackageSpec,
    ) -> Result<reqwest::blocking::Response, InstallError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|source| InstallError::Http {
                package: package.id(),
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(InstallError::Status {
                package: package.id(),
                url: url.to_string(),
                status: response.status(),
            });
        }
        Ok(response)
    }

    fn install_one(&self, request: &InstallRequest, package: &PackageSpec) -> Result<(), InstallError> {
        let dest = request.destination(package);
        if dest.exists() {
            debug!("{} already present at {}", package.id(), dest.display());
            return Ok(());
        }

        let url = self.tarball_url(&request.registry, package)?;
        info!("downloading {} from {}", package.id(), url);
        let bytes = self
            .get(&url, package)?
            .bytes()
            .map_err(|source| InstallError::Http {
                package: package.id(),
                url: url.clone(),
                source,
            })?;

        unpack_into(&bytes[..], &dest).map_err(|source| InstallError::Unpack {
            package: package.id(),
            dest: dest.clone(),
            source,
        })
    }
}

impl Installer for TarballInstaller {
    fn install(&self, request: &InstallRequest) -> Result<(), InstallError> {
        for package in &request.packages {
            self.install_one(request, package)?;
        }
        Ok(())
    }
}

/// Unpack a gzipped npm tarball into `dest`.
///
/// The archive is extracted next to `dest` first and renamed into place, so
/// `dest` either holds a complete package or doesn't exist.
pub fn unpack_into(tarball: impl Read, dest: &Path) -> std::io::Result<()> {
    let parent = dest.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent)?;

    let staging = tempfile::Builder::new()
        .prefix(".eit-unpack-")
        .tempdir_in(parent)?;
    unpack_stripped(tarball, staging.path())?;
    std::fs::rename(staging.path(), dest)?;
    Ok(())
}

/// Extract every entry with its first path component (`package/` in npm
/// tarballs) removed.
///
/// Only regular files and directories are written. Links and paths that
/// aren't plain relative names are rejected, so nothing lands outside `dest`.
fn unpack_stripped(tarball: impl Read, dest: &Path) -> std::io::Result<()> {
    let mut archive = Archive::new(GzDecoder::new(tarball));

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();

        let components: Vec<Component> = path
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();
        if components.iter().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(invalid_entry(format!(
                "archive entry escapes the package: {}",
                path.display()
            )));
        }
        let relative: PathBuf = components.into_iter().skip(1).collect();
        if relative.as_os_str().is_empty() {
            continue;
        }

        let target = dest.join(&relative);
        match entry.header().entry_type() {
            EntryType::Directory => std::fs::create_dir_all(&target)?,
            EntryType::Regular | EntryType::Continuous => {
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                entry.unpack(&target)?;
            }
            EntryType::Symlink | EntryType::Link => {
                return Err(invalid_entry(format!(
                    "archive entry is a link: {}",
                    path.display()
                )));
            }
            other => debug!("skipping {:?} entry {}", other, path.display()),
        }
    }
    Ok(())
}

fn invalid_entry(message: String) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, message)
}
