//! npm registry lookups: published versions, latest version and newer-than
//! queries.

use crate::error::Result;
use semver::Version;
use serde::Deserialize;
use tracing::{debug, warn};

/// Mirror used when no registry is configured.
pub const NPM_MIRROR_REGISTRY: &str = "https://registry.npmmirror.com";
/// The upstream npm registry.
pub const NPM_REGISTRY: &str = "https://registry.npmjs.org";

const USER_AGENT: &str = concat!("eit/", env!("CARGO_PKG_VERSION"));

/// Registry used when the caller does not pass one explicitly.
///
/// `original` selects the upstream registry instead of the mirror.
pub fn default_registry(original: bool) -> &'static str {
    if original {
        NPM_REGISTRY
    } else {
        NPM_MIRROR_REGISTRY
    }
}

// ============================================================================
// Version selection
// ============================================================================

/// Highest version by semver precedence. Entries that don't parse are skipped.
pub fn newest<S: AsRef<str>>(versions: &[S]) -> Option<String> {
    versions
        .iter()
        .filter_map(|v| parse(v.as_ref()).map(|parsed| (parsed, v.as_ref())))
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, v)| v.to_string())
}

/// Versions strictly greater than `baseline`, newest first.
///
/// An unparseable baseline yields nothing.
pub fn newer_than<S: AsRef<str>>(baseline: &str, versions: &[S]) -> Vec<String> {
    let Some(baseline) = parse(baseline) else {
        return Vec::new();
    };

    let mut newer: Vec<(Version, &str)> = versions
        .iter()
        .filter_map(|v| parse(v.as_ref()).map(|parsed| (parsed, v.as_ref())))
        .filter(|(parsed, _)| *parsed > baseline)
        .collect();
    newer.sort_by(|(a, _), (b, _)| b.cmp(a));

    newer.into_iter().map(|(_, v)| v.to_string()).collect()
}

fn parse(version: &str) -> Option<Version> {
    Version::parse(version.trim()).ok()
}

// ============================================================================
// Version source
// ============================================================================

/// Where [`Package`](crate::Package) learns which versions of a package exist.
pub trait VersionSource {
    /// Registry URL passed on to installers.
    fn registry(&self) -> &str;

    /// All published versions of `name`, in registry order.
    fn list_versions(&self, name: &str) -> Result<Vec<String>>;

    /// The highest published version, if any.
    fn latest_version(&self, name: &str) -> Result<Option<String>> {
        Ok(newest(&self.list_versions(name)?))
    }

    /// The newest published version strictly greater than `baseline`.
    fn next_version_after(&self, baseline: &str, name: &str) -> Result<Option<String>> {
        Ok(newer_than(baseline, &self.list_versions(name)?)
            .into_iter()
            .next())
    }
}

/// Response from `GET {registry}/{name}`. Only the version keys matter.
#[derive(Debug, Deserialize)]
struct PackageDocument {
    #[serde(default)]
    versions: serde_json::Map<String, serde_json::Value>,
}

/// Blocking client for an npm-compatible registry.
pub struct NpmClient {
    client: reqwest::blocking::Client,
    registry: String,
}

impl NpmClient {
    /// Client for `registry`, or [`default_registry`] when `None`.
    pub fn new(registry: Option<&str>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            registry: registry
                .unwrap_or(default_registry(false))
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// The raw package document, or `None` when the registry doesn't answer
    /// with a success status.
    pub fn package_info(&self, name: &str) -> Result<Option<serde_json::Value>> {
        if name.is_empty() {
            return Ok(None);
        }

        let url = format!("{}/{}", self.registry, name);
        debug!(%url, "fetching package info");
        let response = self.client.get(&url).send()?;

        if !response.status().is_success() {
            debug!(status = %response.status(), %url, "registry returned no package info");
            return Ok(None);
        }

        match response.json::<serde_json::Value>() {
            Ok(body) => Ok(Some(body)),
            Err(err) => {
                warn!("unreadable registry response for '{}': {}", name, err);
                Ok(None)
            }
        }
    }
}

impl VersionSource for NpmClient {
    fn registry(&self) -> &str {
        &self.registry
    }

    fn list_versions(&self, name: &str) -> Result<Vec<String>> {
        let Some(body) = self.package_info(name)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_value::<PackageDocument>(body) {
            Ok(document) => Ok(document.versions.into_iter().map(|(v, _)| v).collect()),
            Err(err) => {
                warn!("registry response for '{}' has no usable versions: {}", name, err);
                Ok(Vec::new())
            }
        }
    }
}

// ============================================================================
// Convenience entry points
// ============================================================================

/// All published versions of `name`, see [`VersionSource::list_versions`].
pub fn list_versions(name: &str, registry: Option<&str>) -> Result<Vec<String>> {
    NpmClient::new(registry)?.list_versions(name)
}

/// Highest published version of `name`.
pub fn latest_version(name: &str, registry: Option<&str>) -> Result<Option<String>> {
    NpmClient::new(registry)?.latest_version(name)
}

/// Newest published version of `name` strictly greater than `baseline`.
pub fn next_version_after(
    baseline: &str,
    name: &str,
    registry: Option<&str>,
) -> Result<Option<String>> {
    NpmClient::new(registry)?.next_version_after(baseline, name)
}
