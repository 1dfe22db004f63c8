//! Entry file lookup through the nearest `package.json`.

use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

pub const MANIFEST_FILE: &str = "package.json";

/// Finds a package's entry file starting from a directory inside it.
pub trait ManifestResolver {
    /// Absolute path of the entry file, or `None` when no manifest declaring
    /// one is found.
    fn entry_file(&self, start: &Path) -> Option<PathBuf>;
}

/// Walks the real filesystem upward from the start directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsManifestResolver;

#[derive(Debug, Deserialize)]
struct PackageJson {
    #[serde(default)]
    main: Option<String>,
}

impl ManifestResolver for FsManifestResolver {
    fn entry_file(&self, start: &Path) -> Option<PathBuf> {
        let dir = find_package_dir(start)?;
        let manifest_path = dir.join(MANIFEST_FILE);

        let content = match std::fs::read_to_string(&manifest_path) {
            Ok(content) => content,
            Err(err) => {
                warn!("reading {}: {}", manifest_path.display(), err);
                return None;
            }
        };
        let manifest: PackageJson = match serde_json::from_str(&content) {
            Ok(manifest) => manifest,
            Err(err) => {
                warn!("parsing {}: {}", manifest_path.display(), err);
                return None;
            }
        };

        let main = manifest.main.filter(|m| !m.is_empty())?;
        Some(normalize(&dir.join(main)))
    }
}

/// The closest directory, `start` included, that holds a `package.json`.
pub fn find_package_dir(start: &Path) -> Option<PathBuf> {
    let start = normalize(start);
    let found = start
        .ancestors()
        .find(|dir| dir.join(MANIFEST_FILE).is_file())
        .map(Path::to_path_buf);
    debug!(start = %start.display(), found = ?found, "manifest lookup");
    found
}

/// Make `path` absolute against the current directory and fold `.` and `..`
/// components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn main_resolves_relative_to_manifest_dir() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("package.json"), r#"{"main":"lib/index.js"}"#).unwrap();

        let entry = FsManifestResolver.entry_file(tmp.path()).unwrap();
        assert_eq!(entry, normalize(&tmp.path().join("lib").join("index.js")));
    }

    #[test]
    fn walks_up_to_nearest_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("package.json"), r#"{"main":"./bin/../index.js"}"#).unwrap();
        let nested = tmp.path().join("template").join("src");
        fs::create_dir_all(&nested).unwrap();

        let entry = FsManifestResolver.entry_file(&nested).unwrap();
        assert_eq!(entry, normalize(&tmp.path().join("index.js")));
    }

    #[test]
    fn nearer_manifest_wins() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("package.json"), r#"{"main":"outer.js"}"#).unwrap();
        let inner = tmp.path().join("inner");
        fs::create_dir_all(&inner).unwrap();
        fs::write(inner.join("package.json"), r#"{"main":"inner.js"}"#).unwrap();

        let entry = FsManifestResolver.entry_file(&inner).unwrap();
        assert!(entry.ends_with("inner/inner.js"), "{}", entry.display());
    }

    #[test]
    fn manifest_without_main_gives_none() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("package.json"), r#"{"name":"x"}"#).unwrap();
        assert_eq!(FsManifestResolver.entry_file(tmp.path()), None);
    }

    #[test]
    fn broken_manifest_gives_none() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("package.json"), "{ not json").unwrap();
        assert_eq!(FsManifestResolver.entry_file(tmp.path()), None);
    }

    #[test]
    fn normalize_folds_dot_components() {
        let path = Path::new("/a/b/./c/../d");
        assert_eq!(normalize(path), PathBuf::from("/a/b/d"));
    }

    #[test]
    fn normalize_makes_relative_paths_absolute() {
        let normalized = normalize(Path::new("some/file.js"));
        assert!(normalized.is_absolute());
        assert!(normalized.ends_with("some/file.js"));
    }
}
