use std::path::PathBuf;

/// Errors that can occur while resolving, installing or locating a package.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("registry request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error("{action} {}: {source}", path.display())]
    FileSystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no published versions found for '{name}'")]
    NoVersions { name: String },
}

/// Failure reported by an [`Installer`](crate::Installer).
///
/// `package` is always the `name@version` being installed.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("failed to fetch {package} from {url}: {source}")]
    Http {
        package: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("registry returned {status} for {package} ({url})")]
    Status {
        package: String,
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("registry metadata for {package} has no dist.tarball")]
    MissingTarball { package: String },

    #[error("failed to unpack {package} into {}: {source}", dest.display())]
    Unpack {
        package: String,
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
