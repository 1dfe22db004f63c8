//! Runtime configuration, resolved once at startup.
//!
//! Sources, highest priority first: command line flags, environment
//! variables, `~/.env`, built-in defaults.

use crate::error::InitError;
use crate::process::ScriptCommand;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory under the user home holding templates and other state.
pub const DEFAULT_CLI_HOME: &str = ".eit-tool";
/// Service listing the available project templates.
pub const DEFAULT_TEMPLATES_URL: &str = "http://39.106.100.186:7000/";
pub const DEFAULT_INSTALL_COMMAND: &str = "npm install";
pub const DEFAULT_START_COMMAND: &str = "npm start";

/// Name of the CLI's own package, checked for newer releases on startup.
pub const CLI_PACKAGE_NAME: &str = "@eit-tool/cli";

pub const ENV_CLI_HOME: &str = "CLI_HOME";
pub const ENV_REGISTRY: &str = "EIT_REGISTRY";
pub const ENV_TEMPLATES_URL: &str = "EIT_TEMPLATES_URL";
/// Older name of [`ENV_TEMPLATES_URL`], still honored.
pub const ENV_BASE_URL: &str = "BASE_URL";
pub const ENV_INSTALL_COMMAND: &str = "EIT_INSTALL_CMD";
pub const ENV_START_COMMAND: &str = "EIT_START_CMD";

/// Per-user variables file in the home directory.
pub const ENV_FILE: &str = ".env";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub home_dir: PathBuf,
    /// Root of the tool's own files, `~/.eit-tool` by default.
    pub cli_home: PathBuf,
    /// Directory the project is created in.
    pub work_dir: PathBuf,
    /// Local template package to use instead of the registry.
    pub target_path: Option<PathBuf>,
    /// npm registry; `None` selects the default mirror.
    pub registry: Option<String>,
    pub templates_url: String,
    pub install_command: ScriptCommand,
    pub start_command: ScriptCommand,
}

impl Config {
    /// Configuration from the real environment.
    pub fn load(target_path: Option<PathBuf>) -> Result<Self> {
        let work_dir = std::env::current_dir().context("Failed to read the current directory")?;
        Self::from_sources(
            dirs::home_dir(),
            |key| std::env::var(key).ok(),
            work_dir,
            target_path,
        )
    }

    pub fn from_sources(
        home_dir: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
        work_dir: PathBuf,
        target_path: Option<PathBuf>,
    ) -> Result<Self> {
        let home_dir = home_dir
            .filter(|home| home.exists())
            .ok_or(InitError::HomeNotFound)?;
        let file_vars = read_env_file(&home_dir.join(ENV_FILE));
        let var = |key: &str| {
            env(key)
                .filter(|value| !value.trim().is_empty())
                .or_else(|| file_vars.get(key).cloned())
                .filter(|value| !value.trim().is_empty())
        };

        let cli_home = home_dir.join(var(ENV_CLI_HOME).as_deref().unwrap_or(DEFAULT_CLI_HOME));
        let target_path = target_path.map(|path| {
            if path.is_relative() {
                work_dir.join(path)
            } else {
                path
            }
        });

        Ok(Self {
            cli_home,
            target_path,
            registry: var(ENV_REGISTRY),
            templates_url: var(ENV_TEMPLATES_URL)
                .or_else(|| var(ENV_BASE_URL))
                .unwrap_or_else(|| DEFAULT_TEMPLATES_URL.to_string()),
            install_command: script(var(ENV_INSTALL_COMMAND), DEFAULT_INSTALL_COMMAND)?,
            start_command: script(var(ENV_START_COMMAND), DEFAULT_START_COMMAND)?,
            home_dir,
            work_dir,
        })
    }

    /// Install root for template packages.
    pub fn template_target_path(&self) -> PathBuf {
        self.cli_home.join("template")
    }

    /// Multi-version store for template packages.
    pub fn template_store_dir(&self) -> PathBuf {
        self.template_target_path().join("node_modules")
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }
}

/// Variables from a dotenv file. A missing file is empty; malformed lines are
/// skipped.
fn read_env_file(path: &Path) -> HashMap<String, String> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(err) if err.not_found() => return HashMap::new(),
        Err(err) => {
            warn!("ignoring {}: {}", path.display(), err);
            return HashMap::new();
        }
    };

    let mut vars = HashMap::new();
    for item in iter {
        match item {
            Ok((key, value)) => {
                vars.insert(key, value);
            }
            Err(err) => warn!("skipping a line of {}: {}", path.display(), err),
        }
    }
    debug!("{} variable(s) from {}", vars.len(), path.display());
    vars
}

fn script(configured: Option<String>, default: &str) -> Result<ScriptCommand> {
    let line = configured.as_deref().unwrap_or(default);
    ScriptCommand::parse(line).with_context(|| format!("Invalid script command '{}'", line))
}
