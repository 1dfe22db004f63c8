//! `eit init`: create a project from a published template.
//!
//! 1. fetch the template list and make sure the working directory is empty
//!    (asking before anything is deleted)
//! 2. ask for the project kind, name, version and template
//! 3. install or update the template package in the local cache
//! 4. copy its `template/` directory here, then run the install and start
//!    scripts

use crate::config::Config;
use crate::error::InitError;
use crate::logging::success;
use crate::process::run_script;
use crate::prompt::Prompter;
use crate::templates::{ProjectTemplate, TemplateClient};
use anyhow::{Context, Result};
use eit_package::{Package, PackageOptions};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, error};
use walkdir::WalkDir;

/// Directory inside a template package whose contents become the project.
pub const TEMPLATE_DIR: &str = "template";
pub const DEFAULT_PROJECT_VERSION: &str = "1.0.0";

static PROJECT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z]+([-][a-zA-Z][a-zA-Z0-9]*|[_][a-zA-Z][a-zA-Z0-9]*|[a-zA-Z0-9])*$")
        .expect("project name pattern is valid")
});

/// Starts with a letter, ends with a letter or digit, and every `-` or `_` is
/// followed by a letter.
pub fn is_valid_name(name: &str) -> bool {
    PROJECT_NAME.is_match(name)
}

/// Canonical form of a user supplied version (`v1.2.3` → `1.2.3`).
pub fn normalize_version(input: &str) -> Option<String> {
    let trimmed = input.trim().trim_start_matches(['v', '=']);
    semver::Version::parse(trimmed).ok().map(|v| v.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    Project,
    Component,
}

impl ProjectKind {
    const ALL: [ProjectKind; 2] = [ProjectKind::Project, ProjectKind::Component];

    fn label(self) -> &'static str {
        match self {
            ProjectKind::Project => "Project",
            ProjectKind::Component => "Component",
        }
    }
}

/// Answers collected from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    pub kind: ProjectKind,
    pub project_name: String,
    pub project_version: String,
    /// npm package name of the chosen template.
    pub template: String,
}

pub struct InitCommand {
    project_name: String,
    force: bool,
    config: Config,
}

impl InitCommand {
    pub fn new(project_name: Option<String>, force: bool, config: Config) -> Self {
        let project_name = project_name.unwrap_or_default();
        debug!(project_name = %project_name, force, "init");
        Self {
            project_name,
            force,
            config,
        }
    }

    /// Run the whole flow against the configured template service.
    pub fn run(&self, prompter: &mut dyn Prompter) -> Result<()> {
        let templates = TemplateClient::new(&self.config.templates_url)?.list_templates()?;
        self.run_with_templates(&templates, prompter)
    }

    /// Run the flow with an already fetched template list.
    pub fn run_with_templates(
        &self,
        templates: &[ProjectTemplate],
        prompter: &mut dyn Prompter,
    ) -> Result<()> {
        let Some(info) = self.prepare(templates, prompter)? else {
            return Ok(());
        };
        debug!(?info, "project info");

        let package = self.download_template(templates, &info)?;
        self.install_template(&package)
    }

    /// Check the template list and the working directory, then ask the
    /// questions. `None` means the user backed out.
    pub fn prepare(
        &self,
        templates: &[ProjectTemplate],
        prompter: &mut dyn Prompter,
    ) -> Result<Option<ProjectInfo>> {
        if templates.is_empty() {
            return Err(InitError::NoTemplates.into());
        }

        let work_dir = self.config.work_dir();
        if !is_dir_empty(work_dir)? {
            if !self.force
                && !prompter.confirm(
                    "The current directory is not empty. Continue creating the project?",
                    false,
                )?
            {
                return Ok(None);
            }
            if !prompter.confirm("Delete every file in the current directory?", false)? {
                return Ok(None);
            }

            let spinner = spinner("Cleaning the current directory...");
            let cleaned = empty_dir(work_dir);
            spinner.finish_and_clear();
            cleaned?;
        }
        debug!("{} is empty", work_dir.display());

        self.collect_project_info(templates, prompter)
    }

    fn collect_project_info(
        &self,
        templates: &[ProjectTemplate],
        prompter: &mut dyn Prompter,
    ) -> Result<Option<ProjectInfo>> {
        let labels: Vec<String> = ProjectKind::ALL
            .iter()
            .map(|kind| kind.label().to_string())
            .collect();
        let chosen = prompter.select("Select the initialization type", &labels, 0)?;
        let kind = ProjectKind::ALL
            .get(chosen)
            .copied()
            .with_context(|| format!("No initialization type at position {}", chosen))?;

        if kind == ProjectKind::Component {
            error!("Component templates are not available yet");
            return Ok(None);
        }
        let title = kind.label().to_lowercase();

        let default_name =
            is_valid_name(&self.project_name).then_some(self.project_name.as_str());
        let project_name = prompter.input(
            &format!("Enter the {title} name"),
            default_name,
            &|value: &str| {
                if is_valid_name(value) {
                    Ok(())
                } else {
                    Err(format!("Please enter a valid {title} name"))
                }
            },
        )?;

        let version = prompter.input(
            &format!("Enter the {title} version"),
            Some(DEFAULT_PROJECT_VERSION),
            &|value: &str| match normalize_version(value) {
                Some(_) => Ok(()),
                None => Err("Please enter a valid version number".to_string()),
            },
        )?;
        let project_version = normalize_version(&version).unwrap_or(version);

        let names: Vec<String> = templates.iter().map(|t| t.name.clone()).collect();
        let chosen = prompter.select(&format!("Select the {title} template"), &names, 0)?;
        let template = templates
            .get(chosen)
            .map(|t| t.npm_name.clone())
            .with_context(|| format!("No template at position {}", chosen))?;

        Ok(Some(ProjectInfo {
            kind,
            project_name,
            project_version,
            template,
        }))
    }

    /// Make the chosen template available locally: install it when it isn't
    /// cached yet, update it otherwise. A `--target-path` package is used as
    /// is.
    pub fn download_template(
        &self,
        templates: &[ProjectTemplate],
        info: &ProjectInfo,
    ) -> Result<Package> {
        let template = templates
            .iter()
            .find(|t| t.npm_name == info.template)
            .ok_or_else(|| InitError::TemplateNotFound(info.template.clone()))?;

        let options = match &self.config.target_path {
            Some(path) => PackageOptions {
                target_path: path.clone(),
                store_dir: None,
                package_name: template.npm_name.clone(),
                package_version: template.version.clone(),
            },
            None => PackageOptions {
                target_path: self.config.template_target_path(),
                store_dir: Some(self.config.template_store_dir()),
                package_name: template.npm_name.clone(),
                package_version: template.version.clone(),
            },
        };
        let mut package = Package::new(options, self.config.registry.as_deref())?;

        if !package.is_cached() {
            if !package.exists()? {
                return Err(InitError::LocalTemplateMissing(package.target_path().to_path_buf()).into());
            }
            debug!("using local template {}", package.target_path().display());
            return Ok(package);
        }

        if !package.exists()? {
            let spinner = spinner("Downloading template...");
            let installed = package.install();
            spinner.finish_and_clear();
            installed.with_context(|| format!("Failed to download {}", template.npm_name))?;
            if package.exists()? {
                success("Template downloaded");
            }
        } else {
            let spinner = spinner("Updating template...");
            let updated = package.update();
            spinner.finish_and_clear();
            updated.with_context(|| format!("Failed to update {}", template.npm_name))?;
            success("Template updated");
        }
        debug!(
            "template {}@{} at {}",
            package.package_name(),
            package.package_version(),
            package.package_dir().display()
        );
        Ok(package)
    }

    /// Copy the template into the working directory and run its scripts.
    pub fn install_template(&self, package: &Package) -> Result<()> {
        let template_dir = package.package_dir().join(TEMPLATE_DIR);
        if !template_dir.is_dir() {
            return Err(InitError::TemplateDirMissing(template_dir).into());
        }

        let work_dir = self.config.work_dir();
        let spinner = spinner("Installing template...");
        let copied = copy_dir(&template_dir, work_dir);
        spinner.finish_and_clear();
        let copied = copied.with_context(|| {
            format!(
                "Failed to copy {} into {}",
                template_dir.display(),
                work_dir.display()
            )
        })?;
        debug!("copied {} file(s)", copied);
        success("Template installed");

        run_script(&self.config.install_command, work_dir)?;
        run_script(&self.config.start_command, work_dir)?;
        Ok(())
    }
}

// ============================================================================
// Filesystem helpers
// ============================================================================

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

pub fn is_dir_empty(dir: &Path) -> Result<bool> {
    let mut entries =
        std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?;
    Ok(entries.next().is_none())
}

/// Delete everything inside `dir`, keeping `dir` itself.
pub fn empty_dir(dir: &Path) -> Result<()> {
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        let removed = if path.is_dir() && !path.is_symlink() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        removed.with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Recursively copy the contents of `from` into `to`, overwriting files that
/// exist in both. Returns the number of files copied.
pub fn copy_dir(from: &Path, to: &Path) -> Result<usize> {
    std::fs::create_dir_all(to).with_context(|| format!("Failed to create {}", to.display()))?;

    let mut copied = 0;
    for entry in WalkDir::new(from).min_depth(1) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(from)?;
        let dest = to.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest)
                .with_context(|| format!("Failed to create {}", dest.display()))?;
        } else {
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::copy(entry.path(), &dest)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
            copied += 1;
        }
    }
    Ok(copied)
}
