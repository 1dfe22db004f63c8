//! Integration tests for the `init` flow.
//!
//! Answers come from a scripted prompter. The template service and the npm
//! registry are mocked; the install and start scripts are `true`/`false` so
//! only their exit status matters.

#![cfg(unix)]

use eit_cli::config::{
    Config, ENV_INSTALL_COMMAND, ENV_REGISTRY, ENV_START_COMMAND, ENV_TEMPLATES_URL,
};
use eit_cli::error::InitError;
use eit_cli::init::InitCommand;
use eit_cli::prompt::Prompter;
use eit_cli::templates::ProjectTemplate;
use eit_package::cache_location;
use flate2::Compression;
use flate2::write::GzEncoder;
use mockito::{Server, ServerGuard};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

const TEMPLATE_PACKAGE: &str = "@eit-tool/react-template";
const ESCAPED_TEMPLATE_PACKAGE: &str = "@eit-tool%2freact-template";

#[derive(Default)]
struct ScriptedPrompter {
    confirms: VecDeque<bool>,
    selects: VecDeque<usize>,
    inputs: VecDeque<&'static str>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    fn project(name: &'static str, version: &'static str) -> Self {
        Self {
            selects: VecDeque::from([0, 0]),
            inputs: VecDeque::from([name, version]),
            ..Self::default()
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, message: &str, _default: bool) -> anyhow::Result<bool> {
        self.asked.push(message.to_string());
        Ok(self.confirms.pop_front().expect("unexpected confirm"))
    }

    fn select(&mut self, message: &str, items: &[String], _default: usize) -> anyhow::Result<usize> {
        self.asked.push(message.to_string());
        let choice = self.selects.pop_front().expect("unexpected select");
        assert!(choice < items.len(), "{message}: {choice} out of {items:?}");
        Ok(choice)
    }

    fn input(
        &mut self,
        message: &str,
        default: Option<&str>,
        validate: &dyn Fn(&str) -> Result<(), String>,
    ) -> anyhow::Result<String> {
        self.asked.push(message.to_string());
        let answer = self.inputs.pop_front().expect("unexpected input");
        let answer = match (answer, default) {
            ("", Some(default)) => default.to_string(),
            (answer, _) => answer.to_string(),
        };
        validate(&answer).map_err(anyhow::Error::msg)?;
        Ok(answer)
    }
}

fn fixtures_dir() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests/fixtures")
}

fn config(
    home: &Path,
    work_dir: &Path,
    target_path: Option<PathBuf>,
    vars: &[(&str, String)],
) -> Config {
    let env: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    Config::from_sources(
        Some(home.to_path_buf()),
        move |key: &str| env.get(key).cloned(),
        work_dir.to_path_buf(),
        target_path,
    )
    .unwrap()
}

fn scripts(install: &str, start: &str) -> Vec<(&'static str, String)> {
    vec![
        (ENV_INSTALL_COMMAND, install.to_string()),
        (ENV_START_COMMAND, start.to_string()),
    ]
}

fn template(version: &str) -> ProjectTemplate {
    ProjectTemplate {
        name: "React app".to_string(),
        npm_name: TEMPLATE_PACKAGE.to_string(),
        version: version.to_string(),
    }
}

fn npm_tarball(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, format!("package/{path}"), contents.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Version document plus tarball for `version` of the template package.
fn mock_template_version(server: &mut ServerGuard, version: &str) -> (mockito::Mock, mockito::Mock) {
    let tarball_path = format!("/tarballs/react-template-{version}.tgz");
    let document = server
        .mock("GET", format!("/{ESCAPED_TEMPLATE_PACKAGE}/{version}").as_str())
        .with_status(200)
        .with_body(format!(
            r#"{{"name": "{TEMPLATE_PACKAGE}", "version": "{version}", "dist": {{"tarball": "{}{}"}}}}"#,
            server.url(),
            tarball_path
        ))
        .create();
    let tarball = server
        .mock("GET", tarball_path.as_str())
        .with_status(200)
        .with_body(npm_tarball(&[
            ("package.json", r#"{"name": "@eit-tool/react-template", "main": "index.js"}"#),
            ("template/package.json", r#"{"name": "app"}"#),
            ("template/src/App.jsx", "export default function App() {}"),
        ]))
        .create();
    (document, tarball)
}

#[test]
fn creates_project_from_registry_template() {
    let mut server = Server::new();
    let home = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();

    let templates = server
        .mock("GET", "/templates")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"[{{"name": "React app", "npmName": "{TEMPLATE_PACKAGE}", "version": "1.0.0"}}]"#
        ))
        .create();
    let (document, tarball) = mock_template_version(&mut server, "1.0.0");

    let mut vars = scripts("true", "true");
    vars.push((ENV_TEMPLATES_URL, format!("{}/templates", server.url())));
    vars.push((ENV_REGISTRY, server.url()));
    let config = config(home.path(), work.path(), None, &vars);

    let mut prompter = ScriptedPrompter::project("my-app", "v2.0.0");
    InitCommand::new(None, false, config).run(&mut prompter).unwrap();

    templates.assert();
    document.assert();
    tarball.assert();
    assert_eq!(
        prompter.asked,
        [
            "Select the initialization type",
            "Enter the project name",
            "Enter the project version",
            "Select the project template",
        ]
    );

    let cached = cache_location(
        &home.path().join(".eit-tool/template/node_modules"),
        TEMPLATE_PACKAGE,
        "1.0.0",
    );
    assert!(cached.join("package.json").is_file());
    assert_eq!(
        fs::read_to_string(work.path().join("src/App.jsx")).unwrap(),
        "export default function App() {}"
    );
    assert!(work.path().join("package.json").is_file());
}

#[test]
fn cached_template_is_updated_not_downloaded_again() {
    let mut server = Server::new();
    let home = tempfile::tempdir().unwrap();
    let (_document, tarball) = mock_template_version(&mut server, "1.0.0");
    let listing = server
        .mock("GET", format!("/{TEMPLATE_PACKAGE}").as_str())
        .with_status(200)
        .with_body(format!(
            r#"{{"name": "{TEMPLATE_PACKAGE}", "versions": {{"0.9.0": {{}}, "1.0.0": {{}}}}}}"#
        ))
        .create();

    let mut vars = scripts("true", "true");
    vars.push((ENV_REGISTRY, server.url()));
    let templates = [template("1.0.0")];

    for _ in 0..2 {
        let work = tempfile::tempdir().unwrap();
        let config = config(home.path(), work.path(), None, &vars);
        let mut prompter = ScriptedPrompter::project("my-app", "");
        InitCommand::new(None, false, config)
            .run_with_templates(&templates, &mut prompter)
            .unwrap();
        assert!(work.path().join("src/App.jsx").is_file());
    }

    // first run installs, second run only asks the registry for versions
    tarball.assert();
    listing.assert();
}

#[test]
fn uses_local_template_package() {
    let home = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let local = fixtures_dir().join("templates/local-template");
    let config = config(
        home.path(),
        work.path(),
        Some(local),
        &scripts("true", "true"),
    );

    // the given project name is valid, so its prompt is answered with the default
    let mut prompter = ScriptedPrompter::project("", "");
    InitCommand::new(Some("local-app".to_string()), false, config)
        .run_with_templates(&[template("1.0.0")], &mut prompter)
        .unwrap();

    assert_eq!(
        fs::read_to_string(work.path().join("src/main.js")).unwrap().trim(),
        r#"console.log("hello from eit");"#
    );
    // nothing was installed into the cache
    assert!(!home.path().join(".eit-tool/template/node_modules").exists());
}

#[test]
fn failing_install_script_is_reported() {
    let home = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let local = fixtures_dir().join("templates/local-template");
    let config = config(
        home.path(),
        work.path(),
        Some(local),
        &scripts("false", "true"),
    );

    let mut prompter = ScriptedPrompter::project("my-app", "1.0.0");
    let err = InitCommand::new(None, false, config)
        .run_with_templates(&[template("1.0.0")], &mut prompter)
        .unwrap_err();

    match err.downcast_ref::<InitError>() {
        Some(InitError::Process { command, code }) => {
            assert_eq!(command, "false");
            assert_eq!(*code, Some(1));
        }
        other => panic!("unexpected error: {other:?} ({err:#})"),
    }
    // the template was copied before the script ran
    assert!(work.path().join("package.json").is_file());
}

#[test]
fn missing_local_template_is_an_error() {
    let home = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let config = config(
        home.path(),
        work.path(),
        Some(home.path().join("nowhere")),
        &scripts("true", "true"),
    );

    let mut prompter = ScriptedPrompter::project("my-app", "1.0.0");
    let err = InitCommand::new(None, false, config)
        .run_with_templates(&[template("1.0.0")], &mut prompter)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<InitError>(),
        Some(InitError::LocalTemplateMissing(_))
    ));
}

#[test]
fn no_templates_is_an_error() {
    let home = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let config = config(home.path(), work.path(), None, &scripts("true", "true"));

    let err = InitCommand::new(None, false, config)
        .run_with_templates(&[], &mut ScriptedPrompter::default())
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<InitError>(),
        Some(InitError::NoTemplates)
    ));
}

#[test]
fn declining_in_non_empty_directory_changes_nothing() {
    let home = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    fs::write(work.path().join("keep.txt"), "mine").unwrap();
    let config = config(home.path(), work.path(), None, &scripts("true", "true"));

    let mut prompter = ScriptedPrompter {
        confirms: VecDeque::from([false]),
        ..ScriptedPrompter::default()
    };
    InitCommand::new(None, false, config)
        .run_with_templates(&[template("1.0.0")], &mut prompter)
        .unwrap();

    assert_eq!(prompter.asked.len(), 1);
    assert_eq!(fs::read_to_string(work.path().join("keep.txt")).unwrap(), "mine");
}

#[test]
fn force_skips_first_confirmation_and_empties_directory() {
    let home = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    fs::create_dir_all(work.path().join("old/nested")).unwrap();
    fs::write(work.path().join("old/nested/file.txt"), "stale").unwrap();
    let local = fixtures_dir().join("templates/local-template");
    let config = config(
        home.path(),
        work.path(),
        Some(local),
        &scripts("true", "true"),
    );

    let mut prompter = ScriptedPrompter::project("my-app", "1.0.0");
    prompter.confirms = VecDeque::from([true]);
    InitCommand::new(None, true, config)
        .run_with_templates(&[template("1.0.0")], &mut prompter)
        .unwrap();

    assert_eq!(prompter.asked[0], "Delete every file in the current directory?");
    assert!(!work.path().join("old").exists());
    assert!(work.path().join("src/main.js").is_file());
}

#[test]
fn choosing_component_stops_without_output() {
    let home = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let config = config(home.path(), work.path(), None, &scripts("true", "true"));

    let mut prompter = ScriptedPrompter {
        selects: VecDeque::from([1]),
        ..ScriptedPrompter::default()
    };
    InitCommand::new(None, false, config)
        .run_with_templates(&[template("1.0.0")], &mut prompter)
        .unwrap();

    assert_eq!(prompter.asked, ["Select the initialization type"]);
    assert_eq!(fs::read_dir(work.path()).unwrap().count(), 0);
}
