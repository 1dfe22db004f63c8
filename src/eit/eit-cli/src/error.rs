use std::path::PathBuf;

/// Failures specific to the `init` flow.
///
/// Everything else reaches the caller as a contextualized `anyhow::Error`.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("no project templates are available")]
    NoTemplates,

    #[error("template '{0}' is not in the template list")]
    TemplateNotFound(String),

    #[error("the user home directory does not exist")]
    HomeNotFound,

    #[error("local template package {} does not exist", .0.display())]
    LocalTemplateMissing(PathBuf),

    #[error("template package has no template directory at {}", .0.display())]
    TemplateDirMissing(PathBuf),

    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` {}", exit_description(.code))]
    Process { command: String, code: Option<i32> },
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}
