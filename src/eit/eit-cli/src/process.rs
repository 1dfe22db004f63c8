//! Running the template's install and start scripts.

use crate::error::InitError;
use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// A program and its arguments, e.g. `npm install`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ScriptCommand {
    /// Split a command line on whitespace. `None` for a blank line.
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(Self {
            program,
            args: words.collect(),
        })
    }

    fn command(&self) -> Command {
        if cfg!(windows) {
            // npm and friends are .cmd shims on Windows
            let mut cmd = Command::new("cmd");
            cmd.arg("/c").arg(&self.program).args(&self.args);
            cmd
        } else {
            let mut cmd = Command::new(&self.program);
            cmd.args(&self.args);
            cmd
        }
    }
}

impl fmt::Display for ScriptCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Run `script` in `cwd` with the terminal attached and wait for it.
///
/// A spawn failure or a non-zero exit is an error.
pub fn run_script(script: &ScriptCommand, cwd: &Path) -> Result<(), InitError> {
    debug!("running `{}` in {}", script, cwd.display());
    let status = script
        .command()
        .current_dir(cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|source| InitError::Spawn {
            command: script.to_string(),
            source,
        })?;

    if !status.success() {
        return Err(InitError::Process {
            command: script.to_string(),
            code: status.code(),
        });
    }
    Ok(())
}
