//! External process execution.
//!
//! Every external tool the pipeline touches (toolchain, `tar`, `shasum`,
//! `git`, `gh`) is invoked through the [`CommandRunner`] trait. Production
//! code uses [`SystemRunner`]; tests substitute [`ScriptedRunner`], which maps
//! command lines to canned outputs and records every invocation.

use crate::error::{Error, Result};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// A command to execute: program, arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name or path.
    pub program: String,
    /// Arguments, passed verbatim.
    pub args: Vec<String>,
    /// Working directory, inherited when `None`.
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    /// Creates a command with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Creates a `sh -c <script>` command.
    #[must_use]
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new("sh").arg("-c").arg(script)
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when killed by a signal.
    pub status: Option<i32>,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// A successful result with the given stdout.
    #[must_use]
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed result with the given exit code and stderr.
    #[must_use]
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the command exited with code 0.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == Some(0)
    }

    /// Stdout followed by stderr, trimmed.
    #[must_use]
    pub fn combined(&self) -> String {
        match (self.stdout.trim(), self.stderr.trim()) {
            ("", err) => err.to_string(),
            (out, "") => out.to_string(),
            (out, err) => format!("{out}\n{err}"),
        }
    }
}

/// Executes external commands.
pub trait CommandRunner {
    /// Runs a command to completion and captures its output.
    ///
    /// A non-zero exit status is not an error at this level; callers decide
    /// what a failure means.
    ///
    /// # Errors
    ///
    /// Returns an error if the process could not be spawned.
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;

    /// Whether `program` can be found on `PATH`.
    fn is_installed(&self, program: &str) -> bool;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        (**self).run(spec)
    }

    fn is_installed(&self, program: &str) -> bool {
        (**self).is_installed(program)
    }
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    /// Creates a new system runner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        debug!(command = %spec, cwd = ?spec.current_dir, "Running command");

        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        if let Some(dir) = &spec.current_dir {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|source| Error::Command {
            command: spec.to_string(),
            source,
        })?;

        let result = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(command = %spec, status = ?result.status, "Command finished");
        Ok(result)
    }

    fn is_installed(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// A fake runner that answers from a script.
///
/// Responses are matched by prefix against the rendered command line
/// (`program arg1 arg2 ...`); the first matching rule wins. Commands with no
/// matching rule succeed with empty output. Every invocation is recorded.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: Vec<(String, CommandOutput)>,
    installed: HashSet<String>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    /// Creates an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers commands starting with `prefix` with `output`.
    #[must_use]
    pub fn on(mut self, prefix: impl Into<String>, output: CommandOutput) -> Self {
        self.rules.push((prefix.into(), output));
        self
    }

    /// Marks a program as installed.
    #[must_use]
    pub fn with_installed(mut self, program: impl Into<String>) -> Self {
        self.installed.insert(program.into());
        self
    }

    /// All commands run so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rendered command lines run so far, in order.
    #[must_use]
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(ToString::to_string).collect()
    }

    /// Number of recorded commands whose line starts with `prefix`.
    #[must_use]
    pub fn count(&self, prefix: &str) -> usize {
        self.command_lines()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(spec.clone());

        let line = spec.to_string();
        Ok(self
            .rules
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| CommandOutput::success("")))
    }

    fn is_installed(&self, program: &str) -> bool {
        self.installed.contains(program)
    }
}

/// Runs a command and turns a non-zero exit into an error built by `on_failure`.
///
/// # Errors
///
/// Returns the spawn error, or `on_failure(command_line, combined_output)`.
pub fn run_checked<R, F>(runner: &R, spec: &CommandSpec, on_failure: F) -> Result<CommandOutput>
where
    R: CommandRunner + ?Sized,
    F: FnOnce(String, String) -> Error,
{
    let output = runner.run(spec)?;
    if output.is_success() {
        Ok(output)
    } else {
        Err(on_failure(spec.to_string(), output.combined()))
    }
}

/// Renders a path as a command argument.
pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
