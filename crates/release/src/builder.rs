//! Multi-architecture builds.
//!
//! A build is a fixed, strictly sequential list of [`BuildStep`]s:
//!
//! 1. clean (unless skipped)
//! 2. for each architecture, arm64 first: release compile, then strip
//! 3. test (optional, once, after every architecture is built)
//!
//! The first failing step aborts the build. Output locations are derived
//! from the request alone, so callers never need to ask the toolchain where
//! a binary ended up.

use crate::arch::{ArchSet, Architecture};
use crate::error::{Error, Result};
use crate::runner::{CommandRunner, CommandSpec, path_arg, run_checked};
use crate::{emit_build_arch_completed, emit_build_started, emit_test_completed};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Optimisation flags passed to every release compile, before caller flags.
pub const RELEASE_FLAGS: &[&str] = &[
    "-Xswiftc",
    "-Osize",
    "-Xswiftc",
    "-wmo",
    "-Xlinker",
    "-dead_strip",
];

/// How the project's tests are run after building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestDirective {
    /// The toolchain's own test invocation for the package.
    Default,
    /// A caller-supplied shell command run in the project directory.
    Custom {
        /// The command line
        command: String,
        /// Append the toolchain's required test flags when missing
        amend: bool,
    },
}

/// Everything needed to build one project. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    project_name: String,
    project_path: PathBuf,
    arch_set: ArchSet,
    extra_args: Vec<String>,
    skip_clean: bool,
    test: Option<TestDirective>,
}

impl BuildRequest {
    /// Creates a universal build request with no extra flags and no tests.
    #[must_use]
    pub fn new(project_name: impl Into<String>, project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_name: project_name.into(),
            project_path: project_path.into(),
            arch_set: ArchSet::Universal,
            extra_args: Vec::new(),
            skip_clean: false,
            test: None,
        }
    }

    /// Sets the architecture set.
    #[must_use]
    pub const fn with_arch_set(mut self, arch_set: ArchSet) -> Self {
        self.arch_set = arch_set;
        self
    }

    /// Sets extra build flags, appended after the release flags.
    #[must_use]
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Skips the clean step.
    #[must_use]
    pub const fn with_skip_clean(mut self, skip: bool) -> Self {
        self.skip_clean = skip;
        self
    }

    /// Sets the test directive.
    #[must_use]
    pub fn with_test(mut self, test: Option<TestDirective>) -> Self {
        self.test = test;
        self
    }

    /// Project (and binary) name.
    #[must_use]
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Project root.
    #[must_use]
    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    /// Requested architectures.
    #[must_use]
    pub const fn arch_set(&self) -> ArchSet {
        self.arch_set
    }

    /// Extra build flags.
    #[must_use]
    pub fn extra_args(&self) -> &[String] {
        &self.extra_args
    }

    /// Whether cleaning is skipped.
    #[must_use]
    pub const fn skip_clean(&self) -> bool {
        self.skip_clean
    }

    /// Test directive, if tests are run.
    #[must_use]
    pub const fn test(&self) -> Option<&TestDirective> {
        self.test.as_ref()
    }
}

/// Toolchain invocation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Compiler executable.
    pub tool: String,
    /// Strip executable.
    pub strip: String,
    /// Build output root, relative to the project path.
    pub build_root: PathBuf,
    /// Flags appended to custom test commands when `amend` is set.
    pub required_test_flags: Vec<String>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            tool: "swift".to_string(),
            strip: "strip".to_string(),
            build_root: PathBuf::from(".build"),
            required_test_flags: vec!["-quiet".to_string()],
        }
    }
}

impl Toolchain {
    /// Deterministic location of a built binary:
    /// `<project>/<build_root>/<triple>/release/<name>`.
    #[must_use]
    pub fn binary_path(&self, request: &BuildRequest, arch: Architecture) -> PathBuf {
        request
            .project_path
            .join(&self.build_root)
            .join(arch.triple())
            .join("release")
            .join(&request.project_name)
    }

    fn clean_command(&self, request: &BuildRequest) -> CommandSpec {
        CommandSpec::new(&self.tool)
            .args(["package", "clean", "--package-path"])
            .arg(path_arg(&request.project_path))
    }

    fn compile_command(&self, request: &BuildRequest, arch: Architecture) -> CommandSpec {
        CommandSpec::new(&self.tool)
            .args(["build", "-c", "release", "--arch", arch.name()])
            .args(RELEASE_FLAGS.iter().copied())
            .arg("--package-path")
            .arg(path_arg(&request.project_path))
            .args(request.extra_args.iter().cloned())
    }

    fn strip_command(&self, request: &BuildRequest, arch: Architecture) -> CommandSpec {
        CommandSpec::new(&self.strip)
            .arg("-S")
            .arg(path_arg(&self.binary_path(request, arch)))
    }

    fn test_command(&self, request: &BuildRequest, directive: &TestDirective) -> CommandSpec {
        match directive {
            TestDirective::Default => CommandSpec::new(&self.tool)
                .args(["test", "--package-path"])
                .arg(path_arg(&request.project_path)),
            TestDirective::Custom { command, amend } => {
                let script = if *amend {
                    amend_test_command(command, &self.required_test_flags)
                } else {
                    command.clone()
                };
                CommandSpec::shell(script).current_dir(&request.project_path)
            }
        }
    }
}

/// Appends each required flag not already present as a whole token.
#[must_use]
pub fn amend_test_command(command: &str, required: &[String]) -> String {
    let mut amended = command.trim_end().to_string();
    for flag in required {
        if !command.split_whitespace().any(|token| token == flag) {
            amended.push(' ');
            amended.push_str(flag);
        }
    }
    amended
}

/// What a build step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Remove previous build products.
    Clean,
    /// Release compile for one architecture.
    Compile(Architecture),
    /// Strip debug symbols from one architecture's binary.
    Strip(Architecture),
    /// Run the test command.
    Test,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => write!(f, "clean"),
            Self::Compile(arch) => write!(f, "build {arch}"),
            Self::Strip(arch) => write!(f, "strip {arch}"),
            Self::Test => write!(f, "test"),
        }
    }
}

/// One command in a build plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStep {
    /// Step kind.
    pub kind: StepKind,
    /// The command run for it.
    pub command: CommandSpec,
}

/// Where the built binaries are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryOutput {
    /// Exactly one architecture was built.
    Single(PathBuf),
    /// More than one architecture was built.
    Multiple(BTreeMap<Architecture, PathBuf>),
}

impl BinaryOutput {
    /// Binary paths in architecture order.
    #[must_use]
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            Self::Single(path) => vec![path.as_path()],
            Self::Multiple(map) => map.values().map(PathBuf::as_path).collect(),
        }
    }

    /// Number of binaries.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multiple(map) => map.len(),
        }
    }

    /// Whether there are no binaries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Drives the toolchain for every requested architecture.
pub struct MultiArchBuilder<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    toolchain: Toolchain,
}

impl<'a, R: CommandRunner + ?Sized> MultiArchBuilder<'a, R> {
    /// Creates a builder using the default toolchain.
    #[must_use]
    pub fn new(runner: &'a R) -> Self {
        Self {
            runner,
            toolchain: Toolchain::default(),
        }
    }

    /// Replaces the toolchain settings.
    #[must_use]
    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain;
        self
    }

    /// The toolchain settings.
    #[must_use]
    pub const fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// The ordered steps a build of `request` runs.
    #[must_use]
    pub fn plan(&self, request: &BuildRequest) -> Vec<BuildStep> {
        let mut steps = Vec::new();

        if !request.skip_clean {
            steps.push(BuildStep {
                kind: StepKind::Clean,
                command: self.toolchain.clean_command(request),
            });
        }

        for &arch in request.arch_set.architectures() {
            steps.push(BuildStep {
                kind: StepKind::Compile(arch),
                command: self.toolchain.compile_command(request, arch),
            });
            steps.push(BuildStep {
                kind: StepKind::Strip(arch),
                command: self.toolchain.strip_command(request, arch),
            });
        }

        if let Some(directive) = &request.test {
            steps.push(BuildStep {
                kind: StepKind::Test,
                command: self.toolchain.test_command(request, directive),
            });
        }

        steps
    }

    /// Runs the build and returns the binary locations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BuildFailure`] if cleaning, compiling or stripping
    /// fails, and [`Error::TestFailure`] if the test command fails. No
    /// further steps run after a failure.
    pub fn build(&self, request: &BuildRequest) -> Result<BinaryOutput> {
        info!(
            project = %request.project_name,
            arch_set = %request.arch_set,
            skip_clean = request.skip_clean,
            "Building release binaries"
        );

        for step in self.plan(request) {
            debug!(step = %step.kind, command = %step.command, "Build step");
            match step.kind {
                StepKind::Test => {
                    run_checked(self.runner, &step.command, Error::test_failure)?;
                    emit_test_completed!(step.command);
                }
                StepKind::Compile(arch) => {
                    emit_build_started!(request.project_name, arch);
                    run_checked(self.runner, &step.command, Error::build_failure)?;
                }
                StepKind::Strip(arch) => {
                    run_checked(self.runner, &step.command, Error::build_failure)?;
                    emit_build_arch_completed!(arch, self.toolchain.binary_path(request, arch));
                }
                StepKind::Clean => {
                    run_checked(self.runner, &step.command, Error::build_failure)?;
                }
            }
        }

        Ok(self.output_for(request))
    }

    /// The binary locations a successful build of `request` produces.
    #[must_use]
    pub fn output_for(&self, request: &BuildRequest) -> BinaryOutput {
        match request.arch_set.architectures() {
            [arch] => BinaryOutput::Single(self.toolchain.binary_path(request, *arch)),
            archs => BinaryOutput::Multiple(
                archs
                    .iter()
                    .map(|&arch| (arch, self.toolchain.binary_path(request, arch)))
                    .collect(),
            ),
        }
    }
}
