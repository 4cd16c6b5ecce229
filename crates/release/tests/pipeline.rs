//! End-to-end publish scenarios against scripted collaborators.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use brewship_release::{
    ArchSet, CommandOutput, Error, FormulaDescriptor, FormulaRecord,
    FormulaTarget, PublishOptions, PublishOrchestrator, ReleaseHost, ReleaseRequest, Result,
    ScriptedRunner, TestDirective, VersionDirective, VersionPart,
};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[derive(Default)]
struct FakeHost {
    missing_cli: bool,
    latest: Option<String>,
    drop_urls: bool,
    uploads: RefCell<Vec<(String, String, Vec<PathBuf>)>>,
}

impl ReleaseHost for FakeHost {
    fn name(&self) -> &'static str {
        "FakeHost"
    }

    fn check_prerequisites(&self) -> Result<()> {
        if self.missing_cli {
            Err(Error::missing_cli("gh", "brew install gh"))
        } else {
            Ok(())
        }
    }

    fn latest_version(&self, _project_path: &Path) -> Result<Option<String>> {
        Ok(self.latest.clone())
    }

    fn upload(&self, request: &ReleaseRequest<'_>) -> Result<Vec<String>> {
        self.uploads.borrow_mut().push((
            request.version.to_string(),
            request.notes.to_string(),
            request.archives.to_vec(),
        ));
        if self.drop_urls {
            return Ok(Vec::new());
        }
        Ok(request
            .archives
            .iter()
            .map(|archive| {
                format!(
                    "https://github.com/me/app/releases/download/{}/{}",
                    request.version,
                    archive.file_name().unwrap().to_string_lossy()
                )
            })
            .collect())
    }
}

struct FakeTap {
    record: FormulaRecord,
    published: RefCell<Option<(String, Option<String>)>>,
}

impl FakeTap {
    fn new(record: FormulaRecord) -> Self {
        Self {
            record,
            published: RefCell::new(None),
        }
    }
}

impl FormulaTarget for FakeTap {
    fn record(&self) -> Result<FormulaRecord> {
        Ok(self.record.clone())
    }

    fn publish(
        &self,
        record: &FormulaRecord,
        content: &str,
        commit_message: Option<&str>,
    ) -> Result<PathBuf> {
        *self.published.borrow_mut() =
            Some((content.to_string(), commit_message.map(str::to_string)));
        Ok(PathBuf::from("/tap/Formula").join(record.descriptor.file_name()))
    }
}

fn app_record() -> FormulaRecord {
    FormulaRecord::new(
        FormulaDescriptor::new("App")
            .with_desc("An app")
            .with_homepage("https://github.com/me/app")
            .with_license("MIT"),
    )
}

fn scripted() -> ScriptedRunner {
    ScriptedRunner::new()
        .on(
            "shasum -a 256 /work/App/.build/arm64",
            CommandOutput::success("aaa111  App-arm64.tar.gz\n"),
        )
        .on(
            "shasum -a 256 /work/App/.build/x86_64",
            CommandOutput::success("bbb222  App-x86_64.tar.gz\n"),
        )
}

fn options(directive: VersionDirective) -> PublishOptions {
    PublishOptions::new("/work/App", directive).with_verify_checksums(false)
}

#[test]
fn test_universal_publish_end_to_end() {
    let runner = scripted();
    let host = FakeHost::default();
    let tap = FakeTap::new(
        app_record()
            .with_previous_version("v1.2.3")
            .with_test(Some(TestDirective::Default)),
    );
    let orchestrator = PublishOrchestrator::new(&runner, &host, &tap);

    let bundle = orchestrator
        .publish(&options(VersionDirective::Increment(VersionPart::Patch)))
        .unwrap();

    assert_eq!(bundle.version, "v1.2.4");
    assert_eq!(bundle.install_name, "App");
    assert_eq!(bundle.archives.len(), 2);
    assert_eq!(bundle.archives[0].sha256, "aaa111");
    assert_eq!(bundle.archives[1].sha256, "bbb222");
    assert_eq!(bundle.formula_path, PathBuf::from("/tap/Formula/App.rb"));

    let lines = runner.command_lines();
    let position = |prefix: &str| lines.iter().position(|l| l.starts_with(prefix)).unwrap();
    assert_eq!(lines[0], "git status --porcelain");
    assert!(position("swift package clean") < position("swift build -c release --arch arm64"));
    assert!(
        position("swift build -c release --arch arm64")
            < position("swift build -c release --arch x86_64")
    );
    assert!(position("swift build -c release --arch x86_64") < position("swift test"));
    assert!(position("swift test") < position("tar -czf App-arm64.tar.gz App"));
    assert_eq!(runner.count("strip -S"), 2);
    assert_eq!(runner.count("tar -czf"), 2);

    let uploads = host.uploads.borrow();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0, "v1.2.4");
    assert_eq!(uploads[0].1, "Release v1.2.4");
    assert!(uploads[0].2[0].ends_with("App-arm64.tar.gz"));
    assert!(uploads[0].2[1].ends_with("App-x86_64.tar.gz"));

    let published = tap.published.borrow();
    let (formula, message) = published.as_ref().unwrap();
    assert_eq!(formula, &bundle.formula);
    assert_eq!(message.as_deref(), Some("Update App to 1.2.4"));
    assert!(formula.starts_with("class App < Formula\n"));
    assert!(formula.contains("  version \"1.2.4\"\n"));
    assert!(formula.contains(
        "    on_arm do\n      url \"https://github.com/me/app/releases/download/v1.2.4/App-arm64.tar.gz\"\n      sha256 \"aaa111\"\n"
    ));
    assert!(formula.contains(
        "    on_intel do\n      url \"https://github.com/me/app/releases/download/v1.2.4/App-x86_64.tar.gz\"\n      sha256 \"bbb222\"\n"
    ));
}

#[test]
fn test_increment_without_history_builds_nothing() {
    let runner = scripted();
    let host = FakeHost::default();
    let tap = FakeTap::new(app_record());
    let orchestrator = PublishOrchestrator::new(&runner, &host, &tap);

    let err = orchestrator
        .publish(&options(VersionDirective::Increment(VersionPart::Minor)))
        .unwrap_err();

    assert!(matches!(err, Error::NoPreviousVersionToIncrement));
    assert_eq!(runner.count("swift"), 0);
    assert_eq!(runner.count("tar"), 0);
    assert!(host.uploads.borrow().is_empty());
    assert!(tap.published.borrow().is_none());
}

#[test]
fn test_increment_falls_back_to_latest_release() {
    let runner = scripted();
    let host = FakeHost {
        latest: Some("v0.9.0".to_string()),
        ..FakeHost::default()
    };
    let tap = FakeTap::new(app_record());
    let orchestrator = PublishOrchestrator::new(&runner, &host, &tap);

    let bundle = orchestrator
        .publish(&options(VersionDirective::Increment(VersionPart::Minor)))
        .unwrap();
    assert_eq!(bundle.version, "v0.10.0");
}

#[test]
fn test_invalid_explicit_version_builds_nothing() {
    let runner = scripted();
    let host = FakeHost::default();
    let tap = FakeTap::new(app_record());
    let orchestrator = PublishOrchestrator::new(&runner, &host, &tap);

    let err = orchestrator
        .publish(&options(VersionDirective::Explicit("1.0".to_string())))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidVersionNumber { .. }));
    assert_eq!(runner.count("swift"), 0);
}

#[test]
fn test_uncommitted_changes_abort_before_build() {
    let runner = scripted().on(
        "git status --porcelain",
        CommandOutput::success(" M Sources/App/App.swift\n"),
    );
    let host = FakeHost::default();
    let tap = FakeTap::new(app_record());
    let orchestrator = PublishOrchestrator::new(&runner, &host, &tap);

    let err = orchestrator
        .publish(&options(VersionDirective::Explicit("1.0.0".to_string())))
        .unwrap_err();

    match err {
        Error::UncommittedChanges { summary } => {
            assert_eq!(summary, " M Sources/App/App.swift");
        }
        other => panic!("expected UncommittedChanges, got {other:?}"),
    }
    assert_eq!(runner.calls().len(), 1);
}

#[test]
fn test_missing_hosting_cli_aborts_first() {
    let runner = scripted();
    let host = FakeHost {
        missing_cli: true,
        ..FakeHost::default()
    };
    let tap = FakeTap::new(app_record());
    let orchestrator = PublishOrchestrator::new(&runner, &host, &tap);

    let err = orchestrator
        .publish(&options(VersionDirective::Explicit("1.0.0".to_string())))
        .unwrap_err();
    assert!(matches!(err, Error::MissingHostingCli { .. }));
    assert!(runner.calls().is_empty());
}

#[test]
fn test_recorded_build_args_reach_every_compile() {
    let runner = scripted();
    let host = FakeHost::default();
    let tap = FakeTap::new(
        app_record().with_extra_build_args(vec!["-Xswiftc".to_string(), "-DPRO".to_string()]),
    );
    let orchestrator = PublishOrchestrator::new(&runner, &host, &tap);

    orchestrator
        .publish(&options(VersionDirective::Explicit("2.0.0".to_string())))
        .unwrap();

    let compiles: Vec<_> = runner
        .command_lines()
        .into_iter()
        .filter(|l| l.starts_with("swift build"))
        .collect();
    assert_eq!(compiles.len(), 2);
    assert!(compiles.iter().all(|l| l.ends_with("-Xswiftc -DPRO")));
}

#[test]
fn test_single_arch_renders_single_formula() {
    let runner = scripted();
    let host = FakeHost::default();
    let tap = FakeTap::new(app_record());
    let orchestrator = PublishOrchestrator::new(&runner, &host, &tap);

    let bundle = orchestrator
        .publish(
            &options(VersionDirective::Explicit("v3.0.0".to_string()))
                .with_arch_set(ArchSet::Arm64)
                .with_skip_clean(true)
                .with_notes(Some("Bug fixes".to_string())),
        )
        .unwrap();

    assert_eq!(bundle.archives.len(), 1);
    assert_eq!(bundle.archives[0].archive_name(), "App-arm64.tar.gz");
    assert_eq!(runner.count("swift package clean"), 0);
    assert_eq!(runner.count("swift build -c release --arch x86_64"), 0);
    assert_eq!(host.uploads.borrow()[0].1, "Bug fixes");

    assert!(!bundle.formula.contains("on_macos"));
    assert!(bundle.formula.contains(
        "  url \"https://github.com/me/app/releases/download/v3.0.0/App-arm64.tar.gz\"\n  sha256 \"aaa111\"\n  version \"3.0.0\"\n"
    ));
}

#[test]
fn test_test_failure_stops_before_archiving() {
    let runner = scripted().on("swift test", CommandOutput::failure(1, "XCTAssert failed"));
    let host = FakeHost::default();
    let tap = FakeTap::new(app_record().with_test(Some(TestDirective::Default)));
    let orchestrator = PublishOrchestrator::new(&runner, &host, &tap);

    let err = orchestrator
        .publish(&options(VersionDirective::Explicit("1.0.0".to_string())))
        .unwrap_err();
    assert!(matches!(err, Error::TestFailure { .. }));
    assert_eq!(runner.count("tar"), 0);
    assert!(host.uploads.borrow().is_empty());

    let runner = scripted().on("swift test", CommandOutput::failure(1, "XCTAssert failed"));
    let orchestrator = PublishOrchestrator::new(&runner, &host, &tap);
    orchestrator
        .publish(&options(VersionDirective::Explicit("1.0.0".to_string())).with_skip_tests(true))
        .unwrap();
    assert_eq!(runner.count("swift test"), 0);
}

#[test]
fn test_missing_upload_urls_are_rejected() {
    let runner = scripted();
    let host = FakeHost {
        drop_urls: true,
        ..FakeHost::default()
    };
    let tap = FakeTap::new(app_record());
    let orchestrator = PublishOrchestrator::new(&runner, &host, &tap);

    let err = orchestrator
        .publish(&options(VersionDirective::Explicit("1.0.0".to_string())))
        .unwrap_err();
    assert!(matches!(err, Error::Backend { .. }));
    assert!(tap.published.borrow().is_none());
}

#[test]
fn test_formula_commit_can_be_disabled() {
    let runner = scripted();
    let host = FakeHost::default();
    let tap = FakeTap::new(app_record());
    let orchestrator = PublishOrchestrator::new(&runner, &host, &tap);

    orchestrator
        .publish(
            &options(VersionDirective::Explicit("1.0.0".to_string())).with_commit_formula(false),
        )
        .unwrap();
    let published = tap.published.borrow();
    assert!(published.as_ref().unwrap().1.is_none());
}

#[test]
fn test_plan_runs_no_build_commands() {
    let runner = scripted();
    let host = FakeHost::default();
    let tap = FakeTap::new(app_record().with_previous_version("v1.0.0"));
    let orchestrator = PublishOrchestrator::new(&runner, &host, &tap);

    let plan = orchestrator
        .plan(&options(VersionDirective::Increment(VersionPart::Major)))
        .unwrap();

    assert_eq!(plan.version, "v2.0.0");
    assert_eq!(plan.previous_version.as_deref(), Some("v1.0.0"));
    assert_eq!(plan.steps.len(), 5);
    assert_eq!(
        plan.archive_names,
        vec!["App-arm64.tar.gz", "App-x86_64.tar.gz"]
    );
    assert_eq!(plan.formula_file, "App.rb");
    assert_eq!(runner.command_lines(), vec!["git status --porcelain"]);
}

#[test]
fn test_version_marker_is_rewritten_and_committed() {
    let temp = TempDir::new().unwrap();
    let sources = temp.path().join("Sources/App");
    std::fs::create_dir_all(&sources).unwrap();
    std::fs::write(
        sources.join("App.swift"),
        "@main\nstruct App {\n    static let configuration = CommandConfiguration(version: \"1.0.0\")\n}\n",
    )
    .unwrap();

    let runner = ScriptedRunner::new().on("shasum", CommandOutput::success("ccc333  x.tar.gz"));
    let host = FakeHost::default();
    let tap = FakeTap::new(app_record());
    let orchestrator = PublishOrchestrator::new(&runner, &host, &tap);

    let options = PublishOptions::new(temp.path(), VersionDirective::Explicit("1.1.0".to_string()))
        .with_arch_set(ArchSet::Arm64)
        .with_verify_checksums(false)
        .with_version_marker_update(true);
    let bundle = orchestrator.publish(&options).unwrap();

    let content = std::fs::read_to_string(sources.join("App.swift")).unwrap();
    assert!(content.contains("CommandConfiguration(version: \"1.1.0\")"));
    assert!(
        runner
            .command_lines()
            .contains(&"git commit -m Update version to 1.1.0".to_string())
    );
    assert_eq!(
        bundle.formula.matches("sha256 \"ccc333\"").count(),
        1,
        "single formula expected"
    );
}

#[test]
fn test_failed_version_marker_commit_is_rolled_back() {
    let temp = TempDir::new().unwrap();
    let sources = temp.path().join("Sources/App");
    std::fs::create_dir_all(&sources).unwrap();
    let entry = "@main\nstruct App {\n    static let configuration = CommandConfiguration(version: \"1.0.0\")\n}\n";
    std::fs::write(sources.join("App.swift"), entry).unwrap();

    let runner = ScriptedRunner::new()
        .on(
            "git commit -m Update version to",
            CommandOutput::failure(1, "error: gpg failed to sign the data"),
        )
        .on("shasum", CommandOutput::success("ccc333  x.tar.gz"));
    let host = FakeHost::default();
    let tap = FakeTap::new(app_record());
    let orchestrator = PublishOrchestrator::new(&runner, &host, &tap);

    let options = PublishOptions::new(temp.path(), VersionDirective::Explicit("1.1.0".to_string()))
        .with_arch_set(ArchSet::Arm64)
        .with_verify_checksums(false)
        .with_version_marker_update(true);
    let bundle = orchestrator.publish(&options).unwrap();

    // The publish goes on, with the source file back as it was.
    assert_eq!(bundle.version, "1.1.0");
    assert_eq!(
        std::fs::read_to_string(sources.join("App.swift")).unwrap(),
        entry
    );

    let lines = runner.command_lines();
    let commit = lines
        .iter()
        .position(|line| line.starts_with("git commit -m Update version to 1.1.0"))
        .unwrap();
    assert!(lines[commit + 1].starts_with("git reset -q -- "));
    assert!(lines[commit + 1].ends_with("App.swift"));
    assert!(lines[commit + 2..].iter().any(|line| line.starts_with("swift build")));
}
