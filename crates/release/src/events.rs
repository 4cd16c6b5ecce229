//! Structured progress events for the publish pipeline.
//!
//! The pipeline never prints. Progress is emitted as `tracing` events on the
//! `brewship::publish` target, each carrying an `event_type` field, so any
//! subscriber (console renderer, JSON log, test capture) can observe it.
//!
//! ```rust,ignore
//! use brewship_release::emit_build_started;
//!
//! emit_build_started!("App", "arm64");
//! ```

/// Emit a publish started event.
#[macro_export]
macro_rules! emit_publish_started {
    ($project:expr, $arch_set:expr) => {
        ::tracing::info!(
            target: "brewship::publish",
            event_type = "publish.started",
            project = %$project,
            arch_set = %$arch_set,
        )
    };
}

/// Emit a version resolved event.
#[macro_export]
macro_rules! emit_version_resolved {
    ($version:expr, $previous:expr) => {
        ::tracing::info!(
            target: "brewship::publish",
            event_type = "version.resolved",
            version = %$version,
            previous = ?$previous,
        )
    };
}

/// Emit a build started event for one architecture.
#[macro_export]
macro_rules! emit_build_started {
    ($project:expr, $arch:expr) => {
        ::tracing::info!(
            target: "brewship::publish",
            event_type = "build.started",
            project = %$project,
            arch = %$arch,
        )
    };
}

/// Emit a build completed event for one architecture.
#[macro_export]
macro_rules! emit_build_arch_completed {
    ($arch:expr, $binary:expr) => {
        ::tracing::info!(
            target: "brewship::publish",
            event_type = "build.arch_completed",
            arch = %$arch,
            binary = %$binary.display(),
        )
    };
}

/// Emit a test completed event.
#[macro_export]
macro_rules! emit_test_completed {
    ($command:expr) => {
        ::tracing::info!(
            target: "brewship::publish",
            event_type = "test.completed",
            command = %$command,
        )
    };
}

/// Emit an archive created event.
#[macro_export]
macro_rules! emit_archive_created {
    ($archive:expr, $sha256:expr) => {
        ::tracing::info!(
            target: "brewship::publish",
            event_type = "archive.created",
            archive = %$archive.display(),
            sha256 = %$sha256,
        )
    };
}

/// Emit a release uploaded event.
#[macro_export]
macro_rules! emit_release_uploaded {
    ($version:expr, $assets:expr) => {
        ::tracing::info!(
            target: "brewship::publish",
            event_type = "release.uploaded",
            version = %$version,
            assets = $assets,
        )
    };
}

/// Emit a formula rendered event.
#[macro_export]
macro_rules! emit_formula_rendered {
    ($name:expr, $layout:expr) => {
        ::tracing::info!(
            target: "brewship::publish",
            event_type = "formula.rendered",
            formula = %$name,
            layout = %$layout,
        )
    };
}

/// Emit a publish completed event.
#[macro_export]
macro_rules! emit_publish_completed {
    ($name:expr, $version:expr) => {
        ::tracing::info!(
            target: "brewship::publish",
            event_type = "publish.completed",
            formula = %$name,
            version = %$version,
        )
    };
}
