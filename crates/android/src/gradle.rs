//! Gradle build system integration
//!
//! Maps resolved variants onto Gradle task names and output paths, and runs
//! the Gradle wrapper. Packaging and signing themselves stay with Gradle.

use crate::resolver::ResolvedConfig;
use crate::variant::Variant;
use serde::{Deserialize, Serialize};
use smartone_core::error::{Error, Result};
use smartone_core::process::{
    run_command_in_dir, run_command_streaming_in_dir, which_command, CommandResult,
};
use std::path::{Path, PathBuf};

/// Gradle module holding the app
pub const APP_MODULE: &str = "app";

/// Kind of distributable artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Installable APK (`assemble*`)
    Apk,
    /// Android App Bundle (`bundle*`)
    Bundle,
}

impl ArtifactKind {
    fn task_prefix(&self) -> &'static str {
        match self {
            ArtifactKind::Apk => "assemble",
            ArtifactKind::Bundle => "bundle",
        }
    }

    fn output_dir(&self) -> &'static str {
        match self {
            ArtifactKind::Apk => "apk",
            ArtifactKind::Bundle => "bundle",
        }
    }
}

/// Platform-specific wrapper script
pub fn wrapper() -> &'static str {
    if cfg!(windows) {
        "gradlew.bat"
    } else {
        "./gradlew"
    }
}

/// Task producing `kind` for `variant`, e.g. `assembleDevRelease`
pub fn task_name(kind: ArtifactKind, variant: Variant) -> String {
    format!("{}{}", kind.task_prefix(), variant.task_suffix())
}

/// Every task relevant to a variant: build, bundle, unit test, lint
pub fn variant_tasks(variant: Variant) -> Vec<String> {
    let suffix = variant.task_suffix();
    vec![
        task_name(ArtifactKind::Apk, variant),
        task_name(ArtifactKind::Bundle, variant),
        format!("test{}UnitTest", suffix),
        format!("lint{}", suffix),
    ]
}

/// Conventional artifact location relative to the project root
///
/// `app/build/outputs/apk/dev/release/app-dev-release.apk`, or
/// `app/build/outputs/bundle/devRelease/app-dev-release.aab`.
pub fn artifact_path(kind: ArtifactKind, resolved: &ResolvedConfig) -> PathBuf {
    let flavor = resolved.flavor.as_str();
    let build_type = resolved.build_type.as_str();
    let base = Path::new(APP_MODULE).join("build/outputs").join(kind.output_dir());

    match kind {
        ArtifactKind::Apk => base
            .join(flavor)
            .join(build_type)
            .join(format!("{}-{}-{}.apk", APP_MODULE, flavor, build_type)),
        ArtifactKind::Bundle => base
            .join(&resolved.variant_name)
            .join(format!("{}-{}-{}.aab", APP_MODULE, flavor, build_type)),
    }
}

/// Run a Gradle task
pub fn run_task(project_dir: &Path, task: &str) -> Result<CommandResult> {
    tracing::info!(task, dir = %project_dir.display(), "Running Gradle task");
    run_command_in_dir(wrapper(), &[task], project_dir)
}

/// Run a Gradle task with output streamed to the terminal
pub fn run_task_streaming(project_dir: &Path, task: &str) -> Result<()> {
    tracing::info!(task, dir = %project_dir.display(), "Running Gradle task");
    let code = run_command_streaming_in_dir(wrapper(), &[task], project_dir)?;
    if code == 0 {
        Ok(())
    } else {
        Err(Error::gradle(format!("Gradle task {} failed with exit code {}", task, code)))
    }
}

/// Build `kind` for a resolved variant
pub fn build_variant(
    project_dir: &Path,
    kind: ArtifactKind,
    resolved: &ResolvedConfig,
) -> Result<CommandResult> {
    let task = task_name(kind, resolved.variant());
    let result = run_task(project_dir, &task)?;
    if result.success {
        Ok(result)
    } else {
        Err(Error::gradle(format!("Gradle task {} failed", task))
            .with_context(result.combined_output().trim_end().to_string()))
    }
}

/// Check that the wrapper script exists in `project_dir`
pub fn has_wrapper(project_dir: &Path) -> bool {
    project_dir
        .join(wrapper().trim_start_matches("./"))
        .is_file()
}

/// Error for a project directory without a wrapper
///
/// When a system Gradle is on `PATH` the suggestion points at generating the
/// wrapper with it.
pub fn missing_wrapper(project_dir: &Path) -> Error {
    let suggestion = match which_command("gradle") {
        Some(gradle) => format!(
            "Generate one with `{} wrapper` in {}, or pass --project-dir",
            gradle.display(),
            project_dir.display()
        ),
        None => "Run from the Android project root or pass --project-dir".to_string(),
    };
    Error::command_not_found(wrapper())
        .with_context(format!("No Gradle wrapper in {}", project_dir.display()))
        .with_suggestion(suggestion)
}

/// Clean build artifacts
pub fn clean(project_dir: &Path) -> Result<CommandResult> {
    run_task(project_dir, "clean")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve;
    use crate::variant::{BuildType, Flavor};
    use smartone_core::config::ProjectConfig;
    use smartone_core::ErrorCode;

    #[test]
    fn test_task_names() {
        let variant = Variant::new(Flavor::Dev, BuildType::Release);
        assert_eq!(task_name(ArtifactKind::Apk, variant), "assembleDevRelease");
        assert_eq!(task_name(ArtifactKind::Bundle, variant), "bundleDevRelease");
    }

    #[test]
    fn test_variant_tasks() {
        let tasks = variant_tasks(Variant::new(Flavor::Prod, BuildType::Debug));
        assert_eq!(
            tasks,
            [
                "assembleProdDebug",
                "bundleProdDebug",
                "testProdDebugUnitTest",
                "lintProdDebug"
            ]
        );
    }

    #[test]
    fn test_artifact_paths() {
        let project = ProjectConfig::default();
        let resolved = resolve(&project, Flavor::Dev, BuildType::Debug).unwrap();

        assert_eq!(
            artifact_path(ArtifactKind::Apk, &resolved),
            Path::new("app/build/outputs/apk/dev/debug/app-dev-debug.apk")
        );
        assert_eq!(
            artifact_path(ArtifactKind::Bundle, &resolved),
            Path::new("app/build/outputs/bundle/devDebug/app-dev-debug.aab")
        );
    }

    #[test]
    fn test_has_wrapper() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(!has_wrapper(dir.path()));

        std::fs::write(dir.path().join(wrapper().trim_start_matches("./")), "#!/bin/sh\n").unwrap();
        assert!(has_wrapper(dir.path()));
    }

    #[test]
    fn test_missing_wrapper_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = missing_wrapper(dir.path());

        assert_eq!(err.code, ErrorCode::CommandNotFound);
        assert!(err.context.unwrap().contains("No Gradle wrapper"));
        assert!(err.suggestion.unwrap().contains("--project-dir"));
    }

    #[cfg(unix)]
    fn fake_wrapper(dir: &Path, script: &str) {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("gradlew");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_build_variant_failure_carries_gradle_output() {
        let dir = tempfile::TempDir::new().unwrap();
        fake_wrapper(dir.path(), "#!/bin/sh\necho \"> Task :app:$1\"\necho \"BUILD FAILED\" >&2\nexit 1\n");

        let project = ProjectConfig::default();
        let resolved = resolve(&project, Flavor::Prod, BuildType::Debug).unwrap();
        let err = build_variant(dir.path(), ArtifactKind::Apk, &resolved).unwrap_err();

        assert_eq!(err.code, ErrorCode::GradleError);
        assert!(err.message.contains("assembleProdDebug"));
        let context = err.context.unwrap();
        assert!(context.contains("> Task :app:assembleProdDebug"));
        assert!(context.contains("BUILD FAILED"));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_task_streaming_maps_exit_code() {
        let dir = tempfile::TempDir::new().unwrap();
        fake_wrapper(dir.path(), "#!/bin/sh\n[ \"$1\" = \"clean\" ]\n");

        assert!(run_task_streaming(dir.path(), "clean").is_ok());
        let err = run_task_streaming(dir.path(), "bundleDevRelease").unwrap_err();
        assert_eq!(err.code, ErrorCode::GradleError);
        assert!(err.message.contains("exit code 1"));
    }

    #[test]
    fn test_run_task_without_wrapper_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = run_task(dir.path(), "assembleDevDebug").unwrap_err();
        assert!(matches!(err.code, ErrorCode::CommandNotFound | ErrorCode::ProcessError));
    }
}
