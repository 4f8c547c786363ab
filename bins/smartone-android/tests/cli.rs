use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const SIGNED_CONFIG: &str = r#"
[build_types.release]
signing_config = "upload"

[signing.upload]
store_file = "keys/upload.jks"
key_alias = "upload"
store_password_env = "SMARTONE_STORE_PASSWORD"
key_password_env = "SMARTONE_KEY_PASSWORD"
"#;

/// Command running in an empty directory, so no config file is discovered
fn cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("smartone-android").unwrap();
    cmd.current_dir(dir.path()).arg("--no-color");
    cmd
}

fn with_config(contents: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("smartone-build.toml"), contents).unwrap();
    dir
}

#[test]
fn resolve_dev_debug_json() {
    let dir = TempDir::new().unwrap();
    let output = cmd(&dir)
        .args(["resolve", "dev", "debug", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["application_id"], "com.example.smartone.dev");
    assert_eq!(json["app_name"], "SmartOne Dev");
    assert_eq!(json["debuggable"], true);
    assert_eq!(json["minify_enabled"], false);
}

#[test]
fn resolve_prod_release_with_declared_signing() {
    let dir = with_config(SIGNED_CONFIG);
    let output = cmd(&dir)
        .args(["resolve", "prod", "release", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["application_id"], "com.example.smartone");
    assert_eq!(json["app_name"], "SmartOne");
    assert_eq!(json["debuggable"], false);
    assert_eq!(json["minify_enabled"], true);
    assert_eq!(json["signing"]["name"], "upload");
}

#[test]
fn resolve_release_without_signing_fails() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["resolve", "prod", "release"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("E4002"))
        .stdout(predicate::str::contains("com.example.smartone").not());
}

#[test]
fn resolve_invalid_flavor_fails() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["resolve", "staging", "debug"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("Invalid flavor: 'staging'"));
}

#[test]
fn resolve_error_as_json_report() {
    let dir = TempDir::new().unwrap();
    let output = cmd(&dir)
        .args(["resolve", "dev", "nightly", "--json"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(6));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["code_str"], "E4001");
    assert_eq!(json["category"], "Variant");
}

#[test]
fn variants_reports_unsigned_release() {
    let dir = TempDir::new().unwrap();
    let output = cmd(&dir).args(["variants", "--json"]).output().unwrap();

    assert_eq!(output.status.code(), Some(6));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0]["variant"], "devDebug");
    assert!(entries[0]["config"].is_object());
    assert_eq!(entries[1]["error"]["code"], "MISSING_SIGNING_IDENTITY");
}

#[test]
fn variants_all_resolve_when_signed() {
    let dir = with_config(SIGNED_CONFIG);
    cmd(&dir)
        .arg("variants")
        .assert()
        .success()
        .stdout(predicate::str::contains("4 variants resolved"));
}

#[test]
fn check_defaults_pass_with_warnings() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .arg("check")
        .assert()
        .success()
        .stderr(predicate::str::contains("build_types.release.signing_config"));
}

#[test]
fn check_invalid_config_fails() {
    let dir = with_config("[app]\napplication_id = \"smartone\"\nmin_sdk = 40\n");
    cmd(&dir)
        .arg("check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("app.application_id"))
        .stderr(predicate::str::contains("app.min_sdk"));
}

#[test]
fn missing_explicit_config_is_config_error() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["--config", "missing.toml", "resolve", "dev", "debug"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("E3001"));
}

#[test]
fn tasks_lists_gradle_tasks() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["tasks", "dev", "release"])
        .assert()
        .success()
        .stdout(predicate::str::contains("assembleDevRelease"))
        .stdout(predicate::str::contains("bundleDevRelease"));
}

#[test]
fn packaging_classifies_entries() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["packaging", "META-INF/NOTICE", "classes.dex"])
        .assert()
        .success()
        .stdout(predicate::str::contains("exclude META-INF/NOTICE"))
        .stdout(predicate::str::contains("keep    classes.dex"));
}

#[test]
fn build_without_wrapper_fails_before_gradle() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["build", "dev", "debug"])
        .assert()
        .code(127)
        .stderr(predicate::str::contains("No Gradle wrapper"));
}

#[test]
fn build_unsigned_release_fails_before_wrapper_check() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["build", "prod", "release", "--bundle"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("E4002"));
}

#[test]
fn deps_filters_by_configuration() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["deps", "--configuration", "kapt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("com.github.bumptech.glide:compiler:4.16.0"))
        .stdout(predicate::str::contains("retrofit").not());
}

#[test]
fn resolve_json_carries_toolchain_settings() {
    let dir = TempDir::new().unwrap();
    let output = cmd(&dir)
        .args(["resolve", "prod", "debug", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["ndk_version"], "25.1.8937393");
    assert_eq!(json["compile"]["kotlin_jvm_target"], "11");
    assert_eq!(json["compile"]["core_library_desugaring"], true);
    assert_eq!(json["build_features"]["view_binding"], true);
}

#[test]
fn check_release_debug_signing_without_policy_fails() {
    let dir = with_config("[build_types.release]\nsigning_config = \"debug\"\n");
    cmd(&dir)
        .arg("check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("build_types.release.signing_config"))
        .stderr(predicate::str::contains("allow_debug_signing_for_release"));
}

#[test]
fn check_invalid_packaging_glob_fails() {
    let dir = with_config("[packaging]\nresource_excludes = [\"META-INF/[abc\"]\n");
    cmd(&dir)
        .arg("check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("packaging.resource_excludes"));
}

#[test]
fn check_warns_about_missing_keystore() {
    let dir = with_config(SIGNED_CONFIG);
    cmd(&dir)
        .arg("check")
        .assert()
        .success()
        .stderr(predicate::str::contains("signing.upload.store_file"))
        .stderr(predicate::str::contains("Keystore not found"));

    fs::create_dir(dir.path().join("keys")).unwrap();
    fs::write(dir.path().join("keys/upload.jks"), b"keystore").unwrap();
    cmd(&dir)
        .arg("check")
        .assert()
        .success()
        .stderr(predicate::str::contains("Keystore not found").not());
}

#[test]
fn undeclared_flavor_table_is_config_error() {
    let dir = with_config("[flavors.staging]\napplication_id_suffix = \".staging\"\n");
    cmd(&dir)
        .args(["resolve", "dev", "debug"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("E3002"))
        .stderr(predicate::str::contains("staging"));
}

#[test]
fn tasks_ignores_broken_config() {
    let dir = with_config("[app\nbroken");
    cmd(&dir)
        .args(["tasks", "prod", "debug"])
        .assert()
        .success()
        .stdout(predicate::str::contains("assembleProdDebug"));

    cmd(&dir)
        .args(["resolve", "prod", "debug"])
        .assert()
        .code(3);
}

#[cfg(unix)]
fn fake_wrapper(dir: &TempDir, script: &str) {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.path().join("gradlew");
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(unix)]
#[test]
fn build_streams_gradle_output() {
    let dir = TempDir::new().unwrap();
    fake_wrapper(&dir, "#!/bin/sh\necho \"gradle ran $1\"\n");

    cmd(&dir)
        .args(["build", "dev", "debug", "--stream"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gradle ran assembleDevDebug"))
        .stdout(predicate::str::contains("app/build/outputs/apk/dev/debug/app-dev-debug.apk"));
}

#[cfg(unix)]
#[test]
fn build_failure_reports_gradle_output() {
    let dir = TempDir::new().unwrap();
    fake_wrapper(&dir, "#!/bin/sh\necho \"BUILD FAILED\" >&2\nexit 1\n");

    cmd(&dir)
        .args(["build", "dev", "debug", "--bundle"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("E8002"))
        .stderr(predicate::str::contains("BUILD FAILED"));
}
