//! CLI integration tests
//!
//! Spawn the built binary and check output and exit codes.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn derivekit_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_derivekit"))
}

fn run(args: &[&str], cwd: &Path) -> Output {
    Command::new(derivekit_bin())
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .env_remove("DERIVEKIT_OPTIONS_FILE")
        .env_remove("DERIVEKIT_LOG_JSON")
        .output()
        .expect("Failed to execute derivekit")
}

fn create_web_project(dir: &TempDir) -> PathBuf {
    let root = dir.path().canonicalize().expect("Failed to canonicalize temp dir");
    fs::create_dir_all(root.join("src")).expect("Failed to create src directory");
    fs::write(root.join("src/index.js"), "").expect("Failed to write index.js");
    fs::write(root.join("src/main.css"), "").expect("Failed to write main.css");
    fs::write(
        root.join("derive.config.json"),
        r#"{
            "entry": "./src/index.js",
            "output": "dist",
            "module": {"loaders": {"**/*.css": ["style", "css?modules"]}},
            "prefetch": {"src/**/*.js": "eslint"}
        }"#,
    )
    .expect("Failed to write options file");
    root
}

#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    let output = run(&["--help"], dir.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("derivekit"));
    assert!(stdout.contains("compile"));
    assert!(stdout.contains("split"));
    assert!(stdout.contains("prefetch"));
    assert!(stdout.contains("config"));
}

#[test]
fn test_cli_version() {
    let dir = TempDir::new().unwrap();
    let output = run(&["--version"], dir.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_compile_json() {
    let dir = TempDir::new().unwrap();
    let root = create_web_project(&dir);

    let output = run(&["compile", "--format", "json"], &root);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("compile output is JSON");
    assert_eq!(value["context"], root.display().to_string());
    assert_eq!(value["output"]["path"], root.join("dist").display().to_string());
    assert_eq!(value["entry"][0], "./src/index.js");
    assert_eq!(value["module"]["loaders"][1]["request"], "style!css?modules");
    assert_eq!(value["prefetch"][0]["scope"], root.join("src").display().to_string());
}

#[test]
fn test_compile_human_with_explicit_context() {
    let dir = TempDir::new().unwrap();
    let root = create_web_project(&dir);
    let elsewhere = TempDir::new().unwrap();

    let output = run(&["compile", root.to_str().unwrap()], elsewhere.path());
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Compiled Options"));
    assert!(stdout.contains("style!css?modules"));
}

#[test]
fn test_compile_malformed_options_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("derive.config.json"), "{ nope").unwrap();

    let output = run(&["compile"], dir.path());
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load options"));
}

#[test]
fn test_compile_resolve_without_modules_fails() {
    let dir = TempDir::new().unwrap();
    let root = create_web_project(&dir);

    let output = run(&["compile", "--resolve"], &root);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Cannot resolve stage"));
}

#[test]
fn test_split_command() {
    let dir = TempDir::new().unwrap();
    let output = run(&["split", "global:lib/**/*.ts", "--format", "json"], dir.path());
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["scope"], "lib");
    assert_eq!(value["local_pattern"], "**/*.ts");
    assert_eq!(value["global"], true);
}

#[test]
fn test_split_invalid_pattern() {
    let dir = TempDir::new().unwrap();
    let output = run(&["split", "src/[a-z"], dir.path());
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_prefetch_command() {
    let dir = TempDir::new().unwrap();
    let root = create_web_project(&dir);

    let output = run(&["prefetch", "--format", "json"], &root);
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["outcomes"][0]["files"][0]["relative"], "./index.js");
    assert!(value["errors"].as_array().unwrap().is_empty());
}

#[test]
fn test_prefetch_unreadable_scope_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("derive.config.json"),
        r#"{"prefetch": {"missing/**/*.js": "eslint"}}"#,
    )
    .unwrap();

    let output = run(&["prefetch"], dir.path());
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Cannot read scope directory"));
}

#[test]
fn test_config_reflects_environment() {
    let dir = TempDir::new().unwrap();
    let output = Command::new(derivekit_bin())
        .args(["config", "--format", "json"])
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env_remove("DERIVEKIT_LOG_JSON")
        .env_remove("DERIVEKIT_DEPENDENCY_DIR")
        .env("DERIVEKIT_OPTIONS_FILE", "derive.config.yaml")
        .output()
        .expect("Failed to execute derivekit");

    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("config output is JSON");
    assert_eq!(value["options_file"], "derive.config.yaml");
    assert_eq!(value["dependency_dir"], "node_modules");
}

#[test]
fn test_invalid_command() {
    let dir = TempDir::new().unwrap();
    let output = run(&["invalid-command"], dir.path());
    assert!(!output.status.success());
}
