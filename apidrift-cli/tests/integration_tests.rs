//! Integration tests for the apidrift CLI
//!
//! Tests end-to-end command behavior using the CLI binary.
//! Uses tempfile for isolated test directories.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// Run apidrift with the given args in the specified directory
fn run_apidrift(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_apidrift"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute apidrift command")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(&path, content).expect("Failed to write file");
    path
}

/// One API class with the given member JSON objects.
fn repository_stream(members: &str) -> String {
    format!(
        r#"{{
  "module": "Acme_Catalog",
  "constructs": [
    {{
      "construct": "class_like",
      "name": "Acme\\Catalog\\Api\\ProductRepositoryInterface",
      "kind": "interface",
      "is_api": true,
      "members": [{}]
    }}
  ]
}}"#,
        members
    )
}

const GET_BY_ID: &str = r#"{"name": "getById", "kind": "method", "parameters": [{"name": "sku"}]}"#;
const SAVE: &str = r#"{"name": "save", "kind": "method", "parameters": [{"name": "product"}]}"#;
const SAVE_WITH_STORE: &str = r#"{"name": "save", "kind": "method", "parameters": [{"name": "product"}, {"name": "storeId", "default": "null", "optional": true}]}"#;

fn setup_snapshots(dir: &Path, before_members: &str, after_members: &str) {
    write_file(dir, "before.json", &repository_stream(before_members));
    write_file(dir, "after.json", &repository_stream(after_members));
}

fn check(dir: &Path, extra: &[&str]) -> Output {
    let mut args = vec!["check", "--before", "before.json", "--after", "after.json"];
    args.extend_from_slice(extra);
    run_apidrift(dir, &args)
}

// ============================================================================
// Check Command Tests
// ============================================================================

#[test]
fn test_check_identical_snapshots_pass() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let members = format!("{}, {}", GET_BY_ID, SAVE);
    setup_snapshots(temp_dir.path(), &members, &members);

    let output = check(temp_dir.path(), &[]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(
        stdout(&output).contains("No API changes detected"),
        "got: {}",
        stdout(&output)
    );
}

#[test]
fn test_check_removed_method_fails_with_major() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    setup_snapshots(temp_dir.path(), &format!("{}, {}", GET_BY_ID, SAVE), GET_BY_ID);

    let output = check(temp_dir.path(), &["--format", "json"]);

    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
    let json: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("Output should be valid JSON");
    assert_eq!(json["verdict"], "major");
    assert_eq!(json["failed"], true);
    assert_eq!(json["operations"].as_array().unwrap().len(), 1);
    assert_eq!(json["operations"][0]["code"], "method.removed");
    assert_eq!(
        json["operations"][0]["target"],
        "Acme\\Catalog\\Api\\ProductRepositoryInterface::save()"
    );
}

#[test]
fn test_check_optional_parameter_is_minor_and_passes() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    setup_snapshots(temp_dir.path(), SAVE, SAVE_WITH_STORE);

    let output = check(temp_dir.path(), &["--format", "json"]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["verdict"], "minor");
    assert_eq!(json["counts"]["minor"], 1);
    assert_eq!(json["operations"][0]["code"], "method.optional_parameter_added");
}

#[test]
fn test_check_fail_on_flag_overrides_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    setup_snapshots(temp_dir.path(), SAVE, SAVE_WITH_STORE);
    write_file(temp_dir.path(), ".apidrift.toml", "[check]\nfail_on = \"major\"\n");

    let output = check(temp_dir.path(), &["--fail-on", "minor"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_check_fail_on_from_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    setup_snapshots(temp_dir.path(), SAVE, SAVE_WITH_STORE);
    write_file(temp_dir.path(), ".apidrift.toml", "[check]\nfail_on = \"minor\"\n");

    let output = check(temp_dir.path(), &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("FAIL"));
}

#[test]
fn test_check_table_output() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    setup_snapshots(temp_dir.path(), &format!("{}, {}", GET_BY_ID, SAVE), GET_BY_ID);

    let output = check(temp_dir.path(), &[]);
    let stdout_str = stdout(&output);

    assert!(stdout_str.contains("CHECK:"), "got: {}", stdout_str);
    assert!(stdout_str.contains("MAJOR"));
    assert!(stdout_str.contains("[method.removed]"));
    assert!(stdout_str.contains("Verdict: MAJOR"));
}

#[test]
fn test_check_reads_stream_directories() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_file(temp_dir.path(), "v1/catalog.json", &repository_stream(SAVE));
    write_file(
        temp_dir.path(),
        "v1/theme.json",
        r#"[{"module": "Acme_Theme", "constructs": [{"construct": "style", "kind": "variable", "name": "@primary"}]}]"#,
    );
    write_file(temp_dir.path(), "v2/catalog.json", &repository_stream(SAVE));
    write_file(temp_dir.path(), "v2/theme.json", r#"{"module": "Acme_Theme"}"#);

    let output = run_apidrift(
        temp_dir.path(),
        &["check", "--before", "v1", "--after", "v2", "--format", "json"],
    );

    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["operations"][0]["code"], "style.variable.removed");
    assert_eq!(json["operations"][0]["module"], "Acme_Theme");
}

#[test]
fn test_check_duplicate_key_exits_with_structural_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    setup_snapshots(temp_dir.path(), &format!("{}, {}", SAVE, SAVE), SAVE);

    let output = check(temp_dir.path(), &[]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).is_empty(), "no verdict on fatal errors");
    assert!(stderr(&output).contains("Duplicate key"), "got: {}", stderr(&output));
}

#[test]
fn test_check_missing_input_exits_with_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = check(temp_dir.path(), &[]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("before.json"));
}

#[test]
fn test_malformed_config_warns_unless_strict() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    setup_snapshots(temp_dir.path(), SAVE, SAVE);
    write_file(temp_dir.path(), ".apidrift.toml", "[check\nfail_on = ");

    let lenient = check(temp_dir.path(), &[]);
    assert_eq!(lenient.status.code(), Some(0));
    assert!(stderr(&lenient).contains("using defaults"), "got: {}", stderr(&lenient));

    let strict = check(temp_dir.path(), &["--strict"]);
    assert_eq!(strict.status.code(), Some(2));
}

// ============================================================================
// Filter Command Tests
// ============================================================================

fn setup_trees(dir: &Path) {
    let before = "namespace Acme;\n/**\n * Product model.\n *\n * @since 2.1.0\n * @api\n */\nclass Product\n{\n}\n";
    let after = "namespace Acme;\n/**\n * Product model.   \n *\n *\n * @since 2.4.0\n * @api\n */\nclass Product\n{\n\n}\n";
    write_file(dir, "old/Model/Product.src", before);
    write_file(dir, "new/Model/Product.src", after);

    write_file(dir, "old/Model/Repo.src", "namespace Acme;\nfunction save($product) {}\n");
    write_file(dir, "new/Model/Repo.src", "namespace Acme;\nfunction save($product, $storeId = null) {}\n");

    write_file(dir, "old/Model/Same.src", "namespace Acme;\n");
    write_file(dir, "new/Model/Same.src", "namespace Acme;\n");

    write_file(dir, "old/Model/Legacy.src", "namespace Acme;\n");
    write_file(dir, "new/Model/Fresh.src", "namespace Acme;\n");
}

#[test]
fn test_filter_json_lists_surviving_files() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    setup_trees(temp_dir.path());
    write_file(temp_dir.path(), ".apidrift.toml", "[filter]\nignored_tags = [\"since\"]\n");

    let output = run_apidrift(
        temp_dir.path(),
        &["filter", "--before", "old", "--after", "new", "--format", "json"],
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["changed"], serde_json::json!(["Model/Repo.src"]));
    assert_eq!(json["unchanged"], 1);
    assert_eq!(json["filtered"][0]["path"], "Model/Product.src");
    assert_eq!(json["filtered"][0]["stage"], "ignored-tag");
    assert_eq!(json["only_before"], serde_json::json!(["Model/Legacy.src"]));
    assert_eq!(json["only_after"], serde_json::json!(["Model/Fresh.src"]));
}

#[test]
fn test_filter_without_tag_config_keeps_tag_changes() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    setup_trees(temp_dir.path());

    let output = run_apidrift(
        temp_dir.path(),
        &["filter", "--before", "old", "--after", "new", "--format", "json"],
    );

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(
        json["changed"],
        serde_json::json!(["Model/Product.src", "Model/Repo.src"])
    );
}

#[test]
fn test_filter_honors_ignore_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    setup_trees(temp_dir.path());
    write_file(temp_dir.path(), "old/.apidriftignore", "Legacy.src\n");

    let output = run_apidrift(
        temp_dir.path(),
        &["filter", "--before", "old", "--after", "new", "--format", "json"],
    );

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["only_before"], serde_json::json!([]));
}

#[test]
fn test_filter_table_output() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    setup_trees(temp_dir.path());

    let output = run_apidrift(temp_dir.path(), &["filter", "--before", "old", "--after", "new"]);
    let stdout_str = stdout(&output);

    assert!(stdout_str.contains("FILTER:"), "got: {}", stdout_str);
    assert!(stdout_str.contains("doc-comment"));
    assert!(stdout_str.contains("ONLY AFTER"));
}

// ============================================================================
// Codes Command Tests
// ============================================================================

#[test]
fn test_codes_lists_taxonomy() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_apidrift(temp_dir.path(), &["codes", "--format", "json"]);

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let codes = json["codes"].as_array().unwrap();
    assert!(codes.iter().any(|c| c["code"] == "class.removed" && c["severity"] == "major"));
    assert!(codes.iter().any(|c| c["code"] == "layout.block.added" && c["severity"] == "minor"));
}

#[test]
fn test_codes_filter_by_severity() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_apidrift(
        temp_dir.path(),
        &["codes", "--severity", "patch", "--format", "json"],
    );

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let codes = json["codes"].as_array().unwrap();
    assert!(!codes.is_empty());
    assert!(codes.iter().all(|c| c["severity"] == "patch"));
}

#[test]
fn test_no_command_prints_help() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_apidrift(temp_dir.path(), &[]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("check"));
}
