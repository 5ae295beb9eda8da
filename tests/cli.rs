//! End-to-end tests driving the `bagsync` binary.
//!
//! None of these reach a repository: they cover argument handling, error
//! codes, and dry-run imports, which stop before the first PUT.

use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

const BASE: &str = "http://localhost:8080/rest";

fn bagsync() -> Command {
    let mut cmd = Command::cargo_bin("bagsync").unwrap();
    for var in [
        "BAGSYNC_RESOURCE",
        "BAGSYNC_DIR",
        "BAGSYNC_BINARY_DIR",
        "BAGSYNC_RDF_LANG",
        "BAGSYNC_RDF_EXT",
        "BAGSYNC_PRIOR_MANIFEST",
        "BAGSYNC_TIMEOUT",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn stderr_json(output: &std::process::Output) -> serde_json::Value {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let line = stderr
        .lines()
        .rev()
        .find(|l| l.starts_with('{'))
        .unwrap_or_else(|| panic!("no JSON error on stderr: {stderr}"));
    serde_json::from_str(line).unwrap()
}

#[test]
fn test_version_json() {
    let assert = bagsync().args(["--json", "version"]).assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let value: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(value["rdf_languages"][0], "application/ld+json");
}

#[test]
fn test_completions() {
    let assert = bagsync().args(["completions", "bash"]).assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.contains("bagsync"));
}

#[test]
fn test_import_missing_directory() {
    let assert = bagsync()
        .args(["import", "-r", BASE, "-d", "/nonexistent/bag/data"])
        .assert()
        .code(7);
    let error = stderr_json(assert.get_output());
    assert_eq!(error["error"]["code"], "DIRECTORY_NOT_FOUND");
}

#[test]
fn test_invalid_resource() {
    let temp_dir = TempDir::new().unwrap();
    let assert = bagsync()
        .args(["import", "-r", "not a uri", "-d"])
        .arg(temp_dir.path())
        .assert()
        .code(4);
    let error = stderr_json(assert.get_output());
    assert_eq!(error["error"]["code"], "INVALID_ARGUMENT");
    assert!(error["error"]["hint"].is_string());
}

#[test]
fn test_resource_from_environment() {
    let temp_dir = TempDir::new().unwrap();
    bagsync()
        .env("BAGSYNC_RESOURCE", "ftp://localhost/rest")
        .args(["import", "-d"])
        .arg(temp_dir.path())
        .assert()
        .code(4);
}

#[test]
fn test_turtle_unsupported() {
    let temp_dir = TempDir::new().unwrap();
    let assert = bagsync()
        .args(["import", "-r", BASE, "-l", "text/turtle", "-d"])
        .arg(temp_dir.path())
        .assert()
        .code(5);
    let error = stderr_json(assert.get_output());
    assert_eq!(error["error"]["code"], "RDF_ERROR");
}

#[test]
fn test_bad_extension() {
    let temp_dir = TempDir::new().unwrap();
    bagsync()
        .args(["import", "-r", BASE, "-x", "jsonld", "-d"])
        .arg(temp_dir.path())
        .assert()
        .code(7);
}

#[test]
fn test_malformed_prior_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let manifest = temp_dir.path().join("manifest-sha1.txt");
    fs::write(&manifest, "abc123  dataXYZ\nnot-a-valid-line\n").unwrap();

    let assert = bagsync()
        .args(["--dry-run", "export", "-r", BASE, "-d"])
        .arg(temp_dir.path().join("out"))
        .arg("--prior-manifest")
        .arg(&manifest)
        .assert()
        .code(2);
    let error = stderr_json(assert.get_output());
    assert_eq!(error["error"]["code"], "MANIFEST_PARSE_ERROR");
    assert!(error["error"]["message"].as_str().unwrap().contains("line 2"));
}

#[test]
fn test_missing_prior_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let assert = bagsync()
        .args(["--dry-run", "export", "-r", BASE, "-d"])
        .arg(temp_dir.path().join("out"))
        .args(["--prior-manifest", "/nonexistent/manifest-sha1.txt"])
        .assert()
        .code(2);
    let error = stderr_json(assert.get_output());
    assert_eq!(error["error"]["code"], "MANIFEST_UNREADABLE");
}

#[test]
fn test_dry_run_import() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("rest");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("foo.jsonld"),
        r#"[{"@id":"http://localhost:8080/rest/foo","http://purl.org/dc/terms/title":[{"@value":"Foo"}],"http://www.loc.gov/premis/rdf/v1#hasSize":[{"@value":"3"}]}]"#,
    )
    .unwrap();
    fs::write(dir.join("img.binary"), "abc").unwrap();

    let assert = bagsync()
        .args(["--json", "--dry-run", "import", "-r", BASE, "-d"])
        .arg(temp_dir.path())
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let value: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(value["dry_run"], true);
    assert_eq!(value["stats"]["imported"], 1);
    assert_eq!(value["stats"]["skipped"], 1);
    assert_eq!(value["stats"]["removed_triples"], 1);
}
