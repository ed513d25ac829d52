use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn datum(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("datum").unwrap();
    cmd.env("DATUM_HOME", home.path());
    cmd.env_remove("DATUM_REGISTRY");
    cmd.env_remove("DATUM_OUTPUT");
    cmd
}

fn valid_package_json() -> String {
    serde_json::json!({
        "id": "simkjels/samples/sampledata",
        "version": "0.1.0",
        "title": "Sample Data Text File",
        "publisher": {"name": "Simen Kjelsrud"},
        "sources": [{"url": "https://example.com/sample.csv", "format": "csv"}],
    })
    .to_string()
}

#[test]
fn version_flag_works() {
    let home = TempDir::new().unwrap();
    datum(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("datum"));
}

#[test]
fn no_args_shows_help() {
    let home = TempDir::new().unwrap();
    datum(&home).assert().failure();
}

// ---------------------------------------------------------------------------
// pull
// ---------------------------------------------------------------------------

#[test]
fn pull_bad_identifier_exits_1() {
    let home = TempDir::new().unwrap();
    datum(&home)
        .args(["pull", "bad-identifier"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid identifier"));
}

#[test]
fn pull_bad_identifier_json_output() {
    let home = TempDir::new().unwrap();
    let output = datum(&home)
        .args(["--output", "json", "pull", "bad.id"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();
    let payload: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(payload["downloaded"], serde_json::json!(false));
    assert!(payload["error"].is_string());
}

#[test]
fn pull_unknown_dataset_exits_1() {
    let home = TempDir::new().unwrap();
    datum(&home)
        .args(["pull", "simkjels/samples/sampledata:0.1.0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn pull_uppercase_slug_exits_1() {
    let home = TempDir::new().unwrap();
    datum(&home)
        .args(["pull", "Bad/x/y:1.0"])
        .assert()
        .code(1);
}

// ---------------------------------------------------------------------------
// init / check / publish / list round trip
// ---------------------------------------------------------------------------

#[test]
fn check_missing_file_exits_2() {
    let home = TempDir::new().unwrap();
    let cwd = TempDir::new().unwrap();
    datum(&home)
        .current_dir(cwd.path())
        .arg("check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn check_invalid_json_exits_2() {
    let home = TempDir::new().unwrap();
    let cwd = TempDir::new().unwrap();
    std::fs::write(cwd.path().join("datapackage.json"), "{ not json").unwrap();
    datum(&home)
        .current_dir(cwd.path())
        .arg("check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not valid JSON"));
}

#[test]
fn check_valid_package_exits_0() {
    let home = TempDir::new().unwrap();
    let cwd = TempDir::new().unwrap();
    std::fs::write(cwd.path().join("datapackage.json"), valid_package_json()).unwrap();
    datum(&home)
        .current_dir(cwd.path())
        .arg("check")
        .assert()
        .success();
}

#[test]
fn check_schema_violation_exits_1() {
    let home = TempDir::new().unwrap();
    let cwd = TempDir::new().unwrap();
    let broken = serde_json::json!({
        "id": "not-a-valid-id",
        "version": "0.1.0",
        "title": "x",
        "publisher": {"name": "p"},
        "sources": [{"url": "https://example.com/a.csv", "format": "csv"}],
    });
    std::fs::write(cwd.path().join("datapackage.json"), broken.to_string()).unwrap();
    datum(&home)
        .current_dir(cwd.path())
        .arg("check")
        .assert()
        .code(1);
}

#[test]
fn check_json_output_reports_errors() {
    let home = TempDir::new().unwrap();
    let cwd = TempDir::new().unwrap();
    let broken = serde_json::json!({
        "id": "a/b/c",
        "version": "",
        "title": "x",
        "publisher": {"name": "p"},
        "sources": [],
    });
    std::fs::write(cwd.path().join("datapackage.json"), broken.to_string()).unwrap();
    let output = datum(&home)
        .current_dir(cwd.path())
        .args(["--output", "json", "check"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();
    let payload: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(payload["valid"], serde_json::json!(false));
    let fields: Vec<&str> = payload["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"version"));
    assert!(fields.contains(&"sources"));
}

#[test]
fn init_check_publish_list_roundtrip() {
    let home = TempDir::new().unwrap();
    let cwd = TempDir::new().unwrap();

    datum(&home)
        .current_dir(cwd.path())
        .args([
            "init",
            "--id",
            "simkjels/samples/demo",
            "--title",
            "Demo Dataset",
            "--source-url",
            "https://example.com/demo.csv",
        ])
        .assert()
        .success();
    assert!(cwd.path().join("datapackage.json").exists());

    datum(&home)
        .current_dir(cwd.path())
        .arg("check")
        .assert()
        .success();

    datum(&home)
        .current_dir(cwd.path())
        .arg("publish")
        .assert()
        .success();

    // re-publishing the same version without --force is a conflict
    datum(&home)
        .current_dir(cwd.path())
        .arg("publish")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));

    let output = datum(&home)
        .args(["--output", "json", "list"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let payload: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(payload.as_array().unwrap().len(), 1);
    assert_eq!(payload[0]["id"], serde_json::json!("simkjels/samples/demo"));
}

#[test]
fn init_refuses_to_overwrite() {
    let home = TempDir::new().unwrap();
    let cwd = TempDir::new().unwrap();
    std::fs::write(cwd.path().join("datapackage.json"), "{}").unwrap();
    datum(&home)
        .current_dir(cwd.path())
        .args(["init", "--id", "a/b/c", "--title", "T"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));
}

// ---------------------------------------------------------------------------
// search / info
// ---------------------------------------------------------------------------

fn publish_sample(home: &TempDir) {
    let cwd = TempDir::new().unwrap();
    std::fs::write(cwd.path().join("datapackage.json"), valid_package_json()).unwrap();
    datum(home)
        .current_dir(cwd.path())
        .arg("publish")
        .assert()
        .success();
}

#[test]
fn search_finds_published_dataset() {
    let home = TempDir::new().unwrap();
    publish_sample(&home);

    let output = datum(&home)
        .args(["--output", "json", "search", "sample"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let payload: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(payload.as_array().unwrap().len(), 1);
}

#[test]
fn search_no_match_is_empty_not_error() {
    let home = TempDir::new().unwrap();
    publish_sample(&home);

    let output = datum(&home)
        .args(["--output", "json", "search", "zzz-nothing"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let payload: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert!(payload.as_array().unwrap().is_empty());
}

#[test]
fn info_shows_latest_version() {
    let home = TempDir::new().unwrap();
    publish_sample(&home);

    let output = datum(&home)
        .args(["--output", "json", "info", "simkjels/samples/sampledata"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let payload: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(payload["version"], serde_json::json!("0.1.0"));
}

#[test]
fn info_not_found_exits_1() {
    let home = TempDir::new().unwrap();
    datum(&home)
        .args(["info", "no/such/dataset"])
        .assert()
        .code(1);
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

#[test]
fn config_set_get_unset() {
    let home = TempDir::new().unwrap();

    datum(&home)
        .args(["config", "set", "registry", "https://datumhub.org"])
        .assert()
        .success();

    datum(&home)
        .args(["config", "get", "registry"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://datumhub.org"));

    datum(&home)
        .args(["config", "unset", "registry"])
        .assert()
        .success();

    datum(&home)
        .args(["config", "get", "registry"])
        .assert()
        .code(1);
}

#[test]
fn config_corrupted_file_exits_2() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("config.json"), "{ nope").unwrap();
    datum(&home)
        .args(["config", "get", "registry"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("corrupted"));
}

// ---------------------------------------------------------------------------
// cache / update
// ---------------------------------------------------------------------------

#[test]
fn cache_list_empty() {
    let home = TempDir::new().unwrap();
    let output = datum(&home)
        .args(["--output", "json", "cache", "list"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let payload: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert!(payload.as_array().unwrap().is_empty());
}

#[test]
fn cache_size_empty() {
    let home = TempDir::new().unwrap();
    let output = datum(&home)
        .args(["--output", "json", "cache", "size"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let payload: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(payload["size_bytes"], serde_json::json!(0));
}

#[test]
fn cache_clear_empty_is_ok() {
    let home = TempDir::new().unwrap();
    datum(&home)
        .args(["cache", "clear", "--yes"])
        .assert()
        .success();
}

#[test]
fn update_nothing_cached() {
    let home = TempDir::new().unwrap();
    let output = datum(&home)
        .args(["--output", "json", "update"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let payload: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(payload["message"], serde_json::json!("Nothing cached yet."));
}

#[test]
fn update_skips_unpublished_cached_dataset() {
    let home = TempDir::new().unwrap();
    // a cached dataset the registry does not know about
    let ver_dir = home.path().join("cache/gone/from/registry/0.1.0");
    std::fs::create_dir_all(&ver_dir).unwrap();
    std::fs::write(ver_dir.join("data.csv"), b"x").unwrap();

    let output = datum(&home)
        .args(["--output", "json", "update"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let payload: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(
        payload["message"],
        serde_json::json!("No registry entries found for cached datasets.")
    );
}

#[test]
fn update_check_reports_transition() {
    let home = TempDir::new().unwrap();

    // cached 0.1.0
    let ver_dir = home.path().join("cache/simkjels/samples/sampledata/0.1.0");
    std::fs::create_dir_all(&ver_dir).unwrap();
    std::fs::write(ver_dir.join("sample.csv"), b"old").unwrap();

    // registry latest 0.2.0
    let cwd = TempDir::new().unwrap();
    let mut pkg: serde_json::Value = serde_json::from_str(&valid_package_json()).unwrap();
    pkg["version"] = serde_json::json!("0.2.0");
    std::fs::write(cwd.path().join("datapackage.json"), pkg.to_string()).unwrap();
    datum(&home)
        .current_dir(cwd.path())
        .arg("publish")
        .assert()
        .success();

    let output = datum(&home)
        .args(["--output", "json", "update", "--check"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let payload: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let pending = payload["would_update"].as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["from"], serde_json::json!("0.1.0"));
    assert_eq!(pending[0]["to"], serde_json::json!("0.2.0"));
}

// ---------------------------------------------------------------------------
// whoami / logout
// ---------------------------------------------------------------------------

#[test]
fn whoami_local_mode() {
    let home = TempDir::new().unwrap();
    let output = datum(&home)
        .args(["--output", "json", "whoami"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let payload: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(payload["is_remote"], serde_json::json!(false));
    assert_eq!(payload["authenticated"], serde_json::json!(false));
}

#[test]
fn login_with_token_then_whoami_and_logout() {
    let home = TempDir::new().unwrap();

    datum(&home)
        .args(["login", "https://datumhub.org", "--token", "tok-123"])
        .assert()
        .success();

    let output = datum(&home)
        .args([
            "--registry",
            "https://datumhub.org",
            "--output",
            "json",
            "whoami",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let payload: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(payload["is_remote"], serde_json::json!(true));
    assert_eq!(payload["authenticated"], serde_json::json!(true));

    let output = datum(&home)
        .args(["--output", "json", "logout", "https://datumhub.org"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let payload: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(payload["logged_out"], serde_json::json!(true));
}
