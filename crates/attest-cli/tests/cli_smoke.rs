use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn attest(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("attest").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("ATTEST_CONFIG")
        .env_remove("ATTEST_DB")
        .env_remove("ATTEST_SCHEMA")
        .env_remove("ATTEST_ENDPOINT")
        .env_remove("ATTEST_MODEL")
        .env("ATTEST_LOG", "error");
    cmd
}

#[test]
fn test_run_on_empty_database_prints_guidance() {
    let dir = TempDir::new().unwrap();
    attest(&dir)
        .args(["run", "--db", "empty.db", "--no-judge"])
        .assert()
        .success()
        .stderr(contains("No active test cases"))
        .stderr(contains("attest seed --fixtures"));

    attest(&dir)
        .args(["runs", "--db", "empty.db"])
        .assert()
        .success()
        .stderr(contains("No runs recorded yet."));
}

#[test]
fn test_init_then_seed() {
    let dir = TempDir::new().unwrap();
    attest(&dir)
        .arg("init")
        .assert()
        .success()
        .stderr(contains("created attest.yaml"))
        .stderr(contains("created fixtures.yaml"));
    assert!(dir.path().join("attest.yaml").exists());

    attest(&dir)
        .args(["seed", "--fixtures", "fixtures.yaml"])
        .assert()
        .success()
        .stderr(contains("seeded 1 test cases"))
        .stderr(contains("1 active"));

    // relative db in attest.yaml resolves next to the config file
    assert!(dir.path().join(".attest/attest.db").exists());

    attest(&dir)
        .arg("init")
        .assert()
        .success()
        .stderr(contains("already exists"));
}

#[test]
fn test_unreachable_endpoint_yields_error_rows_not_failure() {
    let dir = TempDir::new().unwrap();
    attest(&dir).arg("init").assert().success();
    attest(&dir)
        .args(["seed", "--fixtures", "fixtures.yaml"])
        .assert()
        .success();

    attest(&dir)
        .args([
            "run",
            "--no-judge",
            "--endpoint",
            "http://127.0.0.1:9/api/chat",
            "--name",
            "offline",
            "--json",
            "run.json",
        ])
        .assert()
        .success()
        .stderr(contains("ERROR [lumbar-decompression-001]"))
        .stderr(contains("failed=1"));

    let raw = std::fs::read_to_string(dir.path().join("run.json")).unwrap();
    let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(v["name"], "offline");
    assert_eq!(v["summary"]["failed_cases"], 1);

    attest(&dir)
        .arg("runs")
        .assert()
        .success()
        .stdout(contains("completed"))
        .stdout(contains("offline"));

    attest(&dir)
        .args(["show", "--run-id", "1"])
        .assert()
        .success()
        .stderr(contains("Run #1 \"offline\""));
}

#[test]
fn test_show_unknown_run_is_fatal() {
    let dir = TempDir::new().unwrap();
    attest(&dir)
        .args(["show", "--db", "x.db", "--run-id", "42"])
        .assert()
        .code(2)
        .stderr(contains("run 42 not found"));
}

#[test]
fn test_invalid_schema_is_fatal() {
    let dir = TempDir::new().unwrap();
    attest(&dir)
        .args(["runs", "--db", "x.db", "--schema", "bad-name"])
        .assert()
        .code(2)
        .stderr(contains("invalid schema name"));
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    attest(&dir)
        .arg("version")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}
