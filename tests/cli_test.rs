use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

#[test]
fn test_cli_help() {
    let mut cmd = Command::new(cargo_bin!("paydebit"));
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--bind"))
        .stdout(predicate::str::contains("--max-attempts"))
        .stdout(predicate::str::contains("--echo-invalid-payload"));
}

#[test]
fn test_zero_attempts_rejected() {
    let mut cmd = Command::new(cargo_bin!("paydebit"));
    cmd.arg("--max-attempts").arg("0");

    cmd.assert().failure();
}

#[test]
fn test_invalid_seed_fails_startup() {
    let mut seed = tempfile::NamedTempFile::new().unwrap();
    writeln!(seed, "not json").unwrap();

    let mut cmd = Command::new(cargo_bin!("paydebit"));
    cmd.arg("--bind")
        .arg("127.0.0.1:0")
        .arg("--seed")
        .arg(seed.path())
        .env_remove("RUST_LOG");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("invalid seed file"));
}

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let mut cmd = Command::new(cargo_bin!("paydebit"));
    cmd.arg("--bind")
        .arg("127.0.0.1:0")
        .arg("--db-path")
        .arg("some_db")
        .arg("--seed")
        .arg("/nonexistent/seed.json")
        .env_remove("RUST_LOG");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage.",
        ));
}
