use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// 사용자 디렉토리를 임시 디렉토리로 격리한 명령
fn kpmenu(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kpmenu").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_CACHE_HOME", home.path().join("cache"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    let home = TempDir::new().unwrap();
    kpmenu(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("KeePass"))
        .stdout(predicate::str::contains("--cacheTimeout"))
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_cli_version() {
    let home = TempDir::new().unwrap();
    kpmenu(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_database() {
    let home = TempDir::new().unwrap();
    kpmenu(&home)
        .assert()
        .failure()
        .stderr(predicate::str::contains("you must select a database"));
}

#[test]
fn test_quit_without_daemon() {
    let home = TempDir::new().unwrap();
    kpmenu(&home)
        .arg("--quit")
        .assert()
        .success()
        .stderr(predicate::str::contains("No daemon is running"));
}

#[test]
fn test_unknown_flag() {
    let home = TempDir::new().unwrap();
    kpmenu(&home)
        .arg("--no-such-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unexpected argument"));
}

#[test]
fn test_invalid_config_file() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("broken.toml");
    std::fs::write(&config, "menu = [").unwrap();

    kpmenu(&home)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}
