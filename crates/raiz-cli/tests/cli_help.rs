use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("raiz")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("images"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("normalize"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_images_help_shows_flags() {
    cargo_bin_cmd!("raiz")
        .args(["images", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--retry-all"))
        .stdout(predicate::str::contains("--json"))
        .stdout(predicate::str::contains("--api-origin"));
}

#[test]
fn test_unknown_language_is_rejected() {
    cargo_bin_cmd!("raiz")
        .args(["--lang", "fr", "config", "path"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported language"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("raiz")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
