use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

#[tokio::test]
async fn test_check_succeeds_on_image() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_MAGIC.to_vec()))
        .mount(&server)
        .await;
    let home = tempdir().unwrap();

    cargo_bin_cmd!("raiz")
        .env("RAIZ_HOME", home.path())
        .args(["--lang", "en", "check", &format!("{}/ok.png", server.uri())])
        .assert()
        .success()
        .stdout(predicate::str::contains("Image loaded"));
}

#[tokio::test]
async fn test_check_exhausts_retries_then_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&server)
        .await;
    let home = tempdir().unwrap();
    fs::write(
        home.path().join("config.toml"),
        "[images]\nbackoff_base_ms = 10\n",
    )
    .unwrap();

    cargo_bin_cmd!("raiz")
        .env("RAIZ_HOME", home.path())
        .args(["check", &format!("{}/missing.png", server.uri())])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Falha ao carregar imagem"))
        .stderr(predicate::str::contains("HTTP 404"));
}

#[tokio::test]
async fn test_check_rejects_non_image_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF-1.4\n".to_vec()),
        )
        .mount(&server)
        .await;
    let home = tempdir().unwrap();

    cargo_bin_cmd!("raiz")
        .env("RAIZ_HOME", home.path())
        .args(["check", "--retries", "0", &format!("{}/page", server.uri())])
        .assert()
        .failure()
        .stderr(predicate::str::contains("application/pdf"));
}
