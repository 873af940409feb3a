//! Single-attempt image fetch.

use std::time::Duration;

use anyhow::Context;
use futures_util::future::BoxFuture;
use reqwest::header::CONTENT_TYPE;

use super::error::LoadError;
use crate::api::USER_AGENT;

/// Performs one attempt at fetching an image.
///
/// Timeouts, retries and cancellation belong to the loader; a probe only
/// reports whether this single fetch produced an image.
pub trait ImageProbe: Send + Sync {
    fn probe<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<(), LoadError>>;
}

/// Probe that downloads the image over HTTP and sniffs its bytes.
#[derive(Debug, Clone)]
pub struct HttpImageProbe {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpImageProbe {
    /// Client whose requests (headers and body) are cut off after `timeout`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("build image HTTP client")?;
        Ok(Self { http, timeout })
    }

    fn transport_error(&self, err: &reqwest::Error) -> LoadError {
        if err.is_timeout() {
            LoadError::Timeout(self.timeout)
        } else {
            LoadError::Network(err.to_string())
        }
    }
}

impl ImageProbe for HttpImageProbe {
    fn probe<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<(), LoadError>> {
        Box::pin(async move {
            let response = self
                .http
                .get(url)
                .send()
                .await
                .map_err(|e| self.transport_error(&e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(LoadError::Http(status.as_u16()));
            }

            let declared = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_ascii_lowercase);

            let body = response
                .bytes()
                .await
                .map_err(|e| self.transport_error(&e))?;

            check_image_bytes(&body, declared.as_deref())
        })
    }
}

/// Accepts bytes whose signature is an image format. SVG has no magic
/// number, so it is accepted on its declared content type alone.
fn check_image_bytes(body: &[u8], declared: Option<&str>) -> Result<(), LoadError> {
    if body.is_empty() {
        return Err(LoadError::InvalidImage("corpo vazio".to_string()));
    }

    match infer::get(body) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => Ok(()),
        Some(kind) => Err(LoadError::InvalidImage(kind.mime_type().to_string())),
        None if declared.is_some_and(|ct| ct.starts_with("image/svg")) => Ok(()),
        None => Err(LoadError::InvalidImage(
            declared.unwrap_or("desconhecido").to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_check_image_bytes() {
        assert!(check_image_bytes(&PNG_MAGIC, None).is_ok());
        assert!(check_image_bytes(b"<svg></svg>", Some("image/svg+xml")).is_ok());
        assert!(matches!(
            check_image_bytes(b"<html>oops</html>", Some("text/html")),
            Err(LoadError::InvalidImage(ct)) if ct == "text/html"
        ));
        assert!(matches!(
            check_image_bytes(&[], Some("image/png")),
            Err(LoadError::InvalidImage(_))
        ));
    }

    #[tokio::test]
    async fn test_http_probe_maps_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(PNG_MAGIC.to_vec()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let probe = HttpImageProbe::new(Duration::from_secs(10)).unwrap();
        let ok = format!("{}/ok.png", server.uri());
        let missing = format!("{}/missing.png", server.uri());

        assert_eq!(probe.probe(&ok).await, Ok(()));
        assert_eq!(probe.probe(&missing).await, Err(LoadError::Http(404)));
    }

    #[tokio::test]
    async fn test_http_probe_connection_refused_is_network_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let probe = HttpImageProbe::new(Duration::from_secs(10)).unwrap();
        let result = probe.probe(&format!("http://127.0.0.1:{port}/x.png")).await;
        assert!(matches!(result, Err(LoadError::Network(_))));
    }

    #[tokio::test]
    async fn test_http_probe_slow_response_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(PNG_MAGIC.to_vec())
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let timeout = Duration::from_millis(200);
        let probe = HttpImageProbe::new(timeout).unwrap();
        let result = probe.probe(&format!("{}/slow.png", server.uri())).await;
        assert_eq!(result, Err(LoadError::Timeout(timeout)));
    }
}
