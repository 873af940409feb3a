//! Backend REST client for plant data.

use anyhow::{Context, Result, bail};
use futures_util::future::BoxFuture;
use raiz_types::{ImageRef, PlantImagesResponse};
use tracing::debug;

use crate::config::Config;

/// Standard User-Agent header for raiz requests.
pub const USER_AGENT: &str = concat!("raiz/", env!("CARGO_PKG_VERSION"));

/// Anything that can list a plant's images (raw, un-normalized URLs).
pub trait ImageListSource: Send + Sync {
    fn fetch_images(&self, plant_id: i64) -> BoxFuture<'_, Result<Vec<ImageRef>>>;
}

/// HTTP client for the plant backend.
#[derive(Debug, Clone)]
pub struct PlantApiClient {
    origin: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl PlantApiClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(origin: impl Into<String>, token: Option<String>) -> Result<Self> {
        let origin: String = origin.into();
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("build backend HTTP client")?;
        Ok(Self {
            origin: origin.trim_end_matches('/').to_string(),
            token,
            http,
        })
    }

    /// Builds a client from config, honoring the usual origin precedence.
    ///
    /// # Errors
    /// Returns an error if the resolved origin is not a valid URL or the
    /// HTTP client cannot be built.
    pub fn from_config(config: &Config, origin_override: Option<&str>) -> Result<Self> {
        let origin = config.effective_api_origin(origin_override)?;
        Self::new(origin, config.effective_api_token())
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn images_url(&self, plant_id: i64) -> String {
        format!("{}/api/plantas/{plant_id}/imagens", self.origin)
    }

    /// Fetches the image list of a plant.
    ///
    /// # Errors
    /// Returns an error on transport failure, a non-2xx status (message
    /// carries the code and reason) or an unparsable body.
    pub async fn plant_images(&self, plant_id: i64) -> Result<Vec<ImageRef>> {
        let url = self.images_url(plant_id);
        debug!(plant_id, %url, "fetching plant images");

        let mut request = self.http.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("request {url}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = status.canonical_reason().unwrap_or("");
            if body.trim().is_empty() {
                bail!("HTTP {} {reason}", status.as_u16());
            }
            bail!("HTTP {} {reason}: {}", status.as_u16(), body.trim());
        }

        let parsed: PlantImagesResponse = response
            .json()
            .await
            .with_context(|| format!("parse image list from {url}"))?;

        Ok(parsed.imagens.into_iter().map(ImageRef::from).collect())
    }
}

impl ImageListSource for PlantApiClient {
    fn fetch_images(&self, plant_id: i64) -> BoxFuture<'_, Result<Vec<ImageRef>>> {
        Box::pin(self.plant_images(plant_id))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_plant_images_maps_wire_format() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/plantas/42/imagens"))
            .and(header("authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "imagens": [
                    {"id_imagem": 1, "nome_arquivo": "a.jpg", "ordem": 2, "url": "a.jpg"},
                    {"id_imagem": 2, "nome_arquivo": "b.jpg", "ordem": 1,
                     "legenda": "Raiz", "url": "/uploads/b.jpg", "data_upload": "2024-01-01T00:00:00Z"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = PlantApiClient::new(server.uri(), Some("s3cret".into())).unwrap();
        let images = client.plant_images(42).await.unwrap();

        assert_eq!(images.len(), 2);
        assert_eq!(images[0].id, 1);
        assert_eq!(images[0].url, "a.jpg");
        assert_eq!(images[1].caption.as_deref(), Some("Raiz"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error_with_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/plantas/9/imagens"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Planta não encontrada"))
            .mount(&server)
            .await;

        let client = PlantApiClient::new(format!("{}/", server.uri()), None).unwrap();
        let err = client.fetch_images(9).await.unwrap_err();
        let msg = format!("{err:#}");

        assert!(msg.contains("HTTP 404 Not Found"), "{msg}");
        assert!(msg.contains("Planta não encontrada"), "{msg}");
    }

    #[tokio::test]
    async fn test_malformed_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/plantas/3/imagens"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = PlantApiClient::new(server.uri(), None).unwrap();
        let err = client.plant_images(3).await.unwrap_err();
        assert!(format!("{err:#}").contains("parse image list"));
    }
}
