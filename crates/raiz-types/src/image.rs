//! Plant image references and their per-session load state.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One image attached to a plant.
///
/// Created server-side on upload; read-only here. `url` holds the
/// normalized, fetchable address (empty when the plant has no usable image).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub id: i64,
    pub filename: String,
    /// Display sort key; not necessarily unique.
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
}

impl ImageRef {
    /// Whether there is anything to fetch for this image.
    pub fn has_url(&self) -> bool {
        !self.url.is_empty()
    }

    /// Parses `uploaded_at` as RFC 3339 or the `YYYY-MM-DD HH:MM:SS` form
    /// some database drivers emit. Returns `None` when absent or unparsable.
    pub fn uploaded_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.uploaded_at.as_deref()?.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Per-image load status within one viewing session.
///
/// `Loading -> Loaded` or `Loading -> Error`; an explicit retry re-enters
/// `Loading` from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    #[default]
    Loading,
    Loaded,
    Error,
}

impl LoadState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, LoadState::Loading)
    }
}

// ============================================================================
// Backend wire format
// ============================================================================

/// Response body of `GET /api/plantas/{id}/imagens`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlantImagesResponse {
    #[serde(default)]
    pub imagens: Vec<ApiImage>,
}

/// Image record as the backend serializes it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiImage {
    pub id_imagem: i64,
    #[serde(default)]
    pub nome_arquivo: String,
    #[serde(default)]
    pub ordem: i32,
    #[serde(default)]
    pub legenda: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub data_upload: Option<String>,
}

impl From<ApiImage> for ImageRef {
    /// Keeps the raw `url`; callers normalize it afterwards.
    fn from(api: ApiImage) -> Self {
        ImageRef {
            id: api.id_imagem,
            filename: api.nome_arquivo,
            order: api.ordem,
            caption: api.legenda.filter(|c| !c.trim().is_empty()),
            url: api.url,
            uploaded_at: api.data_upload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_image_maps_fields() {
        let body = r#"{
            "imagens": [
                {"id_imagem": 7, "nome_arquivo": "folha.jpg", "ordem": 2,
                 "legenda": "Folha", "url": "folha.jpg", "data_upload": "2024-03-01T10:00:00Z"},
                {"id_imagem": 8, "ordem": 1, "legenda": "  "}
            ]
        }"#;
        let parsed: PlantImagesResponse = serde_json::from_str(body).unwrap();
        let images: Vec<ImageRef> = parsed.imagens.into_iter().map(Into::into).collect();

        assert_eq!(images[0].id, 7);
        assert_eq!(images[0].filename, "folha.jpg");
        assert_eq!(images[0].order, 2);
        assert_eq!(images[0].caption.as_deref(), Some("Folha"));
        assert!(images[0].uploaded_at_utc().is_some());

        assert_eq!(images[1].caption, None);
        assert!(!images[1].has_url());
    }

    #[test]
    fn test_uploaded_at_accepts_sql_datetime() {
        let image = ImageRef {
            id: 1,
            filename: "a.png".into(),
            order: 0,
            caption: None,
            url: "a.png".into(),
            uploaded_at: Some("2023-11-05 08:30:00".into()),
        };
        let ts = image.uploaded_at_utc().unwrap();
        assert_eq!(ts.to_rfc3339(), "2023-11-05T08:30:00+00:00");
    }

    #[test]
    fn test_load_state_serializes_lowercase() {
        let json = serde_json::to_string(&LoadState::Loaded).unwrap();
        assert_eq!(json, "\"loaded\"");
        assert!(!LoadState::Loading.is_terminal());
        assert!(LoadState::Error.is_terminal());
    }
}
