use std::time::Duration;

use thiserror::Error;

/// Why a single image load attempt (or sequence) did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("Tempo esgotado após {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("HTTP {0}")]
    Http(u16),

    #[error("Erro de rede: {0}")]
    Network(String),

    /// The response body is not a recognizable image.
    #[error("Conteúdo inválido: {0}")]
    InvalidImage(String),

    /// The URL already failed in this session; only an explicit retry clears it.
    #[error("Falha anterior")]
    PreviousFailure,

    #[error("URL vazia")]
    EmptyUrl,

    #[error("Cancelado")]
    Cancelled,
}

/// Outcome of one `load_image` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResult {
    pub url: String,
    pub error: Option<LoadError>,
}

impl LoadResult {
    pub fn loaded(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            error: None,
        }
    }

    pub fn failed(url: impl Into<String>, error: LoadError) -> Self {
        Self {
            url: url.into(),
            error: Some(error),
        }
    }

    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}
