//! Canonicalization of raw image references into fetchable URLs.

use crate::config::ImagesConfig;

/// How a raw image reference was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    /// Nothing to fetch.
    Empty,
    /// Already carries an `http://` or `https://` scheme.
    Absolute,
    /// Server-relative path under a known upload prefix.
    KnownUpload,
    /// File name without any leading slash.
    BareFilename,
    /// Any other server-relative path.
    Rooted,
}

/// Rewrites raw image references against the API origin.
///
/// Pure and total: every input maps deterministically to some string, and
/// an empty input maps to an empty string.
#[derive(Debug, Clone)]
pub struct UrlNormalizer {
    origin: String,
    upload_prefixes: Vec<String>,
    upload_dir: String,
}

impl UrlNormalizer {
    /// Normalizer with the default upload layout.
    pub fn new(origin: impl Into<String>) -> Self {
        Self::with_layout(origin, &ImagesConfig::default())
    }

    /// Normalizer using the prefixes and per-plant directory from config.
    pub fn with_layout(origin: impl Into<String>, images: &ImagesConfig) -> Self {
        let origin: String = origin.into();
        Self {
            origin: origin.trim().trim_end_matches('/').to_string(),
            upload_prefixes: images
                .upload_prefixes
                .iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            upload_dir: format!("/{}", images.upload_dir.trim().trim_matches('/')),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Classifies a raw reference without rewriting it.
    pub fn classify(&self, raw: &str) -> UrlKind {
        let raw = raw.trim();
        if raw.is_empty() {
            UrlKind::Empty
        } else if has_http_scheme(raw) {
            UrlKind::Absolute
        } else if self.upload_prefixes.iter().any(|p| raw.starts_with(p.as_str())) {
            UrlKind::KnownUpload
        } else if !raw.starts_with('/') {
            UrlKind::BareFilename
        } else {
            UrlKind::Rooted
        }
    }

    /// Returns the fetchable URL for `raw` belonging to `plant_id`.
    pub fn normalize(&self, raw: &str, plant_id: i64) -> String {
        let trimmed = raw.trim();
        match self.classify(trimmed) {
            UrlKind::Empty => String::new(),
            UrlKind::Absolute => trimmed.to_string(),
            UrlKind::KnownUpload | UrlKind::Rooted => format!("{}{trimmed}", self.origin),
            UrlKind::BareFilename => {
                format!("{}{}/{plant_id}/{trimmed}", self.origin, self.upload_dir)
            }
        }
    }
}

fn has_http_scheme(raw: &str) -> bool {
    let lower = raw.get(..8).unwrap_or(raw).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
