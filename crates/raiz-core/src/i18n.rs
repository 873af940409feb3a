//! User-facing labels in the supported languages.
//!
//! One catalog serves every surface. Lookups fall back to Portuguese, then
//! to the key itself.

use std::fmt;
use std::str::FromStr;

use raiz_types::LoadState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Pt,
    En,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::Pt => "pt",
            Language::En => "en",
        }
    }

    /// Parses a language tag, tolerating region suffixes (`pt-MZ`, `en_US`).
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.split(['-', '_']).next().unwrap_or("") {
            "pt" => Some(Language::Pt),
            "en" => Some(Language::En),
            _ => None,
        }
    }

    /// Looks up a message key.
    pub fn t(self, key: &'static str) -> &'static str {
        lookup(self, key)
            .or_else(|| lookup(Language::Pt, key))
            .unwrap_or(key)
    }

    /// Label for a per-image load state.
    pub fn load_state(self, state: LoadState) -> &'static str {
        match state {
            LoadState::Loading => self.t("state.loading"),
            LoadState::Loaded => self.t("state.loaded"),
            LoadState::Error => self.t("state.error"),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::parse(s).ok_or_else(|| format!("unsupported language '{s}' (use pt or en)"))
    }
}

fn lookup(lang: Language, key: &str) -> Option<&'static str> {
    let msg = match (lang, key) {
        (Language::Pt, "state.loading") => "carregando",
        (Language::En, "state.loading") => "loading",
        (Language::Pt, "state.loaded") => "carregada",
        (Language::En, "state.loaded") => "loaded",
        (Language::Pt, "state.error") => "erro",
        (Language::En, "state.error") => "error",

        (Language::Pt, "images.none") => "Nenhuma imagem encontrada para esta planta.",
        (Language::En, "images.none") => "No images found for this plant.",
        (Language::Pt, "images.fetch_failed") => "Erro ao carregar imagens",
        (Language::En, "images.fetch_failed") => "Failed to load images",
        (Language::Pt, "images.summary") => "imagens carregadas",
        (Language::En, "images.summary") => "images loaded",
        (Language::Pt, "images.no_url") => "(sem imagem)",
        (Language::En, "images.no_url") => "(no image)",

        (Language::Pt, "column.id") => "ID",
        (Language::Pt, "column.order") => "Ordem",
        (Language::En, "column.order") => "Order",
        (Language::Pt, "column.caption") => "Legenda",
        (Language::En, "column.caption") => "Caption",
        (Language::Pt | Language::En, "column.url") => "URL",
        (Language::Pt, "column.uploaded") => "Enviada em",
        (Language::En, "column.uploaded") => "Uploaded",
        (Language::Pt, "column.state") => "Estado",
        (Language::En, "column.state") => "State",

        (Language::Pt, "check.ok") => "Imagem carregada",
        (Language::En, "check.ok") => "Image loaded",
        (Language::Pt, "check.failed") => "Falha ao carregar imagem",
        (Language::En, "check.failed") => "Image failed to load",

        (Language::Pt, "interrupted") => "Interrompido",
        (Language::En, "interrupted") => "Interrupted",
        _ => return None,
    };
    Some(msg)
}
