//! Entities offered by the back-office autocomplete fields.

use serde::{Deserialize, Serialize};

/// One selectable autocomplete entry.
///
/// Each entity kind carries its own fields; the label shown to the user is
/// derived by [`CatalogItem::display_label`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogItem {
    Author {
        id: i64,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        affiliation: Option<String>,
    },
    Reference {
        id: i64,
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        year: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        link: Option<String>,
    },
    Plant {
        id: i64,
        scientific_name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        common_names: Vec<String>,
    },
    Location {
        id: i64,
        province: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        district: Option<String>,
    },
    Language {
        /// ISO 639-1 code; doubles as the identifier.
        code: String,
        name: String,
    },
}

impl CatalogItem {
    /// Stable identifier used as the selection value.
    pub fn id(&self) -> String {
        match self {
            CatalogItem::Author { id, .. }
            | CatalogItem::Reference { id, .. }
            | CatalogItem::Plant { id, .. }
            | CatalogItem::Location { id, .. } => id.to_string(),
            CatalogItem::Language { code, .. } => code.clone(),
        }
    }

    /// Human-readable label for the suggestion list.
    pub fn display_label(&self) -> String {
        match self {
            CatalogItem::Author {
                name, affiliation, ..
            } => match affiliation {
                Some(aff) if !aff.trim().is_empty() => format!("{name} ({})", aff.trim()),
                _ => name.clone(),
            },
            CatalogItem::Reference { title, year, .. } => match year {
                Some(year) => format!("{title} ({year})"),
                None => title.clone(),
            },
            CatalogItem::Plant {
                scientific_name,
                common_names,
                ..
            } => {
                if common_names.is_empty() {
                    scientific_name.clone()
                } else {
                    format!("{scientific_name} - {}", common_names.join(", "))
                }
            }
            CatalogItem::Location {
                province, district, ..
            } => match district {
                Some(d) if !d.trim().is_empty() => format!("{}, {province}", d.trim()),
                _ => province.clone(),
            },
            CatalogItem::Language { code, name } => format!("{name} [{code}]"),
        }
    }
}
