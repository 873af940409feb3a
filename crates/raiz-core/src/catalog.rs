//! Client-side filtering and debounced search over catalog entries.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use raiz_types::CatalogItem;
use tokio_util::sync::CancellationToken;

/// Lowercases and strips the Latin diacritics used in Portuguese.
pub fn fold(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// Items whose label contains `query`, ignoring case and accents.
///
/// Labels starting with the query come first; otherwise input order is
/// kept. A blank query matches nothing.
pub fn filter_catalog<'a>(
    items: &'a [CatalogItem],
    query: &str,
    limit: usize,
) -> Vec<&'a CatalogItem> {
    let needle = fold(query.trim());
    if needle.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<(bool, &CatalogItem)> = items
        .iter()
        .filter_map(|item| {
            let label = fold(&item.display_label());
            label.find(&needle).map(|pos| (pos != 0, item))
        })
        .collect();
    matches.sort_by_key(|(not_prefix, _)| *not_prefix);
    matches.into_iter().take(limit).map(|(_, item)| item).collect()
}

/// Debounced autocomplete over an in-memory catalog.
///
/// Each call to [`Autocomplete::search`] supersedes the previous one; only
/// the last query of a burst produces results.
#[derive(Debug)]
pub struct Autocomplete {
    items: Vec<CatalogItem>,
    debounce: Duration,
    limit: usize,
    pending: Mutex<Option<CancellationToken>>,
}

impl Autocomplete {
    pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
    pub const DEFAULT_LIMIT: usize = 10;

    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            items,
            debounce: Self::DEFAULT_DEBOUNCE,
            limit: Self::DEFAULT_LIMIT,
            pending: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Waits out the debounce window and returns matches, or `None` if a
    /// newer search arrived in the meantime.
    pub async fn search(&self, query: &str) -> Option<Vec<CatalogItem>> {
        let token = CancellationToken::new();
        {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = pending.replace(token.clone()) {
                previous.cancel();
            }
        }

        tokio::select! {
            biased;
            () = token.cancelled() => return None,
            () = tokio::time::sleep(self.debounce) => {}
        }

        Some(
            filter_catalog(&self.items, query, self.limit)
                .into_iter()
                .cloned()
                .collect(),
        )
    }
}
