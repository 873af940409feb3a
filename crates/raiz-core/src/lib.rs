//! Core raiz library (config, backend client, image pipeline, gallery).

pub mod api;
pub mod catalog;
pub mod config;
pub mod gallery;
pub mod i18n;
pub mod images;
pub mod logging;

use std::sync::Arc;

use anyhow::Result;

use crate::api::PlantApiClient;
use crate::config::Config;
use crate::gallery::{GalleryOptions, PlantGallery};
use crate::images::{ImageLoader, RetryPolicy, UrlNormalizer};

/// Wires a gallery for `plant_id` from configuration: HTTP backend client,
/// HTTP image probe and a fresh session cache.
///
/// # Errors
/// Returns an error if the API origin does not resolve to a valid URL or
/// an HTTP client cannot be built.
pub fn gallery_from_config(
    config: &Config,
    origin_override: Option<&str>,
    plant_id: i64,
) -> Result<PlantGallery> {
    let client = PlantApiClient::from_config(config, origin_override)?;
    let normalizer = UrlNormalizer::with_layout(client.origin(), &config.images);
    let loader = ImageLoader::http(RetryPolicy::from_config(&config.images))?;
    let options = GalleryOptions {
        preload_delay: config.images.preload_delay(),
        auto_preload: true,
    };
    Ok(PlantGallery::new(
        plant_id,
        Arc::new(client),
        normalizer,
        Arc::new(loader),
        options,
    ))
}
