//! `raiz normalize`: show how a raw image reference resolves.

use anyhow::Result;
use raiz_core::config::Config;
use raiz_core::images::UrlNormalizer;

pub fn run(config: &Config, api_origin: Option<&str>, raw: &str, plant_id: i64) -> Result<()> {
    let origin = config.effective_api_origin(api_origin)?;
    let normalizer = UrlNormalizer::with_layout(origin, &config.images);
    println!("{}", normalizer.normalize(raw, plant_id));
    Ok(())
}
