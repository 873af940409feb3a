//! `raiz check`: load one image URL through the retrying loader.

use anyhow::{Result, bail};
use raiz_core::config::Config;
use raiz_core::images::{ImageLoader, LoadError, RetryPolicy};
use tokio_util::sync::CancellationToken;

pub async fn run(
    config: &Config,
    url: &str,
    retries: Option<u32>,
    interrupt: &CancellationToken,
) -> Result<()> {
    let lang = config.language;
    let policy = RetryPolicy::from_config(&config.images);
    let loader = ImageLoader::http(policy)?;

    let result = loader
        .load_image_with(url, retries.unwrap_or(policy.max_retries), interrupt)
        .await;

    match result.error {
        None => {
            println!("{}: {}", lang.t("check.ok"), result.url);
            Ok(())
        }
        Some(LoadError::Cancelled) => bail!("{}", lang.t("interrupted")),
        Some(err) => bail!("{}: {} ({err})", lang.t("check.failed"), result.url),
    }
}
