//! `raiz images`: load a plant gallery and report per-image state.

use anyhow::{Context, Result, bail};
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use raiz_core::config::Config;
use raiz_core::gallery::GalleryState;
use raiz_core::i18n::Language;
use raiz_types::LoadState;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct ImagesRunOptions<'a> {
    pub config: &'a Config,
    pub api_origin: Option<&'a str>,
    pub plant_id: i64,
    pub retry_all: bool,
    pub json: bool,
    pub interrupt: CancellationToken,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    plant_id: i64,
    loaded: usize,
    total: usize,
    images: Vec<JsonImage<'a>>,
}

#[derive(Serialize)]
struct JsonImage<'a> {
    id: i64,
    order: i32,
    caption: Option<&'a str>,
    url: &'a str,
    uploaded_at: Option<&'a str>,
    state: LoadState,
}

pub async fn run(opts: ImagesRunOptions<'_>) -> Result<()> {
    let lang = opts.config.language;
    let gallery = raiz_core::gallery_from_config(opts.config, opts.api_origin, opts.plant_id)?;

    let watcher = {
        let gallery = gallery.clone();
        let interrupt = opts.interrupt.clone();
        tokio::spawn(async move {
            interrupt.cancelled().await;
            gallery.close();
        })
    };

    gallery.initialize(None).await;
    let mut state = gallery.settled().await;

    if let Some(err) = &state.error {
        watcher.abort();
        bail!("{}: {err}", lang.t("images.fetch_failed"));
    }

    if opts.retry_all && !gallery.is_closed() && state.count(LoadState::Error) > 0 {
        gallery.retry_all().await;
        state = gallery.snapshot();
    }

    debug!(
        plant_id = opts.plant_id,
        loaded = state.count(LoadState::Loaded),
        failed = state.count(LoadState::Error),
        "gallery settled"
    );

    let interrupted = gallery.is_closed();
    gallery.close();
    watcher.abort();
    if interrupted {
        bail!("{}", lang.t("interrupted"));
    }

    if opts.json {
        print_json(gallery.plant_id(), &state)?;
    } else {
        print_table(lang, &state);
    }
    Ok(())
}

fn print_json(plant_id: i64, state: &GalleryState) -> Result<()> {
    let images = state
        .images
        .iter()
        .map(|image| JsonImage {
            id: image.id,
            order: image.order,
            caption: image.caption.as_deref(),
            url: &image.url,
            uploaded_at: image.uploaded_at.as_deref(),
            state: state.state_of(image.id).unwrap_or_default(),
        })
        .collect();
    let report = JsonReport {
        plant_id,
        loaded: state.count(LoadState::Loaded),
        total: state.images.len(),
        images,
    };
    let out = serde_json::to_string_pretty(&report).context("serialize report")?;
    println!("{out}");
    Ok(())
}

fn print_table(lang: Language, state: &GalleryState) {
    if state.images.is_empty() {
        println!("{}", lang.t("images.none"));
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        lang.t("column.id"),
        lang.t("column.order"),
        lang.t("column.caption"),
        lang.t("column.uploaded"),
        lang.t("column.url"),
        lang.t("column.state"),
    ]);

    for image in &state.images {
        let url = if image.has_url() {
            image.url.clone()
        } else {
            lang.t("images.no_url").to_string()
        };
        let uploaded = image
            .uploaded_at_utc()
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        table.add_row(vec![
            image.id.to_string(),
            image.order.to_string(),
            image.caption.clone().unwrap_or_default(),
            uploaded,
            url,
            lang.load_state(state.state_of(image.id).unwrap_or_default())
                .to_string(),
        ]);
    }

    println!("{table}");
    println!(
        "{}/{} {}",
        state.count(LoadState::Loaded),
        state.images.len(),
        lang.t("images.summary")
    );
}
