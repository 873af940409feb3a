//! Per-plant image state controller.
//!
//! A [`PlantGallery`] is bound to one plant for one viewing session. It
//! fetches and orders the image list, tracks a [`LoadState`] per image and
//! publishes every change through a `watch` channel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures_util::future::join_all;
use raiz_types::{ImageRef, LoadState};
use tokio::sync::watch;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::api::ImageListSource;
use crate::images::{ImageLoader, LoadError, LoadResult, UrlNormalizer};

/// Snapshot of a gallery as the presentation layer sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryState {
    /// True only while the image list itself is being fetched.
    pub loading: bool,
    /// Set when the list fetch failed; individual image failures live in `states`.
    pub error: Option<String>,
    /// Images in display order.
    pub images: Vec<ImageRef>,
    pub states: HashMap<i64, LoadState>,
}

impl GalleryState {
    /// No list fetch in flight and no image still loading.
    pub fn is_settled(&self) -> bool {
        !self.loading && self.states.values().all(|s| s.is_terminal())
    }

    pub fn count(&self, state: LoadState) -> usize {
        self.states.values().filter(|s| **s == state).count()
    }

    pub fn state_of(&self, image_id: i64) -> Option<LoadState> {
        self.states.get(&image_id).copied()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GalleryOptions {
    /// Debounce between seeding the list and the automatic preload.
    pub preload_delay: Duration,
    pub auto_preload: bool,
}

impl Default for GalleryOptions {
    fn default() -> Self {
        Self {
            preload_delay: Duration::from_millis(100),
            auto_preload: true,
        }
    }
}

/// Session-scoped orchestrator for one plant's images.
///
/// Cheap to clone; clones share state. [`PlantGallery::close`] (or dropping
/// the last handle) cancels pending loads and the scheduled preload.
#[derive(Clone)]
pub struct PlantGallery {
    inner: Arc<Inner>,
    // Background tasks hold `Inner` only, never this guard.
    _cancel_on_drop: Arc<DropGuard>,
}

struct Inner {
    plant_id: i64,
    source: Arc<dyn ImageListSource>,
    normalizer: UrlNormalizer,
    loader: Arc<ImageLoader>,
    state: watch::Sender<GalleryState>,
    cancel: CancellationToken,
    options: GalleryOptions,
    preload_scheduled: AtomicBool,
}

impl PlantGallery {
    pub fn new(
        plant_id: i64,
        source: Arc<dyn ImageListSource>,
        normalizer: UrlNormalizer,
        loader: Arc<ImageLoader>,
        options: GalleryOptions,
    ) -> Self {
        let (state, _) = watch::channel(GalleryState::default());
        let cancel = CancellationToken::new();
        Self {
            _cancel_on_drop: Arc::new(cancel.clone().drop_guard()),
            inner: Arc::new(Inner {
                plant_id,
                source,
                normalizer,
                loader,
                state,
                cancel,
                options,
                preload_scheduled: AtomicBool::new(false),
            }),
        }
    }

    pub fn plant_id(&self) -> i64 {
        self.inner.plant_id
    }

    pub fn loader(&self) -> &Arc<ImageLoader> {
        &self.inner.loader
    }

    /// Live view of the gallery state.
    pub fn subscribe(&self) -> watch::Receiver<GalleryState> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> GalleryState {
        self.inner.state.borrow().clone()
    }

    pub fn load_state(&self, image_id: i64) -> Option<LoadState> {
        self.inner.state.borrow().state_of(image_id)
    }

    /// Seeds the gallery.
    ///
    /// Pre-supplied images are used as given. Otherwise the list is fetched,
    /// each URL normalized and the list stably sorted by `order`. Every image
    /// starts out `Loading`. A failed fetch is recorded in
    /// [`GalleryState::error`] with an empty list.
    pub async fn initialize(&self, presupplied: Option<Vec<ImageRef>>) {
        let plant_id = self.inner.plant_id;
        let images = if let Some(images) = presupplied {
            images
        } else {
            self.inner.state.send_modify(|s| {
                s.loading = true;
                s.error = None;
            });

            let fetched = tokio::select! {
                biased;
                () = self.inner.cancel.cancelled() => {
                    self.inner.state.send_modify(|s| s.loading = false);
                    return;
                }
                fetched = self.inner.source.fetch_images(plant_id) => fetched,
            };

            match fetched {
                Ok(raw) => self.prepare(raw),
                Err(err) => {
                    warn!(plant_id, error = %format!("{err:#}"), "image list fetch failed");
                    self.inner.state.send_modify(|s| {
                        s.loading = false;
                        s.error = Some(format!("{err:#}"));
                        s.images.clear();
                        s.states.clear();
                    });
                    return;
                }
            }
        };

        let has_images = !images.is_empty();
        let states = images.iter().map(|i| (i.id, LoadState::Loading)).collect();
        info!(plant_id, count = images.len(), "gallery seeded");
        self.inner.state.send_modify(|s| {
            s.loading = false;
            s.error = None;
            s.images = images;
            s.states = states;
        });

        if has_images && self.inner.options.auto_preload {
            self.schedule_preload();
        }
    }

    fn prepare(&self, raw: Vec<ImageRef>) -> Vec<ImageRef> {
        let plant_id = self.inner.plant_id;
        let mut images: Vec<ImageRef> = raw
            .into_iter()
            .map(|mut image| {
                image.url = self.inner.normalizer.normalize(&image.url, plant_id);
                image
            })
            .collect();
        // `sort_by_key` is stable: equal orders keep fetch order.
        images.sort_by_key(|i| i.order);
        images
    }

    /// Arms the one-shot automatic preload.
    fn schedule_preload(&self) {
        if self.inner.preload_scheduled.swap(true, Ordering::SeqCst) {
            return;
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let cancel = self.inner.cancel.clone();
        let delay = self.inner.options.preload_delay;
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                () = tokio::time::sleep(delay) => {}
            }
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.preload_all().await;
        });
    }

    /// Evicts one image from the cache and loads it again. Unknown ids are
    /// ignored.
    pub async fn retry_image(&self, image_id: i64) {
        let url = {
            let state = self.inner.state.borrow();
            state
                .images
                .iter()
                .find(|i| i.id == image_id)
                .map(|i| i.url.clone())
        };
        let Some(url) = url else {
            debug!(image_id, "retry for unknown image ignored");
            return;
        };
        if self.is_closed() {
            return;
        }

        let previous = self.inner.state.borrow().states.clone();
        self.inner.loader.retry(&url);
        self.inner.set_state(image_id, LoadState::Loading);
        let result = self.inner.loader.load_image(&url, &self.inner.cancel).await;
        if result.error == Some(LoadError::Cancelled) {
            self.inner.restore(&[image_id], &previous);
        } else {
            self.inner.apply(image_id, &result);
        }
    }

    /// Evicts every image and reloads them one at a time, in display order.
    ///
    /// If the gallery is closed midway, images not yet reloaded get their
    /// previous state back.
    pub async fn retry_all(&self) {
        if self.is_closed() {
            return;
        }

        let images = self.inner.current_images();
        let previous = self.inner.state.borrow().states.clone();
        for image in &images {
            self.inner.loader.retry(&image.url);
        }
        self.inner.state.send_modify(|s| {
            for image in &images {
                s.states.insert(image.id, LoadState::Loading);
            }
        });

        for (idx, image) in images.iter().enumerate() {
            let result = self
                .inner
                .loader
                .load_image(&image.url, &self.inner.cancel)
                .await;
            if result.error == Some(LoadError::Cancelled) {
                let pending: Vec<i64> = images[idx..].iter().map(|i| i.id).collect();
                self.inner.restore(&pending, &previous);
                return;
            }
            self.inner.apply(image.id, &result);
        }
    }

    /// Loads every image concurrently; each state is published as soon as
    /// its own load settles.
    pub async fn preload_all(&self) {
        self.inner.preload_all().await;
    }

    /// Resolves once the gallery is settled (or closed) and returns that state.
    pub async fn settled(&self) -> GalleryState {
        let mut rx = self.inner.state.subscribe();
        tokio::select! {
            biased;
            () = self.inner.cancel.cancelled() => {}
            _ = rx.wait_for(GalleryState::is_settled) => {}
        }
        self.snapshot()
    }

    /// Cancels in-flight loads and the pending preload.
    pub fn close(&self) {
        self.inner.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }
}

impl Inner {
    async fn preload_all(&self) {
        let images = self.current_images();
        debug!(plant_id = self.plant_id, count = images.len(), "preloading images");

        join_all(images.iter().map(|image| async move {
            let result = self.loader.load_image(&image.url, &self.cancel).await;
            self.apply(image.id, &result);
        }))
        .await;
    }

    fn current_images(&self) -> Vec<ImageRef> {
        self.state.borrow().images.clone()
    }

    fn set_state(&self, image_id: i64, state: LoadState) {
        self.state.send_modify(|s| {
            s.states.insert(image_id, state);
        });
    }

    /// Puts back the states recorded in `previous` for `ids`.
    fn restore(&self, ids: &[i64], previous: &HashMap<i64, LoadState>) {
        self.state.send_modify(|s| {
            for id in ids {
                match previous.get(id) {
                    Some(state) => s.states.insert(*id, *state),
                    None => s.states.remove(id),
                };
            }
        });
    }

    fn apply(&self, image_id: i64, result: &LoadResult) {
        match &result.error {
            None => self.set_state(image_id, LoadState::Loaded),
            // The session is going away; leave the state as it was.
            Some(LoadError::Cancelled) => {}
            Some(err) => {
                debug!(image_id, url = %result.url, error = %err, "image marked as error");
                self.set_state(image_id, LoadState::Error);
            }
        }
    }
}
