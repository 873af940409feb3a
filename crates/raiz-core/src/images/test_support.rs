//! Scripted probe for loader and gallery tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::time::Instant;

use super::error::LoadError;
use super::probe::ImageProbe;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Behavior {
    Ok,
    Status(u16),
    /// Fails the first `n` attempts, then succeeds.
    FailThenOk(usize),
    /// Never completes on its own.
    Hang,
}

#[derive(Debug, Clone)]
pub(crate) struct Attempt {
    pub url: String,
    pub started: Instant,
    pub finished: Option<Instant>,
}

/// Unknown URLs behave as [`Behavior::Ok`].
#[derive(Debug, Default)]
pub(crate) struct FakeProbe {
    behaviors: Mutex<HashMap<String, Behavior>>,
    log: Mutex<Vec<Attempt>>,
    latency: Duration,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn set(&self, url: &str, behavior: Behavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(url.to_string(), behavior);
    }

    pub fn attempts(&self, url: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.url == url)
            .count()
    }

    pub fn total_attempts(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    pub fn log(&self) -> Vec<Attempt> {
        self.log.lock().unwrap().clone()
    }
}

impl ImageProbe for FakeProbe {
    fn probe<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<(), LoadError>> {
        Box::pin(async move {
            let behavior = self
                .behaviors
                .lock()
                .unwrap()
                .get(url)
                .copied()
                .unwrap_or(Behavior::Ok);
            let (index, prior) = {
                let mut log = self.log.lock().unwrap();
                let prior = log.iter().filter(|a| a.url == url).count();
                log.push(Attempt {
                    url: url.to_string(),
                    started: Instant::now(),
                    finished: None,
                });
                (log.len() - 1, prior)
            };

            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }

            let result = match behavior {
                Behavior::Ok => Ok(()),
                Behavior::Status(code) => Err(LoadError::Http(code)),
                Behavior::FailThenOk(n) if prior < n => {
                    Err(LoadError::Network("connection reset".to_string()))
                }
                Behavior::FailThenOk(_) => Ok(()),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(())
                }
            };

            self.log.lock().unwrap()[index].finished = Some(Instant::now());
            result
        })
    }
}
