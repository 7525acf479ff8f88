use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::error::{IngestError, Result};
use crate::source::{FixtureLink, MatchSource, RawMatchRecord};

pub const DEFAULT_BATCH_SIZE: usize = 3;
pub const MAX_BATCH_SIZE: usize = 5;
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);
pub const MIN_COOLDOWN: Duration = Duration::from_secs(10);
pub const MAX_COOLDOWN: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

type PauseFn = Box<dyn Fn(Duration) + Send + Sync>;

/// Fixed-window rate limiter: fetch one batch concurrently, wait, fetch the next.
pub struct BatchScheduler {
    batch_size: usize,
    cooldown: Duration,
    pool: rayon::ThreadPool,
    pause: PauseFn,
    cancel: CancelToken,
}

impl BatchScheduler {
    pub fn new(batch_size: usize, cooldown: Duration) -> Result<Self> {
        Self::build(batch_size, cooldown.clamp(MIN_COOLDOWN, MAX_COOLDOWN))
    }

    // Snapshot replays hit no remote source, so batches run back to back.
    pub fn unthrottled(batch_size: usize) -> Result<Self> {
        Self::build(batch_size, Duration::ZERO)
    }

    fn build(batch_size: usize, cooldown: Duration) -> Result<Self> {
        let batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(batch_size)
            .thread_name(|idx| format!("fixture-fetch-{idx}"))
            .build()
            .map_err(|err| IngestError::Io(std::io::Error::other(err)))?;
        Ok(Self {
            batch_size,
            cooldown,
            pool,
            pause: Box::new(std::thread::sleep),
            cancel: CancelToken::new(),
        })
    }

    pub fn with_pause(mut self, pause: impl Fn(Duration) + Send + Sync + 'static) -> Self {
        self.pause = Box::new(pause);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    // Any failed fetch fails the whole call; nothing is retried and no partial
    // result is returned.
    pub fn run<M: MatchSource + ?Sized>(
        &self,
        fixtures: &[FixtureLink],
        source: &M,
    ) -> Result<Vec<RawMatchRecord>> {
        let total = fixtures.len();
        let mut out = Vec::with_capacity(total);

        for (idx, batch) in fixtures.chunks(self.batch_size).enumerate() {
            if self.cancel.is_cancelled() {
                warn!("ingestion cancelled before batch {}", idx + 1);
                return Err(IngestError::Cancelled {
                    completed: out.len(),
                    total,
                });
            }
            if idx > 0 {
                (self.pause)(self.cooldown);
            }

            let done = out.len();
            info!(
                "{:.2}% ({}/{})",
                done as f64 / total as f64 * 100.0,
                done,
                total
            );

            let records = self.pool.install(|| {
                batch
                    .par_iter()
                    .map(|fixture| {
                        if self.cancel.is_cancelled() {
                            return Err(IngestError::Cancelled {
                                completed: done,
                                total,
                            });
                        }
                        debug!("fetching {}", fixture.match_reference);
                        source.extract_match(fixture)
                    })
                    .collect::<Result<Vec<_>>>()
            })?;
            out.extend(records);
        }

        if total > 0 {
            info!("100.00% ({total}/{total})");
        }
        Ok(out)
    }
}
