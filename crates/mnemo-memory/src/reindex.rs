// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Re-embedding every stored memory with a new embedding model.
//!
//! The pipeline is three supervised stages joined by bounded queues:
//!
//! ```text
//! jobs ──▶ embed ──▶ outcomes ──▶ write ──▶ done
//!   ▲                              │
//!   │                              ▼
//!   └──── delayed resubmit ◀──── retry ──▶ permanent failure
//! ```
//!
//! A failed job is rebuilt with its attempt counter bumped and resubmitted
//! after a linear backoff. The retry stage never sleeps itself; each pending
//! retry waits in its own task, so one slow memory never holds up the rest.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use mnemo_config::ReindexConfig;
use mnemo_core::{EmbeddingProvider, MnemoError, Model, ReindexFailure};
use tokio::sync::{Mutex, Notify, mpsc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::store::MemoryStore;
use crate::types::MemoryItem;
use crate::vector::normalize;

/// Retries after the first failed attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Retry `n` (1-based) waits `n` times this.
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(2);

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// One memory's trip through the pipeline.
///
/// Jobs are never mutated; a retry builds a new job via [`ReindexJob::next_attempt`].
#[derive(Debug, Clone)]
pub struct ReindexJob {
    item: MemoryItem,
    attempt: u32,
}

impl ReindexJob {
    pub fn new(item: MemoryItem) -> Self {
        Self { item, attempt: 0 }
    }

    pub fn item(&self) -> &MemoryItem {
        &self.item
    }

    /// Zero for the first try.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// The same memory, one attempt later.
    pub fn next_attempt(self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self
        }
    }
}

/// Result of the embed stage for one job.
#[derive(Debug)]
enum EmbedOutcome {
    Embedded { job: ReindexJob, embedding: Vec<f32> },
    Failed { job: ReindexJob, error: String },
}

/// A job that failed at the embed or write stage, with the error seen.
type RetryRequest = (ReindexJob, String);

/// Configurable reindex pipeline.
#[derive(Debug, Clone)]
pub struct Reindexer {
    max_retries: u32,
    backoff_unit: Duration,
    queue_capacity: usize,
}

impl Default for Reindexer {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Reindexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ReindexConfig) -> Self {
        Self::default()
            .with_max_retries(config.max_retries)
            .with_backoff_unit(Duration::from_secs(config.backoff_secs))
            .with_queue_capacity(config.queue_capacity)
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// Capacity of each stage queue. Clamped to at least 1.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Delay before resubmitting a job that just failed.
    pub fn backoff_for(&self, job: &ReindexJob) -> Duration {
        self.backoff_unit * (job.attempt + 1)
    }

    /// Re-embed every stored memory with `model`.
    ///
    /// Memories that succeed are updated in place even when others fail.
    /// Returns [`MnemoError::Reindex`] listing each memory that exhausted its
    /// retries, or [`MnemoError::Cancelled`] if `cancel` fires first. All
    /// pipeline tasks have stopped by the time this returns.
    pub async fn run(
        &self,
        store: Arc<MemoryStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        model: &Model,
        cancel: &CancellationToken,
    ) -> Result<(), MnemoError> {
        let items = store.get_all_memories().await?;
        if items.is_empty() {
            debug!("no memories to reindex");
            return Ok(());
        }
        let total = items.len();
        info!(total, model = %model, "reindexing memories");

        let progress = Arc::new(Progress::new(total));
        let shutdown = cancel.child_token();
        let tracker = TaskTracker::new();
        let model = Arc::new(model.clone());

        let (job_tx, job_rx) = mpsc::channel::<ReindexJob>(self.queue_capacity);
        let (outcome_tx, outcome_rx) = mpsc::channel::<EmbedOutcome>(self.queue_capacity);
        let (retry_tx, retry_rx) = mpsc::channel::<RetryRequest>(self.queue_capacity);

        tracker.spawn(embed_stage(
            job_rx,
            outcome_tx,
            Arc::clone(&embedder),
            Arc::clone(&model),
            shutdown.clone(),
        ));
        tracker.spawn(write_stage(
            outcome_rx,
            retry_tx,
            store,
            Arc::clone(&model),
            Arc::clone(&progress),
            shutdown.clone(),
        ));
        tracker.spawn(retry_stage(
            retry_rx,
            job_tx.clone(),
            self.clone(),
            tracker.clone(),
            Arc::clone(&progress),
            shutdown.clone(),
        ));
        tracker.spawn(feed(items, job_tx, shutdown.clone()));

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(MnemoError::Cancelled),
            _ = progress.done.notified() => Ok(()),
        };

        shutdown.cancel();
        tracker.close();
        tracker.wait().await;

        if let Err(e) = outcome {
            info!(
                remaining = progress.remaining.load(Ordering::SeqCst),
                "reindex cancelled"
            );
            return Err(e);
        }

        let mut failures = std::mem::take(&mut *progress.failures.lock().await);
        info!(
            reindexed = total - failures.len(),
            failed = failures.len(),
            "reindex complete"
        );
        if failures.is_empty() {
            Ok(())
        } else {
            failures.sort_by(|a, b| a.id.cmp(&b.id));
            Err(MnemoError::Reindex { failures })
        }
    }
}

/// Re-embed every stored memory with `new_model` using the default retry policy.
pub async fn reindex_memories(
    store: Arc<MemoryStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    new_model: &Model,
    cancel: &CancellationToken,
) -> Result<(), MnemoError> {
    Reindexer::default().run(store, embedder, new_model, cancel).await
}

/// Shared completion state.
struct Progress {
    remaining: AtomicUsize,
    done: Notify,
    failures: Mutex<Vec<ReindexFailure>>,
}

impl Progress {
    fn new(total: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(total),
            done: Notify::new(),
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Mark one job finished, successfully or not.
    fn finish_one(&self) {
        if self.remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.done.notify_one();
        }
    }
}

async fn feed(items: Vec<MemoryItem>, job_tx: mpsc::Sender<ReindexJob>, shutdown: CancellationToken) {
    for item in items {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => return,
            sent = job_tx.send(ReindexJob::new(item)) => {
                if sent.is_err() {
                    return;
                }
            }
        }
    }
}

async fn embed_stage(
    mut job_rx: mpsc::Receiver<ReindexJob>,
    outcome_tx: mpsc::Sender<EmbedOutcome>,
    embedder: Arc<dyn EmbeddingProvider>,
    model: Arc<Model>,
    shutdown: CancellationToken,
) {
    loop {
        let job = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            job = job_rx.recv() => match job {
                Some(job) => job,
                None => break,
            },
        };

        let result = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            result = embedder.embed(&model, &job.item.text) => result,
        };
        let outcome = match result {
            Ok(embedding) => EmbedOutcome::Embedded { job, embedding },
            Err(e) => EmbedOutcome::Failed {
                job,
                error: e.to_string(),
            },
        };

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            sent = outcome_tx.send(outcome) => {
                if sent.is_err() {
                    break;
                }
            }
        }
    }
}

async fn write_stage(
    mut outcome_rx: mpsc::Receiver<EmbedOutcome>,
    retry_tx: mpsc::Sender<RetryRequest>,
    store: Arc<MemoryStore>,
    model: Arc<Model>,
    progress: Arc<Progress>,
    shutdown: CancellationToken,
) {
    loop {
        let outcome = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            outcome = outcome_rx.recv() => match outcome {
                Some(outcome) => outcome,
                None => break,
            },
        };

        let retry = match outcome {
            EmbedOutcome::Embedded { job, embedding } => {
                // dim follows the written vector, not the provider's advertised size.
                let embedding = normalize(&embedding);
                let written = store
                    .update_memory_embedding(
                        &job.item.id,
                        &embedding,
                        &model.model_id,
                        embedding.len(),
                        &model.provider,
                    )
                    .await;
                match written {
                    Ok(()) => {
                        debug!(id = %job.item.id, attempt = job.attempt, "memory reindexed");
                        progress.finish_one();
                        continue;
                    }
                    Err(e) => (job, e.to_string()),
                }
            }
            EmbedOutcome::Failed { job, error } => (job, error),
        };

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            sent = retry_tx.send(retry) => {
                if sent.is_err() {
                    break;
                }
            }
        }
    }
}

async fn retry_stage(
    mut retry_rx: mpsc::Receiver<RetryRequest>,
    job_tx: mpsc::Sender<ReindexJob>,
    policy: Reindexer,
    tracker: TaskTracker,
    progress: Arc<Progress>,
    shutdown: CancellationToken,
) {
    loop {
        let (job, error) = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            request = retry_rx.recv() => match request {
                Some(request) => request,
                None => break,
            },
        };

        if job.attempt >= policy.max_retries {
            warn!(
                id = %job.item.id,
                attempts = job.attempt + 1,
                error = %error,
                "memory failed to reindex, keeping old embedding"
            );
            progress.failures.lock().await.push(ReindexFailure {
                id: job.item.id.clone(),
                error,
            });
            progress.finish_one();
            continue;
        }

        let delay = policy.backoff_for(&job);
        debug!(
            id = %job.item.id,
            attempt = job.attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "scheduling reindex retry"
        );
        let job_tx = job_tx.clone();
        let shutdown = shutdown.clone();
        tracker.spawn(async move {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {}
                _ = async {
                    tokio::time::sleep(delay).await;
                    let _ = job_tx.send(job.next_attempt()).await;
                } => {}
            }
        });
    }
}
