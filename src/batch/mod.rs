//! Bounded batch execution.
//!
//! A work list is split into fixed-size chunks. Every item of a chunk is
//! started at once and the chunk is joined; the next chunk starts only after
//! all tasks of the previous one have settled. There is no concurrency cap
//! beyond the chunk size, no work stealing and no cancellation mid-chunk.
//!
//! Tasks return `()`: each task records its own outcome (usually into a
//! shared, lock-guarded report) so one failing item can never abort its
//! siblings or the chunks after it.

use std::future::Future;
use std::time::{Duration, Instant};

use futures::future::join_all;

/// Runs async tasks chunk by chunk.
#[derive(Debug, Clone, Copy)]
pub struct BatchExecutor {
    chunk_size: usize,
    task_timeout: Option<Duration>,
}

/// What happened during a [`BatchExecutor::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub chunks: usize,
    /// Size of every chunk, in order
    pub chunk_sizes: Vec<usize>,
    /// Tasks that ran to completion or timed out
    pub settled: usize,
    /// Indexes (into the original work list) of tasks that hit the timeout
    pub timed_out: Vec<usize>,
}

impl BatchExecutor {
    /// A chunk size of 0 is treated as 1.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            task_timeout: None,
        }
    }

    /// Give up on any single task after `timeout`.
    ///
    /// A timed-out task is dropped and reported in [`BatchStats::timed_out`];
    /// its siblings keep running.
    pub fn with_task_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Run `task` over every item, chunk by chunk, preserving list order.
    pub async fn run<T, F, Fut>(&self, label: &str, items: Vec<T>, task: F) -> BatchStats
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = ()>,
    {
        let total = items.len();
        let total_chunks = total.div_ceil(self.chunk_size);
        let mut stats = BatchStats::default();
        let mut items = items.into_iter();
        let mut offset = 0;

        tracing::debug!(
            label,
            total,
            chunk_size = self.chunk_size,
            chunks = total_chunks,
            "Starting batch"
        );

        loop {
            let chunk: Vec<T> = items.by_ref().take(self.chunk_size).collect();
            if chunk.is_empty() {
                break;
            }

            let started = Instant::now();
            let size = chunk.len();
            let timeout = self.task_timeout;

            let tasks = chunk.into_iter().enumerate().map(|(i, item)| {
                let fut = task(item);
                async move {
                    match timeout {
                        Some(limit) => tokio::time::timeout(limit, fut)
                            .await
                            .is_err()
                            .then_some(offset + i),
                        None => {
                            fut.await;
                            None
                        }
                    }
                }
            });

            let results = join_all(tasks).await;
            let timed_out: Vec<usize> = results.into_iter().flatten().collect();

            if !timed_out.is_empty() {
                tracing::warn!(label, count = timed_out.len(), "Tasks timed out");
            }

            stats.chunks += 1;
            stats.chunk_sizes.push(size);
            stats.settled += size;
            stats.timed_out.extend(timed_out);
            offset += size;

            tracing::info!(
                label,
                chunk = stats.chunks,
                of = total_chunks,
                size,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Chunk settled"
            );
        }

        stats
    }
}
