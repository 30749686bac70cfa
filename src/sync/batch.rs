//! Batched, rate-limited upserts
//!
//! Partitions normalized records into fixed-size batches, runs one atomic
//! upsert per batch, and sleeps between batches. The delay is deliberate
//! backpressure against the provider's and the store's rate limits, not a
//! performance knob. A failed batch is logged and skipped; one bad batch
//! never aborts the run.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

/// Batch sizing and pacing configuration
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum records per upsert batch
    pub batch_size: usize,
    /// Cooldown between batches (applied after every batch except the last)
    pub inter_batch_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            inter_batch_delay: Duration::from_secs(1),
        }
    }
}

/// Outcome of one batched upsert pass
#[derive(Debug, Default, Clone)]
pub struct BatchReport {
    /// Records submitted to the engine
    pub submitted: usize,
    /// Records actually written to the store
    pub written: u64,
    /// Number of batches executed
    pub batches: usize,
    /// Indices of batches whose write failed
    pub failed_batches: Vec<usize>,
}

/// Upsert `records` in contiguous batches of at most `config.batch_size`,
/// calling `write` once per batch and pausing `config.inter_batch_delay`
/// between batches. `write` failures are recorded and skipped.
pub async fn upsert_in_batches<T, F, Fut>(
    records: Vec<T>,
    config: &BatchConfig,
    mut write: F,
) -> BatchReport
where
    F: FnMut(Vec<T>) -> Fut,
    Fut: Future<Output = Result<u64>>,
{
    let mut report = BatchReport {
        submitted: records.len(),
        ..Default::default()
    };

    if records.is_empty() {
        return report;
    }

    let batch_size = config.batch_size.max(1);
    let mut batches: Vec<Vec<T>> = Vec::new();
    let mut iter = records.into_iter().peekable();
    while iter.peek().is_some() {
        batches.push(iter.by_ref().take(batch_size).collect());
    }

    report.batches = batches.len();
    let last_index = batches.len() - 1;

    for (index, batch) in batches.into_iter().enumerate() {
        let size = batch.len();

        match write(batch).await {
            Ok(written) => {
                debug!(batch_index = index, batch_size = size, written = written, "Batch upsert succeeded");
                report.written += written;
            }
            Err(e) => {
                warn!(
                    batch_index = index,
                    batch_size = size,
                    error = %e,
                    "Batch upsert failed, continuing with next batch"
                );
                report.failed_batches.push(index);
            }
        }

        if index < last_index && !config.inter_batch_delay.is_zero() {
            tokio::time::sleep(config.inter_batch_delay).await;
        }
    }

    report
}
