//! The traversal engine: end-to-start iteration over the segmented log.
//!
//! The walk has two phases. Phase A reads the live segment backward, one
//! bounded batch at a time, until the log start or an archive handoff.
//! Phase B probes the archive's native batch size, then walks the archived
//! range backward with bounded-concurrency fan-out, delivering batches in
//! launch order. Consumers receive normalized batches newest-first and can
//! stop the whole traversal by returning `false`.

use std::sync::Arc;

use candid::{Nat, Principal};
use futures::future;
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::metrics::{
    record_range_fetched, record_records_dropped, record_traversal_started, FetchTimer,
};
use crate::models::{Holder, SortOrder, Transaction, UniqueCounts};
use crate::normalize::normalize_record;
use crate::ports::{ArchiveBoundary, RangeSlice, RawRecord, TransactionSource};
use crate::services::replay::{BalanceReplay, IdentityFilter, UniqueAccountCounter};

/// Largest window the live ledger serves in one read.
pub const MAX_LIVE_BATCH: u64 = 2000;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the traversal engine.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Fan-out width for archive reads (phase B rounds).
    pub parallel_batches: usize,
    /// Log every fetch at info level. No behavioral effect.
    pub debug: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            parallel_batches: 10,
            debug: false,
        }
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// Traversal and replay engine for one ledger canister.
///
/// # Design
///
/// All state is traversal-scoped: the engine holds only its configuration,
/// the source port, and the ledger endpoint. Nothing is cached between
/// calls; every operation re-fetches from the remote source.
pub struct Ledger<S: TransactionSource> {
    config: LedgerConfig,
    source: Arc<S>,
    ledger_id: Principal,
}

impl<S: TransactionSource> Ledger<S> {
    pub fn new(ledger_id: Principal, source: Arc<S>, config: LedgerConfig) -> Self {
        Self {
            config,
            source,
            ledger_id,
        }
    }

    /// Total token supply in base units.
    pub async fn total_supply(&self) -> LedgerResult<Nat> {
        self.source.total_supply().await.map_err(|e| {
            warn!(error = %e, "Total supply query failed");
            LedgerError::SupplyUnavailable
        })
    }

    /// Total transaction count.
    ///
    /// Tries the dedicated count call first, then falls back to a
    /// zero-length range read and its reported log length. Both failing is
    /// fatal for any traversal.
    #[instrument(skip(self), fields(ledger = %self.ledger_id))]
    pub async fn total_transactions(&self) -> LedgerResult<u64> {
        match self.source.transaction_count().await {
            Ok(count) => Ok(count),
            Err(e) => {
                debug!(error = %e, "Count call failed, falling back to log length");
                let slice = self
                    .source
                    .read_range(self.ledger_id, 0, 0)
                    .await
                    .map_err(|e| {
                        warn!(error = %e, "Log length fallback failed");
                        LedgerError::CountUnavailable
                    })?;
                slice.log_length.ok_or(LedgerError::CountUnavailable)
            }
        }
    }

    /// Walk the whole log newest to oldest, delivering normalized batches.
    ///
    /// The consumer returns `true` to continue; `false` terminates the
    /// traversal immediately (no further reads are issued, though reads
    /// already launched in an archive round still complete).
    #[instrument(skip_all, fields(ledger = %self.ledger_id))]
    pub async fn iterate_transactions<F>(&self, mut consumer: F) -> LedgerResult<()>
    where
        F: FnMut(Vec<Transaction>) -> bool,
    {
        let total = self.total_transactions().await?;
        record_traversal_started();
        debug!(total, "Starting traversal");

        let mut cursor = total;
        let mut handoff: Option<ArchiveBoundary> = None;

        // Phase A: sequential backward walk of the live segment. Each next
        // read depends on the handoff decision from the previous one.
        while cursor > 0 {
            let length = cursor.min(MAX_LIVE_BATCH);
            cursor -= length;

            if self.config.debug {
                info!(start = cursor, length, "Fetching live range");
            }

            let slice = self.fetch(self.ledger_id, cursor, length, "live").await?;
            let archive = slice.archive.clone();
            let batch = normalize_batch(slice.first_index.unwrap_or(cursor), &slice.records);

            if !consumer(batch) {
                debug!("Consumer requested stop during live walk");
                return Ok(());
            }

            if let Some(boundary) = archive {
                debug!(
                    archive = %boundary.endpoint,
                    first_index = boundary.first_index,
                    "Archive handoff discovered"
                );
                handoff = Some(boundary);
                break;
            }
        }

        match handoff {
            Some(boundary) => self.walk_archive(&boundary, &mut consumer).await,
            None => Ok(()),
        }
    }

    /// Phase B: backward walk of the archived range `[0, boundary)`.
    async fn walk_archive<F>(
        &self,
        boundary: &ArchiveBoundary,
        consumer: &mut F,
    ) -> LedgerResult<()>
    where
        F: FnMut(Vec<Transaction>) -> bool,
    {
        // One probe read, purely to learn this archive's native batch size
        // (archives may serve a different window size than the live ledger).
        let probe = self
            .fetch(boundary.endpoint, 0, MAX_LIVE_BATCH, "archive")
            .await?;
        let batch_size = probe.records.len() as u64;
        if batch_size == 0 {
            warn!(archive = %boundary.endpoint, "Archive served an empty probe, nothing to walk");
            return Ok(());
        }

        // Start at the handoff index rounded down to the archive's batch
        // grid, so every window below it is exactly one native batch.
        let start = boundary.first_index - boundary.first_index % batch_size;
        let mut next = Some(start);

        while next.is_some() {
            // Launch up to parallel_batches reads, windows in descending
            // start order. Ordering is fixed here, at launch.
            let mut starts = Vec::with_capacity(self.config.parallel_batches);
            while starts.len() < self.config.parallel_batches {
                let Some(s) = next else { break };
                starts.push(s);
                next = s.checked_sub(batch_size);
            }

            if self.config.debug {
                info!(
                    windows = starts.len(),
                    high = starts.first(),
                    low = starts.last(),
                    "Fetching archive ranges in parallel"
                );
            }

            let fetches = starts
                .iter()
                .map(|&s| self.fetch(boundary.endpoint, s, batch_size, "archive"));
            let slices = future::try_join_all(fetches).await?;

            // Delivery strictly follows launch order; completion timing of
            // the joined reads is irrelevant.
            for (s, slice) in starts.into_iter().zip(slices) {
                let batch = normalize_batch(s, &slice.records);
                if !consumer(batch) {
                    debug!("Consumer requested stop during archive walk");
                    return Ok(());
                }
            }
        }

        Ok(())
    }

    /// One remote range read, with metrics.
    async fn fetch(
        &self,
        endpoint: Principal,
        start: u64,
        length: u64,
        segment: &'static str,
    ) -> LedgerResult<RangeSlice> {
        let _timer = FetchTimer::new();
        let slice = self.source.read_range(endpoint, start, length).await?;
        record_range_fetched(segment);
        trace!(
            %endpoint,
            start,
            length,
            fetched = slice.records.len(),
            segment,
            "Range read complete"
        );
        Ok(slice)
    }

    // =========================================================================
    // Replay operations
    // =========================================================================

    /// Count distinct accounts and principals over the whole log.
    pub async fn count_unique_accounts(&self) -> LedgerResult<UniqueCounts> {
        let mut counter = UniqueAccountCounter::new();
        self.iterate_transactions(|batch| {
            counter.observe_batch(&batch);
            true
        })
        .await?;
        Ok(counter.finish())
    }

    /// Stream transactions touching `identifier` (account or principal) to
    /// `callback`, newest first. Empty filtered sub-batches are skipped;
    /// the callback's stop signal propagates to the traversal.
    pub async fn filter_transactions<F>(&self, identifier: &str, mut callback: F) -> LedgerResult<()>
    where
        F: FnMut(Vec<Transaction>) -> bool,
    {
        let filter = IdentityFilter::new(identifier);
        self.iterate_transactions(|batch| {
            let matching = filter.filter(batch);
            if matching.is_empty() {
                true
            } else {
                callback(matching)
            }
        })
        .await
    }

    /// Replay balances over the whole log and return positive holders,
    /// sorted per `order` (ties break on account string ascending).
    pub async fn collect_holders(&self, order: SortOrder) -> LedgerResult<Vec<Holder>> {
        let mut replay = BalanceReplay::new();
        self.iterate_transactions(|batch| {
            replay.observe_batch(&batch);
            true
        })
        .await?;
        Ok(replay.into_holders(order))
    }
}

/// Normalize one fetched window into a newest-first batch.
///
/// Records arrive oldest-first with dense indices from `start`;
/// unparseable records are dropped, never an error.
fn normalize_batch(start: u64, records: &[RawRecord]) -> Vec<Transaction> {
    let mut dropped = 0u64;
    let mut batch: Vec<Transaction> = records
        .iter()
        .enumerate()
        .filter_map(|(offset, record)| {
            let tx = normalize_record(start + offset as u64, record);
            if tx.is_none() {
                dropped += 1;
            }
            tx
        })
        .collect();

    if dropped > 0 {
        trace!(dropped, "Dropped unparseable records");
        record_records_dropped(dropped);
    }

    batch.reverse();
    batch
}
