//! Port trait for the remote transaction source.
//!
//! This trait defines the interface for range reads against the ledger and
//! archive canisters. Implementations live in the adapter layer (e.g.
//! `floe-agent`). One `read_range` invocation maps to exactly one remote
//! call; all batching and iteration logic belongs to the engine.

use async_trait::async_trait;
use candid::{Nat, Principal};

use crate::error::SourceResult;

/// Raw transaction party before normalization.
#[derive(Debug, Clone)]
pub struct RawParty {
    /// Owning principal.
    pub owner: Principal,
    /// Raw subaccount bytes, any length the wire produced.
    pub subaccount: Option<Vec<u8>>,
}

/// Raw burn operation.
#[derive(Debug, Clone)]
pub struct RawBurn {
    pub from: RawParty,
    pub amount: Nat,
    pub memo: Option<Vec<u8>>,
}

/// Raw mint operation.
#[derive(Debug, Clone)]
pub struct RawMint {
    pub to: RawParty,
    pub amount: Nat,
    pub memo: Option<Vec<u8>>,
}

/// Raw transfer operation.
#[derive(Debug, Clone)]
pub struct RawTransfer {
    pub from: RawParty,
    pub to: RawParty,
    pub amount: Nat,
    pub fee: Option<Nat>,
    pub memo: Option<Vec<u8>>,
}

/// Raw approve operation.
#[derive(Debug, Clone)]
pub struct RawApprove {
    pub from: RawParty,
    pub spender: RawParty,
    pub amount: Nat,
    pub fee: Option<Nat>,
    pub memo: Option<Vec<u8>>,
    pub created_at_time: Option<u64>,
}

/// One raw ledger record: a tagged union with at most one populated variant.
///
/// A record where every variant is absent is unparseable and gets dropped
/// during normalization.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    /// Record-level timestamp (nanos since epoch).
    pub timestamp: u64,
    pub burn: Option<RawBurn>,
    pub mint: Option<RawMint>,
    pub transfer: Option<RawTransfer>,
    pub approve: Option<RawApprove>,
}

/// Handoff point where the live segment delegates to an archive canister.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveBoundary {
    /// Archive canister serving the delegated range.
    pub endpoint: Principal,
    /// First index the live segment still holds; the archive serves
    /// everything below it.
    pub first_index: u64,
}

/// Result of one bounded range read.
///
/// The archive handoff travels as a side-channel field of the live
/// response; surfacing it here keeps the engine decoupled from the wire
/// shape.
#[derive(Debug, Clone, Default)]
pub struct RangeSlice {
    /// Records for the requested window, oldest first.
    pub records: Vec<RawRecord>,
    /// Log index of `records[0]` as reported by the endpoint. The live
    /// ledger may serve fewer records than requested when the window
    /// straddles the archive handoff; this tells the engine where the
    /// returned records actually start. Archives do not report it.
    pub first_index: Option<u64>,
    /// Total log length as reported by the endpoint, when available.
    pub log_length: Option<u64>,
    /// Archive handoff, when the response revealed one.
    pub archive: Option<ArchiveBoundary>,
}

/// Port trait for the remote ledger/archive query contract.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Total token supply in base units.
    async fn total_supply(&self) -> SourceResult<Nat>;

    /// Preferred transaction-count source (the dedicated count call).
    ///
    /// May fail on ledgers that do not expose it; the engine falls back to
    /// a zero-length [`Self::read_range`] and its reported log length.
    async fn transaction_count(&self) -> SourceResult<u64>;

    /// Read one bounded window `[start, start + length)` from `endpoint`.
    async fn read_range(
        &self,
        endpoint: Principal,
        start: u64,
        length: u64,
    ) -> SourceResult<RangeSlice>;
}

impl Default for RawParty {
    fn default() -> Self {
        Self {
            owner: Principal::anonymous(),
            subaccount: None,
        }
    }
}
