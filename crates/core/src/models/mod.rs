//! Canonical domain models for ledger transactions and replay results.
//!
//! These models are transport-agnostic and represent the canonical form of
//! ledger data within the domain layer. All of them are traversal-scoped
//! value data: nothing here outlives a single top-level call into the
//! engine.

use candid::Nat;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

// =============================================================================
// Transactions
// =============================================================================

/// Kind of a canonical ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Transfer,
    Mint,
    Burn,
    Approve,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransactionKind::Transfer => "transfer",
            TransactionKind::Mint => "mint",
            TransactionKind::Burn => "burn",
            TransactionKind::Approve => "approve",
        };
        write!(f, "{}", s)
    }
}

/// A transaction party: textual principal plus the derived account address.
///
/// Purely descriptive - recomputed for every transaction, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// Textual principal identity.
    pub principal: String,
    /// Derived account-identifier hex. Absent if derivation failed.
    pub account: Option<String>,
    /// Raw subaccount bytes as hex, whenever present on the wire.
    pub subaccount: Option<String>,
}

impl Party {
    /// Whether this party's account or principal equals `identifier`.
    pub fn matches(&self, identifier: &str) -> bool {
        self.account.as_deref() == Some(identifier) || self.principal == identifier
    }
}

/// Canonical, normalized ledger transaction.
///
/// `index` values produced across one full traversal form a contiguous
/// descending range `[0, total)` with no gaps or duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Dense log ordinal, unique over the full log.
    pub index: u64,
    /// Transaction kind.
    pub kind: TransactionKind,
    /// Sending party. Absent for mint.
    pub from: Option<Party>,
    /// Receiving party (the spender, for approve). Absent for burn.
    pub to: Option<Party>,
    /// Transferred amount in base units.
    pub value: Nat,
    /// Fee, present only for transfer/approve.
    pub fee: Option<Nat>,
    /// Lowercase hex of an exactly-8-byte memo tag, empty otherwise.
    pub memo: String,
    /// Ledger timestamp (nanos). Approve entries use their creation time.
    pub timestamp: Option<u64>,
}

// =============================================================================
// Replay Results
// =============================================================================

/// Unique account/principal counts over one traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueCounts {
    /// Distinct derived account addresses seen.
    pub accounts: usize,
    /// Distinct principals seen.
    pub principals: usize,
}

/// A token holder with its replayed balance.
///
/// Accumulator keyed by account address during replay; the signed balance
/// may transiently go negative before the final floor-filtering pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holder {
    /// Account-identifier hex.
    pub account: String,
    /// Owning principal.
    pub principal: String,
    /// Subaccount hex, if any.
    pub subaccount: Option<String>,
    /// Replayed balance in base units.
    pub balance: BigInt,
}

/// Ordering direction for sorted holder queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending order (smallest balance first).
    Asc,
    /// Descending order (largest balance first).
    #[default]
    Desc,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn party_matches_account_and_principal() {
        let party = Party {
            principal: "aaaaa-aa".into(),
            account: Some("deadbeef".into()),
            subaccount: None,
        };
        assert!(party.matches("aaaaa-aa"));
        assert!(party.matches("deadbeef"));
        assert!(!party.matches("cafebabe"));
    }

    #[test]
    fn party_without_account_matches_principal_only() {
        let party = Party {
            principal: "aaaaa-aa".into(),
            account: None,
            subaccount: None,
        };
        assert!(party.matches("aaaaa-aa"));
        assert!(!party.matches(""));
    }

    #[test]
    fn kind_display_is_snake_case() {
        assert_eq!(TransactionKind::Transfer.to_string(), "transfer");
        assert_eq!(TransactionKind::Approve.to_string(), "approve");
    }
}
