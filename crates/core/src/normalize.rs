//! Raw record normalization.
//!
//! Converts one raw ledger record into the canonical [`Transaction`] shape.
//! Pure functions, no I/O: unparseable input yields `None` (never an error)
//! so the traversal can drop it from its batch without aborting.

use candid::Principal;
use ic_ledger_types::{AccountIdentifier, Subaccount, DEFAULT_SUBACCOUNT};

use crate::models::{Party, Transaction, TransactionKind};
use crate::ports::{RawParty, RawRecord};

/// Memos are decoded only when they carry exactly this many bytes.
pub const MEMO_TAG_LEN: usize = 8;

/// Normalize one raw record under its assigned log index.
///
/// Variants are checked in burn → mint → transfer → approve order; the
/// first populated one wins. A record with no populated variant is not a
/// transaction and yields `None`.
pub fn normalize_record(index: u64, raw: &RawRecord) -> Option<Transaction> {
    if let Some(burn) = &raw.burn {
        return Some(Transaction {
            index,
            kind: TransactionKind::Burn,
            from: Some(derive_party(&burn.from)),
            to: None,
            value: burn.amount.clone(),
            fee: None,
            memo: decode_memo(burn.memo.as_deref()),
            timestamp: Some(raw.timestamp),
        });
    }

    if let Some(mint) = &raw.mint {
        return Some(Transaction {
            index,
            kind: TransactionKind::Mint,
            from: None,
            to: Some(derive_party(&mint.to)),
            value: mint.amount.clone(),
            fee: None,
            memo: decode_memo(mint.memo.as_deref()),
            timestamp: Some(raw.timestamp),
        });
    }

    if let Some(transfer) = &raw.transfer {
        return Some(Transaction {
            index,
            kind: TransactionKind::Transfer,
            from: Some(derive_party(&transfer.from)),
            to: Some(derive_party(&transfer.to)),
            value: transfer.amount.clone(),
            fee: transfer.fee.clone(),
            memo: decode_memo(transfer.memo.as_deref()),
            timestamp: Some(raw.timestamp),
        });
    }

    if let Some(approve) = &raw.approve {
        // Approve entries carry their own creation time instead of the
        // record-level timestamp, defaulting to zero when absent.
        return Some(Transaction {
            index,
            kind: TransactionKind::Approve,
            from: Some(derive_party(&approve.from)),
            to: Some(derive_party(&approve.spender)),
            value: approve.amount.clone(),
            fee: approve.fee.clone(),
            memo: decode_memo(approve.memo.as_deref()),
            timestamp: Some(approve.created_at_time.unwrap_or(0)),
        });
    }

    None
}

/// Derive a canonical [`Party`] from a raw wire party.
///
/// Subaccount bytes of exactly 32 bytes combine with the owner into the
/// account identifier; any other length silently falls back to owner-only
/// derivation. The raw subaccount hex is recorded either way.
pub fn derive_party(raw: &RawParty) -> Party {
    let account = match raw.subaccount.as_deref() {
        Some(bytes) if bytes.len() == 32 => {
            let mut sub = [0u8; 32];
            sub.copy_from_slice(bytes);
            derive_account(&raw.owner, &Subaccount(sub))
        }
        _ => derive_account(&raw.owner, &DEFAULT_SUBACCOUNT),
    };

    Party {
        principal: raw.owner.to_text(),
        account,
        subaccount: raw.subaccount.as_deref().map(hex::encode),
    }
}

/// Derive the account-identifier hex for `(owner, subaccount)`.
fn derive_account(owner: &Principal, subaccount: &Subaccount) -> Option<String> {
    Some(AccountIdentifier::new(owner, subaccount).to_hex())
}

/// Decode a memo: exactly 8 raw bytes render as lowercase hex, anything
/// else (including absence) is the empty string.
fn decode_memo(memo: Option<&[u8]>) -> String {
    match memo {
        Some(bytes) if bytes.len() == MEMO_TAG_LEN => hex::encode(bytes),
        _ => String::new(),
    }
}
