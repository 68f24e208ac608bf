//! Candid wire types for the ledger and archive query surface.
//!
//! One response shape, [`TransactionsPage`], decodes both the ledger's
//! `get_transactions` reply and the archive's range reply: candid's
//! optional-field subtyping fills the fields the archive never sends with
//! `None`, and the ledger's non-optional fields decode into `Option` as
//! `Some`. Conversion into the port-level raw types happens here so the
//! client stays a thin transport.

use candid::{define_function, CandidType, Nat, Principal};
use serde::Deserialize;
use serde_bytes::ByteBuf;

use floe_core::error::{SourceError, SourceResult};
use floe_core::ports::{
    ArchiveBoundary, RangeSlice, RawApprove, RawBurn, RawMint, RawParty, RawRecord, RawTransfer,
};

/// Request argument shared by the ledger and archive range endpoints.
#[derive(CandidType, Deserialize, Debug, Clone)]
pub struct GetTransactionsRequest {
    pub start: Nat,
    pub length: Nat,
}

define_function!(pub QueryArchiveFn : (GetTransactionsRequest) -> (TransactionsPage) query);

#[derive(CandidType, Deserialize, Debug, Clone)]
pub struct WireAccount {
    pub owner: Principal,
    pub subaccount: Option<ByteBuf>,
}

#[derive(CandidType, Deserialize, Debug, Clone)]
pub struct WireBurn {
    pub from: WireAccount,
    pub amount: Nat,
    pub memo: Option<ByteBuf>,
    pub created_at_time: Option<u64>,
    pub spender: Option<WireAccount>,
}

#[derive(CandidType, Deserialize, Debug, Clone)]
pub struct WireMint {
    pub to: WireAccount,
    pub amount: Nat,
    pub memo: Option<ByteBuf>,
    pub created_at_time: Option<u64>,
}

#[derive(CandidType, Deserialize, Debug, Clone)]
pub struct WireTransfer {
    pub from: WireAccount,
    pub to: WireAccount,
    pub amount: Nat,
    pub fee: Option<Nat>,
    pub memo: Option<ByteBuf>,
    pub created_at_time: Option<u64>,
    pub spender: Option<WireAccount>,
}

#[derive(CandidType, Deserialize, Debug, Clone)]
pub struct WireApprove {
    pub from: WireAccount,
    pub spender: WireAccount,
    pub amount: Nat,
    pub fee: Option<Nat>,
    pub memo: Option<ByteBuf>,
    pub created_at_time: Option<u64>,
    pub expected_allowance: Option<Nat>,
    pub expires_at: Option<u64>,
}

/// One wire transaction: `kind` is informational, the populated variant
/// field is authoritative.
#[derive(CandidType, Deserialize, Debug, Clone)]
pub struct WireTransaction {
    pub kind: String,
    pub timestamp: u64,
    pub burn: Option<WireBurn>,
    pub mint: Option<WireMint>,
    pub transfer: Option<WireTransfer>,
    pub approve: Option<WireApprove>,
}

/// Pointer to an archived sub-range, served by a callback on the archive
/// canister.
#[derive(CandidType, Deserialize, Debug, Clone)]
pub struct ArchivedRange {
    pub start: Nat,
    pub length: Nat,
    pub callback: QueryArchiveFn,
}

/// Decoded range response from either segment.
#[derive(CandidType, Deserialize, Debug, Clone)]
pub struct TransactionsPage {
    pub transactions: Vec<WireTransaction>,
    /// Ledger only. Index of `transactions[0]`.
    pub first_index: Option<Nat>,
    /// Ledger only. Total log length.
    pub log_length: Option<Nat>,
    /// Ledger only. Archived sub-ranges below the live segment.
    pub archived_transactions: Option<Vec<ArchivedRange>>,
}

impl TransactionsPage {
    /// Lower a decoded page into the port-level [`RangeSlice`].
    ///
    /// The archive handoff is derived from the archived-range pointers:
    /// the endpoint is the callback's canister and the boundary index is
    /// the highest archived end, which is exactly where the live segment
    /// begins.
    pub fn into_slice(self) -> SourceResult<RangeSlice> {
        let archive = match self.archived_transactions.as_deref() {
            Some([]) | None => None,
            Some(ranges) => {
                let endpoint = ranges[0].callback.0.principal;
                let first_index = ranges
                    .iter()
                    .map(|r| nat_to_u64(&r.start).and_then(|s| {
                        let len = nat_to_u64(&r.length)?;
                        s.checked_add(len).ok_or_else(|| {
                            SourceError::DecodeError("archived range overflows u64".into())
                        })
                    }))
                    .collect::<SourceResult<Vec<u64>>>()?
                    .into_iter()
                    .max()
                    .unwrap_or(0);
                Some(ArchiveBoundary {
                    endpoint,
                    first_index,
                })
            }
        };

        Ok(RangeSlice {
            records: self.transactions.into_iter().map(RawRecord::from).collect(),
            first_index: self.first_index.as_ref().map(nat_to_u64).transpose()?,
            log_length: self.log_length.as_ref().map(nat_to_u64).transpose()?,
            archive,
        })
    }
}

impl From<WireAccount> for RawParty {
    fn from(account: WireAccount) -> Self {
        RawParty {
            owner: account.owner,
            subaccount: account.subaccount.map(ByteBuf::into_vec),
        }
    }
}

impl From<WireTransaction> for RawRecord {
    fn from(tx: WireTransaction) -> Self {
        RawRecord {
            timestamp: tx.timestamp,
            burn: tx.burn.map(|b| RawBurn {
                from: b.from.into(),
                amount: b.amount,
                memo: b.memo.map(ByteBuf::into_vec),
            }),
            mint: tx.mint.map(|m| RawMint {
                to: m.to.into(),
                amount: m.amount,
                memo: m.memo.map(ByteBuf::into_vec),
            }),
            transfer: tx.transfer.map(|t| RawTransfer {
                from: t.from.into(),
                to: t.to.into(),
                amount: t.amount,
                fee: t.fee,
                memo: t.memo.map(ByteBuf::into_vec),
            }),
            approve: tx.approve.map(|a| RawApprove {
                from: a.from.into(),
                spender: a.spender.into(),
                amount: a.amount,
                fee: a.fee,
                memo: a.memo.map(ByteBuf::into_vec),
                created_at_time: a.created_at_time,
            }),
        }
    }
}

/// Narrow a candid `Nat` to `u64`, failing on out-of-range values.
pub fn nat_to_u64(value: &Nat) -> SourceResult<u64> {
    u64::try_from(value.0.clone())
        .map_err(|_| SourceError::DecodeError(format!("value {} does not fit in u64", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(tag: u8, subaccount: Option<Vec<u8>>) -> WireAccount {
        WireAccount {
            owner: Principal::from_slice(&[tag; 8]),
            subaccount: subaccount.map(ByteBuf::from),
        }
    }

    fn mint_tx(value: u64) -> WireTransaction {
        WireTransaction {
            kind: "mint".into(),
            timestamp: 7,
            burn: None,
            mint: Some(WireMint {
                to: account(2, None),
                amount: Nat::from(value),
                memo: None,
                created_at_time: None,
            }),
            transfer: None,
            approve: None,
        }
    }

    fn archive_callback(tag: u8) -> QueryArchiveFn {
        QueryArchiveFn::new(Principal::from_slice(&[tag; 4]), "get_transactions".into())
    }

    #[test]
    fn ledger_page_lowers_with_archive_boundary() {
        let page = TransactionsPage {
            transactions: vec![mint_tx(5)],
            first_index: Some(Nat::from(3000u64)),
            log_length: Some(Nat::from(5000u64)),
            archived_transactions: Some(vec![
                ArchivedRange {
                    start: Nat::from(1000u64),
                    length: Nat::from(2000u64),
                    callback: archive_callback(0xBB),
                },
                ArchivedRange {
                    start: Nat::from(0u64),
                    length: Nat::from(1000u64),
                    callback: archive_callback(0xBB),
                },
            ]),
        };

        let slice = page.into_slice().unwrap();
        assert_eq!(slice.records.len(), 1);
        assert_eq!(slice.first_index, Some(3000));
        assert_eq!(slice.log_length, Some(5000));

        // La frontière est la fin la plus haute des plages archivées
        let boundary = slice.archive.unwrap();
        assert_eq!(boundary.first_index, 3000);
        assert_eq!(boundary.endpoint, Principal::from_slice(&[0xBB; 4]));
    }

    #[test]
    fn archive_page_lowers_without_side_channel() {
        let page = TransactionsPage {
            transactions: vec![mint_tx(1), mint_tx(2)],
            first_index: None,
            log_length: None,
            archived_transactions: None,
        };

        let slice = page.into_slice().unwrap();
        assert_eq!(slice.records.len(), 2);
        assert_eq!(slice.first_index, None);
        assert_eq!(slice.log_length, None);
        assert!(slice.archive.is_none());
    }

    #[test]
    fn empty_archived_list_means_no_boundary() {
        let page = TransactionsPage {
            transactions: vec![],
            first_index: Some(Nat::from(0u64)),
            log_length: Some(Nat::from(0u64)),
            archived_transactions: Some(vec![]),
        };

        assert!(page.into_slice().unwrap().archive.is_none());
    }

    #[test]
    fn wire_transaction_converts_each_variant() {
        let tx = WireTransaction {
            kind: "transfer".into(),
            timestamp: 42,
            burn: None,
            mint: None,
            transfer: Some(WireTransfer {
                from: account(1, Some(vec![7u8; 32])),
                to: account(2, None),
                amount: Nat::from(10u64),
                fee: Some(Nat::from(1u64)),
                memo: Some(ByteBuf::from(vec![0u8; 8])),
                created_at_time: Some(42),
                spender: None,
            }),
            approve: None,
        };

        let record = RawRecord::from(tx);
        assert_eq!(record.timestamp, 42);
        let transfer = record.transfer.unwrap();
        assert_eq!(transfer.from.subaccount.as_deref(), Some(&[7u8; 32][..]));
        assert_eq!(transfer.fee, Some(Nat::from(1u64)));
        assert_eq!(transfer.memo.as_deref(), Some(&[0u8; 8][..]));
        assert!(record.burn.is_none() && record.mint.is_none() && record.approve.is_none());
    }

    #[test]
    fn nat_narrowing_rejects_oversized_values() {
        assert_eq!(nat_to_u64(&Nat::from(u64::MAX)).unwrap(), u64::MAX);

        let too_big = Nat::from(u64::MAX) + Nat::from(1u64);
        assert!(nat_to_u64(&too_big).is_err());
    }
}
