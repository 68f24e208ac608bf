//! Replay aggregators: independent consumers of the traversal batch stream.
//!
//! Each aggregator is a plain accumulator with no I/O of its own, so it can
//! be unit-tested without a transaction source. [`super::Ledger`] drives
//! them through `iterate_transactions` and exposes one convenience method
//! per aggregator.

use std::collections::{HashMap, HashSet};

use num_bigint::{BigInt, Sign};

use crate::models::{Holder, Party, SortOrder, Transaction, TransactionKind, UniqueCounts};

// =============================================================================
// Unique account counter
// =============================================================================

/// Counts distinct accounts and principals across a traversal.
///
/// Parties without a derived account contribute to neither set, matching
/// the account-presence gate of the balance replay.
#[derive(Debug, Default)]
pub struct UniqueAccountCounter {
    accounts: HashSet<String>,
    principals: HashSet<String>,
}

impl UniqueAccountCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one delivered batch into the sets.
    pub fn observe_batch(&mut self, batch: &[Transaction]) {
        for tx in batch {
            if let Some(from) = &tx.from {
                self.observe(from);
            }
            if let Some(to) = &tx.to {
                self.observe(to);
            }
        }
    }

    fn observe(&mut self, party: &Party) {
        if let Some(account) = &party.account {
            self.accounts.insert(account.clone());
            self.principals.insert(party.principal.clone());
        }
    }

    /// Final set sizes.
    pub fn finish(self) -> UniqueCounts {
        UniqueCounts {
            accounts: self.accounts.len(),
            principals: self.principals.len(),
        }
    }
}

// =============================================================================
// Identifier filter
// =============================================================================

/// Keeps only transactions touching one account-or-principal identifier.
#[derive(Debug)]
pub struct IdentityFilter {
    identifier: String,
}

impl IdentityFilter {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }

    /// Retain the transactions whose `from` or `to` matches the identifier.
    pub fn filter(&self, batch: Vec<Transaction>) -> Vec<Transaction> {
        batch
            .into_iter()
            .filter(|tx| {
                tx.from
                    .as_ref()
                    .is_some_and(|p| p.matches(&self.identifier))
                    || tx.to.as_ref().is_some_and(|p| p.matches(&self.identifier))
            })
            .collect()
    }
}

// =============================================================================
// Balance replay
// =============================================================================

/// Rebuilds per-account balances by replaying the transaction stream.
///
/// Holders are created lazily at zero on first touch. Because the stream
/// arrives newest-first, a balance may transiently go negative; only the
/// final floored result matters.
#[derive(Debug, Default)]
pub struct BalanceReplay {
    holders: HashMap<String, Holder>,
}

impl BalanceReplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one delivered batch into the running balances.
    pub fn observe_batch(&mut self, batch: &[Transaction]) {
        for tx in batch {
            match tx.kind {
                TransactionKind::Mint => {
                    if let Some(to) = &tx.to {
                        self.credit(to, &tx.value);
                    }
                }
                TransactionKind::Burn => {
                    if let Some(from) = &tx.from {
                        self.debit(from, &tx.value);
                    }
                }
                TransactionKind::Transfer => {
                    if let Some(from) = &tx.from {
                        self.debit(from, &tx.value);
                        if let Some(fee) = &tx.fee {
                            self.debit(from, fee);
                        }
                    }
                    if let Some(to) = &tx.to {
                        self.credit(to, &tx.value);
                    }
                }
                // Approvals move no funds.
                TransactionKind::Approve => {}
            }
        }
    }

    fn credit(&mut self, party: &Party, value: &candid::Nat) {
        if let Some(holder) = self.entry(party) {
            holder.balance += BigInt::from(value.0.clone());
        }
    }

    fn debit(&mut self, party: &Party, value: &candid::Nat) {
        if let Some(holder) = self.entry(party) {
            holder.balance -= BigInt::from(value.0.clone());
        }
    }

    /// Lazily created accumulator entry, keyed by the account address.
    /// Parties without a derived account are skipped.
    fn entry(&mut self, party: &Party) -> Option<&mut Holder> {
        let account = party.account.clone()?;
        Some(
            self.holders
                .entry(account.clone())
                .or_insert_with(|| Holder {
                    account,
                    principal: party.principal.clone(),
                    subaccount: party.subaccount.clone(),
                    balance: BigInt::from(0),
                }),
        )
    }

    /// Finalize: drop non-positive balances and sort.
    ///
    /// Equal balances tie-break on the account string ascending, so the
    /// result is deterministic regardless of map iteration order.
    pub fn into_holders(self, order: SortOrder) -> Vec<Holder> {
        let mut holders: Vec<Holder> = self
            .holders
            .into_values()
            .filter(|h| h.balance.sign() == Sign::Plus)
            .collect();

        holders.sort_by(|a, b| {
            let by_balance = match order {
                SortOrder::Asc => a.balance.cmp(&b.balance),
                SortOrder::Desc => b.balance.cmp(&a.balance),
            };
            by_balance.then_with(|| a.account.cmp(&b.account))
        });

        holders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candid::Nat;

    fn party(name: &str) -> Party {
        Party {
            principal: format!("{}-principal", name),
            account: Some(format!("{}-account", name)),
            subaccount: None,
        }
    }

    fn mint(index: u64, to: &str, value: u64) -> Transaction {
        Transaction {
            index,
            kind: TransactionKind::Mint,
            from: None,
            to: Some(party(to)),
            value: Nat::from(value),
            fee: None,
            memo: String::new(),
            timestamp: Some(0),
        }
    }

    fn burn(index: u64, from: &str, value: u64) -> Transaction {
        Transaction {
            index,
            kind: TransactionKind::Burn,
            from: Some(party(from)),
            to: None,
            value: Nat::from(value),
            fee: None,
            memo: String::new(),
            timestamp: Some(0),
        }
    }

    fn transfer(index: u64, from: &str, to: &str, value: u64, fee: Option<u64>) -> Transaction {
        Transaction {
            index,
            kind: TransactionKind::Transfer,
            from: Some(party(from)),
            to: Some(party(to)),
            value: Nat::from(value),
            fee: fee.map(Nat::from),
            memo: String::new(),
            timestamp: Some(0),
        }
    }

    // Test critique: l'invariant de balance du replay (mint/burn/transfer)
    #[test]
    fn balance_replay_invariant() {
        let mut replay = BalanceReplay::new();
        replay.observe_batch(&[mint(0, "a", 10), burn(1, "a", 3)]);

        let holders = replay.into_holders(SortOrder::Desc);
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].account, "a-account");
        assert_eq!(holders[0].balance, BigInt::from(7));

        let mut replay = BalanceReplay::new();
        replay.observe_batch(&[
            mint(0, "a", 10),
            burn(1, "a", 3),
            transfer(2, "a", "b", 4, Some(1)),
        ]);
        let holders = replay.into_holders(SortOrder::Desc);
        assert_eq!(holders.len(), 2);
        // b=4 devant a=2 en ordre décroissant
        assert_eq!(holders[0].account, "b-account");
        assert_eq!(holders[0].balance, BigInt::from(4));
        assert_eq!(holders[1].account, "a-account");
        assert_eq!(holders[1].balance, BigInt::from(2));
    }

    #[test]
    fn zero_and_negative_balances_are_pruned() {
        let mut replay = BalanceReplay::new();
        replay.observe_batch(&[
            mint(0, "a", 5),
            burn(1, "a", 5),           // a nets to exactly 0
            transfer(2, "b", "c", 3, None), // b goes negative, never minted
        ]);

        let holders = replay.into_holders(SortOrder::Desc);
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].account, "c-account");
    }

    #[test]
    fn equal_balances_tiebreak_on_account_ascending() {
        let mut replay = BalanceReplay::new();
        replay.observe_batch(&[mint(0, "b", 5), mint(1, "a", 5)]);

        let desc = replay.into_holders(SortOrder::Desc);
        assert_eq!(desc[0].account, "a-account");
        assert_eq!(desc[1].account, "b-account");
    }

    #[test]
    fn sort_order_asc_reverses_balances() {
        let mut replay = BalanceReplay::new();
        replay.observe_batch(&[mint(0, "a", 1), mint(1, "b", 2), mint(2, "c", 3)]);

        let asc = replay.into_holders(SortOrder::Asc);
        let balances: Vec<_> = asc.iter().map(|h| h.balance.clone()).collect();
        assert_eq!(
            balances,
            vec![BigInt::from(1), BigInt::from(2), BigInt::from(3)]
        );
    }

    #[test]
    fn approve_moves_no_funds() {
        let approve = Transaction {
            index: 0,
            kind: TransactionKind::Approve,
            from: Some(party("a")),
            to: Some(party("b")),
            value: Nat::from(100u64),
            fee: Some(Nat::from(1u64)),
            memo: String::new(),
            timestamp: Some(0),
        };

        let mut replay = BalanceReplay::new();
        replay.observe_batch(&[mint(0, "a", 10), approve]);

        let holders = replay.into_holders(SortOrder::Desc);
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].balance, BigInt::from(10));
    }

    #[test]
    fn unique_counter_over_transfer_fixture() {
        // 3 transferts entre 2 parties -> {accounts: 2, principals: 2}
        let mut counter = UniqueAccountCounter::new();
        counter.observe_batch(&[
            transfer(0, "a", "b", 1, None),
            transfer(1, "b", "a", 1, None),
            transfer(2, "a", "b", 2, None),
        ]);

        let counts = counter.finish();
        assert_eq!(counts.accounts, 2);
        assert_eq!(counts.principals, 2);
    }

    #[test]
    fn unique_counter_skips_parties_without_account() {
        let mut tx = transfer(0, "a", "b", 1, None);
        tx.to.as_mut().unwrap().account = None;

        let mut counter = UniqueAccountCounter::new();
        counter.observe_batch(&[tx]);

        let counts = counter.finish();
        assert_eq!(counts.accounts, 1);
        assert_eq!(counts.principals, 1);
    }

    #[test]
    fn identity_filter_matches_account_or_principal_on_both_sides() {
        let filter = IdentityFilter::new("a-account");
        let kept = filter.filter(vec![
            transfer(0, "a", "b", 1, None),
            transfer(1, "b", "c", 1, None),
            transfer(2, "c", "a", 1, None),
        ]);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].index, 0);
        assert_eq!(kept[1].index, 2);

        let by_principal = IdentityFilter::new("b-principal");
        let kept = by_principal.filter(vec![
            transfer(0, "a", "b", 1, None),
            transfer(1, "c", "a", 1, None),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].index, 0);

        let none = IdentityFilter::new("unknown");
        assert!(none
            .filter(vec![transfer(0, "a", "b", 1, None)])
            .is_empty());
    }
}
