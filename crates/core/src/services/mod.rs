//! Core services: the traversal engine and the replay aggregators built on
//! top of its batch stream.

mod ledger;
mod replay;

pub use ledger::{Ledger, LedgerConfig, MAX_LIVE_BATCH};
pub use replay::{BalanceReplay, IdentityFilter, UniqueAccountCounter};
