//! IC replica adapter for the Floe ledger client.
//!
//! This crate implements the [`TransactionSource`] port from `floe-core`,
//! providing connectivity to ICRC ledger and archive canisters via
//! `ic-agent` query calls.
//!
//! # Features
//!
//! - Anonymous query calls against a replica or boundary node
//! - One candid response shape for both ledger and archive range reads
//! - Archive-handoff extraction from the ledger's archived-range pointers
//!
//! # Usage
//!
//! ```ignore
//! use floe_agent::{AgentSourceConfig, IcAgentSource};
//! use floe_core::services::{Ledger, LedgerConfig};
//!
//! let ledger_id = Principal::from_text("ryjl3-tyaaa-aaaaa-aaaba-cai")?;
//! let source = IcAgentSource::connect(ledger_id, AgentSourceConfig::default()).await?;
//! let ledger = Ledger::new(ledger_id, Arc::new(source), LedgerConfig::default());
//!
//! let holders = ledger.collect_holders(SortOrder::Desc).await?;
//! ```
//!
//! # Architecture
//!
//! Wire types live in [`wire`] and lower into the raw record types defined
//! by `floe-core`; the client itself is a thin transport around
//! `ic-agent`.
//!
//! [`TransactionSource`]: floe_core::ports::TransactionSource

mod client;
pub mod wire;

pub use client::{AgentSourceConfig, IcAgentSource};
