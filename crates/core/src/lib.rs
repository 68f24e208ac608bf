//! Core domain layer for the Floe ledger client.
//!
//! This crate contains the domain models, port traits (interfaces), and the
//! traversal/replay services for reading an ICRC-style ledger canister and
//! its archive canisters. It follows hexagonal architecture principles -
//! this is the innermost layer with no dependency on any concrete transport.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                caller application                   │
//! ├─────────────────────────────────────────────────────┤
//! │              floe-agent (ic-agent RPC)              │
//! ├─────────────────────────────────────────────────────┤
//! │              floe-core  ← YOU ARE HERE              │
//! │             (models, ports, services)               │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - Canonical domain models (Transaction, Party, Holder, etc.)
//! - [`normalize`] - Raw record to canonical transaction conversion
//! - [`ports`] - Interface traits for transport adapters to implement
//! - [`services`] - Traversal engine and replay aggregators
//! - [`error`] - Domain error types
//! - [`metrics`] - Metric definitions
//!
//! # Key Concepts
//!
//! ## The segmented log
//!
//! An ICRC ledger keeps a bounded "live" tail of its transaction log and
//! delegates older entries to archive canisters. The log is append-only:
//! entries migrate from live to archive but never change content or order.
//!
//! ## Traversal lifecycle
//!
//! 1. Discover the total transaction count (with a zero-length-read fallback)
//! 2. Walk the live segment backward in bounded batches
//! 3. On an archive handoff, probe the archive's native batch size
//! 4. Walk the archive backward with bounded-concurrency fan-out
//! 5. Deliver every batch, newest first, to the registered consumer

pub mod error;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod ports;
pub mod services;
