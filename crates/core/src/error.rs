//! Error types for the ledger client domain layer.
//!
//! This module defines a small hierarchy:
//!
//! - [`SourceError`] - Transport/RPC errors from a transaction source
//! - [`LedgerError`] - Top-level traversal orchestration errors
//!
//! Error conversion is automatic via `From` implementations, allowing `?`
//! to work across the port boundary.

use thiserror::Error;

// =============================================================================
// Source Errors
// =============================================================================

/// Transport and decoding errors from a [`crate::ports::TransactionSource`].
///
/// These originate in the adapter layer when communicating with the ledger
/// or archive canisters.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Connection to the replica could not be established.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A query call failed.
    #[error("Call to '{method}' failed: {message}")]
    CallFailed {
        /// Canister method that failed.
        method: String,
        /// Error details.
        message: String,
    },

    /// The response payload could not be decoded.
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// An endpoint identifier was malformed.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

// =============================================================================
// Ledger Errors
// =============================================================================

/// Top-level traversal errors.
///
/// This is the main error type returned by [`crate::services::Ledger`].
/// A traversal either observes every reachable segment, stops early by
/// consumer request (not an error), or aborts with one of these.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Transport-level failure, aborts the in-progress traversal.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Both transaction-count strategies failed.
    ///
    /// Neither the dedicated count call nor the zero-length range read
    /// produced a usable log length. Fatal to the whole traversal.
    #[error("Unable to determine total transactions from ledger")]
    CountUnavailable,

    /// The total supply query failed.
    #[error("Unable to determine total supply from ledger")]
    SupplyUnavailable,

    /// Invalid engine configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for source/adapter operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for traversal operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    // Test critique: la chaîne de conversion d'erreurs fonctionne
    #[test]
    fn test_error_conversion_chain() {
        let source_err = SourceError::CallFailed {
            method: "get_transactions".into(),
            message: "replica unreachable".into(),
        };
        let ledger_err: LedgerError = source_err.into();

        // Le message original est préservé
        assert!(ledger_err.to_string().contains("replica unreachable"));
        assert!(ledger_err.to_string().contains("get_transactions"));
    }

    #[test]
    fn test_count_unavailable_message() {
        let err = LedgerError::CountUnavailable;
        assert!(err.to_string().contains("total transactions"));
    }
}
