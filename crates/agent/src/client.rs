//! IC replica client implementing the [`TransactionSource`] port.

use async_trait::async_trait;
use candid::{Decode, Encode, Nat, Principal};
use ic_agent::Agent;
use tracing::{debug, instrument, trace};

use floe_core::error::{SourceError, SourceResult};
use floe_core::ports::{RangeSlice, TransactionSource};

use crate::wire::{nat_to_u64, GetTransactionsRequest, TransactionsPage};

/// Configuration for the replica client.
#[derive(Debug, Clone)]
pub struct AgentSourceConfig {
    /// Replica or boundary-node URL.
    pub url: String,
    /// Fetch the subnet root key after connecting. Required against local
    /// replicas, must stay off against mainnet.
    pub fetch_root_key: bool,
}

impl Default for AgentSourceConfig {
    fn default() -> Self {
        Self {
            url: "https://icp-api.io".to_string(),
            fetch_root_key: false,
        }
    }
}

/// `ic-agent` adapter implementing the [`TransactionSource`] port.
///
/// Holds one anonymous agent and the ledger canister id; archive endpoints
/// are passed per call since they are discovered during traversal.
pub struct IcAgentSource {
    agent: Agent,
    ledger_id: Principal,
}

impl IcAgentSource {
    /// Build an agent against `config.url` for queries on `ledger_id`.
    #[instrument(skip_all, fields(url = %config.url, ledger = %ledger_id))]
    pub async fn connect(ledger_id: Principal, config: AgentSourceConfig) -> SourceResult<Self> {
        debug!("Building agent");

        let agent = Agent::builder()
            .with_url(&config.url)
            .build()
            .map_err(|e| SourceError::InvalidEndpoint(e.to_string()))?;

        if config.fetch_root_key {
            agent
                .fetch_root_key()
                .await
                .map_err(|e| SourceError::ConnectionFailed(e.to_string()))?;
        }

        debug!("Agent ready");

        Ok(Self { agent, ledger_id })
    }

    /// One candid query call, argument pre-encoded.
    async fn query(
        &self,
        canister: Principal,
        method: &str,
        arg: Vec<u8>,
    ) -> SourceResult<Vec<u8>> {
        self.agent
            .query(&canister, method)
            .with_arg(arg)
            .call()
            .await
            .map_err(|e| SourceError::CallFailed {
                method: method.to_string(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl TransactionSource for IcAgentSource {
    async fn total_supply(&self) -> SourceResult<Nat> {
        let arg = Encode!().map_err(|e| SourceError::DecodeError(e.to_string()))?;
        let bytes = self
            .query(self.ledger_id, "icrc1_total_supply", arg)
            .await?;
        Decode!(&bytes, Nat).map_err(|e| SourceError::DecodeError(e.to_string()))
    }

    async fn transaction_count(&self) -> SourceResult<u64> {
        let arg = Encode!().map_err(|e| SourceError::DecodeError(e.to_string()))?;
        let bytes = self.query(self.ledger_id, "get_total_tx", arg).await?;
        let count = Decode!(&bytes, Nat).map_err(|e| SourceError::DecodeError(e.to_string()))?;
        nat_to_u64(&count)
    }

    async fn read_range(
        &self,
        endpoint: Principal,
        start: u64,
        length: u64,
    ) -> SourceResult<RangeSlice> {
        // Ledger and archive canisters share the same method shape, so one
        // call path serves both segments.
        let request = GetTransactionsRequest {
            start: Nat::from(start),
            length: Nat::from(length),
        };
        let arg = Encode!(&request).map_err(|e| SourceError::DecodeError(e.to_string()))?;

        trace!(%endpoint, start, length, "Querying range");
        let bytes = self.query(endpoint, "get_transactions", arg).await?;

        let page = Decode!(&bytes, TransactionsPage)
            .map_err(|e| SourceError::DecodeError(e.to_string()))?;
        page.into_slice()
    }
}
