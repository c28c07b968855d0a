// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain access for the soulbound token contract.
//!
//! The coordinator talks to the ledger through the [`ChainClient`] trait:
//! submit a signed state-changing call, wait for its confirmation, fetch a
//! receipt by hash, and perform read-only queries. [`EvmChainClient`] is the
//! production implementation over an alloy HTTP provider.

use std::time::Duration;

use async_trait::async_trait;

pub mod evm;
pub mod types;

#[cfg(test)]
pub mod mock;

pub use evm::EvmChainClient;
pub use types::{
    ChainClientError, ChainReceipt, ChainValue, ContractCall, ContractQuery, PendingTx,
};

/// Remote ledger operations used by the issuance coordinator.
///
/// `submit` and `await_confirmation` are separate so the coordinator can
/// persist the transaction handle between them; a crash after submission is
/// then recoverable through `receipt`.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Build, sign, and submit a state-changing contract call.
    async fn submit(&self, call: ContractCall) -> Result<PendingTx, ChainClientError>;

    /// Wait until the transaction is included or the timeout elapses.
    ///
    /// On timeout returns [`ChainClientError::ConfirmationTimeout`]; the
    /// transaction may still land later.
    async fn await_confirmation(
        &self,
        pending: &PendingTx,
        timeout: Duration,
    ) -> Result<ChainReceipt, ChainClientError>;

    /// Fetch the receipt for a transaction, `None` if not yet included.
    async fn receipt(&self, tx_hash: &str) -> Result<Option<ChainReceipt>, ChainClientError>;

    /// Perform a non-state-changing contract query.
    async fn call_read_only(&self, query: ContractQuery)
        -> Result<ChainValue, ChainClientError>;
}
