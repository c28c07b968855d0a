// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain client types.

use std::time::Duration;

/// A state-changing contract call to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCall {
    /// Mint a soulbound token to `to`.
    Mint {
        token_id: u64,
        to: String,
        value: String,
    },
    /// Transfer a token between owners.
    Transfer {
        token_id: u64,
        from: String,
        to: String,
    },
}

/// A read-only contract query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractQuery {
    /// Current on-chain owner of a token.
    OwnerOf(u64),
    /// Whether the contract flags a token as non-transferable.
    IsNonTransferable(u64),
}

/// Result of a read-only query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainValue {
    /// An address, lowercase 0x-prefixed.
    Address(String),
    Bool(bool),
}

impl ChainValue {
    pub fn as_address(&self) -> Option<&str> {
        match self {
            ChainValue::Address(addr) => Some(addr),
            ChainValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ChainValue::Bool(b) => Some(*b),
            ChainValue::Address(_) => None,
        }
    }
}

/// Handle for a submitted but unconfirmed transaction.
#[derive(Debug, Clone)]
pub struct PendingTx {
    /// Transaction hash (0x prefixed)
    pub tx_hash: String,
}

/// Receipt of an included transaction.
#[derive(Debug, Clone)]
pub struct ChainReceipt {
    /// Transaction hash
    pub tx_hash: String,
    /// Block number where the transaction was included
    pub block_number: u64,
    /// Whether the transaction executed successfully (false = reverted)
    pub success: bool,
}

/// Errors that can occur during chain operations.
///
/// A `ConfirmationTimeout` is not a failure: the transaction may still land
/// later, and the caller must keep enough state to reconcile it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChainClientError {
    #[error("chain endpoint unavailable: {0}")]
    Unavailable(String),

    #[error("invalid signing credential: {0}")]
    Signing(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("transaction submission failed: {0}")]
    Submission(String),

    #[error("confirmation not observed within {0:?}")]
    ConfirmationTimeout(Duration),

    #[error("transaction reverted: {0}")]
    Reverted(String),

    #[error("rpc error: {0}")]
    Rpc(String),
}

impl ChainClientError {
    /// True for the one outcome that leaves a record `Pending` on purpose.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ChainClientError::ConfirmationTimeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_distinguishable() {
        assert!(ChainClientError::ConfirmationTimeout(Duration::from_secs(1)).is_timeout());
        assert!(!ChainClientError::Unavailable("down".into()).is_timeout());
    }

    #[test]
    fn chain_value_accessors() {
        let addr = ChainValue::Address("0xabc".into());
        assert_eq!(addr.as_address(), Some("0xabc"));
        assert_eq!(addr.as_bool(), None);

        let flag = ChainValue::Bool(true);
        assert_eq!(flag.as_bool(), Some(true));
        assert_eq!(flag.as_address(), None);
    }
}
