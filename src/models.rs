// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures for the REST API. All types derive
//! `Serialize`, `Deserialize`, and `ToSchema` for automatic JSON handling
//! and OpenAPI documentation.
//!
//! ## Owner Address Type
//!
//! The [`OwnerAddress`] newtype wraps Ethereum-style addresses (0x-prefixed,
//! 40 hex characters). It provides type safety and clear semantics; format
//! validation happens in the coordinator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::{TokenRecord, TokenStatus};

// =============================================================================
// Owner Address Type
// =============================================================================

/// Ethereum-compatible owner address wrapper.
///
/// Format: `0x` followed by 40 hexadecimal characters (20 bytes).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OwnerAddress(pub String);

impl std::fmt::Display for OwnerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OwnerAddress {
    fn from(value: String) -> Self {
        OwnerAddress(value)
    }
}

impl From<&str> for OwnerAddress {
    fn from(value: &str) -> Self {
        OwnerAddress(value.to_string())
    }
}

impl From<OwnerAddress> for String {
    fn from(value: OwnerAddress) -> Self {
        value.0
    }
}

// =============================================================================
// Token Models
// =============================================================================

/// Request to issue a new token.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IssueTokenRequest {
    /// Opaque token value; must be globally unique
    pub token: String,
    /// Address of the principal receiving the token
    pub owner_id: OwnerAddress,
}

/// Request to transfer a token to a new owner.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TransferTokenRequest {
    /// Address of the new owner
    pub owner_id: OwnerAddress,
    /// Address of the requesting current owner
    pub caller_id: OwnerAddress,
}

/// A stored token as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenResponse {
    /// Store-assigned identifier (also the on-chain token id)
    pub id: u64,
    /// Token value
    pub token_value: String,
    /// Current owner address
    pub owner_id: OwnerAddress,
    /// Record status: pending, confirmed, failed
    pub status: TokenStatus,
    /// Hash of the minting transaction, once submitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_ref: Option<String>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

impl From<TokenRecord> for TokenResponse {
    fn from(record: TokenRecord) -> Self {
        Self {
            id: record.id,
            token_value: record.value,
            owner_id: OwnerAddress(record.owner_id),
            status: record.status,
            chain_ref: record.chain_ref,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Verification result for an owner's holdings.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VerifyResponse {
    /// Tokens whose off-chain and on-chain ownership agree
    pub tokens: Vec<TokenResponse>,
}
