// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Durable token record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Token record status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus {
    /// Record created; the mint has not been observed on-chain yet
    Pending,
    /// The minting transaction was included and finalized
    Confirmed,
    /// The chain leg errored or reverted
    Failed,
}

impl Default for TokenStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Stored soulbound token record.
///
/// `id` and `value` are immutable once created. `owner_id` changes only
/// through a ledger-confirmed transfer, `status` only through the
/// `Pending → Confirmed | Failed` transitions enforced by the store.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenRecord {
    /// Store-assigned unique identifier (doubles as the on-chain token id)
    pub id: u64,
    /// Opaque token value, globally unique
    pub value: String,
    /// Current owner address (lowercase 0x-prefixed)
    pub owner_id: String,
    /// Hash of the minting transaction, recorded at submission time so a
    /// crash between submit and confirmation stays reconcilable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_ref: Option<String>,
    /// Current record status
    pub status: TokenStatus,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Create a new record in `Pending` status.
    pub fn new_pending(id: u64, value: String, owner_id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            value,
            owner_id,
            chain_ref: None,
            status: TokenStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}
