// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Issuance Coordinator
//!
//! Orchestrates issue, transfer, and verify as two-phase operations across
//! the token store and the chain client, with explicit reconciliation rules.
//!
//! ## Issue state machine
//!
//! ```text
//! Init → Recorded → Submitted → Confirmed | Failed
//! ```
//!
//! The `Pending` record is committed (and the store transaction released)
//! before any chain call, so the confirmation wait never holds a store lock.
//! The transaction hash is persisted at submission time: a crash between
//! submit and confirmation leaves a `Pending` record that `reconcile_pending`
//! can resolve from the receipt alone.
//!
//! Every chain failure after the record exists marks it `Failed` — except a
//! confirmation timeout, which intentionally leaves it `Pending` for
//! reconciliation and reports `PendingConfirmation` to the caller.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::chain::{ChainClient, ChainClientError, ContractCall, ContractQuery};
use crate::store::{StoreError, TokenDatabase, TokenRecord, TokenStatus};

/// Grace period before a `Pending` record with no recorded submission is
/// written off as `Failed` (a crash between create and submit).
const DEFAULT_PENDING_GRACE: Duration = Duration::from_secs(300);

// =============================================================================
// Errors & Outcomes
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("token {0} is non-transferable")]
    NonTransferable(u64),

    #[error("chain submission failed: {0}")]
    ChainSubmission(ChainClientError),

    #[error("chain confirmation failed: {0}")]
    ChainConfirmation(ChainClientError),

    #[error("chain query failed: {0}")]
    ChainQuery(ChainClientError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of an issue request.
#[derive(Debug)]
pub enum IssueOutcome {
    /// The mint was observed on-chain; the record is `Confirmed`.
    Confirmed(TokenRecord),
    /// Confirmation was not observed in time. Not a failure: the record
    /// stays `Pending` and reconciliation resolves it later.
    PendingConfirmation(TokenRecord),
}

/// Result of a transfer request.
#[derive(Debug)]
pub enum TransferOutcome {
    /// Ownership changed on-chain and in the store.
    Completed(TokenRecord),
    /// Confirmation was not observed in time; the store still shows the
    /// previous owner. A later `verify` surfaces any divergence.
    PendingConfirmation(TokenRecord),
}

/// Result of a verification request.
#[derive(Debug)]
pub enum VerifyOutcome {
    /// Store and chain agree on the ownership of every token.
    Verified(Vec<TokenRecord>),
    /// Store and chain disagree — a reconciliation signal, never silently
    /// resolved in favor of either side.
    Mismatch {
        token_id: u64,
        recorded: String,
        on_chain: String,
    },
}

/// Counters from one reconciliation sweep.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub confirmed: u64,
    pub failed: u64,
    pub still_pending: u64,
}

// =============================================================================
// Coordinator
// =============================================================================

pub struct IssuanceCoordinator {
    store: Arc<TokenDatabase>,
    chain: Arc<dyn ChainClient>,
    confirmation_timeout: Duration,
    pending_grace: Duration,
}

impl IssuanceCoordinator {
    pub fn new(
        store: Arc<TokenDatabase>,
        chain: Arc<dyn ChainClient>,
        confirmation_timeout: Duration,
    ) -> Self {
        Self {
            store,
            chain,
            confirmation_timeout,
            pending_grace: DEFAULT_PENDING_GRACE,
        }
    }

    /// Override the grace period for unsubmitted `Pending` records.
    pub fn with_pending_grace(mut self, grace: Duration) -> Self {
        self.pending_grace = grace;
        self
    }

    // =========================================================================
    // Issue
    // =========================================================================

    /// Issue a new token: record it, mint it on-chain, confirm it.
    pub async fn issue(
        &self,
        value: &str,
        owner_id: &str,
    ) -> Result<IssueOutcome, CoordinatorError> {
        if value.trim().is_empty() {
            return Err(CoordinatorError::Validation(
                "token value must not be empty".to_string(),
            ));
        }
        let owner = normalize_owner(owner_id)?;

        // Init → Recorded. No chain call is made for a value already on record.
        let record = self.store.create(value, &owner).map_err(|e| match e {
            StoreError::DuplicateValue(v) => {
                CoordinatorError::Conflict(format!("token value `{v}` already issued"))
            }
            other => CoordinatorError::Store(other),
        })?;

        info!(token_id = record.id, owner = %owner, "issuing token");

        // Recorded → Submitted.
        let call = ContractCall::Mint {
            token_id: record.id,
            to: owner.clone(),
            value: value.to_string(),
        };
        let pending = match self.chain.submit(call).await {
            Ok(pending) => pending,
            Err(e) => {
                self.fail_record(record.id);
                return Err(CoordinatorError::ChainSubmission(e));
            }
        };

        // Persist the handle before waiting, for crash recovery.
        self.store.set_chain_ref(record.id, &pending.tx_hash)?;

        // Submitted → Confirmed | Failed.
        match self
            .chain
            .await_confirmation(&pending, self.confirmation_timeout)
            .await
        {
            Ok(receipt) if receipt.success => {
                let record = self.store.mark_confirmed(record.id, &receipt.tx_hash)?;
                info!(token_id = record.id, tx_hash = %receipt.tx_hash, "token confirmed");
                Ok(IssueOutcome::Confirmed(record))
            }
            Ok(receipt) => {
                self.fail_record(record.id);
                Err(CoordinatorError::ChainConfirmation(
                    ChainClientError::Reverted(receipt.tx_hash),
                ))
            }
            Err(e) if e.is_timeout() => {
                info!(
                    token_id = record.id,
                    tx_hash = %pending.tx_hash,
                    "confirmation timed out, leaving record pending for reconciliation"
                );
                Ok(IssueOutcome::PendingConfirmation(self.store.get(record.id)?))
            }
            Err(e) => {
                self.fail_record(record.id);
                Err(CoordinatorError::ChainConfirmation(e))
            }
        }
    }

    // =========================================================================
    // Transfer
    // =========================================================================

    /// Transfer a confirmed token to a new owner.
    ///
    /// The caller must be the current owner, and the contract's
    /// non-transferable flag is queried read-only before any submission —
    /// a call certain to revert is never sent.
    pub async fn transfer(
        &self,
        token_id: u64,
        caller: &str,
        new_owner_id: &str,
    ) -> Result<TransferOutcome, CoordinatorError> {
        let caller = normalize_owner(caller)?;
        let new_owner = normalize_owner(new_owner_id)?;

        let record = self.get_record(token_id)?;

        if record.status != TokenStatus::Confirmed {
            return Err(CoordinatorError::Conflict(format!(
                "token {token_id} is not confirmed"
            )));
        }
        if record.owner_id != caller {
            return Err(CoordinatorError::Forbidden(format!(
                "caller does not own token {token_id}"
            )));
        }
        if new_owner == record.owner_id {
            return Err(CoordinatorError::Validation(
                "transfer target is the current owner".to_string(),
            ));
        }

        let flag = self
            .chain
            .call_read_only(ContractQuery::IsNonTransferable(token_id))
            .await
            .map_err(CoordinatorError::ChainQuery)?;
        if flag.as_bool().ok_or_else(unexpected_value)? {
            return Err(CoordinatorError::NonTransferable(token_id));
        }

        let call = ContractCall::Transfer {
            token_id,
            from: caller,
            to: new_owner.clone(),
        };
        let pending = self
            .chain
            .submit(call)
            .await
            .map_err(CoordinatorError::ChainSubmission)?;

        match self
            .chain
            .await_confirmation(&pending, self.confirmation_timeout)
            .await
        {
            Ok(receipt) if receipt.success => {
                let record = self.store.set_owner(token_id, &new_owner)?;
                info!(token_id, new_owner = %record.owner_id, "token transferred");
                Ok(TransferOutcome::Completed(record))
            }
            Ok(receipt) => Err(CoordinatorError::ChainConfirmation(
                ChainClientError::Reverted(receipt.tx_hash),
            )),
            Err(e) if e.is_timeout() => {
                warn!(
                    token_id,
                    tx_hash = %pending.tx_hash,
                    "transfer confirmation timed out, store keeps previous owner"
                );
                Ok(TransferOutcome::PendingConfirmation(record))
            }
            Err(e) => Err(CoordinatorError::ChainConfirmation(e)),
        }
    }

    // =========================================================================
    // Verify
    // =========================================================================

    /// Verify an owner's holdings against the chain.
    ///
    /// Two independent checks: the store answers "what does our record say",
    /// the contract's `ownerOf` is authoritative. `Verified` only if every
    /// token agrees.
    pub async fn verify(&self, owner_id: &str) -> Result<VerifyOutcome, CoordinatorError> {
        let owner = normalize_owner(owner_id)?;

        let tokens = self.store.list_by_owner(&owner)?;
        if tokens.is_empty() {
            return Err(CoordinatorError::NotFound(format!(
                "no tokens found for owner {owner}"
            )));
        }

        for token in &tokens {
            let value = self
                .chain
                .call_read_only(ContractQuery::OwnerOf(token.id))
                .await
                .map_err(CoordinatorError::ChainQuery)?;
            let on_chain = value.as_address().ok_or_else(unexpected_value)?;

            if !on_chain.eq_ignore_ascii_case(&token.owner_id) {
                warn!(
                    token_id = token.id,
                    recorded = %token.owner_id,
                    on_chain = %on_chain,
                    "ownership mismatch between store and chain"
                );
                return Ok(VerifyOutcome::Mismatch {
                    token_id: token.id,
                    recorded: token.owner_id.clone(),
                    on_chain: on_chain.to_lowercase(),
                });
            }
        }

        Ok(VerifyOutcome::Verified(tokens))
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Resolve `Pending` records left behind by timed-out confirmations.
    ///
    /// Records with a persisted tx hash are settled from the receipt once it
    /// appears. Records with no hash older than the grace period are marked
    /// `Failed` — no submission was ever recorded, so no transaction exists.
    pub async fn reconcile_pending(&self) -> Result<ReconcileSummary, CoordinatorError> {
        let mut summary = ReconcileSummary::default();

        for record in self.store.list_pending()? {
            match &record.chain_ref {
                Some(tx_hash) => match self.chain.receipt(tx_hash).await {
                    Ok(Some(receipt)) if receipt.success => {
                        self.store.mark_confirmed(record.id, tx_hash)?;
                        info!(token_id = record.id, tx_hash = %tx_hash, "reconciled to confirmed");
                        summary.confirmed += 1;
                    }
                    Ok(Some(_)) => {
                        self.store.mark_failed(record.id)?;
                        info!(token_id = record.id, tx_hash = %tx_hash, "reconciled to failed");
                        summary.failed += 1;
                    }
                    Ok(None) => summary.still_pending += 1,
                    Err(e) => {
                        warn!(token_id = record.id, error = %e, "receipt lookup failed");
                        summary.still_pending += 1;
                    }
                },
                None => {
                    let age = Utc::now() - record.created_at;
                    let grace = chrono::Duration::from_std(self.pending_grace)
                        .unwrap_or_else(|_| chrono::Duration::seconds(300));
                    if age >= grace {
                        self.store.mark_failed(record.id)?;
                        warn!(token_id = record.id, "stale record with no submission, marking failed");
                        summary.failed += 1;
                    } else {
                        summary.still_pending += 1;
                    }
                }
            }
        }

        Ok(summary)
    }

    /// Mark a record failed, logging (not masking) a store error so the
    /// original chain error stays the reported cause.
    fn fail_record(&self, token_id: u64) {
        if let Err(e) = self.store.mark_failed(token_id) {
            warn!(token_id, error = %e, "failed to mark record failed");
        }
    }

    fn get_record(&self, token_id: u64) -> Result<TokenRecord, CoordinatorError> {
        self.store.get(token_id).map_err(|e| match e {
            StoreError::NotFound(id) => {
                CoordinatorError::NotFound(format!("token {id} not found"))
            }
            other => CoordinatorError::Store(other),
        })
    }
}

/// Validate an owner address and normalize it to lowercase.
pub fn normalize_owner(address: &str) -> Result<String, CoordinatorError> {
    if !address.starts_with("0x") {
        return Err(CoordinatorError::Validation(
            "owner address must start with 0x".to_string(),
        ));
    }
    if address.len() != 42 {
        return Err(CoordinatorError::Validation(
            "owner address must be 42 characters (0x + 40 hex)".to_string(),
        ));
    }
    if !address[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CoordinatorError::Validation(
            "owner address must contain only hex characters".to_string(),
        ));
    }
    Ok(address.to_lowercase())
}

fn unexpected_value() -> CoordinatorError {
    CoordinatorError::ChainQuery(ChainClientError::Rpc(
        "unexpected value type from contract".to_string(),
    ))
}

// =============================================================================
// Tests
// =============================================================================
