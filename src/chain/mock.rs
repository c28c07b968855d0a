// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Scripted in-memory [`ChainClient`] for coordinator and gateway tests.
//!
//! Records every submitted call (for call-count assertions), applies the
//! effect of confirmed calls to an in-memory owner map, and lets tests choose
//! how confirmations resolve.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::types::*;
use super::ChainClient;

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// How `await_confirmation` resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationMode {
    /// Receipt with success = true; the call's effect is applied.
    Confirm,
    /// `ConfirmationTimeout`; the call stays in flight.
    Timeout,
    /// Receipt with success = false.
    Revert,
}

#[derive(Default)]
struct MockState {
    submitted: Vec<ContractCall>,
    in_flight: HashMap<String, ContractCall>,
    owners: HashMap<u64, String>,
    non_transferable: HashSet<u64>,
    /// tx_hash → success, consulted by `receipt` (reconciliation tests).
    staged_receipts: HashMap<String, bool>,
    submit_error: Option<ChainClientError>,
}

pub struct MockChainClient {
    state: Mutex<MockState>,
    confirmation: Mutex<ConfirmationMode>,
    next_tx: AtomicU64,
}

impl Default for MockChainClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChainClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            confirmation: Mutex::new(ConfirmationMode::Confirm),
            next_tx: AtomicU64::new(0),
        }
    }

    pub fn set_confirmation(&self, mode: ConfirmationMode) {
        *self.confirmation.lock().unwrap() = mode;
    }

    pub fn fail_submissions(&self, error: ChainClientError) {
        self.state.lock().unwrap().submit_error = Some(error);
    }

    pub fn set_owner(&self, token_id: u64, owner: &str) {
        self.state
            .lock()
            .unwrap()
            .owners
            .insert(token_id, owner.to_lowercase());
    }

    pub fn mark_non_transferable(&self, token_id: u64) {
        self.state.lock().unwrap().non_transferable.insert(token_id);
    }

    /// Make `receipt(tx_hash)` return an included receipt.
    pub fn stage_receipt(&self, tx_hash: &str, success: bool) {
        self.state
            .lock()
            .unwrap()
            .staged_receipts
            .insert(tx_hash.to_string(), success);
    }

    pub fn submit_count(&self) -> usize {
        self.state.lock().unwrap().submitted.len()
    }

    pub fn submitted(&self) -> Vec<ContractCall> {
        self.state.lock().unwrap().submitted.clone()
    }
}

/// Apply the ownership effect of a confirmed call.
fn apply_call(state: &mut MockState, call: &ContractCall) {
    match call {
        ContractCall::Mint { token_id, to, .. } => {
            state.owners.insert(*token_id, to.to_lowercase());
        }
        ContractCall::Transfer { token_id, to, .. } => {
            state.owners.insert(*token_id, to.to_lowercase());
        }
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn submit(&self, call: ContractCall) -> Result<PendingTx, ChainClientError> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.submit_error.clone() {
            return Err(error);
        }

        let n = self.next_tx.fetch_add(1, Ordering::SeqCst);
        let tx_hash = format!("0xmock{n:04x}");
        state.submitted.push(call.clone());
        state.in_flight.insert(tx_hash.clone(), call);
        Ok(PendingTx { tx_hash })
    }

    async fn await_confirmation(
        &self,
        pending: &PendingTx,
        timeout: Duration,
    ) -> Result<ChainReceipt, ChainClientError> {
        let mode = *self.confirmation.lock().unwrap();
        match mode {
            ConfirmationMode::Confirm => {
                let mut state = self.state.lock().unwrap();
                if let Some(call) = state.in_flight.remove(&pending.tx_hash) {
                    apply_call(&mut state, &call);
                }
                Ok(ChainReceipt {
                    tx_hash: pending.tx_hash.clone(),
                    block_number: 1,
                    success: true,
                })
            }
            ConfirmationMode::Timeout => Err(ChainClientError::ConfirmationTimeout(timeout)),
            ConfirmationMode::Revert => Ok(ChainReceipt {
                tx_hash: pending.tx_hash.clone(),
                block_number: 1,
                success: false,
            }),
        }
    }

    async fn receipt(&self, tx_hash: &str) -> Result<Option<ChainReceipt>, ChainClientError> {
        let mut state = self.state.lock().unwrap();
        match state.staged_receipts.get(tx_hash).copied() {
            Some(success) => {
                if success {
                    if let Some(call) = state.in_flight.remove(tx_hash) {
                        apply_call(&mut state, &call);
                    }
                }
                Ok(Some(ChainReceipt {
                    tx_hash: tx_hash.to_string(),
                    block_number: 2,
                    success,
                }))
            }
            None => Ok(None),
        }
    }

    async fn call_read_only(
        &self,
        query: ContractQuery,
    ) -> Result<ChainValue, ChainClientError> {
        let state = self.state.lock().unwrap();
        match query {
            ContractQuery::OwnerOf(token_id) => Ok(ChainValue::Address(
                state
                    .owners
                    .get(&token_id)
                    .cloned()
                    .unwrap_or_else(|| ZERO_ADDRESS.to_string()),
            )),
            ContractQuery::IsNonTransferable(token_id) => {
                Ok(ChainValue::Bool(state.non_transferable.contains(&token_id)))
            }
        }
    }
}
