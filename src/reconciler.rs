// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Pending Record Reconciler
//!
//! Background task that periodically resolves `Pending` token records left
//! behind by timed-out confirmations (and by crashes between record creation
//! and submission). Submitted chain transactions cannot be recalled, so a
//! timed-out confirmation is abandoned by its request handler but must still
//! be settled from its persisted transaction hash once a receipt appears.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::coordinator::IssuanceCoordinator;

/// Background reconciler for pending token records.
pub struct Reconciler {
    coordinator: Arc<IssuanceCoordinator>,
    poll_interval: Duration,
}

impl Reconciler {
    pub fn new(coordinator: Arc<IssuanceCoordinator>, poll_interval: Duration) -> Self {
        Self {
            coordinator,
            poll_interval,
        }
    }

    /// Run the reconciliation loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(reconciler.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            "Reconciler starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Reconciler shutting down");
                return;
            }

            self.reconcile_step().await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Reconciler shutting down");
                    return;
                }
            }
        }
    }

    /// Execute one reconciliation sweep.
    async fn reconcile_step(&self) {
        match self.coordinator.reconcile_pending().await {
            Ok(summary) => {
                if summary.confirmed > 0 || summary.failed > 0 {
                    info!(
                        confirmed = summary.confirmed,
                        failed = summary.failed,
                        still_pending = summary.still_pending,
                        "Reconciler: resolved pending records"
                    );
                }
            }
            Err(e) => {
                warn!(error = %e, "Reconciler: sweep failed");
            }
        }
    }
}
