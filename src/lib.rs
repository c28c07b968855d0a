// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! SBT Registry - Soulbound Token Issuance Service
//!
//! This crate bridges a local token record store with an EVM soulbound
//! token contract: records are written locally first, then minted
//! on-chain, and a background reconciler settles anything left pending.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `chain` - EVM contract client (Alloy)
//! - `coordinator` - Two-phase issuance and transfer orchestration
//! - `reconciler` - Background sweep for pending records
//! - `store` - Embedded token database (redb)

pub mod api;
pub mod chain;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod models;
pub mod reconciler;
pub mod state;
pub mod store;
