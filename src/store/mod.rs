// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Token Registry Storage
//!
//! Durable token records live in an embedded redb database. The store is the
//! sole owner of the records; the coordinator only drives status transitions
//! through the operations exposed here.
//!
//! ## Invariants enforced here
//!
//! - No two records share a `value` (checked transactionally in `create`).
//! - `status` transitions only `Pending → Confirmed | Failed`.
//! - `owner_id` changes only through `set_owner`, only on `Confirmed` records.
//! - Only `Failed` records can be removed.

pub mod record;
pub mod token_db;

pub use record::{TokenRecord, TokenStatus};
pub use token_db::{StoreError, StoreResult, TokenDatabase};
