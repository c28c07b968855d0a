// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded token registry backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `tokens`: token id → serialized TokenRecord
//! - `value_index`: token value → token id (enforces global value uniqueness)
//! - `owner_index`: composite key (owner|id_be) → token id
//! - `meta`: key → u64 (id counter)
//!
//! The uniqueness check and record insert for `create` happen inside a single
//! write transaction, so two concurrent issuance requests for the same value
//! cannot both succeed.

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::record::{TokenRecord, TokenStatus};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: token id → serialized TokenRecord (JSON bytes).
const TOKENS: TableDefinition<u64, &[u8]> = TableDefinition::new("tokens");

/// Uniqueness index: token value → token id.
const VALUE_INDEX: TableDefinition<&str, u64> = TableDefinition::new("value_index");

/// Index: composite key (lowercase_owner|id_be) → token id, for owner scans.
const OWNER_INDEX: TableDefinition<&[u8], u64> = TableDefinition::new("owner_index");

/// Meta table: key → u64 (e.g. "next_id" counter).
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_ID_KEY: &str = "next_id";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("token {0} not found")]
    NotFound(u64),

    #[error("token value already issued: {0}")]
    DuplicateValue(String),

    #[error("token {id} is {from:?}, transition not permitted")]
    InvalidTransition { id: u64, from: TokenStatus },
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a composite key for the owner_index table.
///
/// Format: `lowercase_owner | id_be_bytes` so all of an owner's tokens sit in
/// one contiguous, id-ordered key range.
fn make_owner_key(owner_id: &str, id: u64) -> Vec<u8> {
    let owner = owner_id.to_lowercase();
    let mut key = Vec::with_capacity(owner.len() + 1 + 8);
    key.extend_from_slice(owner.as_bytes());
    key.push(b'|');
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// Build a prefix key for range scanning all tokens of an owner.
fn make_owner_prefix(owner_id: &str) -> Vec<u8> {
    let owner = owner_id.to_lowercase();
    let mut prefix = Vec::with_capacity(owner.len() + 1);
    prefix.extend_from_slice(owner.as_bytes());
    prefix.push(b'|');
    prefix
}

/// Build the upper bound for a range scan (prefix with all 0xFF bytes appended).
fn make_owner_prefix_end(owner_id: &str) -> Vec<u8> {
    let mut end = make_owner_prefix(owner_id);
    end.extend_from_slice(&[0xFF; 9]);
    end
}

// =============================================================================
// TokenDatabase
// =============================================================================

/// Embedded ACID token registry.
pub struct TokenDatabase {
    db: Database,
}

impl TokenDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(TOKENS)?;
            let _ = write_txn.open_table(VALUE_INDEX)?;
            let _ = write_txn.open_table(OWNER_INDEX)?;
            let _ = write_txn.open_table(META)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Cheap readability probe for the readiness endpoint.
    pub fn ping(&self) -> StoreResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(META)?;
        Ok(())
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Create a new `Pending` token record.
    ///
    /// The value-uniqueness check and the insert are one write transaction;
    /// redb serializes writers, so concurrent creates for the same value
    /// resolve to exactly one success and one `DuplicateValue`.
    pub fn create(&self, value: &str, owner_id: &str) -> StoreResult<TokenRecord> {
        let write_txn = self.db.begin_write()?;
        let record = {
            let mut value_index = write_txn.open_table(VALUE_INDEX)?;
            if value_index.get(value)?.is_some() {
                return Err(StoreError::DuplicateValue(value.to_string()));
            }

            let mut meta = write_txn.open_table(META)?;
            let id = meta.get(NEXT_ID_KEY)?.map(|v| v.value()).unwrap_or(0) + 1;
            meta.insert(NEXT_ID_KEY, id)?;

            let record =
                TokenRecord::new_pending(id, value.to_string(), owner_id.to_lowercase());
            let json = serde_json::to_vec(&record)?;

            let mut tokens = write_txn.open_table(TOKENS)?;
            tokens.insert(id, json.as_slice())?;
            value_index.insert(value, id)?;

            let mut owner_index = write_txn.open_table(OWNER_INDEX)?;
            owner_index.insert(make_owner_key(&record.owner_id, id).as_slice(), id)?;

            record
        };
        write_txn.commit()?;
        Ok(record)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Look up a single token by id.
    pub fn get(&self, id: u64) -> StoreResult<TokenRecord> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TOKENS)?;
        match table.get(id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StoreError::NotFound(id)),
        }
    }

    /// List the `Confirmed` tokens held by an owner, ascending by id.
    pub fn list_by_owner(&self, owner_id: &str) -> StoreResult<Vec<TokenRecord>> {
        let read_txn = self.db.begin_read()?;
        let owner_index = read_txn.open_table(OWNER_INDEX)?;
        let tokens = read_txn.open_table(TOKENS)?;

        let prefix = make_owner_prefix(owner_id);
        let prefix_end = make_owner_prefix_end(owner_id);

        let mut results = Vec::new();
        for entry in owner_index.range(prefix.as_slice()..prefix_end.as_slice())? {
            let entry = entry?;
            let id = entry.1.value();
            if let Some(value) = tokens.get(id)? {
                let record: TokenRecord = serde_json::from_slice(value.value())?;
                if record.status == TokenStatus::Confirmed {
                    results.push(record);
                }
            }
        }
        Ok(results)
    }

    /// List all `Pending` records (reconciliation input).
    pub fn list_pending(&self) -> StoreResult<Vec<TokenRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TOKENS)?;

        let mut results = Vec::new();
        for entry in table.iter()? {
            let entry = entry?;
            let record: TokenRecord = serde_json::from_slice(entry.1.value())?;
            if record.status == TokenStatus::Pending {
                results.push(record);
            }
        }
        Ok(results)
    }

    // =========================================================================
    // Status Transitions
    // =========================================================================

    /// Record the hash of the submitted minting transaction.
    ///
    /// Permitted only while the record is `Pending`.
    pub fn set_chain_ref(&self, id: u64, tx_hash: &str) -> StoreResult<TokenRecord> {
        self.update_pending(id, |record| {
            record.chain_ref = Some(tx_hash.to_string());
        })
    }

    /// Transition `Pending → Confirmed`, recording the confirmed tx hash.
    pub fn mark_confirmed(&self, id: u64, chain_ref: &str) -> StoreResult<TokenRecord> {
        self.update_pending(id, |record| {
            record.status = TokenStatus::Confirmed;
            record.chain_ref = Some(chain_ref.to_string());
        })
    }

    /// Transition `Pending → Failed`.
    pub fn mark_failed(&self, id: u64) -> StoreResult<TokenRecord> {
        self.update_pending(id, |record| {
            record.status = TokenStatus::Failed;
        })
    }

    /// Change the owner of a `Confirmed` token (transfer flow only).
    pub fn set_owner(&self, id: u64, new_owner_id: &str) -> StoreResult<TokenRecord> {
        let new_owner = new_owner_id.to_lowercase();
        let write_txn = self.db.begin_write()?;
        let record = {
            let mut tokens = write_txn.open_table(TOKENS)?;
            let mut record = read_record(&tokens, id)?;

            if record.status != TokenStatus::Confirmed {
                return Err(StoreError::InvalidTransition {
                    id,
                    from: record.status,
                });
            }

            let mut owner_index = write_txn.open_table(OWNER_INDEX)?;
            owner_index.remove(make_owner_key(&record.owner_id, id).as_slice())?;
            owner_index.insert(make_owner_key(&new_owner, id).as_slice(), id)?;

            record.owner_id = new_owner;
            record.updated_at = chrono::Utc::now();

            let json = serde_json::to_vec(&record)?;
            tokens.insert(id, json.as_slice())?;
            record
        };
        write_txn.commit()?;
        Ok(record)
    }

    /// Remove a `Failed` record.
    ///
    /// `Pending` and `Confirmed` records are never removed: a confirmed
    /// record mirrors an immutable on-chain mint, and a pending one is still
    /// owed a reconciliation outcome.
    pub fn remove(&self, id: u64) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut tokens = write_txn.open_table(TOKENS)?;
            let record = read_record(&tokens, id)?;

            if record.status != TokenStatus::Failed {
                return Err(StoreError::InvalidTransition {
                    id,
                    from: record.status,
                });
            }

            tokens.remove(id)?;

            let mut value_index = write_txn.open_table(VALUE_INDEX)?;
            value_index.remove(record.value.as_str())?;

            let mut owner_index = write_txn.open_table(OWNER_INDEX)?;
            owner_index.remove(make_owner_key(&record.owner_id, id).as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Read-modify-write a record that must currently be `Pending`.
    fn update_pending(
        &self,
        id: u64,
        mutate: impl FnOnce(&mut TokenRecord),
    ) -> StoreResult<TokenRecord> {
        let write_txn = self.db.begin_write()?;
        let record = {
            let mut tokens = write_txn.open_table(TOKENS)?;
            let mut record = read_record(&tokens, id)?;

            if record.status != TokenStatus::Pending {
                return Err(StoreError::InvalidTransition {
                    id,
                    from: record.status,
                });
            }

            mutate(&mut record);
            record.updated_at = chrono::Utc::now();

            let json = serde_json::to_vec(&record)?;
            tokens.insert(id, json.as_slice())?;
            record
        };
        write_txn.commit()?;
        Ok(record)
    }
}

/// Deserialize a record out of the tokens table inside a transaction.
fn read_record(
    table: &impl ReadableTable<u64, &'static [u8]>,
    id: u64,
) -> StoreResult<TokenRecord> {
    let bytes = {
        let existing = table.get(id)?.ok_or(StoreError::NotFound(id))?;
        existing.value().to_vec()
    };
    Ok(serde_json::from_slice(&bytes)?)
}

// =============================================================================
// Tests
// =============================================================================
