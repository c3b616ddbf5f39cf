//! # Storage Module
//!
//! Row storage for the portal.
//!
//! Every entity lives in its own [`Table`] keyed by a `u64` id, with the row
//! body encoded by postcard. Unique columns (emails, reservation numbers...)
//! are kept in [`UniqueIndex`] maps from the column value to the row id.
//!
//! Writes are grouped into a [`Batch`] and applied by [`Store::commit`] as one
//! unit: either every operation lands or none does. A `Claim` on a unique
//! index that is already held by another row aborts the whole batch with
//! [`StoreError::Conflict`].
//!
//! Two backends:
//! - [`MemoryStore`]: BTreeMap tables behind an `RwLock` (tests, demos)
//! - [`RedbStore`]: redb embedded database (ACID, crash safe)

mod memory;
mod record;
mod redb_store;

pub use memory::MemoryStore;
pub use record::{Record, StoreExt};
pub use redb_store::RedbStore;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// TABLES AND INDEXES
// =============================================================================

/// The tables of the portal schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Table {
    Divisions,
    Districts,
    Villages,
    People,
    Users,
    Sessions,
    Applications,
    StatusUpdates,
    Notifications,
    Payments,
    PremiumServices,
    News,
}

impl Table {
    /// Every table, in schema order.
    pub const ALL: [Table; 12] = [
        Table::Divisions,
        Table::Districts,
        Table::Villages,
        Table::People,
        Table::Users,
        Table::Sessions,
        Table::Applications,
        Table::StatusUpdates,
        Table::Notifications,
        Table::Payments,
        Table::PremiumServices,
        Table::News,
    ];

    /// Stable on-disk name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Table::Divisions => "division",
            Table::Districts => "district",
            Table::Villages => "village",
            Table::People => "person",
            Table::Users => "user",
            Table::Sessions => "session",
            Table::Applications => "application",
            Table::StatusUpdates => "status_update",
            Table::Notifications => "notification",
            Table::Payments => "payment",
            Table::PremiumServices => "premium_service",
            Table::News => "news",
        }
    }
}

/// Unique columns, each backed by a value → id map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UniqueIndex {
    ReservationNumber,
    ApplicationNumber,
    UserEmail,
    Username,
    TransactionId,
    SessionToken,
    ServiceSlug,
}

impl UniqueIndex {
    /// Every index.
    pub const ALL: [UniqueIndex; 7] = [
        UniqueIndex::ReservationNumber,
        UniqueIndex::ApplicationNumber,
        UniqueIndex::UserEmail,
        UniqueIndex::Username,
        UniqueIndex::TransactionId,
        UniqueIndex::SessionToken,
        UniqueIndex::ServiceSlug,
    ];

    /// Stable on-disk name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            UniqueIndex::ReservationNumber => "idx_person_reservation_number",
            UniqueIndex::ApplicationNumber => "idx_application_number",
            UniqueIndex::UserEmail => "idx_user_email",
            UniqueIndex::Username => "idx_user_username",
            UniqueIndex::TransactionId => "idx_payment_transaction_id",
            UniqueIndex::SessionToken => "idx_session_token",
            UniqueIndex::ServiceSlug => "idx_premium_service_slug",
        }
    }

    /// Human label used in conflict messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            UniqueIndex::ReservationNumber => "reservation number",
            UniqueIndex::ApplicationNumber => "application number",
            UniqueIndex::UserEmail => "email",
            UniqueIndex::Username => "username",
            UniqueIndex::TransactionId => "transaction id",
            UniqueIndex::SessionToken => "session token",
            UniqueIndex::ServiceSlug => "service slug",
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique index already maps this key to another row.
    #[error("{} already taken: {key}", index.label())]
    Conflict { index: UniqueIndex, key: String },

    /// Row body could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] postcard::Error),

    /// The underlying database failed.
    #[error("backend error: {0}")]
    Backend(String),

    /// A writer panicked while holding the in-memory lock.
    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub(crate) fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }
}

// =============================================================================
// BATCH
// =============================================================================

/// One write operation inside a [`Batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Insert or overwrite a row.
    Put {
        table: Table,
        id: u64,
        bytes: Vec<u8>,
    },
    /// Remove a row (no-op when absent).
    Delete { table: Table, id: u64 },
    /// Map `key` to `id`; fails when the key belongs to another id.
    Claim {
        index: UniqueIndex,
        key: String,
        id: u64,
    },
    /// Drop `key` from the index (no-op when absent).
    Release { index: UniqueIndex, key: String },
}

/// An ordered group of writes committed atomically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    ops: Vec<Op>,
}

impl Batch {
    /// Create an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode and stage a row.
    pub fn put<T: Record>(&mut self, row: &T) -> Result<&mut Self, StoreError> {
        let bytes = record::encode(row)?;
        self.ops.push(Op::Put {
            table: T::TABLE,
            id: row.row_id(),
            bytes,
        });
        Ok(self)
    }

    /// Stage removal of a row.
    pub fn delete<T: Record>(&mut self, id: u64) -> &mut Self {
        self.ops.push(Op::Delete {
            table: T::TABLE,
            id,
        });
        self
    }

    /// Stage a unique-index claim.
    pub fn claim(&mut self, index: UniqueIndex, key: impl Into<String>, id: u64) -> &mut Self {
        self.ops.push(Op::Claim {
            index,
            key: key.into(),
            id,
        });
        self
    }

    /// Stage a unique-index release.
    pub fn release(&mut self, index: UniqueIndex, key: impl Into<String>) -> &mut Self {
        self.ops.push(Op::Release {
            index,
            key: key.into(),
        });
        self
    }

    /// Staged operations, in order.
    #[must_use]
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Number of staged operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// The storage contract shared by every backend.
///
/// All methods take `&self`; backends synchronise internally so a store can
/// sit behind an `Arc` shared by request handlers.
pub trait Store: Send + Sync {
    /// Reserve the next id of a table. Ids start at 1 and are never reused,
    /// even when the batch that would have used them is abandoned. A `Put`
    /// with an id above the sequence moves the sequence up to that id.
    fn next_id(&self, table: Table) -> Result<u64, StoreError>;

    /// Raw row body by id.
    fn get(&self, table: Table, id: u64) -> Result<Option<Vec<u8>>, StoreError>;

    /// Every row of a table, ascending by id.
    fn scan(&self, table: Table) -> Result<Vec<(u64, Vec<u8>)>, StoreError>;

    /// Row id mapped to `key` in a unique index.
    fn lookup(&self, index: UniqueIndex, key: &str) -> Result<Option<u64>, StoreError>;

    /// Apply a batch atomically.
    fn commit(&self, batch: Batch) -> Result<(), StoreError>;

    /// Number of rows in a table.
    fn count(&self, table: Table) -> Result<usize, StoreError> {
        Ok(self.scan(table)?.len())
    }
}

// =============================================================================
// BACKEND CONTRACT TESTS
// =============================================================================

#[cfg(test)]
pub(crate) mod contract {
    //! Checks every backend must pass; called from each backend's tests.

    use super::*;
    use crate::model::Division;
    use crate::DivisionId;

    fn division(id: u64, name: &str) -> Division {
        Division {
            id: DivisionId(id),
            name: name.to_string(),
        }
    }

    pub fn ids_are_sequential_per_table(store: &dyn Store) {
        assert_eq!(store.next_id(Table::Divisions).ok(), Some(1));
        assert_eq!(store.next_id(Table::Divisions).ok(), Some(2));
        assert_eq!(store.next_id(Table::Villages).ok(), Some(1));
    }

    pub fn put_get_scan_delete(store: &dyn Store) {
        let mut batch = Batch::new();
        batch.put(&division(2, "Satara")).expect("encode");
        batch.put(&division(1, "Aurangabad")).expect("encode");
        store.commit(batch).expect("commit");

        let rows: Vec<Division> = store.fetch_all().expect("scan");
        let names: Vec<_> = rows.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Aurangabad", "Satara"]);

        let one: Option<Division> = store.fetch(2).expect("get");
        assert_eq!(one.map(|d| d.name), Some("Satara".to_string()));

        let mut batch = Batch::new();
        batch.delete::<Division>(2);
        store.commit(batch).expect("commit");
        assert_eq!(store.count(Table::Divisions).ok(), Some(1));
        assert!(store.get(Table::Divisions, 2).expect("get").is_none());
    }

    pub fn conflicting_claim_aborts_batch(store: &dyn Store) {
        let mut batch = Batch::new();
        batch.put(&division(1, "first")).expect("encode");
        batch.claim(UniqueIndex::ServiceSlug, "pro", 1);
        store.commit(batch).expect("commit");

        let mut batch = Batch::new();
        batch.put(&division(2, "second")).expect("encode");
        batch.claim(UniqueIndex::ServiceSlug, "pro", 2);
        let result = store.commit(batch);
        assert!(matches!(result, Err(StoreError::Conflict { .. })));

        // Nothing from the failed batch landed.
        assert!(store.get(Table::Divisions, 2).expect("get").is_none());
        assert_eq!(store.lookup(UniqueIndex::ServiceSlug, "pro").ok(), Some(Some(1)));
    }

    pub fn reclaim_by_same_id_and_release(store: &dyn Store) {
        let mut batch = Batch::new();
        batch.claim(UniqueIndex::UserEmail, "a@example.in", 7);
        store.commit(batch).expect("commit");

        let mut batch = Batch::new();
        batch.claim(UniqueIndex::UserEmail, "a@example.in", 7);
        store.commit(batch).expect("same id may re-claim");

        let mut batch = Batch::new();
        batch.release(UniqueIndex::UserEmail, "a@example.in");
        batch.claim(UniqueIndex::UserEmail, "a@example.in", 8);
        store.commit(batch).expect("release then claim");
        assert_eq!(
            store.lookup(UniqueIndex::UserEmail, "a@example.in").ok(),
            Some(Some(8))
        );
    }

    pub fn put_moves_sequence_past_written_ids(store: &dyn Store) {
        let mut batch = Batch::new();
        batch.put(&division(40, "restored")).expect("encode");
        store.commit(batch).expect("commit");
        assert_eq!(store.next_id(Table::Divisions).ok(), Some(41));
    }

    pub fn run_all(make: impl Fn() -> Box<dyn Store>) {
        ids_are_sequential_per_table(make().as_ref());
        put_moves_sequence_past_written_ids(make().as_ref());
        put_get_scan_delete(make().as_ref());
        conflicting_claim_aborts_batch(make().as_ref());
        reclaim_by_same_id_and_release(make().as_ref());
    }
}
