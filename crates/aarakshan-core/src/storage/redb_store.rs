//! redb backend.
//!
//! One redb table per portal table (`u64` id → postcard bytes), one per
//! unique index (`&str` key → `u64` id), plus a `sequence` table holding the
//! highest id handed out or written for each portal table.
//!
//! A [`Batch`] runs inside a single write transaction; returning early on a
//! conflicting claim drops the transaction, which aborts it.

use super::{Batch, Op, Store, StoreError, Table, UniqueIndex};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
};
use std::path::Path;

const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequence");

fn rows(table: Table) -> TableDefinition<'static, u64, &'static [u8]> {
    TableDefinition::new(table.name())
}

fn index(index: UniqueIndex) -> TableDefinition<'static, &'static str, u64> {
    TableDefinition::new(index.name())
}

/// Disk-backed store using the redb embedded database.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish()
    }
}

impl RedbStore {
    /// Open (or create) a database file and make sure every table exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref()).map_err(StoreError::backend)?;

        let txn = db.begin_write().map_err(StoreError::backend)?;
        {
            txn.open_table(SEQUENCES).map_err(StoreError::backend)?;
            for table in Table::ALL {
                txn.open_table(rows(table)).map_err(StoreError::backend)?;
            }
            for idx in UniqueIndex::ALL {
                txn.open_table(index(idx)).map_err(StoreError::backend)?;
            }
        }
        txn.commit().map_err(StoreError::backend)?;

        Ok(Self { db })
    }
}

impl Store for RedbStore {
    fn next_id(&self, table: Table) -> Result<u64, StoreError> {
        let txn = self.db.begin_write().map_err(StoreError::backend)?;
        let next = {
            let mut seq = txn.open_table(SEQUENCES).map_err(StoreError::backend)?;
            let current = seq
                .get(table.name())
                .map_err(StoreError::backend)?
                .map(|g| g.value())
                .unwrap_or(0);
            let next = current.saturating_add(1);
            seq.insert(table.name(), next).map_err(StoreError::backend)?;
            next
        };
        txn.commit().map_err(StoreError::backend)?;
        Ok(next)
    }

    fn get(&self, table: Table, id: u64) -> Result<Option<Vec<u8>>, StoreError> {
        let txn = self.db.begin_read().map_err(StoreError::backend)?;
        let t = txn.open_table(rows(table)).map_err(StoreError::backend)?;
        let value = t.get(id).map_err(StoreError::backend)?;
        Ok(value.map(|g| g.value().to_vec()))
    }

    fn scan(&self, table: Table) -> Result<Vec<(u64, Vec<u8>)>, StoreError> {
        let txn = self.db.begin_read().map_err(StoreError::backend)?;
        let t = txn.open_table(rows(table)).map_err(StoreError::backend)?;
        let mut out = Vec::new();
        for entry in t.iter().map_err(StoreError::backend)? {
            let (id, bytes) = entry.map_err(StoreError::backend)?;
            out.push((id.value(), bytes.value().to_vec()));
        }
        Ok(out)
    }

    fn lookup(&self, idx: UniqueIndex, key: &str) -> Result<Option<u64>, StoreError> {
        let txn = self.db.begin_read().map_err(StoreError::backend)?;
        let t = txn.open_table(index(idx)).map_err(StoreError::backend)?;
        let value = t.get(key).map_err(StoreError::backend)?;
        Ok(value.map(|g| g.value()))
    }

    fn commit(&self, batch: Batch) -> Result<(), StoreError> {
        let txn = self.db.begin_write().map_err(StoreError::backend)?;
        for op in batch.ops() {
            match op {
                Op::Put { table, id, bytes } => {
                    let mut t = txn.open_table(rows(*table)).map_err(StoreError::backend)?;
                    t.insert(*id, bytes.as_slice())
                        .map_err(StoreError::backend)?;

                    let mut seq = txn.open_table(SEQUENCES).map_err(StoreError::backend)?;
                    let current = seq
                        .get(table.name())
                        .map_err(StoreError::backend)?
                        .map(|g| g.value())
                        .unwrap_or(0);
                    if *id > current {
                        seq.insert(table.name(), *id).map_err(StoreError::backend)?;
                    }
                }
                Op::Delete { table, id } => {
                    let mut t = txn.open_table(rows(*table)).map_err(StoreError::backend)?;
                    t.remove(*id).map_err(StoreError::backend)?;
                }
                Op::Claim { index: idx, key, id } => {
                    let mut t = txn.open_table(index(*idx)).map_err(StoreError::backend)?;
                    let owner = t
                        .get(key.as_str())
                        .map_err(StoreError::backend)?
                        .map(|g| g.value());
                    if owner.is_some_and(|owner| owner != *id) {
                        return Err(StoreError::Conflict {
                            index: *idx,
                            key: key.clone(),
                        });
                    }
                    t.insert(key.as_str(), *id).map_err(StoreError::backend)?;
                }
                Op::Release { index: idx, key } => {
                    let mut t = txn.open_table(index(*idx)).map_err(StoreError::backend)?;
                    t.remove(key.as_str()).map_err(StoreError::backend)?;
                }
            }
        }
        txn.commit().map_err(StoreError::backend)?;
        Ok(())
    }

    fn count(&self, table: Table) -> Result<usize, StoreError> {
        let txn = self.db.begin_read().map_err(StoreError::backend)?;
        let t = txn.open_table(rows(table)).map_err(StoreError::backend)?;
        let len = t.len().map_err(StoreError::backend)?;
        Ok(len as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::contract;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn redb_store_satisfies_contract() {
        let dir = tempfile::tempdir().expect("tempdir");
        let counter = AtomicUsize::new(0);
        contract::run_all(|| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let path = dir.path().join(format!("contract-{n}.redb"));
            Box::new(RedbStore::open(path).expect("open"))
        });
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("portal.redb");

        {
            let store = RedbStore::open(&path).expect("open");
            let id = store.next_id(Table::News).expect("next id");
            let mut batch = Batch::new();
            batch.claim(UniqueIndex::ServiceSlug, "express", id);
            store.commit(batch).expect("commit");
        }

        let store = RedbStore::open(&path).expect("reopen");
        assert_eq!(store.lookup(UniqueIndex::ServiceSlug, "express").ok(), Some(Some(1)));
        assert_eq!(store.next_id(Table::News).ok(), Some(2));
    }
}
