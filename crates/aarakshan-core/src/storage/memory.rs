//! In-memory backend.
//!
//! All data structures use `BTreeMap` so scans come back in id order.

use super::{Batch, Op, Store, StoreError, Table, UniqueIndex};
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    rows: BTreeMap<Table, BTreeMap<u64, Vec<u8>>>,
    indexes: BTreeMap<UniqueIndex, BTreeMap<String, u64>>,
    sequences: BTreeMap<Table, u64>,
}

/// Prior value of whatever one op touched, for rolling back a failed batch.
enum Undo {
    Row(Table, u64, Option<Vec<u8>>),
    Index(UniqueIndex, String, Option<u64>),
    Sequence(Table, Option<u64>),
}

impl Tables {
    fn apply(&mut self, op: &Op, undo: &mut Vec<Undo>) -> Result<(), StoreError> {
        match op {
            Op::Put { table, id, bytes } => {
                let prior = self.rows.entry(*table).or_default().insert(*id, bytes.clone());
                undo.push(Undo::Row(*table, *id, prior));
                let prior_seq = self.sequences.get(table).copied();
                if prior_seq.is_none_or(|seq| seq < *id) {
                    self.sequences.insert(*table, *id);
                    undo.push(Undo::Sequence(*table, prior_seq));
                }
            }
            Op::Delete { table, id } => {
                if let Some(prior) = self.rows.get_mut(table).and_then(|rows| rows.remove(id)) {
                    undo.push(Undo::Row(*table, *id, Some(prior)));
                }
            }
            Op::Claim { index, key, id } => {
                let entries = self.indexes.entry(*index).or_default();
                match entries.get(key) {
                    Some(owner) if owner != id => {
                        return Err(StoreError::Conflict {
                            index: *index,
                            key: key.clone(),
                        });
                    }
                    _ => {
                        let prior = entries.insert(key.clone(), *id);
                        undo.push(Undo::Index(*index, key.clone(), prior));
                    }
                }
            }
            Op::Release { index, key } => {
                if let Some(prior) = self.indexes.get_mut(index).and_then(|e| e.remove(key)) {
                    undo.push(Undo::Index(*index, key.clone(), Some(prior)));
                }
            }
        }
        Ok(())
    }

    /// Undo entries newest first.
    fn roll_back(&mut self, undo: Vec<Undo>) {
        for entry in undo.into_iter().rev() {
            match entry {
                Undo::Row(table, id, prior) => {
                    let rows = self.rows.entry(table).or_default();
                    match prior {
                        Some(bytes) => rows.insert(id, bytes),
                        None => rows.remove(&id),
                    };
                }
                Undo::Index(index, key, prior) => {
                    let entries = self.indexes.entry(index).or_default();
                    match prior {
                        Some(id) => entries.insert(key, id),
                        None => entries.remove(&key),
                    };
                }
                Undo::Sequence(table, prior) => match prior {
                    Some(seq) => {
                        self.sequences.insert(table, seq);
                    }
                    None => {
                        self.sequences.remove(&table);
                    }
                },
            }
        }
    }
}

/// Volatile store for tests and throwaway servers.
///
/// A batch is applied in place under the write lock. Each op records what it
/// replaced; when an op fails the batch is undone in reverse order, so a
/// failed batch leaves no trace.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn next_id(&self, table: Table) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let seq = inner.sequences.entry(table).or_insert(0);
        *seq = seq.saturating_add(1);
        Ok(*seq)
    }

    fn get(&self, table: Table, id: u64) -> Result<Option<Vec<u8>>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.rows.get(&table).and_then(|rows| rows.get(&id)).cloned())
    }

    fn scan(&self, table: Table) -> Result<Vec<(u64, Vec<u8>)>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner
            .rows
            .get(&table)
            .map(|rows| rows.iter().map(|(id, b)| (*id, b.clone())).collect())
            .unwrap_or_default())
    }

    fn lookup(&self, index: UniqueIndex, key: &str) -> Result<Option<u64>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner
            .indexes
            .get(&index)
            .and_then(|entries| entries.get(key))
            .copied())
    }

    fn commit(&self, batch: Batch) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let mut undo = Vec::with_capacity(batch.ops().len());
        for op in batch.ops() {
            if let Err(e) = inner.apply(op, &mut undo) {
                inner.roll_back(undo);
                return Err(e);
            }
        }
        Ok(())
    }

    fn count(&self, table: Table) -> Result<usize, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.rows.get(&table).map_or(0, BTreeMap::len))
    }
}
