//! Typed access to rows on top of the raw [`Store`] contract.

use super::{Store, StoreError, Table, UniqueIndex};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A struct stored as one row of a [`Table`].
pub trait Record: Serialize + DeserializeOwned {
    /// Table the row lives in.
    const TABLE: Table;

    /// Primary key of this row.
    fn row_id(&self) -> u64;
}

pub(crate) fn encode<T: Record>(row: &T) -> Result<Vec<u8>, StoreError> {
    Ok(postcard::to_allocvec(row)?)
}

pub(crate) fn decode<T: Record>(bytes: &[u8]) -> Result<T, StoreError> {
    Ok(postcard::from_bytes(bytes)?)
}

/// Typed helpers available on every store, including `dyn Store`.
pub trait StoreExt {
    /// Load one row by id.
    fn fetch<T: Record>(&self, id: u64) -> Result<Option<T>, StoreError>;

    /// Load every row of `T`'s table, ascending by id.
    fn fetch_all<T: Record>(&self) -> Result<Vec<T>, StoreError>;

    /// Load every row matching a predicate.
    fn fetch_where<T: Record>(&self, pred: impl Fn(&T) -> bool) -> Result<Vec<T>, StoreError> {
        Ok(self.fetch_all::<T>()?.into_iter().filter(|r| pred(r)).collect())
    }

    /// Load the row a unique index points at.
    fn find<T: Record>(&self, index: UniqueIndex, key: &str) -> Result<Option<T>, StoreError>;
}

impl<S: Store + ?Sized> StoreExt for S {
    fn fetch<T: Record>(&self, id: u64) -> Result<Option<T>, StoreError> {
        self.get(T::TABLE, id)?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn fetch_all<T: Record>(&self) -> Result<Vec<T>, StoreError> {
        self.scan(T::TABLE)?
            .iter()
            .map(|(_, bytes)| decode(bytes))
            .collect()
    }

    fn find<T: Record>(&self, index: UniqueIndex, key: &str) -> Result<Option<T>, StoreError> {
        match self.lookup(index, key)? {
            Some(id) => self.fetch(id),
            None => Ok(None),
        }
    }
}
