//! # Snapshots
//!
//! Whole-database export and import, used for backups and for moving data
//! between the memory and redb backends.
//!
//! A [`Snapshot`] holds every row of every table. Unique indexes are not
//! stored; [`restore`] rebuilds them from the rows, so a snapshot whose rows
//! break a uniqueness rule is refused as a whole.

use crate::error::{PortalError, Result};
use crate::model::{
    Application, District, Division, News, Notification, Payment, Person, PremiumService, Session,
    StatusUpdate, User, Village,
};
use crate::storage::{Batch, Record, Store, StoreExt, Table, UniqueIndex};
use serde::{Deserialize, Serialize};

/// Format version written into every snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Every row of the portal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub version: u32,
    pub divisions: Vec<Division>,
    pub districts: Vec<District>,
    pub villages: Vec<Village>,
    pub people: Vec<Person>,
    pub users: Vec<User>,
    pub sessions: Vec<Session>,
    pub applications: Vec<Application>,
    pub status_updates: Vec<StatusUpdate>,
    pub notifications: Vec<Notification>,
    pub payments: Vec<Payment>,
    pub premium_services: Vec<PremiumService>,
    pub news: Vec<News>,
}

impl Snapshot {
    /// Total number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.divisions.len()
            + self.districts.len()
            + self.villages.len()
            + self.people.len()
            + self.users.len()
            + self.sessions.len()
            + self.applications.len()
            + self.status_updates.len()
            + self.notifications.len()
            + self.payments.len()
            + self.premium_services.len()
            + self.news.len()
    }
}

/// Read every table.
pub fn export(store: &dyn Store) -> Result<Snapshot> {
    Ok(Snapshot {
        version: SNAPSHOT_VERSION,
        divisions: store.fetch_all()?,
        districts: store.fetch_all()?,
        villages: store.fetch_all()?,
        people: store.fetch_all()?,
        users: store.fetch_all()?,
        sessions: store.fetch_all()?,
        applications: store.fetch_all()?,
        status_updates: store.fetch_all()?,
        notifications: store.fetch_all()?,
        payments: store.fetch_all()?,
        premium_services: store.fetch_all()?,
        news: store.fetch_all()?,
    })
}

fn put_all<T: Record>(batch: &mut Batch, rows: &[T]) -> Result<()> {
    for row in rows {
        batch.put(row)?;
    }
    Ok(())
}

/// Load a snapshot into an empty store in one batch. Returns the row count.
pub fn restore(store: &dyn Store, snapshot: &Snapshot) -> Result<usize> {
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(PortalError::Validation(format!(
            "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
            snapshot.version
        )));
    }
    for table in Table::ALL {
        if store.count(table)? > 0 {
            return Err(PortalError::Conflict(format!(
                "target store already has {} rows",
                table.name()
            )));
        }
    }

    let mut batch = Batch::new();
    put_all(&mut batch, &snapshot.divisions)?;
    put_all(&mut batch, &snapshot.districts)?;
    put_all(&mut batch, &snapshot.villages)?;
    put_all(&mut batch, &snapshot.people)?;
    put_all(&mut batch, &snapshot.users)?;
    put_all(&mut batch, &snapshot.sessions)?;
    put_all(&mut batch, &snapshot.applications)?;
    put_all(&mut batch, &snapshot.status_updates)?;
    put_all(&mut batch, &snapshot.notifications)?;
    put_all(&mut batch, &snapshot.payments)?;
    put_all(&mut batch, &snapshot.premium_services)?;
    put_all(&mut batch, &snapshot.news)?;

    for p in &snapshot.people {
        batch.claim(UniqueIndex::ReservationNumber, p.reservation_number.clone(), p.id.0);
    }
    for u in &snapshot.users {
        batch
            .claim(UniqueIndex::UserEmail, u.email.clone(), u.id.0)
            .claim(UniqueIndex::Username, u.username.clone(), u.id.0);
    }
    for s in &snapshot.sessions {
        batch.claim(UniqueIndex::SessionToken, s.token.clone(), s.id.0);
    }
    for a in &snapshot.applications {
        batch.claim(UniqueIndex::ApplicationNumber, a.application_number.clone(), a.id.0);
    }
    for p in &snapshot.payments {
        batch.claim(UniqueIndex::TransactionId, p.transaction_id.clone(), p.id.0);
    }
    for s in &snapshot.premium_services {
        batch.claim(UniqueIndex::ServiceSlug, s.slug.clone(), s.id.0);
    }

    store.commit(batch)?;
    Ok(snapshot.row_count())
}
