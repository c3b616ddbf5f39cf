//! # Portal Facade
//!
//! The single entry point for every portal operation.
//!
//! `Portal` owns a shared [`Store`], the random source used for salts,
//! tokens and generated numbers, and a [`Dispatcher`] for SMS/email. Each
//! public method validates its input, reads what it needs, then writes all
//! of its rows in one [`Batch`] so a failure leaves nothing half-done.
//!
//! Methods that rewrite an existing application or user row (pipeline
//! moves, login, deactivation, payments) hold the portal's write lock from
//! the read to the commit, so two of them never interleave on stale rows.
//!
//! Operations are grouped by area:
//!
//! | File | Area |
//! |------|------|
//! | `directory.rs` | hierarchy, resident search, person submissions |
//! | `accounts.rs` | registration, login sessions, dashboard |
//! | `applications.rs` | submission, tracking, review pipeline |
//! | `billing.rs` | premium catalog, payments, subscriptions |
//! | `notifications.rs` | inbox and outbound dispatch |
//! | `news.rs` | home page and news list |
//! | `admin.rs` | admin dashboard counters |

mod accounts;
mod admin;
mod applications;
mod billing;
mod directory;
mod news;
mod notifications;

pub use accounts::{Dashboard, LoginOutcome, NewUser};
pub use admin::AdminStats;
pub use applications::{NewApplication, Tracking};
pub use billing::{PaymentRequest, default_catalog};
pub use directory::{
    DistrictRecord, DistrictTree, DistrictView, DivisionTree, DivisionView, NewPerson, PeopleFilter, SearchQuery,
    VillageView,
};
pub use news::{Home, NewNews};
pub use notifications::{Delivery, SendNotification};

use crate::auth::{self, HashCost};
use crate::error::{PortalError, Result};
use crate::model::{Notification, NotificationKind};
use crate::primitives::{DEFAULT_SESSION_TTL_HOURS, MAX_NUMBER_ATTEMPTS};
use crate::storage::{Batch, Record, Store, StoreError, StoreExt, UniqueIndex};
use crate::{Channel, NotificationId, UserId};
use chrono::{DateTime, Duration, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex, OnceLock};

// =============================================================================
// OUTBOUND DISPATCH
// =============================================================================

/// A message leaving the portal through an external channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Sms { phone: String, text: String },
    Email {
        to: String,
        subject: String,
        body: String,
    },
}

/// Delivers [`Outbound`] messages. Returns whether the message was accepted.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, message: &Outbound) -> bool;
}

/// Drops every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDispatcher;

impl Dispatcher for NullDispatcher {
    fn dispatch(&self, _message: &Outbound) -> bool {
        false
    }
}

// =============================================================================
// PORTAL
// =============================================================================

/// Tunables of a [`Portal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalOptions {
    /// Lifetime of a login session.
    pub session_ttl: Duration,
    pub hash_cost: HashCost,
}

impl Default for PortalOptions {
    fn default() -> Self {
        Self {
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            hash_cost: HashCost::Standard,
        }
    }
}

/// The portal service.
pub struct Portal {
    store: Arc<dyn Store>,
    options: PortalOptions,
    rng: Mutex<StdRng>,
    dispatcher: Arc<dyn Dispatcher>,
    writes: Mutex<()>,
    /// Verified against when a login names an unknown email.
    dummy_hash: OnceLock<String>,
}

impl std::fmt::Debug for Portal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Portal")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Portal {
    /// Portal over `store`, seeded from OS entropy.
    pub fn new(store: Arc<dyn Store>, options: PortalOptions) -> Self {
        Self::from_rng(store, options, StdRng::from_entropy())
    }

    /// Portal with a fixed random seed (reproducible numbers in tests).
    pub fn with_seed(store: Arc<dyn Store>, options: PortalOptions, seed: u64) -> Self {
        Self::from_rng(store, options, StdRng::seed_from_u64(seed))
    }

    fn from_rng(store: Arc<dyn Store>, options: PortalOptions, rng: StdRng) -> Self {
        Self {
            store,
            options,
            rng: Mutex::new(rng),
            dispatcher: Arc::new(NullDispatcher),
            writes: Mutex::new(()),
            dummy_hash: OnceLock::new(),
        }
    }

    /// Replace the outbound dispatcher.
    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn Dispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    #[must_use]
    pub fn options(&self) -> PortalOptions {
        self.options
    }

    // =========================================================================
    // SHARED HELPERS
    // =========================================================================

    pub(crate) fn with_rng<R>(&self, f: impl FnOnce(&mut StdRng) -> R) -> Result<R> {
        let mut rng = self.rng.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&mut rng))
    }

    /// Run a read-modify-write under the portal's write lock.
    /// Must not be nested.
    pub(crate) fn exclusive<R>(&self, f: impl FnOnce() -> Result<R>) -> Result<R> {
        let _guard = self.writes.lock().map_err(|_| StoreError::Poisoned)?;
        f()
    }

    /// Hash a password. Only the salt draw holds the rng lock.
    pub(crate) fn hash_password(&self, password: &str) -> Result<String> {
        let salt = self.with_rng(|rng| auth::random_salt(rng))?;
        auth::hash_with_salt(password, self.options.hash_cost, &salt)
    }

    /// A hash of a throwaway password at the configured cost, built once.
    pub(crate) fn dummy_hash(&self) -> Result<&str> {
        if let Some(hash) = self.dummy_hash.get() {
            return Ok(hash);
        }
        let hash = self.hash_password("aarakshan-no-such-account")?;
        Ok(self.dummy_hash.get_or_init(|| hash))
    }

    pub(crate) fn next_id<T: Record>(&self) -> Result<u64> {
        Ok(self.store.next_id(T::TABLE)?)
    }

    /// Load a row or fail with `NotFound`.
    pub(crate) fn require<T: Record>(&self, entity: &'static str, id: u64) -> Result<T> {
        self.store
            .fetch::<T>(id)?
            .ok_or_else(|| PortalError::not_found(entity, id))
    }

    /// Build (but do not store) an inbox notification for `user_id`.
    pub(crate) fn notification(
        &self,
        user_id: UserId,
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
        now: DateTime<Utc>,
    ) -> Result<Notification> {
        Ok(Notification {
            id: NotificationId(self.next_id::<Notification>()?),
            user_id,
            title: title.into(),
            message: message.into(),
            notification_type: kind,
            channel: Channel::Web,
            is_read: false,
            date_created: now,
            date_sent: None,
        })
    }

    /// Draw a random number for a unique index and commit the batch that
    /// claims it, drawing again when the number is already taken.
    pub(crate) fn commit_with_fresh_number<T>(
        &self,
        index: UniqueIndex,
        draw: impl Fn(&mut StdRng) -> String,
        build: impl Fn(&str) -> Result<(Batch, T)>,
    ) -> Result<T> {
        for _ in 0..MAX_NUMBER_ATTEMPTS {
            let number = self.with_rng(&draw)?;
            if self.store.lookup(index, &number)?.is_some() {
                continue;
            }
            let (batch, out) = build(&number)?;
            match self.store.commit(batch) {
                Ok(()) => return Ok(out),
                Err(StoreError::Conflict { index: hit, .. }) if hit == index => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(PortalError::Conflict(format!(
            "could not allocate a free {}",
            index.label()
        )))
    }
}

// =============================================================================
// INPUT CHECKS
// =============================================================================

/// Trimmed non-empty text no longer than `max` characters.
pub(crate) fn required(field: &str, value: &str, max: usize) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PortalError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(PortalError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value.to_string())
}

/// Trimmed optional text; may be empty.
pub(crate) fn optional(field: &str, value: &str, max: usize) -> Result<String> {
    let value = value.trim();
    if value.chars().count() > max {
        return Err(PortalError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value.to_string())
}

/// Birth years outside 1850..=this year are typos.
pub(crate) fn birth_year(value: Option<i32>, now: DateTime<Utc>) -> Result<Option<i32>> {
    use chrono::Datelike;
    match value {
        Some(year) if !(1850..=now.year()).contains(&year) => Err(PortalError::Validation(
            format!("birth_year {year} is out of range"),
        )),
        other => Ok(other),
    }
}

// =============================================================================
// TEST SUPPORT
// =============================================================================
