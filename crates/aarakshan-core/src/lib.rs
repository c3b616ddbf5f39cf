//! # Aarakshan Core
//!
//! Domain engine for the Aarakshan reservation portal.
//!
//! The portal lets citizens browse the administrative hierarchy
//! (division → district → village → person), search verified residents,
//! check eligibility for a Kunbi / Maratha-Kunbi certificate, and submit
//! reservation applications that move through a fixed review pipeline.
//!
//! ## Layout
//!
//! - [`model`]: plain rows (one struct per table)
//! - [`eligibility`]: the six-question decision table
//! - [`workflow`]: the ordered committee stages and their transitions
//! - [`storage`]: the `Store` trait with in-memory and redb backends
//! - [`portal`]: the `Portal` facade every caller goes through
//! - [`snapshot`], [`seed`], [`content`]: backups, initial data, static pages
//!
//! The core is synchronous and never reads the wall clock: every operation
//! that stamps a row takes `now` from the caller.

pub mod auth;
pub mod content;
pub mod eligibility;
pub mod error;
pub mod model;
pub mod pagination;
pub mod portal;
pub mod primitives;
pub mod seed;
pub mod snapshot;
pub mod storage;
pub mod workflow;

pub use error::{PortalError, Result};
pub use model::*;
pub use pagination::Page;
pub use portal::{Dispatcher, NullDispatcher, Outbound, Portal, PortalOptions};
pub use storage::{MemoryStore, RedbStore, Store, StoreError};
pub use workflow::{ApplicationStatus, Decision, Stage, WorkflowError};

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// IDENTIFIERS
// =============================================================================

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

row_id!(
    /// Identifier of a division (top of the hierarchy).
    DivisionId
);
row_id!(
    /// Identifier of a district.
    DistrictId
);
row_id!(
    /// Identifier of a village.
    VillageId
);
row_id!(
    /// Identifier of a resident record.
    PersonId
);
row_id!(
    /// Identifier of a registered user.
    UserId
);
row_id!(ApplicationId);
row_id!(StatusUpdateId);
row_id!(NotificationId);
row_id!(PaymentId);
row_id!(PremiumServiceId);
row_id!(NewsId);
row_id!(SessionId);
