//! # Data Model
//!
//! One plain struct per stored table. Rows reference each other by typed id
//! only; joins happen in [`crate::portal`].
//!
//! Timestamps are UTC. Money is integral (paise), see [`Amount`].

mod account;
mod application;
mod billing;
mod news;
mod notification;
mod person;
mod region;

pub use account::{Session, SubscriptionTier, User};
pub use application::{Application, Priority, StatusUpdate};
pub use billing::{Amount, Payment, PaymentMethod, PaymentStatus, PremiumService};
pub use news::News;
pub use notification::{Channel, Notification, NotificationKind};
pub use person::Person;
pub use region::{District, Division, Village};

/// Implements [`crate::storage::Record`] for a row struct with an `id` newtype.
macro_rules! record {
    ($ty:ty, $table:ident) => {
        impl $crate::storage::Record for $ty {
            const TABLE: $crate::storage::Table = $crate::storage::Table::$table;

            fn row_id(&self) -> u64 {
                self.id.0
            }
        }
    };
}

pub(crate) use record;
