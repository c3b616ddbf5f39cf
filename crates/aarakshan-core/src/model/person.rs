use super::record;
use crate::{PersonId, VillageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A resident who already holds a reservation certificate.
///
/// Submitted by the public, hidden until an administrator verifies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub surname: String,
    pub birth_year: Option<i32>,
    /// Unique across all people.
    pub reservation_number: String,
    pub village_id: VillageId,
    pub contact_number: String,
    pub date_added: DateTime<Utc>,
    pub is_verified: bool,
}

impl Person {
    /// "Name Surname".
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }
}

record!(Person, People);
