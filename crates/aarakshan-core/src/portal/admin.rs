//! Admin dashboard counters.

use super::Portal;
use crate::error::Result;
use crate::model::Person;
use crate::primitives::ADMIN_RECENT_SUBMISSIONS;
use crate::storage::{StoreExt, Table};
use serde::Serialize;

/// Figures on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminStats {
    pub total_people: usize,
    pub verified_people: usize,
    pub pending_people: usize,
    pub total_news: usize,
    pub total_applications: usize,
    pub total_users: usize,
    /// Newest unverified submissions.
    pub recent_submissions: Vec<Person>,
}

impl Portal {
    pub fn admin_stats(&self) -> Result<AdminStats> {
        let mut people = self.store.fetch_all::<Person>()?;
        let total_people = people.len();
        people.retain(|p| !p.is_verified);
        let pending_people = people.len();
        people.sort_by(|a, b| {
            b.date_added
                .cmp(&a.date_added)
                .then_with(|| b.id.cmp(&a.id))
        });
        people.truncate(ADMIN_RECENT_SUBMISSIONS);

        Ok(AdminStats {
            total_people,
            verified_people: total_people - pending_people,
            pending_people,
            total_news: self.store.count(Table::News)?,
            total_applications: self.store.count(Table::Applications)?,
            total_users: self.store.count(Table::Users)?,
            recent_submissions: people,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::portal::testing::{portal, region, t0};
    use crate::portal::NewPerson;
    use chrono::Duration;

    #[test]
    fn counts_people_by_verification() {
        let p = portal();
        let r = region(&p);
        for i in 0..8 {
            let person = p
                .submit_person(
                    NewPerson {
                        name: "N".into(),
                        surname: "S".into(),
                        birth_year: None,
                        reservation_number: format!("R{i}"),
                        village_id: r.village.id,
                        contact_number: String::new(),
                    },
                    t0() + Duration::minutes(i),
                )
                .expect("submit");
            if i < 2 {
                p.verify_person(person.id).expect("verify");
            }
        }

        let stats = p.admin_stats().expect("stats");
        assert_eq!(stats.total_people, 8);
        assert_eq!(stats.verified_people, 2);
        assert_eq!(stats.pending_people, 6);
        assert_eq!(stats.recent_submissions.len(), 5);
        assert_eq!(stats.recent_submissions[0].reservation_number, "R7");
        assert_eq!(stats.total_news, 0);
    }
}
