//! Hierarchy browsing, resident search and person submissions.

use super::{Portal, birth_year, optional, required};
use crate::error::{PortalError, Result};
use crate::model::{District, Division, Person, Village};
use crate::pagination::Page;
use crate::primitives::{
    ADMIN_PEOPLE_PER_PAGE, MAX_NAME_LEN, MAX_PHONE_LEN, MAX_RESERVATION_NUMBER_LEN,
};
use crate::storage::{Batch, StoreExt, UniqueIndex};
use crate::{DistrictId, DivisionId, PersonId, VillageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A division with its districts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DivisionView {
    pub division: Division,
    pub districts: Vec<District>,
}

/// A district with its villages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistrictView {
    pub district: District,
    pub villages: Vec<Village>,
}

/// A village with its verified residents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VillageView {
    pub village: Village,
    pub people: Vec<Person>,
}

/// Admin locations tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DivisionTree {
    pub division: Division,
    pub districts: Vec<DistrictTree>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistrictTree {
    pub district: District,
    pub villages: Vec<Village>,
}

/// Per-district totals on the district-wise records page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistrictRecord {
    pub district: District,
    pub division: String,
    pub villages: usize,
    pub verified_people: usize,
}

/// Search form. Blank fields are ignored; all-blank finds nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    /// Matches name or surname.
    pub q: String,
    /// Matches the village name.
    pub village: String,
    pub surname: String,
}

impl SearchQuery {
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.q.trim().is_empty() && self.village.trim().is_empty() && self.surname.trim().is_empty()
    }
}

/// Person details submitted by the public.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerson {
    pub name: String,
    pub surname: String,
    #[serde(default)]
    pub birth_year: Option<i32>,
    pub reservation_number: String,
    pub village_id: VillageId,
    #[serde(default)]
    pub contact_number: String,
}

/// Filter of the admin people list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeopleFilter {
    #[default]
    All,
    Verified,
    Pending,
}

impl PeopleFilter {
    fn admits(self, person: &Person) -> bool {
        match self {
            PeopleFilter::All => true,
            PeopleFilter::Verified => person.is_verified,
            PeopleFilter::Pending => !person.is_verified,
        }
    }
}

/// Case-insensitive substring match.
fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Newest first; ties broken by id so the order is stable.
fn newest_first(people: &mut [Person]) {
    people.sort_by(|a, b| {
        b.date_added
            .cmp(&a.date_added)
            .then_with(|| b.id.cmp(&a.id))
    });
}

impl Portal {
    // =========================================================================
    // HIERARCHY
    // =========================================================================

    pub fn divisions(&self) -> Result<Vec<Division>> {
        Ok(self.store.fetch_all()?)
    }

    pub fn division(&self, id: DivisionId) -> Result<DivisionView> {
        let division = self.require::<Division>("division", id.0)?;
        Ok(DivisionView {
            districts: self.districts_of(id)?,
            division,
        })
    }

    pub fn district(&self, id: DistrictId) -> Result<DistrictView> {
        let district = self.require::<District>("district", id.0)?;
        Ok(DistrictView {
            villages: self.villages_of(id)?,
            district,
        })
    }

    /// A village and the verified people living there.
    pub fn village(&self, id: VillageId) -> Result<VillageView> {
        let village = self.require::<Village>("village", id.0)?;
        let people = self
            .store
            .fetch_where(|p: &Person| p.village_id == id && p.is_verified)?;
        Ok(VillageView { village, people })
    }

    /// Districts of a division. Unknown divisions have none.
    pub fn districts_of(&self, division: DivisionId) -> Result<Vec<District>> {
        Ok(self
            .store
            .fetch_where(|d: &District| d.division_id == division)?)
    }

    /// Villages of a district. Unknown districts have none.
    pub fn villages_of(&self, district: DistrictId) -> Result<Vec<Village>> {
        Ok(self
            .store
            .fetch_where(|v: &Village| v.district_id == district)?)
    }

    /// Every division with its districts and villages.
    pub fn locations(&self) -> Result<Vec<DivisionTree>> {
        let mut villages: BTreeMap<DistrictId, Vec<Village>> = BTreeMap::new();
        for village in self.store.fetch_all::<Village>()? {
            villages.entry(village.district_id).or_default().push(village);
        }
        let mut districts: BTreeMap<DivisionId, Vec<DistrictTree>> = BTreeMap::new();
        for district in self.store.fetch_all::<District>()? {
            let children = villages.remove(&district.id).unwrap_or_default();
            districts
                .entry(district.division_id)
                .or_default()
                .push(DistrictTree {
                    district,
                    villages: children,
                });
        }
        Ok(self
            .divisions()?
            .into_iter()
            .map(|division| DivisionTree {
                districts: districts.remove(&division.id).unwrap_or_default(),
                division,
            })
            .collect())
    }

    /// Verified residents counted per district.
    pub fn district_records(&self) -> Result<Vec<DistrictRecord>> {
        let divisions: BTreeMap<DivisionId, String> = self
            .divisions()?
            .into_iter()
            .map(|d| (d.id, d.name))
            .collect();
        let villages = self.store.fetch_all::<Village>()?;
        let home: BTreeMap<VillageId, DistrictId> =
            villages.iter().map(|v| (v.id, v.district_id)).collect();

        let mut verified: BTreeMap<DistrictId, usize> = BTreeMap::new();
        for person in self.store.fetch_where(|p: &Person| p.is_verified)? {
            if let Some(district) = home.get(&person.village_id) {
                *verified.entry(*district).or_default() += 1;
            }
        }

        Ok(self
            .store
            .fetch_all::<District>()?
            .into_iter()
            .map(|district| DistrictRecord {
                division: divisions.get(&district.division_id).cloned().unwrap_or_default(),
                villages: villages.iter().filter(|v| v.district_id == district.id).count(),
                verified_people: verified.get(&district.id).copied().unwrap_or(0),
                district,
            })
            .collect())
    }

    pub fn add_division(&self, name: &str) -> Result<Division> {
        let division = Division {
            id: DivisionId(self.next_id::<Division>()?),
            name: required("name", name, MAX_NAME_LEN)?,
        };
        let mut batch = Batch::new();
        batch.put(&division)?;
        self.store.commit(batch)?;
        Ok(division)
    }

    pub fn add_district(&self, division_id: DivisionId, name: &str) -> Result<District> {
        let name = required("name", name, MAX_NAME_LEN)?;
        self.require::<Division>("division", division_id.0)?;
        let district = District {
            id: DistrictId(self.next_id::<District>()?),
            name,
            division_id,
        };
        let mut batch = Batch::new();
        batch.put(&district)?;
        self.store.commit(batch)?;
        Ok(district)
    }

    /// Add a village under an existing district.
    pub fn add_village(&self, district_id: DistrictId, name: &str) -> Result<Village> {
        let name = required("name", name, MAX_NAME_LEN)?;
        self.require::<District>("district", district_id.0)?;
        let village = Village {
            id: VillageId(self.next_id::<Village>()?),
            name,
            district_id,
        };
        let mut batch = Batch::new();
        batch.put(&village)?;
        self.store.commit(batch)?;
        Ok(village)
    }

    // =========================================================================
    // RESIDENTS
    // =========================================================================

    /// Verified people matching every non-blank field, newest first.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<Person>> {
        if query.is_blank() {
            return Ok(Vec::new());
        }
        let q = query.q.trim();
        let village = query.village.trim();
        let surname = query.surname.trim();

        let village_names: BTreeMap<VillageId, String> = if village.is_empty() {
            BTreeMap::new()
        } else {
            self.store
                .fetch_all::<Village>()?
                .into_iter()
                .map(|v| (v.id, v.name))
                .collect()
        };

        let mut hits = self.store.fetch_where(|p: &Person| {
            p.is_verified
                && (q.is_empty() || contains(&p.name, q) || contains(&p.surname, q))
                && (surname.is_empty() || contains(&p.surname, surname))
                && (village.is_empty()
                    || village_names
                        .get(&p.village_id)
                        .is_some_and(|name| contains(name, village)))
        })?;
        newest_first(&mut hits);
        Ok(hits)
    }

    /// Record a person for later verification.
    pub fn submit_person(&self, input: NewPerson, now: DateTime<Utc>) -> Result<Person> {
        let name = required("name", &input.name, MAX_NAME_LEN)?;
        let surname = required("surname", &input.surname, MAX_NAME_LEN)?;
        let reservation_number = required(
            "reservation_number",
            &input.reservation_number,
            MAX_RESERVATION_NUMBER_LEN,
        )?;
        let contact_number = optional("contact_number", &input.contact_number, MAX_PHONE_LEN)?;
        let birth_year = birth_year(input.birth_year, now)?;
        self.require::<Village>("village", input.village_id.0)?;

        if self
            .store
            .lookup(UniqueIndex::ReservationNumber, &reservation_number)?
            .is_some()
        {
            return Err(PortalError::Conflict(format!(
                "reservation number {reservation_number}"
            )));
        }

        let person = Person {
            id: PersonId(self.next_id::<Person>()?),
            name,
            surname,
            birth_year,
            reservation_number,
            village_id: input.village_id,
            contact_number,
            date_added: now,
            is_verified: false,
        };
        let mut batch = Batch::new();
        batch.put(&person)?;
        batch.claim(
            UniqueIndex::ReservationNumber,
            person.reservation_number.clone(),
            person.id.0,
        );
        self.store.commit(batch)?;
        Ok(person)
    }

    /// Mark a submission as verified so it shows up publicly.
    pub fn verify_person(&self, id: PersonId) -> Result<Person> {
        let mut person = self.require::<Person>("person", id.0)?;
        if !person.is_verified {
            person.is_verified = true;
            let mut batch = Batch::new();
            batch.put(&person)?;
            self.store.commit(batch)?;
        }
        Ok(person)
    }

    /// Remove a person and free their reservation number.
    pub fn delete_person(&self, id: PersonId) -> Result<Person> {
        let person = self.require::<Person>("person", id.0)?;
        let mut batch = Batch::new();
        batch.delete::<Person>(id.0);
        batch.release(UniqueIndex::ReservationNumber, person.reservation_number.clone());
        self.store.commit(batch)?;
        Ok(person)
    }

    /// Admin people list, newest first.
    pub fn people(&self, filter: PeopleFilter, page: usize) -> Result<Page<Person>> {
        let mut people = self.store.fetch_where(|p: &Person| filter.admits(p))?;
        newest_first(&mut people);
        Ok(Page::paginate(people, page, ADMIN_PEOPLE_PER_PAGE))
    }
}

// =============================================================================
// TESTS
// =============================================================================
