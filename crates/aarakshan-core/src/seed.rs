//! # Seed Data
//!
//! Initial hierarchy, news and premium catalog for a fresh database.
//!
//! Seeding is idempotent per part: the hierarchy and news are written as one
//! batch only when there are no divisions yet, and catalog entries are added
//! by slug.

use crate::error::Result;
use crate::model::{District, Division, News, Village};
use crate::portal::{Portal, default_catalog};
use crate::storage::{Batch, Record, Store, Table};
use crate::{DistrictId, DivisionId, NewsId, VillageId};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Districts of the first division, each with its villages.
const AURANGABAD_DISTRICTS: [(&str, [&str; 5]); 8] = [
    ("औरंगाबाद", ["वलुज", "पैठण", "कन्नड", "सोयगाव", "खुलताबाद"]),
    ("जालना", ["जालना शहर", "भोकरदन", "परतूर", "अंबड", "जाफराबाद"]),
    ("हिंगोली", ["हिंगोली शहर", "कल्याणी", "औंढा नागनाथ", "वशीम", "सेंधवा"]),
    ("परभणी", ["परभणी शहर", "पुरना", "सोनपेठ", "जिंतूर", "गंगाखेड"]),
    ("नांदेड", ["नांदेड शहर", "लोहा", "भोकर", "बिलोली", "कंधार"]),
    ("लातूर", ["लातूर शहर", "उदगीर", "अहमदपुर", "निलंगा", "जलकोट"]),
    ("उस्मानाबाद", ["उस्मानाबाद शहर", "तुळजापुर", "ओमेरगा", "परांडा", "कलम"]),
    ("बीड", ["बीड शहर", "गेवराई", "पारली", "अश्टी", "वडवणी"]),
];

const NEWS: [(&str, &str, bool); 3] = [
    (
        "मराठा आरक्षणाचा नवीन GR जारी",
        "महाराष्ट्र सरकारने मराठा समुदायासाठी नवीन आरक्षण योजना जाहीर केली आहे. या योजनेअंतर्गत शिक्षण आणि नोकऱ्यांमध्ये आरक्षण दिले जाणार आहे.",
        true,
    ),
    (
        "आरक्षण प्रमाणपत्रासाठी अर्ज सुरू",
        "मराठा समुदायातील व्यक्ती आता ऑनलाइन आणि ऑफलाइन पद्धतीने आरक्षण प्रमाणपत्रासाठी अर्ज करू शकतात.",
        true,
    ),
    (
        "रेफरल सिस्टमची माहिती",
        "आरक्षण मिळवण्यासाठी तुमच्या गावातील किंवा कुटुंबातील आधीपासून आरक्षण असणाऱ्या व्यक्तीचा रेफरल आवश्यक आहे.",
        false,
    ),
];

/// What a seeding run wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub divisions: usize,
    pub districts: usize,
    pub villages: usize,
    pub news: usize,
    pub services: usize,
}

impl SeedReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Seed a database. Running it twice writes nothing the second time.
pub fn seed(portal: &Portal, now: DateTime<Utc>) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    let store = portal.store();
    if store.count(Table::Divisions)? == 0 {
        let mut batch = Batch::new();
        let aurangabad = Division {
            id: DivisionId(next::<Division>(store)?),
            name: "औरंगाबाद विभाग".into(),
        };
        batch.put(&aurangabad)?;
        report.divisions += 1;
        for (district, villages) in AURANGABAD_DISTRICTS {
            let district = District {
                id: DistrictId(next::<District>(store)?),
                name: district.into(),
                division_id: aurangabad.id,
            };
            batch.put(&district)?;
            report.districts += 1;
            for village in villages {
                batch.put(&Village {
                    id: VillageId(next::<Village>(store)?),
                    name: village.into(),
                    district_id: district.id,
                })?;
                report.villages += 1;
            }
        }
        batch.put(&Division {
            id: DivisionId(next::<Division>(store)?),
            name: "सातारा विभाग".into(),
        })?;
        report.divisions += 1;

        // The first item is the newest.
        for (age, (title, content, featured)) in NEWS.iter().enumerate() {
            let age = i64::try_from(age).unwrap_or_default();
            batch.put(&News {
                id: NewsId(next::<News>(store)?),
                title: (*title).to_string(),
                content: (*content).to_string(),
                image_url: None,
                date_posted: now - Duration::minutes(age),
                is_featured: *featured,
            })?;
            report.news += 1;
        }
        store.commit(batch)?;
    }

    report.services = portal.install_catalog(default_catalog())?;
    Ok(report)
}

fn next<T: Record>(store: &dyn Store) -> Result<u64> {
    Ok(store.next_id(T::TABLE)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::testing::{portal, t0};

    #[test]
    fn seeds_hierarchy_news_and_catalog() {
        let p = portal();
        let report = seed(&p, t0()).expect("seed");
        assert_eq!(
            report,
            SeedReport {
                divisions: 2,
                districts: 8,
                villages: 40,
                news: 3,
                services: 3,
            }
        );

        let divisions = p.divisions().expect("divisions");
        assert_eq!(divisions[0].name, "औरंगाबाद विभाग");
        assert_eq!(p.districts_of(divisions[0].id).expect("districts").len(), 8);
        assert!(p.districts_of(divisions[1].id).expect("districts").is_empty());

        let home = p.home().expect("home");
        assert_eq!(home.news.len(), 2);
        assert_eq!(home.news[0].title, "मराठा आरक्षणाचा नवीन GR जारी");
    }

    #[test]
    fn second_run_is_a_no_op() {
        let p = portal();
        seed(&p, t0()).expect("seed");
        assert!(seed(&p, t0()).expect("reseed").is_empty());
        assert_eq!(p.divisions().expect("divisions").len(), 2);
    }

    #[test]
    fn failed_hierarchy_write_leaves_nothing_and_retry_seeds_all() {
        use crate::auth::HashCost;
        use crate::portal::PortalOptions;
        use crate::storage::{MemoryStore, StoreError, UniqueIndex};
        use std::sync::Arc;
        use std::sync::atomic::{AtomicBool, Ordering};

        /// Fails the first commit, then behaves.
        #[derive(Default)]
        struct FailOnce {
            inner: MemoryStore,
            failed: AtomicBool,
        }

        impl Store for FailOnce {
            fn next_id(&self, table: Table) -> std::result::Result<u64, StoreError> {
                self.inner.next_id(table)
            }
            fn get(&self, table: Table, id: u64) -> std::result::Result<Option<Vec<u8>>, StoreError> {
                self.inner.get(table, id)
            }
            fn scan(&self, table: Table) -> std::result::Result<Vec<(u64, Vec<u8>)>, StoreError> {
                self.inner.scan(table)
            }
            fn lookup(&self, index: UniqueIndex, key: &str) -> std::result::Result<Option<u64>, StoreError> {
                self.inner.lookup(index, key)
            }
            fn commit(&self, batch: Batch) -> std::result::Result<(), StoreError> {
                if !self.failed.swap(true, Ordering::SeqCst) {
                    return Err(StoreError::Backend("disk full".into()));
                }
                self.inner.commit(batch)
            }
        }

        let options = PortalOptions {
            hash_cost: HashCost::Low,
            ..PortalOptions::default()
        };
        let p = Portal::with_seed(Arc::new(FailOnce::default()), options, 5);

        assert!(seed(&p, t0()).is_err());
        assert_eq!(p.store().count(Table::Divisions).ok(), Some(0));
        assert_eq!(p.store().count(Table::Villages).ok(), Some(0));
        assert_eq!(p.store().count(Table::News).ok(), Some(0));

        let report = seed(&p, t0()).expect("retry");
        assert_eq!(report.villages, 40);
        assert_eq!(report.news, 3);
        assert_eq!(p.divisions().expect("divisions").len(), 2);
    }
}
