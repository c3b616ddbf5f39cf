//! Home page and news items.

use super::{Portal, optional, required};
use crate::error::Result;
use crate::model::{Division, News};
use crate::pagination::Page;
use crate::primitives::{HOME_FEATURED_NEWS, NEWS_PER_PAGE};
use crate::storage::{Batch, StoreExt};
use crate::NewsId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Home page data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Home {
    pub news: Vec<News>,
    pub divisions: Vec<Division>,
}

/// Admin "add news" form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNews {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub is_featured: bool,
}

impl Portal {
    fn news_newest_first(&self, pred: impl Fn(&News) -> bool) -> Result<Vec<News>> {
        let mut items = self.store.fetch_where(pred)?;
        items.sort_by(|a, b| {
            b.date_posted
                .cmp(&a.date_posted)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(items)
    }

    pub fn home(&self) -> Result<Home> {
        let mut news = self.news_newest_first(|n| n.is_featured)?;
        news.truncate(HOME_FEATURED_NEWS);
        Ok(Home {
            news,
            divisions: self.divisions()?,
        })
    }

    pub fn news_page(&self, page: usize) -> Result<Page<News>> {
        Ok(Page::paginate(
            self.news_newest_first(|_| true)?,
            page,
            NEWS_PER_PAGE,
        ))
    }

    pub fn add_news(&self, input: NewNews, now: DateTime<Utc>) -> Result<News> {
        let image_url = optional("image_url", &input.image_url, 500)?;
        let item = News {
            id: NewsId(self.next_id::<News>()?),
            title: required("title", &input.title, 200)?,
            content: required("content", &input.content, 10_000)?,
            image_url: (!image_url.is_empty()).then_some(image_url),
            date_posted: now,
            is_featured: input.is_featured,
        };
        let mut batch = Batch::new();
        batch.put(&item)?;
        self.store.commit(batch)?;
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::testing::{portal, t0};
    use chrono::Duration;

    fn item(title: &str, featured: bool) -> NewNews {
        NewNews {
            title: title.into(),
            content: "मजकूर".into(),
            image_url: String::new(),
            is_featured: featured,
        }
    }

    #[test]
    fn home_shows_three_newest_featured() {
        let p = portal();
        for i in 0..5 {
            p.add_news(item(&format!("f{i}"), true), t0() + Duration::hours(i))
                .expect("add");
        }
        p.add_news(item("plain", false), t0() + Duration::days(1))
            .expect("add");

        let titles: Vec<_> = p.home().expect("home").news.into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["f4", "f3", "f2"]);
    }

    #[test]
    fn news_pages_hold_ten() {
        let p = portal();
        for i in 0..12 {
            p.add_news(item(&format!("n{i}"), false), t0() + Duration::minutes(i))
                .expect("add");
        }
        let first = p.news_page(1).expect("page");
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.items[0].title, "n11");
        assert_eq!(p.news_page(2).expect("page").items.len(), 2);
        assert!(p.news_page(3).expect("page").items.is_empty());
    }

    #[test]
    fn blank_image_url_is_none() {
        let p = portal();
        assert_eq!(p.add_news(item("x", false), t0()).expect("add").image_url, None);
    }
}
