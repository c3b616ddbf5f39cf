use super::record;
use crate::NewsId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct News {
    pub id: NewsId,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub date_posted: DateTime<Utc>,
    /// Featured items appear on the home page.
    pub is_featured: bool,
}

record!(News, News);
