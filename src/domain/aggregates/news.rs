//! News posts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use crate::domain::events::{DomainEvent, NewsEvent};
use crate::domain::value_objects::Slug;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsStatus { #[default] Draft, Published }

impl NewsStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Draft => "draft", Self::Published => "published" }
    }
}

impl std::str::FromStr for NewsStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            other => Err(format!("unknown news status {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct News {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub author_id: Uuid,
    pub content: String,
    pub status: NewsStatus,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewsForm {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 200))]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub status: NewsStatus,
}

/// Admin list view: the columns shown for each post.
#[derive(Clone, Debug, Serialize)]
pub struct NewsSummary { pub id: Uuid, pub title: String, pub slug: String, pub status: NewsStatus, pub created_on: DateTime<Utc> }

impl From<&News> for NewsSummary {
    fn from(n: &News) -> Self { Self { id: n.id, title: n.title.clone(), slug: n.slug.clone(), status: n.status, created_on: n.created_on } }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewsFilter { pub status: Option<NewsStatus>, pub q: Option<String> }

impl NewsFilter {
    pub fn published() -> Self { Self { status: Some(NewsStatus::Published), q: None } }

    pub fn matches(&self, news: &News) -> bool {
        if self.status.is_some_and(|s| s != news.status) { return false; }
        match self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => {
                let q = q.to_lowercase();
                news.title.to_lowercase().contains(&q) || news.content.to_lowercase().contains(&q)
            }
            None => true,
        }
    }
}

impl News {
    pub fn create(form: NewsForm, author_id: Uuid) -> (Self, Option<DomainEvent>) {
        let now = Utc::now();
        let mut news = Self {
            id: Uuid::now_v7(), title: String::new(), slug: String::new(), author_id, content: String::new(),
            status: NewsStatus::Draft, created_on: now, updated_on: now,
        };
        let event = news.apply_form(form);
        (news, event)
    }

    /// Applies the form; returns a publish event when the post goes live.
    pub fn apply_form(&mut self, form: NewsForm) -> Option<DomainEvent> {
        let was_published = self.status == NewsStatus::Published;
        self.title = form.title.trim().to_string();
        self.slug = match form.slug.as_deref().map(Slug::from_title) {
            Some(slug) if !slug.as_str().is_empty() => slug.into_inner(),
            _ => Slug::from_title(&self.title).into_inner(),
        };
        self.content = form.content;
        self.status = form.status;
        self.updated_on = Utc::now();
        (!was_published && self.status == NewsStatus::Published)
            .then(|| DomainEvent::News(NewsEvent::Published { news_id: self.id, slug: self.slug.clone() }))
    }
}
