use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use super::auth::Superuser;
use super::{AppState, Message};
use crate::domain::aggregates::{News, NewsFilter, NewsForm, NewsStatus, NewsSummary};
use crate::error::{Result, StorefrontError};

fn check_form(form: &NewsForm) -> Result<()> {
    form.validate().map_err(|e| StorefrontError::invalid("Failed, check your form and try again!", e))
}

fn check_slug(news: &News) -> Result<()> {
    if news.slug.is_empty() {
        let mut errors = validator::ValidationErrors::new();
        errors.add("slug", validator::ValidationError::new("empty_slug"));
        return Err(StorefrontError::invalid("Failed, check your form and try again!", errors));
    }
    Ok(())
}

pub async fn list_news(State(s): State<AppState>) -> Result<Json<Vec<News>>> {
    Ok(Json(s.store.news(&NewsFilter::published()).await?))
}

pub async fn news_detail(State(s): State<AppState>, Path(slug): Path<String>) -> Result<Json<News>> {
    s.store
        .news_by_slug(&slug)
        .await?
        .filter(|n| n.status == NewsStatus::Published)
        .map(Json)
        .ok_or_else(|| StorefrontError::not_found("News post not found"))
}

/// Admin changelist: filter by status, search title and content.
pub async fn admin_list_news(State(s): State<AppState>, _admin: Superuser, Query(filter): Query<NewsFilter>) -> Result<Json<Vec<NewsSummary>>> {
    let news = s.store.news(&filter).await?;
    Ok(Json(news.iter().map(NewsSummary::from).collect()))
}

#[tracing::instrument(skip_all)]
pub async fn admin_create_news(State(s): State<AppState>, Superuser(admin): Superuser, Json(form): Json<NewsForm>) -> Result<(StatusCode, Json<News>)> {
    check_form(&form)?;
    let (news, event) = News::create(form, admin.id);
    check_slug(&news)?;
    s.store.insert_news(news.clone()).await?;
    tracing::info!(slug = %news.slug, "news post created");
    s.events.publish(event).await;
    Ok((StatusCode::CREATED, Json(news)))
}

#[tracing::instrument(skip_all, fields(news_id = %id))]
pub async fn admin_update_news(State(s): State<AppState>, _admin: Superuser, Path(id): Path<Uuid>, Json(form): Json<NewsForm>) -> Result<Json<News>> {
    check_form(&form)?;
    let mut news = s.store.news_by_id(id).await?.ok_or_else(|| StorefrontError::not_found("News post not found"))?;
    let event = news.apply_form(form);
    check_slug(&news)?;
    if !s.store.update_news(news.clone()).await? {
        return Err(StorefrontError::not_found("News post not found"));
    }
    s.events.publish(event).await;
    Ok(Json(news))
}

pub async fn admin_delete_news(State(s): State<AppState>, _admin: Superuser, Path(id): Path<Uuid>) -> Result<Json<Vec<Message>>> {
    if !s.store.delete_news(id).await? {
        return Err(StorefrontError::not_found("News post not found"));
    }
    Ok(Json(vec![Message::success("News post deleted")]))
}
