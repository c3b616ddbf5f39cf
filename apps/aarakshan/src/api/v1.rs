//! `/api/v1` endpoints used by the mobile client.

use super::auth::{CurrentUser, ensure_self};
use super::error::ApiResult;
use super::extract::{Json, Path};
use super::{AppState, blocking};
use super::public::Choice;
use super::views::{ApplicationSummary, NotificationItem};
use aarakshan_core::primitives::API_NOTIFICATIONS;
use aarakshan_core::{DistrictId, UserId};
use axum::extract::State;
use serde_json::{Value, json};

/// The 20 newest notifications, without marking them read.
pub async fn notifications(
    State(state): State<AppState>,
    session: CurrentUser,
    Path(user_id): Path<u64>,
) -> ApiResult<Json<Value>> {
    ensure_self(&session.user, UserId(user_id))?;
    let inbox: Vec<_> = blocking(&state, move |portal| {
        portal.recent_notifications(UserId(user_id), API_NOTIFICATIONS)
    })
    .await?
    .into_iter()
    .map(NotificationItem::from)
    .collect();
    Ok(Json(json!({ "success": true, "notifications": inbox })))
}

pub async fn applications(
    State(state): State<AppState>,
    session: CurrentUser,
    Path(user_id): Path<u64>,
) -> ApiResult<Json<Value>> {
    ensure_self(&session.user, UserId(user_id))?;
    let applications: Vec<_> = blocking(&state, move |portal| {
        portal.user_applications(UserId(user_id))
    })
    .await?
    .iter()
    .map(ApplicationSummary::from)
    .collect();
    Ok(Json(json!({ "success": true, "applications": applications })))
}

pub async fn villages(
    State(state): State<AppState>,
    Path(district_id): Path<u64>,
) -> ApiResult<Json<Value>> {
    let villages: Vec<_> = blocking(&state, move |portal| portal.villages_of(DistrictId(district_id)))
        .await?
        .into_iter()
        .map(|v| Choice {
            id: v.id.0,
            name: v.name,
        })
        .collect();
    Ok(Json(json!({ "success": true, "villages": villages })))
}
