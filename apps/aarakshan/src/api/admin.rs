//! Operator routes. Every handler takes the [`Admin`] extractor.

use super::auth::Admin;
use super::error::ApiResult;
use super::extract::{Json, Path, Query};
use super::{AppState, blocking};
use super::views::{ApplicationSummary, Profile};
use aarakshan_core::portal::{AdminStats, NewNews, PeopleFilter, SendNotification};
use aarakshan_core::{Decision, DistrictId, DivisionId, PersonId, UserId};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

/// Name used on status updates when the request does not give one.
const DEFAULT_ACTOR: &str = "admin";

#[derive(Debug, Clone, Deserialize)]
pub struct PeopleParams {
    #[serde(default)]
    pub filter: PeopleFilter,
    #[serde(default)]
    pub page: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NameForm {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DistrictForm {
    pub division_id: DivisionId,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VillageForm {
    pub district_id: DistrictId,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransitionForm {
    pub actor: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecisionForm {
    pub decision: Decision,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ActiveForm {
    pub active: bool,
}

fn created(body: Value) -> Response {
    (StatusCode::CREATED, Json(body)).into_response()
}

// =============================================================================
// DASHBOARD AND PEOPLE
// =============================================================================

pub async fn dashboard(State(state): State<AppState>, _: Admin) -> ApiResult<Json<AdminStats>> {
    Ok(Json(blocking(&state, |portal| portal.admin_stats()).await?))
}

pub async fn people(
    State(state): State<AppState>,
    _: Admin,
    Query(params): Query<PeopleParams>,
) -> ApiResult<Json<Value>> {
    let filter = params.filter;
    let page = blocking(&state, move |portal| portal.people(filter, params.page.unwrap_or(1))).await?;
    Ok(Json(json!({ "filter": filter, "people": page })))
}

pub async fn verify_person(
    State(state): State<AppState>,
    _: Admin,
    Path(id): Path<u64>,
) -> ApiResult<Json<Value>> {
    let person = blocking(&state, move |portal| portal.verify_person(PersonId(id))).await?;
    info!(person = %person.id, "person verified");
    Ok(Json(json!({ "success": true, "person": person })))
}

pub async fn delete_person(
    State(state): State<AppState>,
    _: Admin,
    Path(id): Path<u64>,
) -> ApiResult<Json<Value>> {
    let person = blocking(&state, move |portal| portal.delete_person(PersonId(id))).await?;
    info!(person = %person.id, "person deleted");
    Ok(Json(json!({ "success": true, "person": person })))
}

// =============================================================================
// LOCATIONS
// =============================================================================

pub async fn locations(State(state): State<AppState>, _: Admin) -> ApiResult<Json<Value>> {
    let divisions = blocking(&state, |portal| portal.locations()).await?;
    Ok(Json(json!({ "divisions": divisions })))
}

pub async fn add_division(
    State(state): State<AppState>,
    _: Admin,
    Json(form): Json<NameForm>,
) -> ApiResult<Response> {
    let division = blocking(&state, move |portal| portal.add_division(&form.name)).await?;
    Ok(created(json!({ "success": true, "division": division })))
}

pub async fn add_district(
    State(state): State<AppState>,
    _: Admin,
    Json(form): Json<DistrictForm>,
) -> ApiResult<Response> {
    let district =
        blocking(&state, move |portal| portal.add_district(form.division_id, &form.name)).await?;
    Ok(created(json!({ "success": true, "district": district })))
}

pub async fn add_village(
    State(state): State<AppState>,
    _: Admin,
    Json(form): Json<VillageForm>,
) -> ApiResult<Response> {
    let village =
        blocking(&state, move |portal| portal.add_village(form.district_id, &form.name)).await?;
    Ok(created(json!({ "success": true, "village": village })))
}

// =============================================================================
// NEWS AND NOTIFICATIONS
// =============================================================================

pub async fn add_news(
    State(state): State<AppState>,
    _: Admin,
    Json(input): Json<NewNews>,
) -> ApiResult<Response> {
    let news = blocking(&state, move |portal| portal.add_news(input, Utc::now())).await?;
    Ok(created(json!({ "success": true, "news": news })))
}

pub async fn send_notification(
    State(state): State<AppState>,
    _: Admin,
    Json(input): Json<SendNotification>,
) -> ApiResult<Json<Value>> {
    let delivery =
        blocking(&state, move |portal| portal.send_notification(input, Utc::now())).await?;
    Ok(Json(json!({
        "success": true,
        "notification_id": delivery.notification.id,
        "sms_sent": delivery.sms_sent,
        "email_sent": delivery.email_sent,
    })))
}

// =============================================================================
// PIPELINE
// =============================================================================

pub async fn advance(
    State(state): State<AppState>,
    _: Admin,
    Path(number): Path<String>,
    form: Option<Json<TransitionForm>>,
) -> ApiResult<Json<Value>> {
    let form = form.map(|Json(f)| f).unwrap_or_default();
    let actor = form.actor.unwrap_or_else(|| DEFAULT_ACTOR.into());
    let target = number.clone();
    let application = blocking(&state, move |portal| {
        portal.advance(&target, &actor, form.message, Utc::now())
    })
    .await?;
    info!(number = %number, stage = %application.current_stage, "application advanced");
    Ok(Json(json!({
        "success": true,
        "application": ApplicationSummary::from(&application),
    })))
}

pub async fn decide(
    State(state): State<AppState>,
    _: Admin,
    Path(number): Path<String>,
    Json(form): Json<DecisionForm>,
) -> ApiResult<Json<Value>> {
    let actor = form.actor.unwrap_or_else(|| DEFAULT_ACTOR.into());
    let target = number.clone();
    let application = blocking(&state, move |portal| {
        portal.decide(&target, form.decision, &actor, form.message, Utc::now())
    })
    .await?;
    info!(number = %number, status = %application.status, "application decided");
    Ok(Json(json!({
        "success": true,
        "application": ApplicationSummary::from(&application),
    })))
}

// =============================================================================
// USERS AND SESSIONS
// =============================================================================

pub async fn set_user_active(
    State(state): State<AppState>,
    _: Admin,
    Path(id): Path<u64>,
    Json(form): Json<ActiveForm>,
) -> ApiResult<Json<Value>> {
    let user = blocking(&state, move |portal| portal.set_user_active(UserId(id), form.active)).await?;
    info!(user = %user.id, active = user.is_active, "user activation changed");
    Ok(Json(json!({ "success": true, "user": Profile::from(&user), "is_active": user.is_active })))
}

pub async fn purge_sessions(State(state): State<AppState>, _: Admin) -> ApiResult<Json<Value>> {
    let purged = blocking(&state, |portal| portal.purge_expired_sessions(Utc::now())).await?;
    Ok(Json(json!({ "success": true, "purged": purged })))
}
