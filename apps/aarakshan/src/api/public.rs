//! Anonymous pages: hierarchy, search, news, static content and the
//! eligibility check.

use super::error::{ApiError, ApiResult};
use super::extract::{Json, Path, Query};
use super::{AppState, blocking};
use aarakshan_core::content;
use aarakshan_core::eligibility::{self, Locale, Questionnaire};
use aarakshan_core::portal::{DistrictView, DivisionView, Home, NewPerson, SearchQuery, VillageView};
use aarakshan_core::{DistrictId, DivisionId, News, Page, VillageId};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// `?page=` of list pages.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default = "first_page")]
    pub page: usize,
}

fn first_page() -> usize {
    1
}

/// Entry of a cascading select box.
#[derive(Debug, Clone, Serialize)]
pub struct Choice {
    pub id: u64,
    pub name: String,
}

// =============================================================================
// HIERARCHY
// =============================================================================

pub async fn home(State(state): State<AppState>) -> ApiResult<Json<Home>> {
    Ok(Json(blocking(&state, |portal| portal.home()).await?))
}

pub async fn division(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<DivisionView>> {
    Ok(Json(blocking(&state, move |portal| portal.division(DivisionId(id))).await?))
}

pub async fn district(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<DistrictView>> {
    Ok(Json(blocking(&state, move |portal| portal.district(DistrictId(id))).await?))
}

pub async fn village(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<VillageView>> {
    Ok(Json(blocking(&state, move |portal| portal.village(VillageId(id))).await?))
}

pub async fn districts_of(
    State(state): State<AppState>,
    Path(division_id): Path<u64>,
) -> ApiResult<Json<Vec<Choice>>> {
    let districts =
        blocking(&state, move |portal| portal.districts_of(DivisionId(division_id))).await?;
    Ok(Json(
        districts
            .into_iter()
            .map(|d| Choice {
                id: d.id.0,
                name: d.name,
            })
            .collect(),
    ))
}

pub async fn villages_of(
    State(state): State<AppState>,
    Path(district_id): Path<u64>,
) -> ApiResult<Json<Vec<Choice>>> {
    let villages =
        blocking(&state, move |portal| portal.villages_of(DistrictId(district_id))).await?;
    Ok(Json(
        villages
            .into_iter()
            .map(|v| Choice {
                id: v.id.0,
                name: v.name,
            })
            .collect(),
    ))
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Value>> {
    let (query, results) = blocking(&state, move |portal| {
        let results = portal.search(&query)?;
        Ok((query, results))
    })
    .await?;
    Ok(Json(json!({
        "query": query,
        "count": results.len(),
        "results": results,
    })))
}

pub async fn submit_person(
    State(state): State<AppState>,
    Json(input): Json<NewPerson>,
) -> ApiResult<Response> {
    let person = blocking(&state, move |portal| portal.submit_person(input, Utc::now())).await?;
    tracing::info!(person = %person.id, "person submitted for verification");
    let body = json!({
        "success": true,
        "message": "माहिती सबमिट केली. पडताळणीनंतर ती दिसेल.",
        "person": person,
    });
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

// =============================================================================
// NEWS AND CONTENT
// =============================================================================

pub async fn news(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Page<News>>> {
    Ok(Json(blocking(&state, move |portal| portal.news_page(params.page)).await?))
}

pub async fn documents() -> Json<Value> {
    Json(json!({ "documents": content::DOCUMENTS }))
}

pub async fn faq() -> Json<Value> {
    Json(json!({ "faqs": content::FAQ }))
}

pub async fn nearest_office() -> Json<Value> {
    Json(json!({ "offices": content::OFFICES }))
}

pub async fn testimonials() -> Json<Value> {
    Json(json!({ "testimonials": content::TESTIMONIALS }))
}

pub async fn phases() -> Json<Value> {
    Json(json!({ "phases": content::phases() }))
}

pub async fn district_records(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let records = blocking(&state, |portal| portal.district_records()).await?;
    Ok(Json(json!({ "records": records })))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

// =============================================================================
// ELIGIBILITY
// =============================================================================

/// The questionnaire plus the language of the reasons.
#[derive(Debug, Clone, Deserialize)]
pub struct EligibilityForm {
    #[serde(flatten)]
    pub answers: Questionnaire,
    #[serde(default)]
    pub lang: Locale,
}

fn eligibility_error(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "status": "error", "message": message }))).into_response()
}

/// Answers with `{status, ...}` rather than the usual `{success, ...}`,
/// malformed bodies included.
pub async fn check_eligibility(form: Result<Json<EligibilityForm>, ApiError>) -> Response {
    let Json(form) = match form {
        Ok(form) => form,
        Err(err) => return eligibility_error(err.status(), err.message()),
    };
    match eligibility::evaluate(&form.answers) {
        Ok(verdict) => Json(json!({
            "status": "success",
            "eligible": verdict.eligible,
            "reasons": verdict.messages(form.lang),
            "codes": verdict.reasons,
        }))
        .into_response(),
        Err(err) => eligibility_error(StatusCode::BAD_REQUEST, err.to_string()),
    }
}
