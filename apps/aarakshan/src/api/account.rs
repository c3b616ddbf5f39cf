//! Session-bound pages: registration, login, dashboard, applications and
//! payments.

use super::auth::{CurrentUser, MaybeUser};
use super::error::{ApiError, ApiResult};
use super::extract::{Json, Path, Query};
use super::views::{ApplicationSummary, NotificationItem, Profile, TrackedApplication, UserSummary};
use super::{AppState, blocking};
use aarakshan_core::portal::{NewApplication, NewUser, PaymentRequest};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Public tracking form.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackForm {
    pub application_number: String,
    pub phone: String,
}

// =============================================================================
// ACCOUNT
// =============================================================================

pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<NewUser>,
) -> ApiResult<Response> {
    let user = blocking(&state, move |portal| portal.register(input, Utc::now())).await?;
    info!(user = %user.id, "user registered");
    let body = json!({ "success": true, "user": UserSummary::from(&user) });
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// Shared by `/login` and `/api/v1/login`.
pub async fn login(
    State(state): State<AppState>,
    Json(form): Json<LoginForm>,
) -> ApiResult<Json<Value>> {
    let key = form.email.trim().to_lowercase();
    if state.login_limiter.check_key(&key).is_err() {
        warn!("login rate limit hit");
        return Err(ApiError::RateLimited);
    }
    let outcome = blocking(&state, move |portal| {
        portal.login(&form.email, &form.password, Utc::now())
    })
    .await?;
    info!(user = %outcome.user.id, "login");
    Ok(Json(json!({
        "success": true,
        "user": UserSummary::from(&outcome.user),
        "token": outcome.session.token,
        "expires_at": outcome.session.expires_at,
    })))
}

pub async fn logout(
    State(state): State<AppState>,
    session: CurrentUser,
) -> ApiResult<Json<Value>> {
    let token = session.token;
    blocking(&state, move |portal| portal.logout(&token)).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn dashboard(
    State(state): State<AppState>,
    session: CurrentUser,
) -> ApiResult<Json<Value>> {
    let user_id = session.user.id;
    let dashboard = blocking(&state, move |portal| portal.dashboard(user_id)).await?;
    let applications: Vec<_> = dashboard.applications.iter().map(ApplicationSummary::from).collect();
    let notifications: Vec<_> = dashboard
        .notifications
        .into_iter()
        .map(NotificationItem::from)
        .collect();
    Ok(Json(json!({
        "user": Profile::from(&dashboard.user),
        "applications": applications,
        "notifications": notifications,
    })))
}

pub async fn profile(
    State(state): State<AppState>,
    session: CurrentUser,
) -> ApiResult<Json<Value>> {
    let user_id = session.user.id;
    let payments = blocking(&state, move |portal| portal.payments_of(user_id)).await?;
    Ok(Json(json!({
        "user": Profile::from(&session.user),
        "payments": payments,
    })))
}

/// Lists every notification and marks them read.
pub async fn notifications(
    State(state): State<AppState>,
    session: CurrentUser,
) -> ApiResult<Json<Value>> {
    let user_id = session.user.id;
    let inbox: Vec<_> = blocking(&state, move |portal| portal.notifications_page(user_id))
        .await?
        .into_iter()
        .map(NotificationItem::from)
        .collect();
    Ok(Json(json!({ "notifications": inbox })))
}

// =============================================================================
// BILLING
// =============================================================================

pub async fn premium(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let services = blocking(&state, |portal| portal.catalog()).await?;
    Ok(Json(json!({ "services": services })))
}

pub async fn purchase(
    State(state): State<AppState>,
    session: CurrentUser,
    Path(service): Path<String>,
) -> ApiResult<Json<Value>> {
    let service = blocking(&state, move |portal| portal.quote(&service)).await?;
    Ok(Json(json!({
        "service": service,
        "user": UserSummary::from(&session.user),
    })))
}

pub async fn process_payment(
    State(state): State<AppState>,
    session: CurrentUser,
    Json(request): Json<PaymentRequest>,
) -> ApiResult<Json<Value>> {
    let user_id = session.user.id;
    let payment = blocking(&state, move |portal| {
        portal.process_payment(user_id, request, Utc::now())
    })
    .await?;
    info!(user = %session.user.id, txn = %payment.transaction_id, service = %payment.service, "payment processed");
    Ok(Json(json!({
        "success": true,
        "transaction_id": payment.transaction_id,
        "amount": payment.amount,
    })))
}

// =============================================================================
// APPLICATIONS
// =============================================================================

pub async fn submit_application(
    State(state): State<AppState>,
    session: CurrentUser,
    Json(input): Json<NewApplication>,
) -> ApiResult<Response> {
    let user_id = session.user.id;
    let application = blocking(&state, move |portal| {
        portal.submit_application(user_id, input, Utc::now())
    })
    .await?;
    info!(
        user = %session.user.id,
        number = %application.application_number,
        "application submitted"
    );
    let body = json!({
        "success": true,
        "application_number": application.application_number,
        "application": ApplicationSummary::from(&application),
    });
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// Shared by `/track-application/{n}` and `/api/v1/track/{n}`.
pub async fn track_application(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(number): Path<String>,
) -> ApiResult<Json<Value>> {
    let viewer = viewer.map(|u| u.id);
    let tracking = blocking(&state, move |portal| portal.track(&number, viewer)).await?;
    Ok(Json(json!({
        "success": true,
        "application": TrackedApplication::from(tracking),
    })))
}

pub async fn track_public(
    State(state): State<AppState>,
    Query(form): Query<TrackForm>,
) -> ApiResult<Json<Value>> {
    let tracking = blocking(&state, move |portal| {
        portal.track_public(&form.application_number, &form.phone)
    })
    .await?;
    Ok(Json(json!({
        "success": true,
        "application": TrackedApplication::from(tracking),
    })))
}
