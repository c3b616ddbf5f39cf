//! Request extractors for session users and the admin key.

use super::error::ApiError;
use super::{AppState, blocking};
use aarakshan_core::{PortalError, User};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;
use subtle::ConstantTimeEq;

/// Header carrying the operator key on `/admin` routes.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Bearer token of the request, if any.
fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// A logged-in user. Rejects with 401 when the token is missing or stale.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer(&parts.headers)
            .ok_or(PortalError::Unauthorized)?
            .to_string();
        let lookup = token.clone();
        let user = blocking(state, move |portal| portal.authenticate(&lookup, Utc::now())).await?;
        Ok(Self { user, token })
    }
}

/// The session user when a token is sent, `None` for anonymous requests.
///
/// A token that is sent but invalid is still an error.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer(&parts.headers).map(str::to_string) else {
            return Ok(Self(None));
        };
        let user = blocking(state, move |portal| portal.authenticate(&token, Utc::now())).await?;
        Ok(Self(Some(user)))
    }
}

/// Proof that the request carried the configured admin key.
#[derive(Debug, Clone, Copy)]
pub struct Admin;

fn admin_key_matches(expected: Option<&str>, sent: Option<&str>) -> bool {
    match (expected, sent) {
        (Some(expected), Some(sent)) => expected.as_bytes().ct_eq(sent.as_bytes()).into(),
        _ => false,
    }
}

impl FromRequestParts<AppState> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let sent = parts
            .headers
            .get(ADMIN_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        if admin_key_matches(state.config.admin_key.as_deref(), sent) {
            Ok(Admin)
        } else {
            Err(ApiError::AdminKey)
        }
    }
}

/// Refuse access to another user's data.
pub fn ensure_self(session: &User, requested: aarakshan_core::UserId) -> Result<(), ApiError> {
    if session.id == requested {
        Ok(())
    } else {
        Err(PortalError::Forbidden("you can only view your own data".into()).into())
    }
}
