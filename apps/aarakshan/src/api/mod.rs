//! # HTTP API
//!
//! axum router over a shared [`Portal`]. Every route answers JSON.
//!
//! | Prefix | Access |
//! |--------|--------|
//! | `/`, content pages, `/api/*` lookups | anonymous |
//! | `/dashboard`, `/profile`, payments, applications | bearer session token |
//! | `/api/v1/*` with a `user_id` | the session user must be that user |
//! | `/admin/*` | `X-Admin-Key` header |

pub mod account;
pub mod admin;
pub mod auth;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod public;
pub mod v1;
pub mod views;

use crate::config::ServerConfig;
use aarakshan_core::Portal;
use axum::{
    Router,
    http::{
        HeaderName, HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{delete, get, post},
};
use error::{ApiError, ApiResult};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

pub use dispatch::TracingDispatcher;

/// How often recovered login-limiter keys are dropped.
const LIMITER_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub portal: Arc<Portal>,
    pub config: Arc<ServerConfig>,
    /// Login attempts, keyed by lowercased email.
    pub login_limiter: Arc<DefaultKeyedRateLimiter<String>>,
}

impl AppState {
    pub fn new(portal: Portal, config: ServerConfig) -> Self {
        let limiter = RateLimiter::keyed(Quota::per_minute(config.login_per_minute));
        Self {
            portal: Arc::new(portal),
            config: Arc::new(config),
            login_limiter: Arc::new(limiter),
        }
    }
}

/// Drop keys whose quota has fully recovered so the map tracks only recent
/// senders.
pub fn sweep_limiter(limiter: &DefaultKeyedRateLimiter<String>) {
    limiter.retain_recent();
    limiter.shrink_to_fit();
}

async fn sweep_login_limiter(limiter: Arc<DefaultKeyedRateLimiter<String>>) {
    let mut ticker = tokio::time::interval(LIMITER_SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        sweep_limiter(&limiter);
        debug!(keys = limiter.len(), "login limiter swept");
    }
}

/// Run a portal call on the blocking pool. Every store-touching handler
/// goes through here: redb does file I/O and passwords take argon2 time.
pub(crate) async fn blocking<T, F>(state: &AppState, f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Portal) -> aarakshan_core::Result<T> + Send + 'static,
{
    let portal = Arc::clone(&state.portal);
    tokio::task::spawn_blocking(move || f(&portal))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

fn cors(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(auth::ADMIN_KEY_HEADER),
        ])
        .max_age(Duration::from_secs(60 * 60));
    match config.cors_origin.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(e)) => {
            warn!("ignoring invalid CORS origin: {e}");
            layer
        }
        None => layer,
    }
}

/// Every route of the portal.
pub fn router(state: AppState) -> Router {
    let pages = Router::new()
        .route("/", get(public::home))
        .route("/division/{id}", get(public::division))
        .route("/district/{id}", get(public::district))
        .route("/village/{id}", get(public::village))
        .route("/search", get(public::search))
        .route("/news", get(public::news))
        .route("/submit-person", post(public::submit_person))
        .route("/check-eligibility", post(public::check_eligibility))
        .route("/documents", get(public::documents))
        .route("/faq", get(public::faq))
        .route("/nearest-office", get(public::nearest_office))
        .route("/testimonials", get(public::testimonials))
        .route("/phases", get(public::phases))
        .route("/district-wise-records", get(public::district_records))
        .route("/health", get(public::health))
        .route("/api/districts/{division_id}", get(public::districts_of))
        .route("/api/villages/{district_id}", get(public::villages_of));

    let accounts = Router::new()
        .route("/register", post(account::register))
        .route("/login", post(account::login))
        .route("/logout", post(account::logout))
        .route("/dashboard", get(account::dashboard))
        .route("/profile", get(account::profile))
        .route("/notifications", get(account::notifications))
        .route("/premium", get(account::premium))
        .route("/purchase/{service}", get(account::purchase))
        .route("/process-payment", post(account::process_payment))
        .route("/submit-application", post(account::submit_application))
        .route("/track-application/{number}", get(account::track_application))
        .route("/track", get(account::track_public));

    let api_v1 = Router::new()
        .route("/login", post(account::login))
        .route("/notifications/{user_id}", get(v1::notifications))
        .route("/applications/{user_id}", get(v1::applications))
        .route("/track/{number}", get(account::track_application))
        .route("/villages/{district_id}", get(v1::villages));

    let admin = Router::new()
        .route("/", get(admin::dashboard))
        .route("/people", get(admin::people))
        .route("/people/{id}/verify", post(admin::verify_person))
        .route("/people/{id}", delete(admin::delete_person))
        .route("/locations", get(admin::locations))
        .route("/divisions", post(admin::add_division))
        .route("/districts", post(admin::add_district))
        .route("/villages", post(admin::add_village))
        .route("/news", post(admin::add_news))
        .route("/notifications", post(admin::send_notification))
        .route("/applications/{number}/advance", post(admin::advance))
        .route("/applications/{number}/decide", post(admin::decide))
        .route("/users/{id}/active", post(admin::set_user_active))
        .route("/sessions/purge", post(admin::purge_sessions));

    let cors = cors(&state.config);
    pages
        .merge(accounts)
        .nest("/api/v1", api_v1)
        .nest("/admin", admin)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Bind and serve until Ctrl+C or SIGTERM.
pub async fn serve(state: AppState) -> std::io::Result<()> {
    let address = state.config.bind_address();
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    let sweeper = tokio::spawn(sweep_login_limiter(Arc::clone(&state.login_limiter)));
    let served = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;
    sweeper.abort();
    served?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to listen for Ctrl+C: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
