//! # Configuration
//!
//! Server settings, read from command-line flags with `AARAKSHAN_*`
//! environment fallbacks.

use aarakshan_core::PortalOptions;
use aarakshan_core::auth::HashCost;
use clap::{Args, ValueEnum};
use std::fmt;
use std::num::NonZeroU32;
use std::path::PathBuf;

/// Where rows live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Backend {
    /// Process memory; everything is lost on exit.
    Memory,
    /// A redb database file.
    #[default]
    Redb,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Memory => write!(f, "memory"),
            Backend::Redb => write!(f, "redb"),
        }
    }
}

/// Settings of the HTTP server.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to bind.
    #[arg(long, env = "AARAKSHAN_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "AARAKSHAN_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Database file (ignored by the memory backend).
    #[arg(long, env = "AARAKSHAN_DB", default_value = "aarakshan.redb")]
    pub database: PathBuf,

    #[arg(long, env = "AARAKSHAN_BACKEND", value_enum, default_value_t = Backend::Redb)]
    pub backend: Backend,

    /// Value expected in the `X-Admin-Key` header. Admin routes are closed
    /// when unset.
    #[arg(long, env = "AARAKSHAN_ADMIN_KEY", hide_env_values = true)]
    pub admin_key: Option<String>,

    /// Lifetime of a login session, in hours.
    #[arg(long, env = "AARAKSHAN_SESSION_TTL_HOURS", default_value = "168")]
    pub session_ttl_hours: NonZeroU32,

    /// Login attempts allowed per email per minute.
    #[arg(long, env = "AARAKSHAN_LOGIN_PER_MINUTE", default_value = "10")]
    pub login_per_minute: NonZeroU32,

    /// Origin allowed by CORS. Cross-origin requests are refused when unset.
    #[arg(long, env = "AARAKSHAN_CORS_ORIGIN")]
    pub cors_origin: Option<String>,

    /// Load the initial hierarchy, news and catalog before serving.
    #[arg(long, env = "AARAKSHAN_SEED")]
    pub seed: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            database: PathBuf::from("aarakshan.redb"),
            backend: Backend::Redb,
            admin_key: None,
            session_ttl_hours: NonZeroU32::MIN.saturating_add(167),
            login_per_minute: NonZeroU32::MIN.saturating_add(9),
            cors_origin: None,
            seed: false,
        }
    }
}

impl ServerConfig {
    /// `host:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn portal_options(&self) -> PortalOptions {
        PortalOptions {
            session_ttl: chrono::Duration::hours(i64::from(self.session_ttl_hours.get())),
            hash_cost: HashCost::Standard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        config: ServerConfig,
    }

    #[test]
    fn flag_defaults_match_default_impl() {
        let parsed = Harness::try_parse_from(["aarakshan"]).expect("parse").config;
        let default = ServerConfig::default();
        assert_eq!(parsed.port, default.port);
        assert_eq!(parsed.backend, default.backend);
        assert_eq!(parsed.session_ttl_hours, default.session_ttl_hours);
        assert_eq!(parsed.login_per_minute, default.login_per_minute);
    }

    #[test]
    fn session_ttl_becomes_portal_option() {
        let config = Harness::try_parse_from(["aarakshan", "--session-ttl-hours", "2"])
            .expect("parse")
            .config;
        assert_eq!(config.portal_options().session_ttl, chrono::Duration::hours(2));
    }

    #[test]
    fn zero_rate_is_rejected() {
        assert!(Harness::try_parse_from(["aarakshan", "--login-per-minute", "0"]).is_err());
    }

    #[test]
    fn bind_address_joins_host_and_port() {
        let config = ServerConfig {
            host: "0.0.0.0".into(),
            port: 9000,
            ..ServerConfig::default()
        };
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
    }
}
