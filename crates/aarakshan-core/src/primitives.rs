//! # Primitives
//!
//! Fixed limits and constants shared by the portal operations.

/// People per page on the admin people list.
pub const ADMIN_PEOPLE_PER_PAGE: usize = 20;

/// News items per page on the public news list.
pub const NEWS_PER_PAGE: usize = 10;

/// Featured news items shown on the home page.
pub const HOME_FEATURED_NEWS: usize = 3;

/// Unread notifications shown on the dashboard.
pub const DASHBOARD_NOTIFICATIONS: usize = 5;

/// Notifications returned by the JSON notifications API.
pub const API_NOTIFICATIONS: usize = 20;

/// Recent unverified submissions shown on the admin dashboard.
pub const ADMIN_RECENT_SUBMISSIONS: usize = 5;

/// Attempts at drawing a fresh application/transaction number before giving up.
pub const MAX_NUMBER_ATTEMPTS: usize = 16;

/// Prefix of application numbers (`MR<year><6 digits>`).
pub const APPLICATION_PREFIX: &str = "MR";

/// Prefix of payment transaction ids (`TXN<yyyymmdd><5 digits>`).
pub const TRANSACTION_PREFIX: &str = "TXN";

/// Author recorded on status updates written by the portal itself.
pub const SYSTEM_ACTOR: &str = "System";

/// Default lifetime of a login session, in hours.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;

/// Bytes of entropy in a session token.
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Minimum accepted password length (in characters).
pub const MIN_PASSWORD_LEN: usize = 8;

/// Maximum length accepted for short text fields (names, titles).
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length accepted for phone numbers.
pub const MAX_PHONE_LEN: usize = 15;

/// Maximum length accepted for reservation numbers.
pub const MAX_RESERVATION_NUMBER_LEN: usize = 50;
