//! Registered users and their login sessions.

use super::record;
use crate::{SessionId, UserId, VillageId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Paid tier of an account. Decides the review priority and the promised
/// processing time of new applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Premium,
    Pro,
}

impl SubscriptionTier {
    /// Days promised for an application submitted on this tier.
    #[must_use]
    pub const fn completion_days(self) -> i64 {
        match self {
            SubscriptionTier::Free => 120,
            SubscriptionTier::Premium => 60,
            SubscriptionTier::Pro => 30,
        }
    }

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Premium => "premium",
            SubscriptionTier::Pro => "pro",
        }
    }

    /// Tier sold under a catalog slug, if the slug is a subscription.
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<SubscriptionTier> {
        match slug {
            "premium" => Some(SubscriptionTier::Premium),
            "pro" => Some(SubscriptionTier::Pro),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_paid(self) -> bool {
        !matches!(self, SubscriptionTier::Free)
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// USER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// PHC string (`$argon2id$...`).
    pub password_hash: String,
    pub full_name: String,
    pub phone: String,
    pub village_id: Option<VillageId>,
    pub subscription_type: SubscriptionTier,
    /// `None` for free accounts and for tiers granted without expiry.
    pub subscription_expires: Option<DateTime<Utc>>,
    pub date_created: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub email_verified: bool,
}

impl User {
    /// Tier in force at `now`; an expired subscription counts as free.
    #[must_use]
    pub fn effective_tier(&self, now: DateTime<Utc>) -> SubscriptionTier {
        match self.subscription_expires {
            Some(expires) if expires <= now => SubscriptionTier::Free,
            _ => self.subscription_type,
        }
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Server-side login session, looked up by its opaque token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Time left before expiry (zero once expired).
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }
}

record!(User, Users);
record!(Session, Sessions);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user(tier: SubscriptionTier, expires: Option<DateTime<Utc>>) -> User {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("date");
        User {
            id: UserId(1),
            username: "ganesh".into(),
            email: "ganesh@example.in".into(),
            password_hash: String::new(),
            full_name: "Ganesh Pawar".into(),
            phone: String::new(),
            village_id: None,
            subscription_type: tier,
            subscription_expires: expires,
            date_created: created,
            last_login: None,
            is_active: true,
            email_verified: false,
        }
    }

    #[test]
    fn expired_subscription_falls_back_to_free() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).single().expect("date");
        let live = user(SubscriptionTier::Pro, Some(now + Duration::days(1)));
        let gone = user(SubscriptionTier::Pro, Some(now - Duration::days(1)));
        let forever = user(SubscriptionTier::Premium, None);

        assert_eq!(live.effective_tier(now), SubscriptionTier::Pro);
        assert_eq!(gone.effective_tier(now), SubscriptionTier::Free);
        assert_eq!(forever.effective_tier(now), SubscriptionTier::Premium);
    }

    #[test]
    fn completion_days_shrink_with_tier() {
        assert_eq!(SubscriptionTier::Free.completion_days(), 120);
        assert_eq!(SubscriptionTier::Premium.completion_days(), 60);
        assert_eq!(SubscriptionTier::Pro.completion_days(), 30);
    }

    #[test]
    fn only_subscriptions_map_to_tiers() {
        assert_eq!(SubscriptionTier::from_slug("pro"), Some(SubscriptionTier::Pro));
        assert_eq!(SubscriptionTier::from_slug("express"), None);
    }
}
