//! Registration, login sessions and the user dashboard.

use super::{Portal, optional, required};
use crate::auth::{self, generate_token};
use crate::error::{PortalError, Result};
use crate::model::{Application, Notification, NotificationKind, Session, SubscriptionTier, User, Village};
use crate::primitives::{DASHBOARD_NOTIFICATIONS, MAX_NAME_LEN, MAX_PHONE_LEN, MIN_PASSWORD_LEN};
use crate::storage::{Batch, StoreExt, UniqueIndex};
use crate::{SessionId, UserId, VillageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub village_id: Option<VillageId>,
}

/// A successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub user: User,
    pub session: Session,
}

/// Everything the user dashboard shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub user: User,
    /// Newest first.
    pub applications: Vec<Application>,
    /// Latest unread, newest first.
    pub notifications: Vec<Notification>,
}

/// Emails compare case-insensitively.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Portal {
    /// Create an account and greet it with a welcome notification.
    pub fn register(&self, input: NewUser, now: DateTime<Utc>) -> Result<User> {
        let username = required("username", &input.username, MAX_NAME_LEN)?;
        let email = normalize_email(&input.email);
        if email.is_empty() || !email.contains('@') {
            return Err(PortalError::Validation("a valid email is required".into()));
        }
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(PortalError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let full_name = required("full_name", &input.full_name, MAX_NAME_LEN)?;
        let phone = optional("phone", &input.phone, MAX_PHONE_LEN)?;
        if let Some(village) = input.village_id {
            self.require::<Village>("village", village.0)?;
        }

        if self.store.lookup(UniqueIndex::UserEmail, &email)?.is_some() {
            return Err(PortalError::Conflict(format!("email {email}")));
        }
        if self.store.lookup(UniqueIndex::Username, &username)?.is_some() {
            return Err(PortalError::Conflict(format!("username {username}")));
        }

        let password_hash = self.hash_password(&input.password)?;

        let user = User {
            id: UserId(self.next_id::<User>()?),
            username,
            email,
            password_hash,
            full_name,
            phone,
            village_id: input.village_id,
            subscription_type: SubscriptionTier::Free,
            subscription_expires: None,
            date_created: now,
            last_login: None,
            is_active: true,
            email_verified: false,
        };
        let welcome = self.notification(
            user.id,
            "स्वागत आहे!",
            format!(
                "नमस्कार {}, मराठा आरक्षण मंचमध्ये तुमचे स्वागत आहे!",
                user.full_name
            ),
            NotificationKind::Success,
            now,
        )?;

        let mut batch = Batch::new();
        batch.put(&user)?.put(&welcome)?;
        batch
            .claim(UniqueIndex::UserEmail, user.email.clone(), user.id.0)
            .claim(UniqueIndex::Username, user.username.clone(), user.id.0);
        self.store.commit(batch)?;
        Ok(user)
    }

    /// Check credentials and open a session.
    ///
    /// Unknown email and wrong password are indistinguishable: an unknown
    /// email is still checked against a dummy hash of the same cost.
    pub fn login(&self, email: &str, password: &str, now: DateTime<Utc>) -> Result<LoginOutcome> {
        let Some(found) = self
            .store
            .find::<User>(UniqueIndex::UserEmail, &normalize_email(email))?
        else {
            let _ = auth::verify_password(password, self.dummy_hash()?);
            return Err(PortalError::InvalidCredentials);
        };
        if !auth::verify_password(password, &found.password_hash) {
            return Err(PortalError::InvalidCredentials);
        }

        self.exclusive(|| {
            // Re-read: the account may have been deactivated while hashing.
            let mut user = self.require::<User>("user", found.id.0)?;
            if !user.is_active {
                return Err(PortalError::Forbidden("account is deactivated".into()));
            }

            user.last_login = Some(now);
            let session = Session {
                id: SessionId(self.next_id::<Session>()?),
                user_id: user.id,
                token: self.with_rng(|rng| generate_token(rng))?,
                created_at: now,
                expires_at: now + self.options.session_ttl,
            };

            let mut batch = Batch::new();
            batch.put(&user)?.put(&session)?;
            batch.claim(UniqueIndex::SessionToken, session.token.clone(), session.id.0);
            self.store.commit(batch)?;
            Ok(LoginOutcome { user, session })
        })
    }

    /// Resolve a session token to its active user.
    pub fn authenticate(&self, token: &str, now: DateTime<Utc>) -> Result<User> {
        let session = self
            .store
            .find::<Session>(UniqueIndex::SessionToken, token)?
            .ok_or(PortalError::Unauthorized)?;
        if session.is_expired(now) {
            return Err(PortalError::Unauthorized);
        }
        let user = self
            .store
            .fetch::<User>(session.user_id.0)?
            .ok_or(PortalError::Unauthorized)?;
        if !user.is_active {
            return Err(PortalError::Unauthorized);
        }
        Ok(user)
    }

    /// End a session. Unknown tokens are ignored.
    pub fn logout(&self, token: &str) -> Result<()> {
        if let Some(session) = self.store.find::<Session>(UniqueIndex::SessionToken, token)? {
            let mut batch = Batch::new();
            batch
                .delete::<Session>(session.id.0)
                .release(UniqueIndex::SessionToken, session.token);
            self.store.commit(batch)?;
        }
        Ok(())
    }

    /// Drop every expired session; returns how many were removed.
    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        let expired = self.store.fetch_where(|s: &Session| s.is_expired(now))?;
        if expired.is_empty() {
            return Ok(0);
        }
        let mut batch = Batch::new();
        for session in &expired {
            batch
                .delete::<Session>(session.id.0)
                .release(UniqueIndex::SessionToken, session.token.clone());
        }
        self.store.commit(batch)?;
        Ok(expired.len())
    }

    pub fn profile(&self, user_id: UserId) -> Result<User> {
        self.require("user", user_id.0)
    }

    /// Enable or disable an account. Disabling also ends its sessions.
    pub fn set_user_active(&self, user_id: UserId, active: bool) -> Result<User> {
        self.exclusive(|| {
            let mut user = self.require::<User>("user", user_id.0)?;
            user.is_active = active;
            let mut batch = Batch::new();
            batch.put(&user)?;
            if !active {
                for session in self.store.fetch_where(|s: &Session| s.user_id == user_id)? {
                    batch
                        .delete::<Session>(session.id.0)
                        .release(UniqueIndex::SessionToken, session.token);
                }
            }
            self.store.commit(batch)?;
            Ok(user)
        })
    }

    pub fn dashboard(&self, user_id: UserId) -> Result<Dashboard> {
        let user = self.profile(user_id)?;
        let applications = self.user_applications(user_id)?;
        let mut notifications = self.notifications_newest_first(user_id)?;
        notifications.retain(|n| !n.is_read);
        notifications.truncate(DASHBOARD_NOTIFICATIONS);
        Ok(Dashboard {
            user,
            applications,
            notifications,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::testing::{new_user, portal, t0};
    use chrono::Duration;

    #[test]
    fn register_hashes_password_and_sends_welcome() {
        let p = portal();
        let user = p.register(new_user("rahul"), t0()).expect("register");
        assert!(user.password_hash.starts_with("$argon2id$"));
        assert_eq!(user.subscription_type, SubscriptionTier::Free);

        let inbox = p.notifications_newest_first(user.id).expect("inbox");
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].title, "स्वागत आहे!");
        assert!(inbox[0].message.contains("rahul Patil"));
    }

    #[test]
    fn email_and_username_are_unique() {
        let p = portal();
        p.register(new_user("rahul"), t0()).expect("register");

        let mut same_email = new_user("other");
        same_email.email = "RAHUL@example.in".into();
        assert!(p.register(same_email, t0()).is_err_and(|e| e.is_conflict()));

        let mut same_name = new_user("rahul");
        same_name.email = "fresh@example.in".into();
        assert!(p.register(same_name, t0()).is_err_and(|e| e.is_conflict()));
    }

    #[test]
    fn register_validates_input() {
        let p = portal();
        let mut short = new_user("a");
        short.password = "short".into();
        assert!(matches!(p.register(short, t0()), Err(PortalError::Validation(_))));

        let mut bad_village = new_user("b");
        bad_village.village_id = Some(VillageId(9));
        assert!(matches!(
            p.register(bad_village, t0()),
            Err(PortalError::NotFound { entity: "village", .. })
        ));
    }

    #[test]
    fn login_opens_session_and_stamps_last_login() {
        let p = portal();
        p.register(new_user("rahul"), t0()).expect("register");
        let later = t0() + Duration::hours(1);
        let outcome = p.login("rahul@example.in", "kunbi-1967", later).expect("login");

        assert_eq!(outcome.user.last_login, Some(later));
        assert_eq!(
            p.authenticate(&outcome.session.token, later).expect("auth").id,
            outcome.user.id
        );
        assert_eq!(outcome.session.expires_at, later + p.options().session_ttl);
    }

    #[test]
    fn bad_credentials_are_refused_alike() {
        let p = portal();
        p.register(new_user("rahul"), t0()).expect("register");
        assert!(matches!(
            p.login("rahul@example.in", "wrong-password", t0()),
            Err(PortalError::InvalidCredentials)
        ));
        assert!(matches!(
            p.login("nobody@example.in", "kunbi-1967", t0()),
            Err(PortalError::InvalidCredentials)
        ));
    }

    #[test]
    fn unknown_email_still_runs_the_hasher() {
        let p = portal();
        assert!(p.dummy_hash.get().is_none());
        assert!(matches!(
            p.login("nobody@example.in", "kunbi-1967", t0()),
            Err(PortalError::InvalidCredentials)
        ));
        let dummy = p.dummy_hash.get().expect("dummy hash built on first miss");
        assert!(dummy.starts_with("$argon2id$"));
        assert!(!auth::verify_password("kunbi-1967", dummy));
    }

    #[test]
    fn concurrent_login_never_outlives_deactivation() {
        use std::sync::Barrier;

        for round in 0..40 {
            let p = portal();
            let user = p.register(new_user(&format!("u{round}")), t0()).expect("register");
            let email = user.email.clone();
            let barrier = Barrier::new(2);

            std::thread::scope(|scope| {
                scope.spawn(|| {
                    barrier.wait();
                    let _ = p.login(&email, "kunbi-1967", t0());
                });
                scope.spawn(|| {
                    barrier.wait();
                    p.set_user_active(user.id, false).expect("deactivate");
                });
            });

            let row = p.profile(user.id).expect("user");
            assert!(!row.is_active, "round {round}: deactivation was undone");
            let live = p
                .store
                .fetch_where(|s: &Session| s.user_id == user.id)
                .expect("sessions");
            assert!(live.is_empty(), "round {round}: session survived deactivation");
        }
    }

    #[test]
    fn expired_or_logged_out_sessions_are_rejected() {
        let p = portal();
        p.register(new_user("rahul"), t0()).expect("register");
        let s = p.login("rahul@example.in", "kunbi-1967", t0()).expect("login").session;

        let after = s.expires_at + Duration::seconds(1);
        assert!(matches!(p.authenticate(&s.token, after), Err(PortalError::Unauthorized)));
        assert_eq!(p.purge_expired_sessions(after).expect("purge"), 1);

        let s = p.login("rahul@example.in", "kunbi-1967", t0()).expect("login").session;
        p.logout(&s.token).expect("logout");
        assert!(matches!(p.authenticate(&s.token, t0()), Err(PortalError::Unauthorized)));
        p.logout(&s.token).expect("second logout is a no-op");
    }

    #[test]
    fn deactivated_users_cannot_log_in() {
        let p = portal();
        let user = p.register(new_user("rahul"), t0()).expect("register");
        let s = p.login("rahul@example.in", "kunbi-1967", t0()).expect("login").session;

        p.set_user_active(user.id, false).expect("deactivate");
        assert!(matches!(p.authenticate(&s.token, t0()), Err(PortalError::Unauthorized)));
        assert!(matches!(
            p.login("rahul@example.in", "kunbi-1967", t0()),
            Err(PortalError::Forbidden(_))
        ));
    }

    #[test]
    fn dashboard_shows_unread_notifications_only() {
        let p = portal();
        let user = p.register(new_user("rahul"), t0()).expect("register");
        assert_eq!(p.dashboard(user.id).expect("dash").notifications.len(), 1);

        p.notifications_page(user.id).expect("mark read");
        let dash = p.dashboard(user.id).expect("dash");
        assert!(dash.notifications.is_empty());
        assert!(dash.applications.is_empty());
    }
}
