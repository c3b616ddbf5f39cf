//! JSON projections of core rows.
//!
//! Rows never leave the server as-is: users carry their password hash and
//! applications keep progress implicit.

use aarakshan_core::portal::Tracking;
use aarakshan_core::{
    Application, ApplicationStatus, Notification, NotificationKind, Priority, Stage, StatusUpdate,
    SubscriptionTier, User, UserId, VillageId,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The user object returned by login and registration.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub subscription_type: SubscriptionTier,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            subscription_type: user.subscription_type,
        }
    }
}

/// Profile page.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub village_id: Option<VillageId>,
    pub subscription_type: SubscriptionTier,
    pub subscription_expires: Option<DateTime<Utc>>,
    pub date_created: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub email_verified: bool,
}

impl From<&User> for Profile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            phone: user.phone.clone(),
            village_id: user.village_id,
            subscription_type: user.subscription_type,
            subscription_expires: user.subscription_expires,
            date_created: user.date_created,
            last_login: user.last_login,
            email_verified: user.email_verified,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationItem {
    pub id: u64,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationKind,
    pub is_read: bool,
    pub date_created: DateTime<Utc>,
}

impl From<Notification> for NotificationItem {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id.0,
            title: n.title,
            message: n.message,
            notification_type: n.notification_type,
            is_read: n.is_read,
            date_created: n.date_created,
        }
    }
}

/// One row of the "my applications" list.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationSummary {
    pub application_number: String,
    pub status: ApplicationStatus,
    pub current_stage: Stage,
    pub progress_percentage: u8,
    pub date_submitted: DateTime<Utc>,
    pub estimated_completion: Option<DateTime<Utc>>,
}

impl From<&Application> for ApplicationSummary {
    fn from(a: &Application) -> Self {
        Self {
            application_number: a.application_number.clone(),
            status: a.status,
            current_stage: a.current_stage,
            progress_percentage: a.progress_percentage(),
            date_submitted: a.date_submitted,
            estimated_completion: a.estimated_completion,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateItem {
    pub stage: Stage,
    pub status: ApplicationStatus,
    pub message: Option<String>,
    pub date_updated: DateTime<Utc>,
    pub updated_by: Option<String>,
}

impl From<StatusUpdate> for UpdateItem {
    fn from(u: StatusUpdate) -> Self {
        Self {
            stage: u.stage,
            status: u.status,
            message: u.message,
            date_updated: u.date_updated,
            updated_by: u.updated_by,
        }
    }
}

/// An application with its history, as shown on the tracking pages.
#[derive(Debug, Clone, Serialize)]
pub struct TrackedApplication {
    #[serde(flatten)]
    pub summary: ApplicationSummary,
    pub applicant_name: String,
    pub applicant_surname: String,
    pub village_id: VillageId,
    pub priority: Priority,
    pub actual_completion: Option<DateTime<Utc>>,
    pub stage_label: &'static str,
    pub status_updates: Vec<UpdateItem>,
}

impl From<Tracking> for TrackedApplication {
    fn from(t: Tracking) -> Self {
        let a = t.application;
        Self {
            summary: ApplicationSummary::from(&a),
            stage_label: a.current_stage.label(),
            applicant_name: a.applicant_name,
            applicant_surname: a.applicant_surname,
            village_id: a.village_id,
            priority: a.priority,
            actual_completion: a.actual_completion,
            status_updates: t.status_updates.into_iter().map(UpdateItem::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aarakshan_core::ApplicationId;
    use chrono::TimeZone;

    #[test]
    fn profile_hides_password_hash() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).single().expect("date");
        let user = User {
            id: UserId(1),
            username: "rahul".into(),
            email: "rahul@example.in".into(),
            password_hash: "$argon2id$secret".into(),
            full_name: "Rahul Patil".into(),
            phone: String::new(),
            village_id: None,
            subscription_type: SubscriptionTier::Free,
            subscription_expires: None,
            date_created: now,
            last_login: None,
            is_active: true,
            email_verified: false,
        };
        let json = serde_json::to_string(&Profile::from(&user)).expect("json");
        assert!(!json.contains("argon2"));
        let json = serde_json::to_string(&UserSummary::from(&user)).expect("json");
        assert!(!json.contains("password"));
    }

    #[test]
    fn summary_carries_derived_progress() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).single().expect("date");
        let app = Application {
            id: ApplicationId(1),
            application_number: "MR2025000001".into(),
            user_id: UserId(1),
            status: ApplicationStatus::UnderReview,
            priority: Priority::Normal,
            applicant_name: "A".into(),
            applicant_surname: "B".into(),
            birth_year: None,
            village_id: VillageId(1),
            contact_number: String::new(),
            date_submitted: now,
            estimated_completion: None,
            actual_completion: None,
            current_stage: Stage::ScrutinyCommittee,
        };
        let json = serde_json::to_value(ApplicationSummary::from(&app)).expect("json");
        assert_eq!(json["progress_percentage"], 70);
        assert_eq!(json["current_stage"], "scrutiny_committee");
    }
}
