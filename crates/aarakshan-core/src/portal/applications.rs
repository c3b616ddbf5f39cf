//! Application submission, tracking and the committee pipeline.

use super::{Portal, birth_year, optional, required};
use crate::error::{PortalError, Result};
use crate::model::{
    Application, NotificationKind, Priority, StatusUpdate, User, Village,
};
use crate::primitives::{APPLICATION_PREFIX, MAX_NAME_LEN, MAX_PHONE_LEN, SYSTEM_ACTOR};
use crate::storage::{Batch, StoreExt, UniqueIndex};
use crate::workflow::{self, ApplicationStatus, Decision, Stage};
use crate::{ApplicationId, StatusUpdateId, UserId, VillageId};
use chrono::{DateTime, Datelike, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Application form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewApplication {
    pub applicant_name: String,
    pub applicant_surname: String,
    #[serde(default)]
    pub birth_year: Option<i32>,
    pub village_id: VillageId,
    #[serde(default)]
    pub contact_number: String,
}

/// An application with its history, oldest update first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tracking {
    pub application: Application,
    pub status_updates: Vec<StatusUpdate>,
}

impl Portal {
    /// File a new application for `user_id`.
    ///
    /// Priority and the promised completion date come from the user's tier
    /// in force at `now`.
    pub fn submit_application(
        &self,
        user_id: UserId,
        input: NewApplication,
        now: DateTime<Utc>,
    ) -> Result<Application> {
        let applicant_name = required("applicant_name", &input.applicant_name, MAX_NAME_LEN)?;
        let applicant_surname =
            required("applicant_surname", &input.applicant_surname, MAX_NAME_LEN)?;
        let contact_number = optional("contact_number", &input.contact_number, MAX_PHONE_LEN)?;
        let birth_year = birth_year(input.birth_year, now)?;
        let user = self.require::<User>("user", user_id.0)?;
        self.require::<Village>("village", input.village_id.0)?;

        let tier = user.effective_tier(now);
        let id = ApplicationId(self.next_id::<Application>()?);
        let update_id = StatusUpdateId(self.next_id::<StatusUpdate>()?);
        let year = now.year();

        self.commit_with_fresh_number(
            UniqueIndex::ApplicationNumber,
            |rng| format!("{APPLICATION_PREFIX}{year}{}", rng.gen_range(100_000..=999_999)),
            |number| {
                let application = Application {
                    id,
                    application_number: number.to_string(),
                    user_id,
                    status: ApplicationStatus::Submitted,
                    priority: if tier.is_paid() {
                        Priority::Premium
                    } else {
                        Priority::Normal
                    },
                    applicant_name: applicant_name.clone(),
                    applicant_surname: applicant_surname.clone(),
                    birth_year,
                    village_id: input.village_id,
                    contact_number: contact_number.clone(),
                    date_submitted: now,
                    estimated_completion: Some(now + Duration::days(tier.completion_days())),
                    actual_completion: None,
                    current_stage: Stage::GramCommittee,
                };
                let update = StatusUpdate {
                    id: update_id,
                    application_id: id,
                    stage: Stage::GramCommittee,
                    status: ApplicationStatus::Submitted,
                    message: Some("अर्ज यशस्वीरित्या सबमिट झाला आहे".into()),
                    updated_by: Some(SYSTEM_ACTOR.into()),
                    date_updated: now,
                };
                let notice = self.notification(
                    user_id,
                    "अर्ज सबमिट झाला",
                    format!("तुमचा अर्ज क्रमांक {number} यशस्वीरित्या सबमिट झाला आहे"),
                    NotificationKind::Success,
                    now,
                )?;

                let mut batch = Batch::new();
                batch.put(&application)?.put(&update)?.put(&notice)?;
                batch.claim(UniqueIndex::ApplicationNumber, number, id.0);
                Ok((batch, application))
            },
        )
    }

    /// Applications of a user, newest first.
    pub fn user_applications(&self, user_id: UserId) -> Result<Vec<Application>> {
        let mut apps = self
            .store
            .fetch_where(|a: &Application| a.user_id == user_id)?;
        apps.sort_by(|a, b| {
            b.date_submitted
                .cmp(&a.date_submitted)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(apps)
    }

    pub fn application_by_number(&self, number: &str) -> Result<Application> {
        self.store
            .find::<Application>(UniqueIndex::ApplicationNumber, number.trim())?
            .ok_or_else(|| PortalError::not_found("application", number))
    }

    /// History of an application, oldest first (ties by insertion order).
    pub fn status_updates(&self, id: ApplicationId) -> Result<Vec<StatusUpdate>> {
        let mut updates = self
            .store
            .fetch_where(|u: &StatusUpdate| u.application_id == id)?;
        updates.sort_by(|a, b| a.date_updated.cmp(&b.date_updated).then_with(|| a.id.cmp(&b.id)));
        Ok(updates)
    }

    /// Track by number.
    ///
    /// Anonymous viewers and the owner may look; another logged-in user may
    /// not.
    pub fn track(&self, number: &str, viewer: Option<UserId>) -> Result<Tracking> {
        let application = self.application_by_number(number)?;
        if viewer.is_some_and(|v| v != application.user_id) {
            return Err(PortalError::Forbidden(
                "you can only track your own applications".into(),
            ));
        }
        self.tracking(application)
    }

    /// Public tracking form: number and contact phone must both match.
    pub fn track_public(&self, number: &str, phone: &str) -> Result<Tracking> {
        let application = self
            .store
            .find::<Application>(UniqueIndex::ApplicationNumber, number.trim())?
            .filter(|a| a.contact_number == phone.trim())
            .ok_or_else(|| PortalError::not_found("application", number))?;
        self.tracking(application)
    }

    fn tracking(&self, application: Application) -> Result<Tracking> {
        Ok(Tracking {
            status_updates: self.status_updates(application.id)?,
            application,
        })
    }

    // =========================================================================
    // PIPELINE
    // =========================================================================

    /// Move an application to the next committee.
    pub fn advance(
        &self,
        number: &str,
        actor: &str,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Application> {
        self.exclusive(|| {
            let mut application = self.application_by_number(number)?;
            let next = workflow::plan_advance(application.current_stage, application.status)?;
            application.current_stage = next;
            application.status = ApplicationStatus::UnderReview;

            let notice = self.notification(
                application.user_id,
                "अर्जाची स्थिती बदलली",
                format!(
                    "तुमचा अर्ज {} आता {} कडे आहे",
                    application.application_number,
                    next.label()
                ),
                NotificationKind::Info,
                now,
            )?;
            self.record_transition(application, actor, message, notice, now)
        })
    }

    /// Record the final decision (or an early rejection).
    pub fn decide(
        &self,
        number: &str,
        decision: Decision,
        actor: &str,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Application> {
        self.exclusive(|| {
            let mut application = self.application_by_number(number)?;
            let status =
                workflow::plan_decision(application.current_stage, application.status, decision)?;
            application.status = status;
            application.actual_completion = Some(now);

            let (title, kind) = match decision {
                Decision::Approve => ("अर्ज मंजूर", NotificationKind::Success),
                Decision::Reject => ("अर्ज नाकारला", NotificationKind::Error),
            };
            let notice = self.notification(
                application.user_id,
                title,
                format!(
                    "तुमचा अर्ज {}: {}",
                    application.application_number,
                    status.label()
                ),
                kind,
                now,
            )?;
            self.record_transition(application, actor, message, notice, now)
        })
    }

    /// Caller holds the write lock.
    fn record_transition(
        &self,
        application: Application,
        actor: &str,
        message: Option<String>,
        notice: crate::model::Notification,
        now: DateTime<Utc>,
    ) -> Result<Application> {
        let actor = required("actor", actor, MAX_NAME_LEN)?;
        let update = StatusUpdate {
            id: StatusUpdateId(self.next_id::<StatusUpdate>()?),
            application_id: application.id,
            stage: application.current_stage,
            status: application.status,
            message: message.filter(|m| !m.trim().is_empty()),
            updated_by: Some(actor),
            date_updated: now,
        };
        let mut batch = Batch::new();
        batch.put(&application)?.put(&update)?.put(&notice)?;
        self.store.commit(batch)?;
        Ok(application)
    }
}

// =============================================================================
// TESTS
// =============================================================================
