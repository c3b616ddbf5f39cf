//! Reservation applications and their append-only status history.

use super::record;
use crate::workflow::{self, ApplicationStatus, Stage};
use crate::{ApplicationId, StatusUpdateId, UserId, VillageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review priority, fixed at submission from the applicant's tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    High,
    Premium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    /// `MR<year><6 digits>`, unique.
    pub application_number: String,
    pub user_id: UserId,
    pub status: ApplicationStatus,
    pub priority: Priority,
    pub applicant_name: String,
    pub applicant_surname: String,
    pub birth_year: Option<i32>,
    pub village_id: VillageId,
    pub contact_number: String,
    pub date_submitted: DateTime<Utc>,
    pub estimated_completion: Option<DateTime<Utc>>,
    pub actual_completion: Option<DateTime<Utc>>,
    pub current_stage: Stage,
}

impl Application {
    #[must_use]
    pub fn progress_percentage(&self) -> u8 {
        workflow::progress_percent(self.current_stage, self.status)
    }
}

/// One entry of an application's history. Never edited after insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub id: StatusUpdateId,
    pub application_id: ApplicationId,
    pub stage: Stage,
    pub status: ApplicationStatus,
    pub message: Option<String>,
    pub updated_by: Option<String>,
    pub date_updated: DateTime<Utc>,
}

record!(Application, Applications);
record!(StatusUpdate, StatusUpdates);
