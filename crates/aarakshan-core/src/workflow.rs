//! # Review Workflow
//!
//! An application passes four committees in a fixed order:
//!
//! ```text
//! gram_committee → taluka_committee → scrutiny_committee → final_approval
//! ```
//!
//! The stage only moves forward. Approval is possible only at
//! `final_approval`; rejection is possible at any stage. Approved and
//! rejected applications are terminal.
//!
//! Progress is derived from the stage and status, so the percentage shown to
//! the applicant can never disagree with where the file actually is.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// STAGE
// =============================================================================

/// Committee currently holding an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    GramCommittee,
    TalukaCommittee,
    ScrutinyCommittee,
    FinalApproval,
}

impl Stage {
    /// Every stage, in pipeline order.
    pub const ALL: [Stage; 4] = [
        Stage::GramCommittee,
        Stage::TalukaCommittee,
        Stage::ScrutinyCommittee,
        Stage::FinalApproval,
    ];

    /// The following stage, or `None` at `final_approval`.
    #[must_use]
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::GramCommittee => Some(Stage::TalukaCommittee),
            Stage::TalukaCommittee => Some(Stage::ScrutinyCommittee),
            Stage::ScrutinyCommittee => Some(Stage::FinalApproval),
            Stage::FinalApproval => None,
        }
    }

    /// Wire code (`gram_committee`, ...).
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Stage::GramCommittee => "gram_committee",
            Stage::TalukaCommittee => "taluka_committee",
            Stage::ScrutinyCommittee => "scrutiny_committee",
            Stage::FinalApproval => "final_approval",
        }
    }

    /// Marathi label shown to applicants.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Stage::GramCommittee => "ग्राम समिती",
            Stage::TalukaCommittee => "तालुका समिती",
            Stage::ScrutinyCommittee => "छाननी समिती",
            Stage::FinalApproval => "अंतिम मंजुरी",
        }
    }

    /// Progress while the application sits at this stage.
    #[must_use]
    pub const fn progress_percent(self) -> u8 {
        match self {
            Stage::GramCommittee => 20,
            Stage::TalukaCommittee => 45,
            Stage::ScrutinyCommittee => 70,
            Stage::FinalApproval => 90,
        }
    }

    /// Parse a wire code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Stage> {
        Stage::ALL.into_iter().find(|s| s.code() == code)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// STATUS
// =============================================================================

/// Overall status of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Submitted,
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    /// Whether no further transition is allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Approved | ApplicationStatus::Rejected)
    }

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Marathi label shown to applicants.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "सबमिट केले",
            ApplicationStatus::UnderReview => "तपासणी",
            ApplicationStatus::Approved => "मंजूर",
            ApplicationStatus::Rejected => "नाकारले",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome recorded by the final committee (or a rejection anywhere).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

// =============================================================================
// TRANSITIONS
// =============================================================================

/// Refused pipeline transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("application is already {0}")]
    Terminal(ApplicationStatus),

    #[error("application is at final_approval; record a decision instead")]
    NoNextStage,

    #[error("cannot approve at {0}; approval happens at final_approval")]
    ApprovalBeforeFinalStage(Stage),
}

/// Progress shown for a stage/status pair.
#[must_use]
pub fn progress_percent(stage: Stage, status: ApplicationStatus) -> u8 {
    match status {
        ApplicationStatus::Approved => 100,
        _ => stage.progress_percent(),
    }
}

/// Where an `advance` would take an application.
pub fn plan_advance(stage: Stage, status: ApplicationStatus) -> Result<Stage, WorkflowError> {
    if status.is_terminal() {
        return Err(WorkflowError::Terminal(status));
    }
    stage.next().ok_or(WorkflowError::NoNextStage)
}

/// Status a decision would leave an application in.
pub fn plan_decision(
    stage: Stage,
    status: ApplicationStatus,
    decision: Decision,
) -> Result<ApplicationStatus, WorkflowError> {
    if status.is_terminal() {
        return Err(WorkflowError::Terminal(status));
    }
    match decision {
        Decision::Approve if stage != Stage::FinalApproval => {
            Err(WorkflowError::ApprovalBeforeFinalStage(stage))
        }
        Decision::Approve => Ok(ApplicationStatus::Approved),
        Decision::Reject => Ok(ApplicationStatus::Rejected),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn stages_advance_in_order() {
        let mut stage = Stage::GramCommittee;
        let mut seen = vec![stage];
        while let Ok(next) = plan_advance(stage, ApplicationStatus::UnderReview) {
            stage = next;
            seen.push(stage);
        }
        assert_eq!(seen, Stage::ALL.to_vec());
        assert_eq!(
            plan_advance(stage, ApplicationStatus::UnderReview),
            Err(WorkflowError::NoNextStage)
        );
    }

    #[test]
    fn terminal_status_blocks_everything() {
        for status in [ApplicationStatus::Approved, ApplicationStatus::Rejected] {
            assert_eq!(
                plan_advance(Stage::GramCommittee, status),
                Err(WorkflowError::Terminal(status))
            );
            assert_eq!(
                plan_decision(Stage::FinalApproval, status, Decision::Reject),
                Err(WorkflowError::Terminal(status))
            );
        }
    }

    #[test]
    fn approval_only_at_final_stage() {
        assert_eq!(
            plan_decision(
                Stage::ScrutinyCommittee,
                ApplicationStatus::UnderReview,
                Decision::Approve
            ),
            Err(WorkflowError::ApprovalBeforeFinalStage(Stage::ScrutinyCommittee))
        );
        assert_eq!(
            plan_decision(
                Stage::FinalApproval,
                ApplicationStatus::UnderReview,
                Decision::Approve
            ),
            Ok(ApplicationStatus::Approved)
        );
    }

    #[test]
    fn rejection_allowed_at_first_stage() {
        assert_eq!(
            plan_decision(
                Stage::GramCommittee,
                ApplicationStatus::Submitted,
                Decision::Reject
            ),
            Ok(ApplicationStatus::Rejected)
        );
    }

    #[test]
    fn codes_round_trip_through_serde_names() {
        for stage in Stage::ALL {
            assert_eq!(Stage::from_code(stage.code()), Some(stage));
            let json = serde_json::to_string(&stage).expect("serialize");
            assert_eq!(json, format!("\"{}\"", stage.code()));
        }
        assert_eq!(Stage::from_code("district_committee"), None);
    }

    #[test]
    fn approved_is_full_progress() {
        assert_eq!(
            progress_percent(Stage::FinalApproval, ApplicationStatus::Approved),
            100
        );
        assert_eq!(
            progress_percent(Stage::TalukaCommittee, ApplicationStatus::Rejected),
            45
        );
    }

    fn any_stage() -> impl Strategy<Value = Stage> {
        prop::sample::select(Stage::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn advance_is_strictly_forward(stage in any_stage()) {
            if let Ok(next) = plan_advance(stage, ApplicationStatus::UnderReview) {
                prop_assert!(next > stage);
                prop_assert!(next.progress_percent() > stage.progress_percent());
            }
        }

        #[test]
        fn progress_never_exceeds_hundred(stage in any_stage(), approved in any::<bool>()) {
            let status = if approved { ApplicationStatus::Approved } else { ApplicationStatus::UnderReview };
            prop_assert!(progress_percent(stage, status) <= 100);
        }
    }
}
