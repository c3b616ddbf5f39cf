//! Integration tests for Aarakshan CLI commands.
//!
//! Uses tempfile for testing file-based operations.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use aarakshan::cli::{
    cmd_advance, cmd_decide, cmd_export, cmd_import, cmd_init, cmd_seed, cmd_stats,
    cmd_verify_person, open_portal,
};
use aarakshan_core::auth::HashCost;
use aarakshan_core::portal::{NewApplication, NewPerson, NewUser};
use aarakshan_core::{
    ApplicationStatus, Decision, Portal, PortalOptions, RedbStore, Stage, VillageId,
};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Create a temporary directory for tests.
fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Initialized and seeded database.
fn seeded_db(dir: &TempDir) -> PathBuf {
    let db_path = dir.path().join("portal.redb");
    cmd_init(&db_path, false).unwrap();
    cmd_seed(&db_path).unwrap();
    db_path
}

/// Portal with cheap password hashing, for arranging fixtures.
/// Must be dropped before the next command opens the same file.
fn fixture_portal(db_path: &Path) -> Portal {
    let store = RedbStore::open(db_path).unwrap();
    let options = PortalOptions {
        hash_cost: HashCost::Low,
        ..PortalOptions::default()
    };
    Portal::new(Arc::new(store), options)
}

fn first_village(portal: &Portal) -> VillageId {
    let division = portal.divisions().unwrap()[0].id;
    let district = portal.districts_of(division).unwrap()[0].id;
    portal.villages_of(district).unwrap()[0].id
}

/// Register a user and file one application; returns its number.
fn file_application(db_path: &Path) -> String {
    let portal = fixture_portal(db_path);
    let village_id = first_village(&portal);
    let user = portal
        .register(
            NewUser {
                username: "sunita".into(),
                email: "sunita@example.in".into(),
                password: "kunbi-1967".into(),
                full_name: "Sunita Jadhav".into(),
                phone: "9822000000".into(),
                village_id: Some(village_id),
            },
            Utc::now(),
        )
        .unwrap();
    portal
        .submit_application(
            user.id,
            NewApplication {
                applicant_name: "Sunita".into(),
                applicant_surname: "Jadhav".into(),
                birth_year: Some(1990),
                village_id,
                contact_number: "9822000000".into(),
            },
            Utc::now(),
        )
        .unwrap()
        .application_number
}

// =============================================================================
// INIT COMMAND TESTS
// =============================================================================

#[test]
fn test_init_creates_database() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");

    let result = cmd_init(&db_path, false);
    assert!(result.is_ok());
    assert!(db_path.exists());
}

#[test]
fn test_init_fails_if_exists_without_force() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");

    // First init
    cmd_init(&db_path, false).unwrap();

    // Second init should fail
    let result = cmd_init(&db_path, false);
    assert!(result.is_err());
}

#[test]
fn test_init_force_replaces_database() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);

    cmd_init(&db_path, true).unwrap();

    let stats = cmd_stats(&db_path, false).unwrap();
    assert_eq!(stats.total_news, 0);
    assert!(open_portal(&db_path).unwrap().divisions().unwrap().is_empty());
}

#[test]
fn test_commands_require_existing_database() {
    let temp = create_temp_dir();
    let missing = temp.path().join("missing.redb");

    assert!(cmd_seed(&missing).is_err());
    assert!(cmd_stats(&missing, true).is_err());
    assert!(!missing.exists());
}

// =============================================================================
// SEED AND STATS TESTS
// =============================================================================

#[test]
fn test_seed_is_idempotent() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");
    cmd_init(&db_path, false).unwrap();

    let first = cmd_seed(&db_path).unwrap();
    assert_eq!(first.villages, 40);
    assert_eq!(first.services, 3);

    let second = cmd_seed(&db_path).unwrap();
    assert!(second.is_empty());
}

#[test]
fn test_stats_json_and_text() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);

    let stats = cmd_stats(&db_path, true).unwrap();
    assert_eq!(stats.total_news, 3);
    assert_eq!(stats.total_people, 0);
    assert!(cmd_stats(&db_path, false).is_ok());
}

// =============================================================================
// PERSON AND PIPELINE TESTS
// =============================================================================

#[test]
fn test_verify_person() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);

    let id = {
        let portal = fixture_portal(&db_path);
        let village_id = first_village(&portal);
        portal
            .submit_person(
                NewPerson {
                    name: "Rahul".into(),
                    surname: "Patil".into(),
                    birth_year: Some(1958),
                    reservation_number: "KUN/2024/001".into(),
                    village_id,
                    contact_number: String::new(),
                },
                Utc::now(),
            )
            .unwrap()
            .id
    };
    assert_eq!(cmd_stats(&db_path, false).unwrap().pending_people, 1);

    let person = cmd_verify_person(&db_path, id.0).unwrap();
    assert!(person.is_verified);

    let stats = cmd_stats(&db_path, false).unwrap();
    assert_eq!(stats.verified_people, 1);
    assert_eq!(stats.pending_people, 0);
}

#[test]
fn test_verify_unknown_person_fails() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);

    assert!(cmd_verify_person(&db_path, 404).is_err());
}

#[test]
fn test_advance_through_pipeline_then_approve() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let number = file_application(&db_path);

    let app = cmd_advance(&db_path, &number, "taluka clerk", Some("documents ok".into())).unwrap();
    assert_eq!(app.current_stage, Stage::TalukaCommittee);
    assert_eq!(app.status, ApplicationStatus::UnderReview);

    cmd_advance(&db_path, &number, "admin", None).unwrap();
    let app = cmd_advance(&db_path, &number, "admin", None).unwrap();
    assert_eq!(app.current_stage, Stage::FinalApproval);

    // No stage after final approval.
    assert!(cmd_advance(&db_path, &number, "admin", None).is_err());

    let app = cmd_decide(&db_path, &number, Decision::Approve, "collector", None).unwrap();
    assert_eq!(app.status, ApplicationStatus::Approved);
    assert_eq!(app.progress_percentage(), 100);

    // Terminal.
    assert!(cmd_decide(&db_path, &number, Decision::Reject, "collector", None).is_err());

    let updates = {
        let portal = open_portal(&db_path).unwrap();
        let app = portal.application_by_number(&number).unwrap();
        portal.status_updates(app.id).unwrap()
    };
    assert_eq!(updates.len(), 5);
    assert_eq!(updates[1].updated_by.as_deref(), Some("taluka clerk"));
}

#[test]
fn test_early_approval_is_refused() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let number = file_application(&db_path);

    assert!(cmd_decide(&db_path, &number, Decision::Approve, "admin", None).is_err());
    let app = cmd_decide(&db_path, &number, Decision::Reject, "admin", Some("no proof".into())).unwrap();
    assert_eq!(app.status, ApplicationStatus::Rejected);
}

// =============================================================================
// EXPORT/IMPORT TESTS
// =============================================================================

#[test]
fn test_export_import_roundtrip() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let number = file_application(&db_path);
    let json_path = temp.path().join("export.json");

    let exported = cmd_export(&db_path, &json_path).unwrap();
    assert!(json_path.exists());

    let target = temp.path().join("restored.redb");
    cmd_init(&target, false).unwrap();
    let imported = cmd_import(&target, &json_path).unwrap();
    assert_eq!(imported, exported);

    let portal = open_portal(&target).unwrap();
    assert!(portal.application_by_number(&number).is_ok());
    assert_eq!(portal.catalog().unwrap().len(), 3);
}

#[test]
fn test_import_into_non_empty_database_fails() {
    let temp = create_temp_dir();
    let db_path = seeded_db(&temp);
    let json_path = temp.path().join("export.json");
    cmd_export(&db_path, &json_path).unwrap();

    assert!(cmd_import(&db_path, &json_path).is_err());
}

#[test]
fn test_import_rejects_invalid_json() {
    let temp = create_temp_dir();
    let db_path = temp.path().join("test.redb");
    cmd_init(&db_path, false).unwrap();
    let bad = temp.path().join("bad.json");
    std::fs::write(&bad, "not json").unwrap();

    assert!(cmd_import(&db_path, &bad).is_err());
}
