//! # CLI Commands
//!
//! Operator commands against a redb database file. Each `cmd_*` function
//! prints a short report and returns what it did, so tests can check it.

use crate::config::Backend;
use aarakshan_core::portal::AdminStats;
use aarakshan_core::seed::{self, SeedReport};
use aarakshan_core::snapshot::{self, Snapshot};
use aarakshan_core::{
    Application, Decision, MemoryStore, Person, PersonId, Portal, PortalOptions, RedbStore, Store,
    StoreError,
};
use chrono::Utc;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub type CliResult<T = ()> = Result<T, Box<dyn Error>>;

// =============================================================================
// HELPERS
// =============================================================================

/// Open the configured backend. The memory backend ignores `path`.
pub fn open_store(backend: Backend, path: &Path) -> Result<Arc<dyn Store>, StoreError> {
    Ok(match backend {
        Backend::Memory => Arc::new(MemoryStore::new()),
        Backend::Redb => Arc::new(RedbStore::open(path)?),
    })
}

/// Open an existing database. Commands other than `init` never create one.
pub fn open_portal(path: &Path) -> CliResult<Portal> {
    if !path.exists() {
        return Err(format!(
            "database {} does not exist; run `aarakshan init` first",
            path.display()
        )
        .into());
    }
    let store = open_store(Backend::Redb, path)?;
    Ok(Portal::new(store, PortalOptions::default()))
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Create an empty database file. `force` replaces an existing one.
pub fn cmd_init(path: &Path, force: bool) -> CliResult {
    if path.exists() {
        if !force {
            return Err(format!(
                "database {} already exists (use --force to replace it)",
                path.display()
            )
            .into());
        }
        fs::remove_file(path)?;
    }
    RedbStore::open(path)?;
    println!("Initialized empty database at {}", path.display());
    Ok(())
}

/// Load the initial hierarchy, news and premium catalog.
pub fn cmd_seed(path: &Path) -> CliResult<SeedReport> {
    let portal = open_portal(path)?;
    let report = seed::seed(&portal, Utc::now())?;
    if report.is_empty() {
        println!("Nothing to seed");
    } else {
        println!(
            "Seeded {} divisions, {} districts, {} villages, {} news, {} services",
            report.divisions, report.districts, report.villages, report.news, report.services
        );
    }
    Ok(report)
}

/// Print the admin dashboard counters.
pub fn cmd_stats(path: &Path, json: bool) -> CliResult<AdminStats> {
    let portal = open_portal(path)?;
    let stats = portal.admin_stats()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("People:        {} ({} verified, {} pending)", stats.total_people, stats.verified_people, stats.pending_people);
        println!("Applications:  {}", stats.total_applications);
        println!("Users:         {}", stats.total_users);
        println!("News:          {}", stats.total_news);
        for person in &stats.recent_submissions {
            println!("  pending #{} {} ({})", person.id, person.full_name(), person.reservation_number);
        }
    }
    Ok(stats)
}

pub fn cmd_verify_person(path: &Path, id: u64) -> CliResult<Person> {
    let portal = open_portal(path)?;
    let person = portal.verify_person(PersonId(id))?;
    println!("Verified #{} {}", person.id, person.full_name());
    Ok(person)
}

/// Move an application to the next committee.
pub fn cmd_advance(
    path: &Path,
    number: &str,
    actor: &str,
    message: Option<String>,
) -> CliResult<Application> {
    let portal = open_portal(path)?;
    let application = portal.advance(number, actor, message, Utc::now())?;
    println!(
        "{} is now at {} ({}%)",
        application.application_number,
        application.current_stage,
        application.progress_percentage()
    );
    Ok(application)
}

pub fn cmd_decide(
    path: &Path,
    number: &str,
    decision: Decision,
    actor: &str,
    message: Option<String>,
) -> CliResult<Application> {
    let portal = open_portal(path)?;
    let application = portal.decide(number, decision, actor, message, Utc::now())?;
    println!("{} is {}", application.application_number, application.status);
    Ok(application)
}

/// Write every row as JSON. Returns the row count.
pub fn cmd_export(path: &Path, out: &Path) -> CliResult<usize> {
    let portal = open_portal(path)?;
    let snapshot = snapshot::export(portal.store())?;
    fs::write(out, serde_json::to_vec_pretty(&snapshot)?)?;
    let rows = snapshot.row_count();
    println!("Exported {rows} rows to {}", out.display());
    Ok(rows)
}

/// Load a JSON export into an empty database. Returns the row count.
pub fn cmd_import(path: &Path, input: &Path) -> CliResult<usize> {
    let portal = open_portal(path)?;
    let snapshot: Snapshot = serde_json::from_slice(&fs::read(input)?)?;
    let rows = snapshot::restore(portal.store(), &snapshot)?;
    println!("Imported {rows} rows from {}", input.display());
    Ok(rows)
}
