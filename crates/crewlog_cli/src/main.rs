//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `crewlog_core` wiring.
//! - Keep output deterministic for quick local sanity checks.

use crewlog_core::{
    Direction, Job, LiveQuery, Predicate, RecordStore, SortOrder, User, USER_SCHEMA,
};
use std::error::Error;
use uuid::Uuid;

fn main() -> Result<(), Box<dyn Error>> {
    println!("crewlog_core version={}", crewlog_core::core_version());

    let store = RecordStore::open_in_memory()?;

    let piper = User::with_id(
        Uuid::parse_str("00000000-0000-4000-8000-000000000001")?,
        "Piper",
        "London",
        1_700_000_000_000,
    )?;
    let rhea = User::with_id(
        Uuid::parse_str("00000000-0000-4000-8000-000000000002")?,
        "Rhea",
        "London",
        1_710_000_000_000,
    )?;
    let milo = User::with_id(
        Uuid::parse_str("00000000-0000-4000-8000-000000000003")?,
        "Milo",
        "Paris",
        1_720_000_000_000,
    )?;
    store.insert_user(&piper)?;
    store.insert_user(&rhea)?;
    store.insert_user(&milo)?;

    let inventory = Job::with_id(
        Uuid::parse_str("00000000-0000-4000-8000-000000000011")?,
        "inventory",
        2,
    )?
    .assigned_to(rhea.uuid);
    store.insert_job(&inventory)?;

    let londoners = LiveQuery::<User>::new(
        store.clone(),
        Predicate::parse(&USER_SCHEMA, "city == \"London\"")?,
        SortOrder::by(&USER_SCHEMA, "name", Direction::Ascending)?,
    )?;

    println!("londoners={}", londoners.results().len());
    for user in londoners.results() {
        println!("user name={} city={} join_date={}", user.name, user.city, user.join_date);
    }
    for job in store.jobs_of(rhea.uuid)? {
        println!("job name={} priority={}", job.name, job.priority);
    }

    Ok(())
}
