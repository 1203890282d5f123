use crewlog_core::{Job, RecordStore, StoreError, User};
use uuid::Uuid;

fn job_with_id(id: &str, name: &str) -> Job {
    Job::with_id(Uuid::parse_str(id).unwrap(), name, 1).unwrap()
}

#[test]
fn deleting_user_cascades_to_owned_jobs() {
    let store = RecordStore::open_in_memory().unwrap();

    let rhea = User::new("Rhea", "London", 0);
    let milo = User::new("Milo", "Paris", 0);
    store.insert_user(&rhea).unwrap();
    store.insert_user(&milo).unwrap();

    let j1 = Job::new("inventory", 1).assigned_to(rhea.uuid);
    let j2 = Job::new("dispatch", 2).assigned_to(rhea.uuid);
    let unrelated = Job::new("audit", 3).assigned_to(milo.uuid);
    store.insert_job(&j1).unwrap();
    store.insert_job(&j2).unwrap();
    store.insert_job(&unrelated).unwrap();

    store.delete_user(rhea.uuid).unwrap();

    assert!(store.get_user(rhea.uuid).unwrap().is_none());
    assert!(store.get_job(j1.uuid).unwrap().is_none());
    assert!(store.get_job(j2.uuid).unwrap().is_none());

    // Other owners and their jobs are untouched.
    assert!(store.get_user(milo.uuid).unwrap().is_some());
    assert!(store.get_job(unrelated.uuid).unwrap().is_some());
}

#[test]
fn deleting_job_never_deletes_owner() {
    let store = RecordStore::open_in_memory().unwrap();

    let rhea = User::new("Rhea", "London", 0);
    store.insert_user(&rhea).unwrap();
    let job = Job::new("inventory", 1).assigned_to(rhea.uuid);
    store.insert_job(&job).unwrap();

    store.delete_job(job.uuid).unwrap();

    assert!(store.get_job(job.uuid).unwrap().is_none());
    assert!(store.get_user(rhea.uuid).unwrap().is_some());
    assert!(store.jobs_of(rhea.uuid).unwrap().is_empty());
}

#[test]
fn detach_clears_back_reference() {
    let store = RecordStore::open_in_memory().unwrap();

    let rhea = User::new("Rhea", "London", 0);
    store.insert_user(&rhea).unwrap();
    let job = Job::new("inventory", 1).assigned_to(rhea.uuid);
    store.insert_job(&job).unwrap();

    store.detach_job(job.uuid).unwrap();

    let loaded = store.get_job(job.uuid).unwrap().unwrap();
    assert_eq!(loaded.owner, None);
    assert!(store.jobs_of(rhea.uuid).unwrap().is_empty());

    // A detached job survives its former owner's cascade.
    store.delete_user(rhea.uuid).unwrap();
    assert!(store.get_job(job.uuid).unwrap().is_some());
}

#[test]
fn attach_moves_job_between_owners() {
    let store = RecordStore::open_in_memory().unwrap();

    let rhea = User::new("Rhea", "London", 0);
    let milo = User::new("Milo", "Paris", 0);
    store.insert_user(&rhea).unwrap();
    store.insert_user(&milo).unwrap();

    let job = Job::new("inventory", 1);
    store.insert_job(&job).unwrap();

    store.attach_job(job.uuid, rhea.uuid).unwrap();
    assert_eq!(
        store.get_job(job.uuid).unwrap().unwrap().owner,
        Some(rhea.uuid)
    );

    store.attach_job(job.uuid, milo.uuid).unwrap();
    assert_eq!(
        store.get_job(job.uuid).unwrap().unwrap().owner,
        Some(milo.uuid)
    );
    assert!(store.jobs_of(rhea.uuid).unwrap().is_empty());
    assert_eq!(store.jobs_of(milo.uuid).unwrap().len(), 1);
}

#[test]
fn jobs_of_keeps_deterministic_relationship_order() {
    let store = RecordStore::open_in_memory().unwrap();

    let rhea = User::new("Rhea", "London", 0);
    store.insert_user(&rhea).unwrap();

    let first = job_with_id("00000000-0000-4000-8000-000000000001", "first");
    let second = job_with_id("00000000-0000-4000-8000-000000000002", "second");
    let third = job_with_id("00000000-0000-4000-8000-000000000003", "third");
    for job in [&first, &second, &third] {
        store.insert_job(&job.clone().assigned_to(rhea.uuid)).unwrap();
    }

    let ordered: Vec<_> = store
        .jobs_of(rhea.uuid)
        .unwrap()
        .into_iter()
        .map(|job| job.uuid)
        .collect();
    assert_eq!(ordered, vec![first.uuid, second.uuid, third.uuid]);

    // Unchanged inputs produce the identical sequence.
    let again: Vec<_> = store
        .jobs_of(rhea.uuid)
        .unwrap()
        .into_iter()
        .map(|job| job.uuid)
        .collect();
    assert_eq!(ordered, again);
}

#[test]
fn relationship_operations_on_missing_records_fail() {
    let store = RecordStore::open_in_memory().unwrap();

    let rhea = User::new("Rhea", "London", 0);
    store.insert_user(&rhea).unwrap();
    let job = Job::new("inventory", 1);
    store.insert_job(&job).unwrap();

    let ghost = Uuid::new_v4();
    assert!(matches!(
        store.attach_job(job.uuid, ghost).unwrap_err(),
        StoreError::NotFound(id) if id == ghost
    ));
    assert!(matches!(
        store.attach_job(ghost, rhea.uuid).unwrap_err(),
        StoreError::NotFound(id) if id == ghost
    ));
    assert!(matches!(
        store.detach_job(ghost).unwrap_err(),
        StoreError::NotFound(id) if id == ghost
    ));
    assert!(matches!(
        store.jobs_of(ghost).unwrap_err(),
        StoreError::NotFound(id) if id == ghost
    ));
}
