use crewlog_core::{
    field, text, Direction, Job, LiveQuery, Predicate, RecordStore, SortOrder, StoreError, User,
    JOB_SCHEMA, USER_SCHEMA,
};

fn seed_cities(store: &RecordStore) -> (User, User, User) {
    let piper = User::new("Piper", "London", 1_700_000_000_000);
    let rhea_london = User::new("Rhea", "London", 1_710_000_000_000);
    let rhea_paris = User::new("Rhea", "Paris", 1_720_000_000_000);
    store.insert_user(&piper).unwrap();
    store.insert_user(&rhea_london).unwrap();
    store.insert_user(&rhea_paris).unwrap();
    (piper, rhea_london, rhea_paris)
}

#[test]
fn filter_and_sort_select_exactly_the_matching_record() {
    let store = RecordStore::open_in_memory().unwrap();
    let (_, rhea_london, _) = seed_cities(&store);

    let query = LiveQuery::<User>::new(
        store.clone(),
        Predicate::parse(&USER_SCHEMA, "city == \"London\" and name contains \"R\"").unwrap(),
        SortOrder::by(&USER_SCHEMA, "name", Direction::Ascending).unwrap(),
    )
    .unwrap();

    let results = query.results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].uuid, rhea_london.uuid);

    // Unchanged inputs reproduce the identical sequence.
    assert_eq!(query.results(), results);
}

#[test]
fn store_changes_are_reflected_synchronously() {
    let store = RecordStore::open_in_memory().unwrap();
    let (piper, rhea_london, _) = seed_cities(&store);

    let query = LiveQuery::<User>::new(
        store.clone(),
        Predicate::new(&USER_SCHEMA, field("city").equals(text("London"))).unwrap(),
        SortOrder::by(&USER_SCHEMA, "name", Direction::Ascending).unwrap(),
    )
    .unwrap();
    assert_eq!(query.results().len(), 2);

    let ada = User::new("Ada", "London", 1_730_000_000_000);
    store.insert_user(&ada).unwrap();
    let names: Vec<_> = query.results().into_iter().map(|user| user.name).collect();
    assert_eq!(names, vec!["Ada", "Piper", "Rhea"]);

    store
        .update_user(piper.uuid, |user| user.city = "Paris".to_string())
        .unwrap();
    let names: Vec<_> = query.results().into_iter().map(|user| user.name).collect();
    assert_eq!(names, vec!["Ada", "Rhea"]);

    store.delete_user(rhea_london.uuid).unwrap();
    let names: Vec<_> = query.results().into_iter().map(|user| user.name).collect();
    assert_eq!(names, vec!["Ada"]);
}

#[test]
fn replacing_sort_order_reorders_without_changing_membership() {
    let store = RecordStore::open_in_memory().unwrap();

    let ada = User::new("Ada", "London", 3_000);
    let bea = User::new("Bea", "London", 2_000);
    let cal = User::new("Cal", "London", 1_000);
    store.insert_user(&ada).unwrap();
    store.insert_user(&bea).unwrap();
    store.insert_user(&cal).unwrap();

    let query = LiveQuery::<User>::new(
        store.clone(),
        Predicate::always(&USER_SCHEMA),
        SortOrder::by(&USER_SCHEMA, "name", Direction::Ascending).unwrap(),
    )
    .unwrap();

    let by_name: Vec<_> = query.results().into_iter().map(|user| user.uuid).collect();
    assert_eq!(by_name, vec![ada.uuid, bea.uuid, cal.uuid]);

    query
        .set_sort_order(SortOrder::by(&USER_SCHEMA, "join_date", Direction::Ascending).unwrap())
        .unwrap();
    let by_join_date: Vec<_> = query.results().into_iter().map(|user| user.uuid).collect();
    assert_eq!(by_join_date, vec![cal.uuid, bea.uuid, ada.uuid]);

    let mut membership_before = by_name.clone();
    let mut membership_after = by_join_date.clone();
    membership_before.sort();
    membership_after.sort();
    assert_eq!(membership_before, membership_after);
}

#[test]
fn replacing_predicate_refilters_immediately() {
    let store = RecordStore::open_in_memory().unwrap();
    seed_cities(&store);

    let query = LiveQuery::<User>::new(
        store.clone(),
        Predicate::parse(&USER_SCHEMA, "city == \"London\"").unwrap(),
        SortOrder::by(&USER_SCHEMA, "name", Direction::Ascending).unwrap(),
    )
    .unwrap();
    assert_eq!(query.results().len(), 2);

    query
        .set_predicate(Predicate::parse(&USER_SCHEMA, "city == \"Paris\"").unwrap())
        .unwrap();
    let results = query.results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].city, "Paris");
}

#[test]
fn lexicographic_sort_breaks_ties_with_later_keys() {
    let store = RecordStore::open_in_memory().unwrap();

    let late = User::new("Rhea", "London", 2_000);
    let early = User::new("Rhea", "London", 1_000);
    store.insert_user(&late).unwrap();
    store.insert_user(&early).unwrap();

    let query = LiveQuery::<User>::new(
        store.clone(),
        Predicate::always(&USER_SCHEMA),
        SortOrder::new(
            &USER_SCHEMA,
            &[
                ("name", Direction::Ascending),
                ("join_date", Direction::Ascending),
            ],
        )
        .unwrap(),
    )
    .unwrap();

    let join_dates: Vec<_> = query
        .results()
        .into_iter()
        .map(|user| user.join_date)
        .collect();
    assert_eq!(join_dates, vec![1_000, 2_000]);
}

#[test]
fn text_sort_keys_compare_case_insensitively() {
    let store = RecordStore::open_in_memory().unwrap();

    let lower = User::new("ada", "London", 0);
    let upper = User::new("Bea", "London", 0);
    store.insert_user(&upper).unwrap();
    store.insert_user(&lower).unwrap();

    let query = LiveQuery::<User>::new(
        store.clone(),
        Predicate::always(&USER_SCHEMA),
        SortOrder::by(&USER_SCHEMA, "name", Direction::Ascending).unwrap(),
    )
    .unwrap();

    let names: Vec<_> = query.results().into_iter().map(|user| user.name).collect();
    assert_eq!(names, vec!["ada", "Bea"]);
}

#[test]
fn dropped_queries_are_pruned_and_store_keeps_working() {
    let store = RecordStore::open_in_memory().unwrap();
    seed_cities(&store);

    let query = LiveQuery::<User>::new(
        store.clone(),
        Predicate::always(&USER_SCHEMA),
        SortOrder::by(&USER_SCHEMA, "name", Direction::Ascending).unwrap(),
    )
    .unwrap();
    assert_eq!(query.results().len(), 3);
    drop(query);

    // Next mutations sweep the dead observer and proceed normally.
    store.insert_user(&User::new("Ada", "London", 0)).unwrap();
    store.insert_user(&User::new("Eve", "Berlin", 0)).unwrap();

    let fresh = LiveQuery::<User>::new(
        store.clone(),
        Predicate::always(&USER_SCHEMA),
        SortOrder::by(&USER_SCHEMA, "name", Direction::Ascending).unwrap(),
    )
    .unwrap();
    assert_eq!(fresh.results().len(), 5);
}

#[test]
fn criteria_built_for_another_record_type_are_rejected() {
    let store = RecordStore::open_in_memory().unwrap();

    let err = LiveQuery::<Job>::new(
        store.clone(),
        Predicate::always(&USER_SCHEMA),
        SortOrder::by(&JOB_SCHEMA, "priority", Direction::Ascending).unwrap(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        StoreError::SchemaMismatch {
            built_for: "user",
            requested: "job"
        }
    ));
}
