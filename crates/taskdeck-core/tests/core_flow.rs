use chrono::{Duration, TimeZone, Utc};
use taskdeck_core::store::Counts;
use taskdeck_core::{Filter, NotFoundError, Priority, SortKey, Status, TaskStore, ValidationError};

fn titles(store: &TaskStore, filter: Filter, sort: SortKey) -> Vec<String> {
    store
        .view(filter, sort)
        .into_iter()
        .map(|task| task.title)
        .collect()
}

#[test]
fn add_toggle_delete_walkthrough() {
    let mut store = TaskStore::new();

    let milk = store.add("Buy milk", Some(Priority::Medium)).expect("add milk");
    let bank = store.add("Call bank", Some(Priority::High)).expect("add bank");
    let err = store.add("Hi", Some(Priority::Low)).expect_err("short title");
    assert!(matches!(err, ValidationError::TitleTooShort { min: 3, actual: 2 }));

    assert_eq!(titles(&store, Filter::All, SortKey::Created), vec!["Call bank", "Buy milk"]);
    assert_eq!(store.counts().total, 2);

    let toggled = store.toggle(milk.id).expect("toggle milk");
    assert_eq!(toggled.status, Status::Completed);
    assert_eq!(titles(&store, Filter::Completed, SortKey::Created), vec!["Buy milk"]);
    assert_eq!(store.counts(), Counts { total: 2, completed: 1 });

    store.delete(bank.id).expect("delete bank");
    assert_eq!(store.counts(), Counts { total: 1, completed: 1 });
    for sort in [SortKey::Created, SortKey::Priority, SortKey::Alphabetical] {
        assert_eq!(titles(&store, Filter::All, sort), vec!["Buy milk"]);
    }

    assert_eq!(store.delete(bank.id), Err(NotFoundError(bank.id)));
    assert_eq!(store.counts().total, 1);
}

#[test]
fn views_respect_filter_and_severity_order() {
    let base = Utc.with_ymd_and_hms(2026, 5, 4, 8, 0, 0).single().expect("timestamp");
    let mut store = TaskStore::new();

    let specs = [
        ("Sweep porch", Priority::Low),
        ("File taxes", Priority::High),
        ("Book dentist", Priority::Medium),
        ("Renew passport", Priority::High),
        ("Sort mail", Priority::Low),
    ];
    for (offset, (title, priority)) in specs.into_iter().enumerate() {
        let at = base + Duration::minutes(offset as i64);
        let task = store.add_at(title, Some(priority), at).expect("add");
        if offset % 2 == 0 {
            store.toggle(task.id).expect("toggle");
        }
    }

    let all = store.view(Filter::All, SortKey::Priority);
    assert_eq!(all.len(), store.len());
    assert!(
        all.windows(2)
            .all(|pair| pair[0].priority.severity() >= pair[1].priority.severity())
    );

    for sort in [SortKey::Created, SortKey::Priority, SortKey::Alphabetical] {
        assert!(store.view(Filter::Completed, sort).iter().all(|t| t.status == Status::Completed));
        assert!(store.view(Filter::Pending, sort).iter().all(|t| t.status == Status::Pending));
    }

    assert_eq!(
        titles(&store, Filter::All, SortKey::Alphabetical),
        vec!["Book dentist", "File taxes", "Renew passport", "Sort mail", "Sweep porch"]
    );
    assert_eq!(
        titles(&store, Filter::Pending, SortKey::Created),
        vec!["Renew passport", "File taxes"]
    );
}

#[test]
fn alphabetical_view_sorts_accented_titles_with_their_base_letter() {
    let mut store = TaskStore::new();
    for title in ["Zebra crossing", "Éclair recipe", "banana bread"] {
        store.add(title, None).expect("add");
    }

    assert_eq!(
        titles(&store, Filter::All, SortKey::Alphabetical),
        vec!["banana bread", "Éclair recipe", "Zebra crossing"]
    );
}
