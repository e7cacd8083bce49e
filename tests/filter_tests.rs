use chrono::NaiveDate;
use todo_cli::error::Error;
use todo_cli::filter::{ListOptions, StatusScope, TaskFilter};
use todo_cli::models::StatusCategory;
use todo_cli::repository::NewTask;
use todo_cli::storage::Store;

// Ids handed out by seed_defaults on a fresh database.
const INBOX: i64 = 1;
const NEXT_ACTION: i64 = 2;
const WAITING_FOR: i64 = 3;
const DONE: i64 = 5;
const CANCELLED: i64 = 6;
const LOW: i64 = 1;
const MEDIUM: i64 = 2;
const HIGH: i64 = 3;
const URGENT: i64 = 4;
const PERSONAL: i64 = 1;
const WORK: i64 = 2;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn today() -> NaiveDate {
    date("2025-06-15")
}

fn seeded_store() -> Store {
    let store = Store::open_in_memory().unwrap();
    store.seed_defaults().unwrap();
    store
}

fn add(store: &Store, name: &str, status: i64, priority: i64) -> i64 {
    store
        .create_task(&NewTask {
            name: name.into(),
            status_id: Some(status),
            priority_id: Some(priority),
            ..NewTask::default()
        })
        .unwrap()
}

fn add_full(store: &Store, new: NewTask) -> i64 {
    store.create_task(&new).unwrap()
}

fn ids(store: &Store, filter: &TaskFilter) -> Vec<i64> {
    store
        .query_tasks(filter, today())
        .unwrap()
        .iter()
        .map(|d| d.task.id)
        .collect()
}

#[test]
fn test_default_view_hides_terminal_tasks() {
    let store = seeded_store();
    let inbox = add(&store, "inbox", INBOX, LOW);
    let active = add(&store, "active", NEXT_ACTION, LOW);
    add(&store, "done", DONE, LOW);
    add(&store, "cancelled", CANCELLED, LOW);

    assert_eq!(ids(&store, &TaskFilter::default()), vec![inbox, active]);
    assert_eq!(ids(&store, &TaskFilter::all()).len(), 4);
}

#[test]
fn test_ordering_by_priority_then_id() {
    let store = seeded_store();
    let a = add(&store, "a", INBOX, MEDIUM);
    let b = add(&store, "b", INBOX, URGENT);
    let c = add(&store, "c", INBOX, MEDIUM);
    let d = add(&store, "d", INBOX, HIGH);

    assert_eq!(ids(&store, &TaskFilter::default()), vec![b, d, a, c]);
}

#[test]
fn test_fixed_views() {
    let store = seeded_store();
    let inbox = add(&store, "inbox", INBOX, LOW);
    let next = add(&store, "next", NEXT_ACTION, LOW);
    let waiting = add(&store, "waiting", WAITING_FOR, LOW);
    add(&store, "done", DONE, LOW);

    assert_eq!(ids(&store, &TaskFilter::inbox()), vec![inbox]);
    assert_eq!(ids(&store, &TaskFilter::active()), vec![next, waiting]);
    assert_eq!(
        ids(&store, &TaskFilter::in_category(StatusCategory::Done)).len(),
        1
    );
}

#[test]
fn test_overdue_clause() {
    let store = seeded_store();
    let late = add_full(
        &store,
        NewTask {
            name: "late".into(),
            status_id: Some(NEXT_ACTION),
            priority_id: Some(LOW),
            deadline: Some(date("2025-06-14")),
            ..NewTask::default()
        },
    );
    add_full(
        &store,
        NewTask {
            name: "due today".into(),
            status_id: Some(NEXT_ACTION),
            priority_id: Some(LOW),
            deadline: Some(today()),
            ..NewTask::default()
        },
    );
    add_full(
        &store,
        NewTask {
            name: "late but done".into(),
            status_id: Some(DONE),
            priority_id: Some(LOW),
            deadline: Some(date("2025-01-01")),
            ..NewTask::default()
        },
    );
    add(&store, "no deadline", INBOX, LOW);

    assert_eq!(ids(&store, &TaskFilter::overdue_only()), vec![late]);

    // --overdue --all still only admits open tasks.
    let filter = TaskFilter {
        overdue: true,
        ..TaskFilter::all()
    };
    assert_eq!(ids(&store, &filter), vec![late]);

    let details = store.query_tasks(&TaskFilter::all(), today()).unwrap();
    let flagged: Vec<&str> = details
        .iter()
        .filter(|d| d.is_overdue(today()))
        .map(|d| d.task.name.as_str())
        .collect();
    assert_eq!(flagged, vec!["late"]);
}

#[test]
fn test_search_matches_name_or_description() {
    let store = seeded_store();
    let by_name = add(&store, "Buy MILK", INBOX, LOW);
    let by_description = add_full(
        &store,
        NewTask {
            name: "Groceries".into(),
            description: Some("milk and bread".into()),
            status_id: Some(INBOX),
            priority_id: Some(LOW),
            ..NewTask::default()
        },
    );
    add(&store, "Something else", INBOX, LOW);

    let filter = TaskFilter {
        search: Some("milk".into()),
        ..TaskFilter::default()
    };
    assert_eq!(ids(&store, &filter), vec![by_name, by_description]);
}

#[test]
fn test_search_treats_wildcards_literally() {
    let store = seeded_store();
    let percent = add(&store, "Raise by 10%", INBOX, LOW);
    add(&store, "Raise by 100", INBOX, LOW);
    let underscore = add(&store, "rename file_name", INBOX, LOW);
    add(&store, "rename filename", INBOX, LOW);

    let filter = TaskFilter {
        search: Some("10%".into()),
        ..TaskFilter::default()
    };
    assert_eq!(ids(&store, &filter), vec![percent]);

    let filter = TaskFilter {
        search: Some("file_".into()),
        ..TaskFilter::default()
    };
    assert_eq!(ids(&store, &filter), vec![underscore]);
}

#[test]
fn test_search_folds_non_ascii_case() {
    let store = seeded_store();
    let summer = add(&store, "Été planning", INBOX, LOW);
    let street = add_full(
        &store,
        NewTask {
            name: "Errands".into(),
            description: Some("Post office on STRAẞE corner".into()),
            status_id: Some(INBOX),
            priority_id: Some(LOW),
            ..NewTask::default()
        },
    );
    add(&store, "Winter planning", INBOX, LOW);

    for needle in ["été", "ÉTÉ", "Été"] {
        let filter = TaskFilter {
            search: Some(needle.into()),
            ..TaskFilter::default()
        };
        assert_eq!(ids(&store, &filter), vec![summer], "search {needle:?}");
    }

    let filter = TaskFilter {
        search: Some("straße".into()),
        ..TaskFilter::default()
    };
    assert_eq!(ids(&store, &filter), vec![street]);
}

#[test]
fn test_clauses_combine_with_and() {
    let store = seeded_store();
    let wanted = add_full(
        &store,
        NewTask {
            name: "Quarterly report".into(),
            category_id: Some(WORK),
            status_id: Some(NEXT_ACTION),
            priority_id: Some(HIGH),
            ..NewTask::default()
        },
    );
    add_full(
        &store,
        NewTask {
            name: "Personal report".into(),
            category_id: Some(PERSONAL),
            status_id: Some(NEXT_ACTION),
            priority_id: Some(HIGH),
            ..NewTask::default()
        },
    );
    add_full(
        &store,
        NewTask {
            name: "Work report, low".into(),
            category_id: Some(WORK),
            status_id: Some(NEXT_ACTION),
            priority_id: Some(LOW),
            ..NewTask::default()
        },
    );

    let filter = TaskFilter {
        category_id: Some(WORK),
        priority_id: Some(HIGH),
        search: Some("report".into()),
        ..TaskFilter::default()
    };
    assert_eq!(ids(&store, &filter), vec![wanted]);
}

#[test]
fn test_list_options_resolution() {
    let store = seeded_store();

    let filter = ListOptions::default().resolve(&store).unwrap();
    assert_eq!(filter, TaskFilter::default());

    let filter = ListOptions {
        all: true,
        ..ListOptions::default()
    }
    .resolve(&store)
    .unwrap();
    assert_eq!(filter.status, StatusScope::Any);

    // An explicit status wins over --all and may name a terminal status.
    let filter = ListOptions {
        status: Some("done".into()),
        all: true,
        ..ListOptions::default()
    }
    .resolve(&store)
    .unwrap();
    assert_eq!(filter.status, StatusScope::Exact(DONE));

    let filter = ListOptions {
        category: Some("wor".into()),
        priority: Some("urg".into()),
        search: Some(String::new()),
        ..ListOptions::default()
    }
    .resolve(&store)
    .unwrap();
    assert_eq!(filter.category_id, Some(WORK));
    assert_eq!(filter.priority_id, Some(URGENT));
    assert_eq!(filter.search, None);
}

#[test]
fn test_unknown_names_in_list_options() {
    let store = seeded_store();

    let err = ListOptions {
        status: Some("Blocked".into()),
        ..ListOptions::default()
    }
    .resolve(&store)
    .unwrap_err();
    assert!(matches!(err, Error::NotFound { kind: "Status", .. }));

    let filter = ListOptions {
        category: Some("Garden".into()),
        priority: Some("Critical".into()),
        ..ListOptions::default()
    }
    .resolve(&store)
    .unwrap();
    assert_eq!(filter.category_id, None);
    assert_eq!(filter.priority_id, None);
}

#[test]
fn test_orphaned_tasks_after_reconfigure() {
    let store = seeded_store();
    let id = add_full(
        &store,
        NewTask {
            name: "old".into(),
            status_id: Some(NEXT_ACTION),
            priority_id: Some(HIGH),
            deadline: Some(date("2020-01-01")),
            ..NewTask::default()
        },
    );

    store.reset_all().unwrap();
    store.seed_defaults().unwrap();

    // Fresh rows never reuse the old ids.
    let statuses = store.list_statuses().unwrap();
    assert!(statuses.iter().all(|s| s.id > CANCELLED));

    assert!(ids(&store, &TaskFilter::default()).is_empty());
    assert!(ids(&store, &TaskFilter::overdue_only()).is_empty());
    assert_eq!(ids(&store, &TaskFilter::all()), vec![id]);

    let detail = store.find_task(id).unwrap();
    assert!(detail.status.is_none());
    assert!(detail.priority.is_none());
    assert_eq!(detail.status_name(), "-");
    assert!(!detail.is_overdue(today()));
}
