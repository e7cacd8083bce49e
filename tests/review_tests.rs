use std::collections::VecDeque;

use chrono::{NaiveDate, TimeZone, Utc};
use todo_cli::error::{Error, Result};
use todo_cli::lifecycle::Clock;
use todo_cli::models::{StatusCategory, TaskDetail, TaskStatus};
use todo_cli::repository::NewTask;
use todo_cli::review::*;
use todo_cli::storage::Store;

const INBOX: i64 = 1;
const NEXT_ACTION: i64 = 2;
const DONE: i64 = 5;
const MEDIUM: i64 = 2;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn clock() -> Clock {
    Clock::fixed(
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap(),
        date("2025-06-15"),
    )
}

/// Answers from queues and records every call it receives.
#[derive(Default)]
struct Script {
    triage: VecDeque<StatusDecision>,
    reassess: VecDeque<StatusDecision>,
    overdue: VecDeque<OverdueAction>,
    started: Vec<(Phase, usize)>,
    seen: Vec<(Phase, i64)>,
    overdue_days: Vec<i64>,
    outcomes: Vec<(i64, Outcome)>,
    fail_on_reassess: bool,
}

impl ReviewDecider for Script {
    fn phase_started(&mut self, phase: Phase, count: usize) -> Result<()> {
        self.started.push((phase, count));
        Ok(())
    }

    fn triage(&mut self, task: &TaskDetail, _statuses: &[TaskStatus]) -> Result<StatusDecision> {
        self.seen.push((Phase::Triage, task.task.id));
        Ok(self.triage.pop_front().unwrap_or(StatusDecision::Skip))
    }

    fn reassess(
        &mut self,
        task: &TaskDetail,
        _statuses: &[TaskStatus],
        _overdue: bool,
    ) -> Result<StatusDecision> {
        if self.fail_on_reassess {
            return Err(Error::Validation("input closed".into()));
        }
        self.seen.push((Phase::Reassess, task.task.id));
        Ok(self.reassess.pop_front().unwrap_or(StatusDecision::Skip))
    }

    fn resolve_overdue(&mut self, task: &TaskDetail, days_overdue: i64) -> Result<OverdueAction> {
        self.seen.push((Phase::ResolveOverdue, task.task.id));
        self.overdue_days.push(days_overdue);
        Ok(self.overdue.pop_front().unwrap_or(OverdueAction::Skip))
    }

    fn outcome(&mut self, task: &TaskDetail, outcome: &Outcome) -> Result<()> {
        self.outcomes.push((task.task.id, outcome.clone()));
        Ok(())
    }
}

fn seeded_store() -> Store {
    let store = Store::open_in_memory().unwrap();
    store.seed_defaults().unwrap();
    store
}

fn add(store: &Store, name: &str, status: i64, deadline: Option<&str>) -> i64 {
    store
        .create_task(&NewTask {
            name: name.into(),
            status_id: Some(status),
            priority_id: Some(MEDIUM),
            deadline: deadline.map(date),
            ..NewTask::default()
        })
        .unwrap()
}

#[test]
fn test_empty_review_announces_every_phase() {
    let store = seeded_store();
    let mut script = Script::default();
    let report = run_review(&store, &mut script, clock()).unwrap();

    assert_eq!(
        script.started,
        vec![
            (Phase::Triage, 0),
            (Phase::Reassess, 0),
            (Phase::ResolveOverdue, 0)
        ]
    );
    assert_eq!(report.phases.len(), 3);
    assert_eq!(report.total_changed(), 0);
}

#[test]
fn test_triaged_task_comes_up_again_in_reassess() {
    let store = seeded_store();
    let task = add(&store, "Plan trip", INBOX, None);
    let mut script = Script {
        triage: VecDeque::from([StatusDecision::MoveTo(NEXT_ACTION)]),
        ..Script::default()
    };

    let report = run_review(&store, &mut script, clock()).unwrap();

    assert_eq!(
        script.seen,
        vec![(Phase::Triage, task), (Phase::Reassess, task)]
    );
    assert_eq!(
        script.outcomes[0],
        (
            task,
            Outcome::Moved {
                status: "Next Action".into()
            }
        )
    );
    let triage = report.phase(Phase::Triage).unwrap();
    assert_eq!((triage.reviewed, triage.changed), (1, 1));
    let reassess = report.phase(Phase::Reassess).unwrap();
    assert_eq!((reassess.reviewed, reassess.skipped), (1, 1));
    assert_eq!(store.find_task(task).unwrap().status_name(), "Next Action");
}

#[test]
fn test_reassess_into_done_sets_completed_at() {
    let store = seeded_store();
    let task = add(&store, "Call bank", NEXT_ACTION, None);
    let mut script = Script {
        reassess: VecDeque::from([StatusDecision::MoveTo(DONE)]),
        ..Script::default()
    };
    run_review(&store, &mut script, clock()).unwrap();

    let detail = store.find_task(task).unwrap();
    assert_eq!(detail.status_category(), Some(StatusCategory::Done));
    assert_eq!(detail.task.completed_at, Some(clock().now));
}

#[test]
fn test_overdue_actions() {
    let store = seeded_store();
    let reschedule = add(&store, "Reschedule me", NEXT_ACTION, Some("2025-06-10"));
    let finish = add(&store, "Finish me", NEXT_ACTION, Some("2025-06-01"));
    let cancel = add(&store, "Cancel me", INBOX, Some("2025-05-15"));
    let skip = add(&store, "Skip me", NEXT_ACTION, Some("2025-06-14"));
    add(&store, "Due today", NEXT_ACTION, Some("2025-06-15"));

    let mut script = Script {
        overdue: VecDeque::from([
            OverdueAction::Reschedule(date("2025-07-01")),
            OverdueAction::MarkDone,
            OverdueAction::Cancel,
            OverdueAction::Skip,
        ]),
        ..Script::default()
    };
    let report = run_review(&store, &mut script, clock()).unwrap();

    let overdue_ids: Vec<i64> = script
        .seen
        .iter()
        .filter(|(phase, _)| *phase == Phase::ResolveOverdue)
        .map(|(_, id)| *id)
        .collect();
    assert_eq!(overdue_ids, vec![reschedule, finish, cancel, skip]);
    assert_eq!(script.overdue_days, vec![5, 14, 31, 1]);

    let summary = report.phase(Phase::ResolveOverdue).unwrap();
    assert_eq!((summary.reviewed, summary.changed, summary.skipped), (4, 3, 1));

    let detail = store.find_task(reschedule).unwrap();
    assert_eq!(detail.task.deadline, Some(date("2025-07-01")));
    assert_eq!(detail.status_name(), "Next Action");

    let detail = store.find_task(finish).unwrap();
    assert_eq!(detail.status_name(), "Done");
    assert_eq!(detail.task.completed_at, Some(clock().now));

    let detail = store.find_task(cancel).unwrap();
    assert_eq!(detail.status_name(), "Cancelled");
    assert!(detail.task.completed_at.is_none());

    assert_eq!(
        store.find_task(skip).unwrap().task.deadline,
        Some(date("2025-06-14"))
    );
}

#[test]
fn test_missing_done_status_fails_only_that_task() {
    let store = Store::open_in_memory().unwrap();
    let inbox = store.insert_status("Inbox", StatusCategory::Inbox).unwrap();
    let doing = store.insert_status("Doing", StatusCategory::Active).unwrap();
    let dropped = store
        .insert_status("Dropped", StatusCategory::Cancelled)
        .unwrap();
    store.seed_default_priorities().unwrap();

    let first = store
        .create_task(&NewTask {
            name: "Needs done".into(),
            status_id: Some(doing),
            priority_id: Some(MEDIUM),
            deadline: Some(date("2025-06-01")),
            ..NewTask::default()
        })
        .unwrap();
    let second = store
        .create_task(&NewTask {
            name: "Needs cancel".into(),
            status_id: Some(inbox),
            priority_id: Some(MEDIUM),
            deadline: Some(date("2025-06-02")),
            ..NewTask::default()
        })
        .unwrap();

    let mut script = Script {
        overdue: VecDeque::from([OverdueAction::MarkDone, OverdueAction::Cancel]),
        ..Script::default()
    };
    let report = run_review(&store, &mut script, clock()).unwrap();

    let summary = report.phase(Phase::ResolveOverdue).unwrap();
    assert_eq!((summary.failed, summary.changed), (1, 1));
    assert!(matches!(
        &script.outcomes[script.outcomes.len() - 2],
        (id, Outcome::Failed { .. }) if *id == first
    ));

    assert_eq!(store.find_task(first).unwrap().task.status_id, doing);
    assert_eq!(store.find_task(second).unwrap().task.status_id, dropped);
}

#[test]
fn test_decider_errors_abort_the_review() {
    let store = seeded_store();
    let task = add(&store, "Late", NEXT_ACTION, Some("2025-06-01"));
    let mut script = Script {
        fail_on_reassess: true,
        ..Script::default()
    };

    let err = run_review(&store, &mut script, clock()).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    // The overdue phase never started.
    assert_eq!(script.started.len(), 2);
    assert_eq!(store.find_task(task).unwrap().status_name(), "Next Action");
}

#[test]
fn test_unknown_status_decision_is_reported() {
    let store = seeded_store();
    let task = add(&store, "Orphan target", INBOX, None);
    let mut script = Script {
        triage: VecDeque::from([StatusDecision::MoveTo(999)]),
        ..Script::default()
    };
    let report = run_review(&store, &mut script, clock()).unwrap();

    assert_eq!(report.phase(Phase::Triage).unwrap().failed, 1);
    assert_eq!(store.find_task(task).unwrap().status_name(), "Inbox");
}
