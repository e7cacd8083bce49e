//! The three-phase weekly review.
//!
//! 1. Triage: every Inbox task is skipped or moved to another status.
//! 2. Reassess: the same choice for every Active task.
//! 3. Resolve overdue: reschedule, finish, cancel or skip each overdue task.
//!
//! Each phase loads its tasks when it starts, so a task moved into an Active
//! status during triage comes up again in the reassess phase. Decisions are
//! committed one task at a time and never rolled back. A task that cannot be
//! updated is reported and the review moves on.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::filter::TaskFilter;
use crate::lifecycle::{self, days_overdue, Clock};
use crate::models::{StatusCategory, TaskDetail, TaskStatus};
use crate::storage::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Triage,
    Reassess,
    ResolveOverdue,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Triage, Phase::Reassess, Phase::ResolveOverdue];

    fn filter(self) -> TaskFilter {
        match self {
            Phase::Triage => TaskFilter::inbox(),
            Phase::Reassess => TaskFilter::active(),
            Phase::ResolveOverdue => TaskFilter::overdue_only(),
        }
    }
}

/// Answer for the triage and reassess phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusDecision {
    Skip,
    MoveTo(i64),
}

/// Answer for the overdue phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverdueAction {
    Reschedule(NaiveDate),
    MarkDone,
    Cancel,
    Skip,
}

/// What happened to one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Skipped,
    Moved { status: String },
    Rescheduled { deadline: NaiveDate },
    Completed { status: String },
    Cancelled { status: String },
    Failed { reason: String },
}

/// The interactive side of a review. The orchestrator only calls these
/// methods and never prompts by itself.
pub trait ReviewDecider {
    /// Called at the start of every phase, including empty ones.
    fn phase_started(&mut self, phase: Phase, count: usize) -> Result<()>;

    fn triage(&mut self, task: &TaskDetail, statuses: &[TaskStatus]) -> Result<StatusDecision>;

    fn reassess(
        &mut self,
        task: &TaskDetail,
        statuses: &[TaskStatus],
        overdue: bool,
    ) -> Result<StatusDecision>;

    fn resolve_overdue(&mut self, task: &TaskDetail, days_overdue: i64) -> Result<OverdueAction>;

    fn outcome(&mut self, task: &TaskDetail, outcome: &Outcome) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSummary {
    pub phase: Phase,
    pub reviewed: usize,
    pub changed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl PhaseSummary {
    fn new(phase: Phase) -> Self {
        PhaseSummary {
            phase,
            reviewed: 0,
            changed: 0,
            skipped: 0,
            failed: 0,
        }
    }

    fn record(&mut self, outcome: &Outcome) {
        self.reviewed += 1;
        match outcome {
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed { .. } => self.failed += 1,
            _ => self.changed += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewReport {
    pub phases: Vec<PhaseSummary>,
}

impl ReviewReport {
    pub fn phase(&self, phase: Phase) -> Option<&PhaseSummary> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    pub fn total_changed(&self) -> usize {
        self.phases.iter().map(|p| p.changed).sum()
    }
}

/// Runs the full review against `store`.
///
/// Errors returned by the decider abort the review; storage and
/// configuration problems with a single task become [`Outcome::Failed`].
pub fn run_review<D: ReviewDecider>(
    store: &Store,
    decider: &mut D,
    clock: Clock,
) -> Result<ReviewReport> {
    let mut phases = Vec::with_capacity(Phase::ALL.len());
    for phase in Phase::ALL {
        phases.push(run_phase(store, decider, clock, phase)?);
    }
    let report = ReviewReport { phases };
    info!(changed = report.total_changed(), "review finished");
    Ok(report)
}

fn run_phase<D: ReviewDecider>(
    store: &Store,
    decider: &mut D,
    clock: Clock,
    phase: Phase,
) -> Result<PhaseSummary> {
    let tasks = store.query_tasks(&phase.filter(), clock.today)?;
    let mut summary = PhaseSummary::new(phase);
    decider.phase_started(phase, tasks.len())?;
    if tasks.is_empty() {
        return Ok(summary);
    }
    let statuses = store.list_statuses()?;

    for detail in tasks {
        let outcome = match phase {
            Phase::Triage => {
                let decision = decider.triage(&detail, &statuses)?;
                settle(apply_decision(store, &detail, &statuses, decision, clock))
            }
            Phase::Reassess => {
                let overdue = detail.is_overdue(clock.today);
                let decision = decider.reassess(&detail, &statuses, overdue)?;
                settle(apply_decision(store, &detail, &statuses, decision, clock))
            }
            Phase::ResolveOverdue => {
                let days = detail
                    .task
                    .deadline
                    .map(|d| days_overdue(d, clock.today))
                    .unwrap_or(0);
                let action = decider.resolve_overdue(&detail, days)?;
                settle(apply_overdue_action(store, &detail, &statuses, action, clock))
            }
        };
        if let Outcome::Failed { reason } = &outcome {
            warn!(task = detail.task.id, ?phase, %reason, "review step failed");
        }
        summary.record(&outcome);
        decider.outcome(&detail, &outcome)?;
    }
    Ok(summary)
}

fn settle(result: Result<Outcome>) -> Outcome {
    result.unwrap_or_else(|e| Outcome::Failed {
        reason: e.to_string(),
    })
}

fn apply_decision(
    store: &Store,
    detail: &TaskDetail,
    statuses: &[TaskStatus],
    decision: StatusDecision,
    clock: Clock,
) -> Result<Outcome> {
    let status_id = match decision {
        StatusDecision::Skip => return Ok(Outcome::Skipped),
        StatusDecision::MoveTo(id) => id,
    };
    let status = statuses.iter().find(|s| s.id == status_id).ok_or_else(|| Error::NotFound {
        kind: "Status",
        value: format!("#{status_id}"),
    })?;
    let mut task = detail.task.clone();
    lifecycle::transition(&mut task, status, clock.now);
    store.save_task(&mut task)?;
    Ok(Outcome::Moved {
        status: status.name.clone(),
    })
}

fn apply_overdue_action(
    store: &Store,
    detail: &TaskDetail,
    statuses: &[TaskStatus],
    action: OverdueAction,
    clock: Clock,
) -> Result<Outcome> {
    let mut task = detail.task.clone();
    let outcome = match action {
        OverdueAction::Skip => return Ok(Outcome::Skipped),
        OverdueAction::Reschedule(deadline) => {
            task.deadline = Some(deadline);
            Outcome::Rescheduled { deadline }
        }
        OverdueAction::MarkDone => {
            let (status, _) = lifecycle::transition_to_category(
                &mut task,
                statuses,
                StatusCategory::Done,
                clock.now,
            )?;
            Outcome::Completed { status: status.name }
        }
        OverdueAction::Cancel => {
            let (status, _) = lifecycle::transition_to_category(
                &mut task,
                statuses,
                StatusCategory::Cancelled,
                clock.now,
            )?;
            Outcome::Cancelled { status: status.name }
        }
    };
    store.save_task(&mut task)?;
    Ok(outcome)
}
