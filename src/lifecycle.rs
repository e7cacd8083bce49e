//! Status transitions, default assignment and the overdue rule.

use chrono::{DateTime, Local, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{StatusCategory, Task, TaskCategory, TaskPriority, TaskStatus};
use crate::reference::find_by_name_fuzzy;
use crate::repository::NewTask;

/// The current instant and the user's local calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    pub now: DateTime<Utc>,
    pub today: NaiveDate,
}

impl Clock {
    pub fn system() -> Self {
        Clock {
            now: Utc::now(),
            today: Local::now().date_naive(),
        }
    }

    pub fn fixed(now: DateTime<Utc>, today: NaiveDate) -> Self {
        Clock { now, today }
    }
}

/// A task is overdue when its deadline lies strictly before `today` and it
/// has not reached Done or Cancelled. A deadline of today is not overdue.
pub fn is_overdue(deadline: Option<NaiveDate>, category: StatusCategory, today: NaiveDate) -> bool {
    match deadline {
        Some(deadline) => deadline < today && category.is_open(),
        None => false,
    }
}

/// Whole days between the deadline and today; positive when overdue.
pub fn days_overdue(deadline: NaiveDate, today: NaiveDate) -> i64 {
    (today - deadline).num_days()
}

/// What a status change did to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from_status_id: i64,
    pub to_status_id: i64,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Moves `task` to `status`.
///
/// Any status may follow any other. Entering a Done status stamps
/// `completed_at` with `now`, even when it was already set; every other
/// target clears it.
pub fn transition(task: &mut Task, status: &TaskStatus, now: DateTime<Utc>) -> Transition {
    let from_status_id = task.status_id;
    task.status_id = status.id;
    task.completed_at = match status.category {
        StatusCategory::Done => Some(now),
        _ => None,
    };
    debug!(
        task = task.id,
        from = from_status_id,
        to = status.id,
        category = status.category.as_str(),
        "status transition"
    );
    Transition {
        from_status_id,
        to_status_id: status.id,
        completed_at: task.completed_at,
    }
}

/// Looks up the first status of `category` and moves the task there.
///
/// Returns [`Error::ConfigurationGap`] when no such status is configured.
pub fn transition_to_category(
    task: &mut Task,
    statuses: &[TaskStatus],
    category: StatusCategory,
    now: DateTime<Utc>,
) -> Result<(TaskStatus, Transition)> {
    let status = statuses
        .iter()
        .find(|s| s.category == category)
        .cloned()
        .ok_or_else(|| {
            Error::ConfigurationGap(format!(
                "No status in the {} category is configured.",
                category.label()
            ))
        })?;
    let transition = transition(task, &status, now);
    Ok((status, transition))
}

/// A value picked by a fallback chain. `degraded` is set when the preferred
/// choice was unavailable and a substitute was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Defaulted<T> {
    pub value: T,
    pub degraded: bool,
}

impl<T> Defaulted<T> {
    pub fn exact(value: T) -> Self {
        Defaulted {
            value,
            degraded: false,
        }
    }

    pub fn fallback(value: T) -> Self {
        Defaulted {
            value,
            degraded: true,
        }
    }
}

/// How the user selected a priority or category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RefChoice {
    /// Nothing given; apply the default policy.
    #[default]
    Unspecified,
    /// A name from a flag, matched fuzzily.
    Named(String),
    /// A row picked from a menu.
    Picked(i64),
}

/// Status for a new task: the first Inbox status, otherwise the first status
/// of any kind (degraded). `None` only when no statuses exist.
pub fn default_status(statuses: &[TaskStatus]) -> Option<Defaulted<&TaskStatus>> {
    if let Some(inbox) = statuses.iter().find(|s| s.category == StatusCategory::Inbox) {
        return Some(Defaulted::exact(inbox));
    }
    statuses.iter().min_by_key(|s| s.id).map(Defaulted::fallback)
}

/// Priority for a new task. `priorities` must be ordered by level ascending.
///
/// Unspecified picks the middle entry (index `len / 2`). A name that matches
/// nothing falls back to the lowest level and is reported as degraded.
pub fn choose_priority<'a>(
    priorities: &'a [TaskPriority],
    choice: &RefChoice,
) -> Option<Defaulted<&'a TaskPriority>> {
    let lowest = priorities.first()?;
    match choice {
        RefChoice::Unspecified => priorities.get(priorities.len() / 2).map(Defaulted::exact),
        RefChoice::Named(name) => Some(
            find_by_name_fuzzy(priorities, name)
                .map(Defaulted::exact)
                .unwrap_or_else(|| Defaulted::fallback(lowest)),
        ),
        RefChoice::Picked(id) => Some(
            priorities
                .iter()
                .find(|p| p.id == *id)
                .map(Defaulted::exact)
                .unwrap_or_else(|| Defaulted::fallback(lowest)),
        ),
    }
}

/// Category for a new task. A name that matches nothing leaves it unset.
pub fn choose_category<'a>(
    categories: &'a [TaskCategory],
    choice: &RefChoice,
) -> Option<&'a TaskCategory> {
    match choice {
        RefChoice::Unspecified => None,
        RefChoice::Named(name) => find_by_name_fuzzy(categories, name),
        RefChoice::Picked(id) => categories.iter().find(|c| c.id == *id),
    }
}

/// Everything the user supplied for a new task, however it was gathered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTaskInput {
    pub name: String,
    pub description: Option<String>,
    pub category: RefChoice,
    pub priority: RefChoice,
    pub deadline: Option<NaiveDate>,
    pub expected_date: Option<NaiveDate>,
}

/// The reference rows default assignment works from.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceData<'a> {
    pub statuses: &'a [TaskStatus],
    /// Ordered by level ascending.
    pub priorities: &'a [TaskPriority],
    pub categories: &'a [TaskCategory],
}

/// A new task ready for the repository, plus the rows it was assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTask {
    pub task: NewTask,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub category: Option<TaskCategory>,
    /// Human-readable notes about fallbacks that were taken.
    pub notices: Vec<String>,
}

/// Validates `input` and applies the default assignment policy.
pub fn prepare_new_task(input: NewTaskInput, refs: ReferenceData<'_>) -> Result<PreparedTask> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::Validation("Task name is required.".into()));
    }

    let mut notices = Vec::new();

    let status = default_status(refs.statuses).ok_or(Error::NotInstalled)?;
    if status.degraded {
        warn!(status = %status.value.name, "no inbox status configured, using first status");
        notices.push(format!(
            "No Inbox status is configured; using \"{}\" instead.",
            status.value.name
        ));
    }

    let priority = choose_priority(refs.priorities, &input.priority).ok_or_else(|| {
        Error::ConfigurationGap("No priorities are configured. Run `todo task:install`.".into())
    })?;
    if priority.degraded {
        warn!(priority = %priority.value.name, "requested priority not found, using lowest");
        if let RefChoice::Named(requested) = &input.priority {
            notices.push(format!(
                "Priority \"{}\" not found; using \"{}\".",
                requested, priority.value.name
            ));
        }
    }

    let category = choose_category(refs.categories, &input.category);
    if let (RefChoice::Named(requested), None) = (&input.category, category) {
        debug!(category = %requested, "requested category not found, leaving unset");
    }

    let task = NewTask {
        name,
        description: input.description.filter(|d| !d.trim().is_empty()),
        category_id: category.map(|c| c.id),
        priority_id: Some(priority.value.id),
        status_id: Some(status.value.id),
        deadline: input.deadline,
        expected_date: input.expected_date,
    };

    Ok(PreparedTask {
        task,
        status: status.value.clone(),
        priority: priority.value.clone(),
        category: category.cloned(),
        notices,
    })
}

/// A per-field edit instruction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Change<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> Change<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Change::Keep)
    }

    fn apply(self, field: &mut Option<T>) {
        match self {
            Change::Keep => {}
            Change::Clear => *field = None,
            Change::Set(value) => *field = Some(value),
        }
    }
}

/// Field changes for an existing task. Status is changed through
/// [`transition`] only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskEdit {
    pub name: Option<String>,
    pub description: Change<String>,
    pub category_id: Change<i64>,
    pub priority_id: Option<i64>,
    pub deadline: Change<NaiveDate>,
    pub expected_date: Change<NaiveDate>,
}

impl TaskEdit {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_keep()
            && self.category_id.is_keep()
            && self.priority_id.is_none()
            && self.deadline.is_keep()
            && self.expected_date.is_keep()
    }
}

/// Applies `edit` to `task`. A blank new name is rejected before anything
/// changes.
pub fn apply_edit(task: &mut Task, edit: TaskEdit) -> Result<()> {
    if let Some(name) = &edit.name {
        if name.trim().is_empty() {
            return Err(Error::Validation("Task name cannot be empty.".into()));
        }
    }
    if let Some(name) = edit.name {
        task.name = name.trim().to_string();
    }
    edit.description.apply(&mut task.description);
    edit.category_id.apply(&mut task.category_id);
    if let Some(priority_id) = edit.priority_id {
        task.priority_id = priority_id;
    }
    edit.deadline.apply(&mut task.deadline);
    edit.expected_date.apply(&mut task.expected_date);
    Ok(())
}

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Word that removes a date or description in edits.
pub const CLEAR_SENTINEL: &str = "clear";

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .map_err(|e| Error::Validation(format!("Invalid date '{}': {}. Use YYYY-MM-DD.", input, e)))
}

/// Parses an optional date answer: blank means no date.
pub fn parse_optional_date(input: Option<&str>) -> Result<Option<NaiveDate>> {
    match input.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse_date(s).map(Some),
        None => Ok(None),
    }
}

/// Parses an edit answer for a date field: blank keeps, `clear` removes.
pub fn parse_date_change(input: Option<&str>) -> Result<Change<NaiveDate>> {
    match input.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(Change::Keep),
        Some(s) if s.eq_ignore_ascii_case(CLEAR_SENTINEL) => Ok(Change::Clear),
        Some(s) => parse_date(s).map(Change::Set),
    }
}
