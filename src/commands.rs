use std::io::{BufRead, Write};
use std::path::Path;

use tracing::info;

use crate::display::{format_date, format_timestamp, inbox_table, task_detail_lines, task_table};
use crate::error::{Error, Result};
use crate::filter::{ListOptions, TaskFilter};
use crate::lifecycle::{
    self, apply_edit, parse_date, parse_date_change, parse_optional_date, prepare_new_task, Change,
    Clock, NewTaskInput, ReferenceData, RefChoice, TaskEdit, CLEAR_SENTINEL,
};
use crate::models::{StatusCategory, TaskCategory, TaskDetail, TaskPriority, TaskStatus};
use crate::prompt::Console;
use crate::reference::{find_by_name_fuzzy, split_names, DEFAULT_STATUSES};
use crate::review::{
    run_review, OverdueAction, Outcome, Phase, ReviewDecider, ReviewReport, StatusDecision,
};
use crate::storage::Store;

/// Flags of `task:add`. Anything left out is asked for.
#[derive(Debug, Clone, Default)]
pub struct AddArgs {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub deadline: Option<String>,
    pub expected_date: Option<String>,
}

/// Flags of `task:edit`. With none given the edit is interactive.
#[derive(Debug, Clone, Default)]
pub struct EditArgs {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub deadline: Option<String>,
    pub expected_date: Option<String>,
}

impl EditArgs {
    pub fn has_flags(&self) -> bool {
        self.name.is_some()
            || self.description.is_some()
            || self.category.is_some()
            || self.priority.is_some()
            || self.deadline.is_some()
            || self.expected_date.is_some()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn names<T: crate::models::Named>(items: &[T]) -> Vec<String> {
    items.iter().map(|i| i.name().to_string()).collect()
}

/// Asks for an optional date until the answer is blank or valid.
fn ask_optional_date<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    question: &str,
) -> Result<Option<chrono::NaiveDate>> {
    loop {
        let answer = console.ask(question)?;
        match parse_optional_date(Some(&answer)) {
            Ok(date) => return Ok(date),
            Err(e) => console.line(format!("  {e}"))?,
        }
    }
}

/// Asks for a date edit until the answer is blank, `clear` or valid.
fn ask_date_change<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    question: &str,
) -> Result<Change<chrono::NaiveDate>> {
    loop {
        let answer = console.ask(question)?;
        match parse_date_change(Some(&answer)) {
            Ok(change) => return Ok(change),
            Err(e) => console.line(format!("  {e}"))?,
        }
    }
}

/// Collects a new task from flags, prompting for whatever is missing.
fn gather_new_task<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    args: AddArgs,
    priorities: &[TaskPriority],
    categories: &[TaskCategory],
) -> Result<NewTaskInput> {
    let name = match non_empty(args.name) {
        Some(name) => name,
        None => console.ask("Task name")?,
    };
    if name.trim().is_empty() {
        return Err(Error::Validation("Task name is required.".into()));
    }

    let description = match non_empty(args.description) {
        Some(d) => Some(d),
        None => non_empty(Some(console.ask("Description (optional)")?)),
    };

    let category = if categories.is_empty() {
        RefChoice::Unspecified
    } else if let Some(requested) = non_empty(args.category) {
        RefChoice::Named(requested)
    } else {
        let mut options = names(categories);
        options.push("None".into());
        let picked = console.choice("Category", &options, options.len() - 1)?;
        match categories.get(picked) {
            Some(c) => RefChoice::Picked(c.id),
            None => RefChoice::Unspecified,
        }
    };

    let priority = if let Some(requested) = non_empty(args.priority) {
        RefChoice::Named(requested)
    } else if priorities.is_empty() {
        RefChoice::Unspecified
    } else {
        let options = names(priorities);
        let picked = console.choice("Priority", &options, priorities.len() / 2)?;
        RefChoice::Picked(priorities[picked].id)
    };

    let deadline = match non_empty(args.deadline) {
        Some(d) => Some(parse_date(&d)?),
        None => ask_optional_date(console, "Deadline (YYYY-MM-DD, optional)")?,
    };
    let expected_date = match non_empty(args.expected_date) {
        Some(d) => Some(parse_date(&d)?),
        None => ask_optional_date(console, "Expected date (YYYY-MM-DD, optional)")?,
    };

    Ok(NewTaskInput {
        name,
        description,
        category,
        priority,
        deadline,
        expected_date,
    })
}

/// Creates a task. New tasks always start in the Inbox.
pub fn cmd_add<R: BufRead, W: Write>(
    store: &Store,
    console: &mut Console<R, W>,
    args: AddArgs,
) -> Result<i64> {
    let statuses = store.list_statuses()?;
    let priorities = store.list_priorities()?;
    let categories = store.list_categories()?;

    let input = gather_new_task(console, args, &priorities, &categories)?;
    let prepared = prepare_new_task(
        input,
        ReferenceData {
            statuses: &statuses,
            priorities: &priorities,
            categories: &categories,
        },
    )?;
    let id = store.create_task(&prepared.task)?;

    console.blank()?;
    for notice in &prepared.notices {
        console.line(format!("  Warning: {notice}"))?;
    }
    console.line(format!("  Task #{} created: {}", id, prepared.task.name))?;
    console.line(format!(
        "  Status: {} | Priority: {}",
        prepared.status.name, prepared.priority.name
    ))?;
    console.blank()?;
    Ok(id)
}

/// Builds an edit from flags. Unknown category and priority names are ignored.
fn edit_from_flags(
    args: EditArgs,
    priorities: &[TaskPriority],
    categories: &[TaskCategory],
) -> Result<TaskEdit> {
    let description = match non_empty(args.description) {
        None => Change::Keep,
        Some(d) if d.trim().eq_ignore_ascii_case(CLEAR_SENTINEL) => Change::Clear,
        Some(d) => Change::Set(d),
    };
    let category_id = match non_empty(args.category) {
        Some(name) => find_by_name_fuzzy(categories, &name)
            .map(|c| Change::Set(c.id))
            .unwrap_or(Change::Keep),
        None => Change::Keep,
    };
    let priority_id = non_empty(args.priority)
        .and_then(|name| find_by_name_fuzzy(priorities, &name).map(|p| p.id));

    Ok(TaskEdit {
        name: args.name,
        description,
        category_id,
        priority_id,
        deadline: parse_date_change(args.deadline.as_deref())?,
        expected_date: parse_date_change(args.expected_date.as_deref())?,
    })
}

/// Walks through every field; Enter keeps the current value.
fn edit_interactively<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    detail: &TaskDetail,
    priorities: &[TaskPriority],
    categories: &[TaskCategory],
) -> Result<TaskEdit> {
    let task = &detail.task;
    let mut edit = TaskEdit {
        name: non_empty(Some(console.ask(&format!("Name [{}]", task.name))?)),
        ..TaskEdit::default()
    };

    let current = task.description.as_deref().unwrap_or("none");
    let answer = console.ask(&format!("Description [{current}]"))?;
    edit.description = match answer.trim() {
        "" => Change::Keep,
        s if s.eq_ignore_ascii_case(CLEAR_SENTINEL) => Change::Clear,
        s => Change::Set(s.to_string()),
    };

    if !categories.is_empty() {
        let mut options = names(categories);
        options.push("None".into());
        options.push(format!("Keep ({})", detail.category_name()));
        let picked = console.choice("Category", &options, options.len() - 1)?;
        edit.category_id = match categories.get(picked) {
            Some(c) => Change::Set(c.id),
            None if picked == categories.len() => Change::Clear,
            None => Change::Keep,
        };
    }

    if !priorities.is_empty() {
        let mut options = names(priorities);
        options.push(format!("Keep ({})", detail.priority_name()));
        let picked = console.choice("Priority", &options, options.len() - 1)?;
        edit.priority_id = priorities.get(picked).map(|p| p.id);
    }

    edit.deadline = ask_date_change(
        console,
        &format!(
            "Deadline [{}] (YYYY-MM-DD or 'clear')",
            format_date(task.deadline)
        ),
    )?;
    edit.expected_date = ask_date_change(
        console,
        &format!(
            "Expected date [{}] (YYYY-MM-DD or 'clear')",
            format_date(task.expected_date)
        ),
    )?;
    Ok(edit)
}

/// Edits a task's fields. Status is changed by `task:status` only.
pub fn cmd_edit<R: BufRead, W: Write>(
    store: &Store,
    console: &mut Console<R, W>,
    id: i64,
    args: EditArgs,
) -> Result<()> {
    let detail = store.find_task(id)?;
    let priorities = store.list_priorities()?;
    let categories = store.list_categories()?;

    let edit = if args.has_flags() {
        edit_from_flags(args, &priorities, &categories)?
    } else {
        console.line(format!("  Editing Task #{}: {}", detail.task.id, detail.task.name))?;
        console.line("  Press Enter to keep the current value.")?;
        console.blank()?;
        edit_interactively(console, &detail, &priorities, &categories)?
    };

    let mut task = detail.task;
    apply_edit(&mut task, edit)?;
    store.save_task(&mut task)?;

    console.blank()?;
    console.line(format!("  Task #{} updated.", task.id))?;
    console.blank()?;
    Ok(())
}

fn print_json<R: BufRead, W: Write, T: serde::Serialize + ?Sized>(
    console: &mut Console<R, W>,
    value: &T,
) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    console.line(s)
}

/// Lists tasks matching the flags, most urgent priority first.
///
/// Done and Cancelled tasks are hidden unless `--all` or `--status` is given.
pub fn cmd_list<R: BufRead, W: Write>(
    store: &Store,
    console: &mut Console<R, W>,
    options: &ListOptions,
    json: bool,
    clock: Clock,
) -> Result<usize> {
    let filter = options.resolve(store)?;
    let tasks = store.query_tasks(&filter, clock.today)?;
    if json {
        print_json(console, &tasks)?;
        return Ok(tasks.len());
    }
    if tasks.is_empty() {
        console.line("  No tasks found.")?;
        return Ok(0);
    }
    console.blank()?;
    console.line(task_table(&tasks, clock.today).to_string())?;
    Ok(tasks.len())
}

/// Shows unprocessed tasks.
pub fn cmd_inbox<R: BufRead, W: Write>(
    store: &Store,
    console: &mut Console<R, W>,
    json: bool,
    clock: Clock,
) -> Result<usize> {
    let tasks = store.query_tasks(&TaskFilter::inbox(), clock.today)?;
    if json {
        print_json(console, &tasks)?;
        return Ok(tasks.len());
    }
    console.blank()?;
    if tasks.is_empty() {
        console.line("  Inbox is empty. You're all caught up!")?;
        console.blank()?;
        return Ok(0);
    }
    console.line(format!("  Inbox ({} tasks)", tasks.len()))?;
    console.blank()?;
    console.line(inbox_table(&tasks, clock.today).to_string())?;
    console.line("  Tip: Run `todo task:status <id> <status>` to process items.")?;
    console.blank()?;
    Ok(tasks.len())
}

pub fn cmd_show<R: BufRead, W: Write>(
    store: &Store,
    console: &mut Console<R, W>,
    id: i64,
    json: bool,
    clock: Clock,
) -> Result<()> {
    let detail = store.find_task(id)?;
    if json {
        return print_json(console, &detail);
    }
    console.blank()?;
    for line in task_detail_lines(&detail, clock.today) {
        console.line(line)?;
    }
    console.blank()?;
    Ok(())
}

/// Moves a task to another status, by fuzzy name or from a menu.
pub fn cmd_status<R: BufRead, W: Write>(
    store: &Store,
    console: &mut Console<R, W>,
    id: i64,
    status: Option<String>,
    clock: Clock,
) -> Result<TaskStatus> {
    let detail = store.find_task(id)?;
    console.line(format!("  Task #{}: {}", detail.task.id, detail.task.name))?;
    console.line(format!("  Current status: {}", detail.status_name()))?;
    console.blank()?;

    let statuses = store.list_statuses()?;
    let target = match non_empty(status) {
        Some(name) => match find_by_name_fuzzy(&statuses, &name) {
            Some(s) => s.clone(),
            None => {
                console.line(format!("  Available statuses: {}", names(&statuses).join(", ")))?;
                return Err(Error::status_not_found(&name));
            }
        },
        None => {
            let current = statuses
                .iter()
                .position(|s| s.id == detail.task.status_id)
                .unwrap_or(0);
            let picked = console.choice("Move to status", &names(&statuses), current)?;
            statuses[picked].clone()
        }
    };

    let mut task = detail.task;
    let transition = lifecycle::transition(&mut task, &target, clock.now);
    store.save_task(&mut task)?;

    console.line(format!("  Status changed to: {}", target.name))?;
    if let Some(completed_at) = transition.completed_at {
        console.line(format!("  Task completed at {}", format_timestamp(completed_at)))?;
    }
    console.blank()?;
    Ok(target)
}

/// Prompts for every review decision on a [`Console`].
pub struct ConsoleReviewer<'a, R, W> {
    console: &'a mut Console<R, W>,
}

impl<'a, R: BufRead, W: Write> ConsoleReviewer<'a, R, W> {
    pub fn new(console: &'a mut Console<R, W>) -> Self {
        ConsoleReviewer { console }
    }

    fn status_choice(
        &mut self,
        question: &str,
        statuses: &[TaskStatus],
        skip_label: &str,
    ) -> Result<StatusDecision> {
        let mut options = names(statuses);
        options.push(skip_label.to_string());
        let picked = self.console.choice(question, &options, options.len() - 1)?;
        Ok(match statuses.get(picked) {
            Some(status) => StatusDecision::MoveTo(status.id),
            None => StatusDecision::Skip,
        })
    }
}

impl<R: BufRead, W: Write> ReviewDecider for ConsoleReviewer<'_, R, W> {
    fn phase_started(&mut self, phase: Phase, count: usize) -> Result<()> {
        let line = match (phase, count) {
            (Phase::Triage, 0) => "  Inbox is empty, nothing to process.".to_string(),
            (Phase::Triage, n) => format!("  Step 1: Process Inbox ({n} items)"),
            (Phase::Reassess, 0) => "  No active tasks to review.".to_string(),
            (Phase::Reassess, n) => format!("  Step 2: Review Active Tasks ({n} items)"),
            (Phase::ResolveOverdue, 0) => "  No overdue tasks.".to_string(),
            (Phase::ResolveOverdue, n) => format!("  Step 3: Overdue Tasks ({n} items)"),
        };
        self.console.line(line)?;
        self.console.blank()
    }

    fn triage(&mut self, task: &TaskDetail, statuses: &[TaskStatus]) -> Result<StatusDecision> {
        self.console
            .line(format!("  #{} {}", task.task.id, task.task.name))?;
        if let Some(description) = &task.task.description {
            self.console.line(format!("    {description}"))?;
        }
        self.status_choice("Move to", statuses, "Skip")
    }

    fn reassess(
        &mut self,
        task: &TaskDetail,
        statuses: &[TaskStatus],
        overdue: bool,
    ) -> Result<StatusDecision> {
        self.console.line(format!(
            "  #{} {} [{} | {}]",
            task.task.id,
            task.task.name,
            task.status_name(),
            task.priority_name()
        ))?;
        if let Some(deadline) = task.task.deadline {
            let deadline = format_date(Some(deadline));
            if overdue {
                self.console.line(format!("    ! Overdue: {deadline}"))?;
            } else {
                self.console.line(format!("    Deadline: {deadline}"))?;
            }
        }
        self.status_choice("Action", statuses, "Keep as is")
    }

    fn resolve_overdue(&mut self, task: &TaskDetail, days_overdue: i64) -> Result<OverdueAction> {
        self.console.line(format!(
            "  #{} {} (overdue by {} days)",
            task.task.id, task.task.name, days_overdue
        ))?;
        let options: Vec<String> = ["Reschedule", "Mark as done", "Cancel", "Skip"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let picked = self.console.choice("Action", &options, options.len() - 1)?;
        Ok(match picked {
            0 => loop {
                let answer = self.console.ask("New deadline (YYYY-MM-DD)")?;
                if answer.trim().is_empty() {
                    break OverdueAction::Skip;
                }
                match parse_date(&answer) {
                    Ok(date) => break OverdueAction::Reschedule(date),
                    Err(e) => self.console.line(format!("  {e}"))?,
                }
            },
            1 => OverdueAction::MarkDone,
            2 => OverdueAction::Cancel,
            _ => OverdueAction::Skip,
        })
    }

    fn outcome(&mut self, _task: &TaskDetail, outcome: &Outcome) -> Result<()> {
        let line = match outcome {
            Outcome::Skipped => "    -> Skipped".to_string(),
            Outcome::Moved { status } => format!("    -> Moved to {status}"),
            Outcome::Rescheduled { deadline } => {
                format!("    -> Rescheduled to {}", format_date(Some(*deadline)))
            }
            Outcome::Completed { status } => format!("    -> Marked as done ({status})"),
            Outcome::Cancelled { status } => format!("    -> Cancelled ({status})"),
            Outcome::Failed { reason } => format!("    -> Not changed: {reason}"),
        };
        self.console.line(line)
    }
}

/// Runs the interactive weekly review.
pub fn cmd_review<R: BufRead, W: Write>(
    store: &Store,
    console: &mut Console<R, W>,
    clock: Clock,
) -> Result<ReviewReport> {
    console.blank()?;
    console.line("  Weekly Review")?;
    console.line(format!("  {}", "-".repeat(50)))?;
    console.blank()?;

    let report = {
        let mut reviewer = ConsoleReviewer::new(console);
        run_review(store, &mut reviewer, clock)?
    };

    console.blank()?;
    console.line(format!(
        "  Review complete! {} task(s) updated.",
        report.total_changed()
    ))?;
    console.blank()?;
    Ok(report)
}

fn setup_statuses<R: BufRead, W: Write>(
    store: &Store,
    console: &mut Console<R, W>,
    use_defaults: bool,
) -> Result<()> {
    console.blank()?;
    console.line("  Task Statuses (GTD Workflow)")?;
    let defaults: Vec<&str> = DEFAULT_STATUSES.iter().map(|(name, _)| *name).collect();
    console.line(format!("  Defaults: {}", defaults.join(", ")))?;
    console.blank()?;

    let custom = !use_defaults
        && console.choice(
            "How would you like to set up statuses?",
            &["Use GTD defaults".to_string(), "Enter my own".to_string()],
            0,
        )? == 1;

    if custom {
        console.line("  Enter your statuses. For each, you'll assign a type:")?;
        console.line("    inbox     - Unprocessed items (capture bucket)")?;
        console.line("    active    - Items you're working on or tracking")?;
        console.line("    done      - Completed items")?;
        console.line("    cancelled - Dropped items")?;
        console.blank()?;
        let entered = split_names(&console.ask("Enter your statuses (comma-separated)")?);
        if !entered.is_empty() {
            let kinds: Vec<String> = StatusCategory::ALL
                .iter()
                .map(|c| c.as_str().to_string())
                .collect();
            for name in entered {
                let picked = console.choice(&format!("Type for \"{name}\""), &kinds, 1)?;
                store.insert_status(&name, StatusCategory::ALL[picked])?;
            }
            console.line("  Custom statuses created.")?;
            if store.find_status_by_category(StatusCategory::Inbox)?.is_none() {
                console.line("  Note: no inbox status, new tasks will start in the first status.")?;
            }
            if store.find_status_by_category(StatusCategory::Done)?.is_none() {
                console.line("  Note: no done status, reviews cannot mark tasks as done.")?;
            }
            return Ok(());
        }
        console.line("  No statuses entered, using the defaults.")?;
    }
    store.seed_default_statuses()?;
    console.line("  Default statuses created.")
}

fn setup_priorities<R: BufRead, W: Write>(
    store: &Store,
    console: &mut Console<R, W>,
    use_defaults: bool,
) -> Result<()> {
    console.blank()?;
    console.line("  Task Priorities")?;
    console.line("  Defaults: Low, Medium, High, Urgent")?;
    console.blank()?;

    let custom = !use_defaults
        && console.choice(
            "How would you like to set up priorities?",
            &["Use defaults".to_string(), "Enter my own".to_string()],
            0,
        )? == 1;

    if custom {
        let entered = split_names(
            &console.ask("Enter your priorities (comma-separated, from lowest to highest)")?,
        );
        if !entered.is_empty() {
            store.insert_priorities_in_order(&entered)?;
            console.line("  Custom priorities created.")?;
            return Ok(());
        }
        console.line("  No priorities entered, using the defaults.")?;
    }
    store.seed_default_priorities()?;
    console.line("  Default priorities created.")
}

fn setup_categories<R: BufRead, W: Write>(
    store: &Store,
    console: &mut Console<R, W>,
    use_defaults: bool,
) -> Result<()> {
    console.blank()?;
    console.line("  Task Categories")?;
    console.line("  Defaults: Personal, Work, Learning")?;
    console.blank()?;

    let custom = !use_defaults
        && console.choice(
            "How would you like to set up categories?",
            &["Use defaults".to_string(), "Enter my own".to_string()],
            0,
        )? == 1;

    if custom {
        // An empty list is allowed: categories are optional.
        for name in split_names(&console.ask("Enter your categories (comma-separated)")?) {
            store.insert_category(&name)?;
        }
        return console.line("  Custom categories created.");
    }
    store.seed_default_categories()?;
    console.line("  Default categories created.")
}

/// Creates the database and configures statuses, priorities and categories.
///
/// On an installed database nothing changes unless the user confirms a
/// reconfiguration, which replaces the reference data but keeps all tasks.
/// Returns whether reference data was written.
pub fn cmd_install<R: BufRead, W: Write>(
    path: &Path,
    console: &mut Console<R, W>,
    use_defaults: bool,
) -> Result<bool> {
    console.blank()?;
    console.line("  Welcome to Todo CLI!")?;
    console.line("  Let's set things up.")?;
    console.blank()?;

    let store = Store::create(path)?;
    console.line(format!("  Database: {}", path.display()))?;

    let reconfigure = store.is_installed()?;
    if reconfigure
        && !console.confirm(
            "Your Todo CLI is already set up. Do you want to reconfigure?",
            false,
        )?
    {
        console.line("  All good! Run `todo task:add` to create your first task.")?;
        return Ok(false);
    }

    // A failed step keeps the previous reference data.
    store.in_transaction(|store| {
        if reconfigure {
            store.reset_all()?;
        }
        setup_statuses(store, console, use_defaults)?;
        setup_priorities(store, console, use_defaults)?;
        setup_categories(store, console, use_defaults)
    })?;
    info!(path = %path.display(), "installed");

    console.blank()?;
    console.line("  Todo CLI is ready! Run `todo task:add` to create your first task.")?;
    console.blank()?;
    Ok(true)
}
