//! Table and detail rendering.

use chrono::{DateTime, Local, NaiveDate, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::lifecycle::DATE_FORMAT;
use crate::models::{TaskDetail, TaskPriority};

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|name| Cell::new(name).add_attribute(Attribute::Bold))
        .collect()
}

fn new_table(columns: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(columns));
    table
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| "-".into())
}

/// Timestamp in the user's local time zone.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn priority_color(priority: Option<&TaskPriority>) -> Color {
    match priority.map(|p| p.level).unwrap_or(0) {
        level if level >= 30 => Color::Red,
        level if level >= 20 => Color::Yellow,
        level if level >= 10 => Color::Cyan,
        _ => Color::Grey,
    }
}

fn deadline_cell(detail: &TaskDetail, today: NaiveDate) -> Cell {
    let text = format_date(detail.task.deadline);
    if detail.is_overdue(today) {
        Cell::new(format!("{text} !")).fg(Color::Red)
    } else {
        Cell::new(text)
    }
}

/// The `task:list` table.
pub fn task_table(tasks: &[TaskDetail], today: NaiveDate) -> Table {
    let mut table = new_table(&[
        "ID", "Name", "Category", "Priority", "Status", "Deadline", "Expected",
    ]);
    for t in tasks {
        table.add_row(vec![
            Cell::new(t.task.id),
            Cell::new(&t.task.name),
            Cell::new(t.category_name()),
            Cell::new(t.priority_name()).fg(priority_color(t.priority.as_ref())),
            Cell::new(t.status_name()),
            deadline_cell(t, today),
            Cell::new(format_date(t.task.expected_date)),
        ]);
    }
    table
}

/// The `task:inbox` table.
pub fn inbox_table(tasks: &[TaskDetail], today: NaiveDate) -> Table {
    let mut table = new_table(&["ID", "Name", "Category", "Priority", "Deadline", "Created"]);
    for t in tasks {
        table.add_row(vec![
            Cell::new(t.task.id),
            Cell::new(&t.task.name),
            Cell::new(t.category_name()),
            Cell::new(t.priority_name()).fg(priority_color(t.priority.as_ref())),
            deadline_cell(t, today),
            Cell::new(t.task.created_at.with_timezone(&Local).format(DATE_FORMAT)),
        ]);
    }
    table
}

/// The `task:show` view, one line per entry.
pub fn task_detail_lines(detail: &TaskDetail, today: NaiveDate) -> Vec<String> {
    let task = &detail.task;
    let mut lines = vec![
        format!("  Task #{}: {}", task.id, task.name),
        format!("  {}", "-".repeat(50)),
    ];
    if let Some(description) = &task.description {
        lines.push(String::new());
        lines.push(format!("  {description}"));
    }
    lines.push(String::new());

    let mut details = vec![
        ("Status", detail.status_name().to_string()),
        ("Priority", detail.priority_name().to_string()),
        ("Category", detail.category_name().to_string()),
        ("Deadline", format_date(task.deadline)),
        ("Expected Date", format_date(task.expected_date)),
        ("Created", format_timestamp(task.created_at)),
    ];
    if let Some(completed_at) = task.completed_at {
        details.push(("Completed", format_timestamp(completed_at)));
    }
    for (label, value) in details {
        lines.push(format!("  {label:<15} {value}"));
    }
    if detail.is_overdue(today) {
        lines.push("  ! OVERDUE".into());
    }
    lines
}
