use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;

/// Fixed lifecycle classification of a status.
///
/// Users name their statuses freely; the category is what the application
/// logic looks at.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StatusCategory {
    Inbox,
    Active,
    Done,
    Cancelled,
}

impl StatusCategory {
    pub const ALL: [StatusCategory; 4] = [
        StatusCategory::Inbox,
        StatusCategory::Active,
        StatusCategory::Done,
        StatusCategory::Cancelled,
    ];

    /// The value stored in the `task_statuses.category` column.
    pub fn as_str(self) -> &'static str {
        match self {
            StatusCategory::Inbox => "inbox",
            StatusCategory::Active => "active",
            StatusCategory::Done => "done",
            StatusCategory::Cancelled => "cancelled",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusCategory::Inbox => "Inbox",
            StatusCategory::Active => "Active",
            StatusCategory::Done => "Done",
            StatusCategory::Cancelled => "Cancelled",
        }
    }

    /// Done and Cancelled end a task's lifecycle.
    pub fn is_terminal(self) -> bool {
        matches!(self, StatusCategory::Done | StatusCategory::Cancelled)
    }

    /// Inbox and Active tasks still need attention.
    pub fn is_open(self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatusCategory(pub String);

impl fmt::Display for UnknownStatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown status category '{}' (expected inbox, active, done or cancelled)",
            self.0
        )
    }
}

impl std::error::Error for UnknownStatusCategory {}

impl FromStr for StatusCategory {
    type Err = UnknownStatusCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inbox" => Ok(StatusCategory::Inbox),
            "active" => Ok(StatusCategory::Active),
            "done" => Ok(StatusCategory::Done),
            "cancelled" => Ok(StatusCategory::Cancelled),
            _ => Err(UnknownStatusCategory(s.to_string())),
        }
    }
}

impl ToSql for StatusCategory {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for StatusCategory {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: UnknownStatusCategory| FromSqlError::Other(Box::new(e)))
    }
}

/// A user-defined status, e.g. "Next Action" in the Active category.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TaskStatus {
    pub id: i64,
    pub name: String,
    pub category: StatusCategory,
}

/// A user-defined priority. Higher `level` means more urgent.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TaskPriority {
    pub id: i64,
    pub name: String,
    pub level: i64,
}

/// A free grouping label such as "Work".
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TaskCategory {
    pub id: i64,
    pub name: String,
}

/// Anything that can be looked up by name.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for TaskStatus {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for TaskPriority {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for TaskCategory {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A single task as stored in the `tasks` table.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Task {
    /// Unique identifier for the task.
    pub id: i64,
    /// Short name, never empty.
    pub name: String,
    /// Optional free-form notes.
    pub description: Option<String>,
    /// Optional category reference.
    pub category_id: Option<i64>,
    /// Priority reference.
    pub priority_id: i64,
    /// Status reference.
    pub status_id: i64,
    /// Hard deadline.
    pub deadline: Option<NaiveDate>,
    /// Date the user expects to get to the task.
    pub expected_date: Option<NaiveDate>,
    /// Set exactly while the status is in the Done category.
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task together with its resolved reference rows.
///
/// References are optional because reconfiguring the reference data can leave
/// a task pointing at a status, priority or category that no longer exists.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category: Option<TaskCategory>,
}

impl TaskDetail {
    pub fn status_category(&self) -> Option<StatusCategory> {
        self.status.as_ref().map(|s| s.category)
    }

    pub fn status_name(&self) -> &str {
        self.status.as_ref().map(|s| s.name.as_str()).unwrap_or("-")
    }

    pub fn priority_name(&self) -> &str {
        self.priority.as_ref().map(|p| p.name.as_str()).unwrap_or("-")
    }

    pub fn category_name(&self) -> &str {
        self.category.as_ref().map(|c| c.name.as_str()).unwrap_or("-")
    }

    /// See [`crate::lifecycle::is_overdue`].
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.status_category() {
            Some(category) => crate::lifecycle::is_overdue(self.task.deadline, category, today),
            None => false,
        }
    }
}
