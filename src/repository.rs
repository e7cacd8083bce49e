//! Task persistence.

use chrono::{NaiveDate, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::filter::TaskFilter;
use crate::models::{Task, TaskCategory, TaskDetail, TaskPriority, TaskStatus};
use crate::storage::Store;

/// Fields for a task that has not been stored yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub priority_id: Option<i64>,
    pub status_id: Option<i64>,
    pub deadline: Option<NaiveDate>,
    pub expected_date: Option<NaiveDate>,
}

pub(crate) const SELECT_DETAIL: &str = "SELECT
    t.id, t.name, t.description, t.category_id, t.priority_id, t.status_id,
    t.deadline, t.expected_date, t.completed_at, t.created_at, t.updated_at,
    s.id, s.name, s.category,
    p.id, p.name, p.level,
    c.id, c.name
FROM tasks t
LEFT JOIN task_statuses s ON s.id = t.status_id
LEFT JOIN task_priorities p ON p.id = t.priority_id
LEFT JOIN task_categories c ON c.id = t.category_id";

fn row_to_detail(row: &Row) -> rusqlite::Result<TaskDetail> {
    let task = Task {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category_id: row.get(3)?,
        priority_id: row.get(4)?,
        status_id: row.get(5)?,
        deadline: row.get(6)?,
        expected_date: row.get(7)?,
        completed_at: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    };
    let status = match row.get::<_, Option<i64>>(11)? {
        Some(id) => Some(TaskStatus {
            id,
            name: row.get(12)?,
            category: row.get(13)?,
        }),
        None => None,
    };
    let priority = match row.get::<_, Option<i64>>(14)? {
        Some(id) => Some(TaskPriority {
            id,
            name: row.get(15)?,
            level: row.get(16)?,
        }),
        None => None,
    };
    let category = match row.get::<_, Option<i64>>(17)? {
        Some(id) => Some(TaskCategory {
            id,
            name: row.get(18)?,
        }),
        None => None,
    };
    Ok(TaskDetail {
        task,
        status,
        priority,
        category,
    })
}

impl Store {
    /// Inserts a new task and returns its id.
    ///
    /// Fails with [`Error::Validation`] when the name is blank or the status or
    /// priority is missing; nothing is written in that case.
    pub fn create_task(&self, new: &NewTask) -> Result<i64> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Task name is required.".into()));
        }
        let priority_id = new
            .priority_id
            .ok_or_else(|| Error::Validation("Task priority is required.".into()))?;
        let status_id = new
            .status_id
            .ok_or_else(|| Error::Validation("Task status is required.".into()))?;

        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO tasks (name, description, category_id, priority_id, status_id,
                                deadline, expected_date, completed_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, ?8, ?8)",
            params![
                name,
                new.description,
                new.category_id,
                priority_id,
                status_id,
                new.deadline,
                new.expected_date,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(id, task = name, "task created");
        Ok(id)
    }

    pub fn find_task(&self, id: i64) -> Result<TaskDetail> {
        let sql = format!("{SELECT_DETAIL} WHERE t.id = ?1");
        self.conn
            .query_row(&sql, params![id], row_to_detail)
            .optional()?
            .ok_or_else(|| Error::task_not_found(id))
    }

    /// Writes every mutable field of `task` back and refreshes `updated_at`.
    pub fn save_task(&self, task: &mut Task) -> Result<()> {
        task.updated_at = Utc::now();
        let changed = self.conn.execute(
            "UPDATE tasks SET name = ?1, description = ?2, category_id = ?3, priority_id = ?4,
                              status_id = ?5, deadline = ?6, expected_date = ?7,
                              completed_at = ?8, updated_at = ?9
             WHERE id = ?10",
            params![
                task.name,
                task.description,
                task.category_id,
                task.priority_id,
                task.status_id,
                task.deadline,
                task.expected_date,
                task.completed_at,
                task.updated_at,
                task.id,
            ],
        )?;
        if changed == 0 {
            return Err(Error::task_not_found(task.id));
        }
        info!(id = task.id, "task updated");
        Ok(())
    }

    /// Tasks matching `filter`, most urgent priority first.
    pub fn query_tasks(&self, filter: &TaskFilter, today: NaiveDate) -> Result<Vec<TaskDetail>> {
        let (clause, values) = filter.to_sql(today);
        let mut sql = String::from(SELECT_DETAIL);
        if !clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        sql.push_str(" ORDER BY p.level DESC, t.id ASC");
        debug!(%sql, "querying tasks");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), row_to_detail)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count_tasks(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?)
    }
}
