//! Reference data: the user's statuses, priorities and categories.

use rusqlite::{params, OptionalExtension};
use tracing::info;

use crate::error::Result;
use crate::models::{Named, StatusCategory, TaskCategory, TaskPriority, TaskStatus};
use crate::storage::Store;

pub const DEFAULT_STATUSES: [(&str, StatusCategory); 6] = [
    ("Inbox", StatusCategory::Inbox),
    ("Next Action", StatusCategory::Active),
    ("Waiting For", StatusCategory::Active),
    ("Someday/Maybe", StatusCategory::Active),
    ("Done", StatusCategory::Done),
    ("Cancelled", StatusCategory::Cancelled),
];

pub const DEFAULT_PRIORITIES: [(&str, i64); 4] =
    [("Low", 0), ("Medium", 10), ("High", 20), ("Urgent", 30)];

pub const DEFAULT_CATEGORIES: [&str; 3] = ["Personal", "Work", "Learning"];

/// Level gap between consecutive custom priorities.
pub const PRIORITY_LEVEL_STEP: i64 = 10;

/// Case-insensitive substring lookup; the first match in `items` order wins.
///
/// Several items may contain the query. No attempt is made to pick the
/// closest one.
pub fn find_by_name_fuzzy<'a, T: Named>(items: &'a [T], query: &str) -> Option<&'a T> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    items
        .iter()
        .find(|item| item.name().to_lowercase().contains(&needle))
}

/// Splits comma-separated user input, dropping blank entries.
pub fn split_names(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

impl Store {
    pub fn list_statuses(&self) -> Result<Vec<TaskStatus>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, category FROM task_statuses ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(TaskStatus {
                id: row.get(0)?,
                name: row.get(1)?,
                category: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Priorities ordered by level, lowest first; equal levels keep insertion order.
    pub fn list_priorities(&self) -> Result<Vec<TaskPriority>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, level FROM task_priorities ORDER BY level, id")?;
        let rows = stmt.query_map([], |row| {
            Ok(TaskPriority {
                id: row.get(0)?,
                name: row.get(1)?,
                level: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn list_categories(&self) -> Result<Vec<TaskCategory>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM task_categories ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(TaskCategory {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// First status (by id) in the given category.
    pub fn find_status_by_category(&self, category: StatusCategory) -> Result<Option<TaskStatus>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, category FROM task_statuses WHERE category = ?1 ORDER BY id LIMIT 1",
                params![category],
                |row| {
                    Ok(TaskStatus {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        category: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn insert_status(&self, name: &str, category: StatusCategory) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO task_statuses (name, category) VALUES (?1, ?2)",
            params![name, category],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_priority(&self, name: &str, level: i64) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO task_priorities (name, level) VALUES (?1, ?2)",
            params![name, level],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_category(&self, name: &str) -> Result<i64> {
        self.conn
            .execute("INSERT INTO task_categories (name) VALUES (?1)", params![name])?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Inserts custom priorities, lowest first, spaced by [`PRIORITY_LEVEL_STEP`].
    pub fn insert_priorities_in_order(&self, names: &[String]) -> Result<()> {
        for (index, name) in names.iter().enumerate() {
            self.insert_priority(name, index as i64 * PRIORITY_LEVEL_STEP)?;
        }
        Ok(())
    }

    pub fn seed_default_statuses(&self) -> Result<()> {
        for (name, category) in DEFAULT_STATUSES {
            self.insert_status(name, category)?;
        }
        Ok(())
    }

    pub fn seed_default_priorities(&self) -> Result<()> {
        for (name, level) in DEFAULT_PRIORITIES {
            self.insert_priority(name, level)?;
        }
        Ok(())
    }

    pub fn seed_default_categories(&self) -> Result<()> {
        for name in DEFAULT_CATEGORIES {
            self.insert_category(name)?;
        }
        Ok(())
    }

    pub fn seed_defaults(&self) -> Result<()> {
        self.seed_default_statuses()?;
        self.seed_default_priorities()?;
        self.seed_default_categories()
    }

    /// Deletes every status, priority and category. Tasks are left alone and
    /// may afterwards reference ids that no longer exist; AUTOINCREMENT keeps
    /// those ids from being handed out again.
    pub fn reset_all(&self) -> Result<()> {
        self.conn.execute_batch(
            "DELETE FROM task_statuses;
             DELETE FROM task_priorities;
             DELETE FROM task_categories;",
        )?;
        info!("reference data cleared");
        Ok(())
    }
}
