//! Composable task filters.
//!
//! A [`TaskFilter`] is a set of independent clauses that are AND-combined into
//! one SQL predicate. `task:list` builds one from command-line flags through
//! [`ListOptions`]; the inbox and the weekly review use the fixed views
//! [`TaskFilter::inbox`], [`TaskFilter::active`] and
//! [`TaskFilter::overdue_only`].

use chrono::NaiveDate;
use rusqlite::types::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::StatusCategory;
use crate::reference::find_by_name_fuzzy;
use crate::storage::Store;

/// Which statuses a filter admits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusScope {
    Any,
    Exact(i64),
    Categories(Vec<StatusCategory>),
}

const OPEN_CATEGORIES: [StatusCategory; 2] = [StatusCategory::Inbox, StatusCategory::Active];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: StatusScope,
    pub category_id: Option<i64>,
    pub priority_id: Option<i64>,
    /// Past deadline and still Inbox or Active.
    pub overdue: bool,
    /// Case-insensitive substring of the name or the description.
    pub search: Option<String>,
}

impl Default for TaskFilter {
    /// The default list view: everything that is not Done or Cancelled.
    fn default() -> Self {
        TaskFilter {
            status: StatusScope::Categories(OPEN_CATEGORIES.to_vec()),
            category_id: None,
            priority_id: None,
            overdue: false,
            search: None,
        }
    }
}

impl TaskFilter {
    pub fn all() -> Self {
        TaskFilter {
            status: StatusScope::Any,
            ..TaskFilter::default()
        }
    }

    pub fn in_category(category: StatusCategory) -> Self {
        TaskFilter {
            status: StatusScope::Categories(vec![category]),
            ..TaskFilter::default()
        }
    }

    pub fn inbox() -> Self {
        Self::in_category(StatusCategory::Inbox)
    }

    pub fn active() -> Self {
        Self::in_category(StatusCategory::Active)
    }

    pub fn overdue_only() -> Self {
        TaskFilter {
            overdue: true,
            ..TaskFilter::default()
        }
    }

    /// Renders the filter as a WHERE predicate (without the keyword) plus its
    /// positional parameters. An empty string means "no restriction".
    pub fn to_sql(&self, today: NaiveDate) -> (String, Vec<Value>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        match &self.status {
            StatusScope::Any => {}
            StatusScope::Exact(id) => {
                clauses.push("t.status_id = ?".into());
                values.push(Value::Integer(*id));
            }
            StatusScope::Categories(categories) if categories.is_empty() => {
                clauses.push("0".into());
            }
            StatusScope::Categories(categories) => {
                clauses.push(category_membership(categories, &mut values));
            }
        }

        if let Some(id) = self.category_id {
            clauses.push("t.category_id = ?".into());
            values.push(Value::Integer(id));
        }

        if let Some(id) = self.priority_id {
            clauses.push("t.priority_id = ?".into());
            values.push(Value::Integer(id));
        }

        if self.overdue {
            values.push(Value::Text(today.format("%Y-%m-%d").to_string()));
            let open = category_membership(&OPEN_CATEGORIES, &mut values);
            clauses.push(format!(
                "(t.deadline IS NOT NULL AND t.deadline < ? AND {open})"
            ));
        }

        if let Some(needle) = self.search.as_deref().filter(|s| !s.is_empty()) {
            // instr() matches literally, so `%` and `_` need no escaping.
            clauses.push(
                "(instr(fold_case(t.name), ?) > 0 \
                 OR instr(fold_case(IFNULL(t.description, '')), ?) > 0)"
                    .into(),
            );
            let folded = needle.to_lowercase();
            values.push(Value::Text(folded.clone()));
            values.push(Value::Text(folded));
        }

        (clauses.join(" AND "), values)
    }
}

fn category_membership(categories: &[StatusCategory], values: &mut Vec<Value>) -> String {
    let placeholders = vec!["?"; categories.len()].join(", ");
    for category in categories {
        values.push(Value::Text(category.as_str().to_string()));
    }
    format!("s.category IN ({placeholders})")
}

/// Raw `task:list` flags, before any name lookup.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub status: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub overdue: bool,
    pub all: bool,
    pub search: Option<String>,
}

impl ListOptions {
    /// Looks up the named status, category and priority.
    ///
    /// An unknown status is an error because it decides what the view shows
    /// at all. Unknown categories and priorities drop their clause.
    pub fn resolve(&self, store: &Store) -> Result<TaskFilter> {
        let status = match self.status.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(name) => {
                let statuses = store.list_statuses()?;
                let status = find_by_name_fuzzy(&statuses, name)
                    .ok_or_else(|| Error::status_not_found(name))?;
                StatusScope::Exact(status.id)
            }
            None if self.all => StatusScope::Any,
            None => StatusScope::Categories(OPEN_CATEGORIES.to_vec()),
        };

        let category_id = match self.category.as_deref() {
            Some(name) => {
                let categories = store.list_categories()?;
                let found = find_by_name_fuzzy(&categories, name).map(|c| c.id);
                if found.is_none() {
                    debug!(category = name, "category filter matched nothing, ignoring");
                }
                found
            }
            None => None,
        };

        let priority_id = match self.priority.as_deref() {
            Some(name) => {
                let priorities = store.list_priorities()?;
                let found = find_by_name_fuzzy(&priorities, name).map(|p| p.id);
                if found.is_none() {
                    debug!(priority = name, "priority filter matched nothing, ignoring");
                }
                found
            }
            None => None,
        };

        Ok(TaskFilter {
            status,
            category_id,
            priority_id,
            overdue: self.overdue,
            search: self.search.clone().filter(|s| !s.is_empty()),
        })
    }
}
