//! # Todo CLI
//!
//! A personal task tracker for the terminal built around the GTD (Getting
//! Things Done) workflow: capture everything in the Inbox, triage it into
//! active statuses, and close it out as Done or Cancelled.
//!
//! ## Features
//!
//! *   **Your own vocabulary**: statuses, priorities and categories are
//!     configured at install time. Every status belongs to one of four fixed
//!     categories (Inbox, Active, Done, Cancelled), which is what drives the
//!     behaviour; the names are yours.
//! *   **Completion tracking**: moving a task into a Done status stamps its
//!     completion time, moving it anywhere else clears it.
//! *   **Overdue detection**: computed on every read from the deadline and the
//!     status category, never stored.
//! *   **Filtering**: by status, category, priority, overdue state and free
//!     text, sorted by priority.
//! *   **Weekly review**: process the inbox, reassess active work, and deal
//!     with everything overdue in one guided pass.
//! *   **Data Persistence**: a single SQLite file, `~/.todo/database.sqlite`
//!     by default.
//!
//! ## Usage
//!
//! ```bash
//! # First run: create the database and pick statuses, priorities, categories
//! todo task:install
//!
//! # Capture a task (anything omitted is asked for)
//! todo task:add --name "Write report" --priority High --deadline 2026-03-01
//!
//! # What's waiting to be processed?
//! todo task:inbox
//!
//! # Move it along
//! todo task:status 1 "Next Action"
//! todo task:status 1 Done
//!
//! # Everything still open, or everything at all
//! todo task:list
//! todo task:list --all
//! todo task:list --overdue --category work --search report
//!
//! # Details and edits
//! todo task:show 1
//! todo task:edit 1 --deadline clear
//!
//! # Weekly review
//! todo task:review
//! ```
//!
//! ## Data Storage
//!
//! The database location is, in order of precedence, the `--db` flag, the
//! `TODO_DB` environment variable, or `~/.todo/database.sqlite`.
//!
//! ## Logging
//!
//! Diagnostics go to stderr and are off by default. Set `RUST_LOG`, e.g.
//! `RUST_LOG=todo_cli=debug`, to see them.

pub mod commands;
pub mod display;
pub mod error;
pub mod filter;
pub mod lifecycle;
pub mod models;
pub mod prompt;
pub mod reference;
pub mod repository;
pub mod review;
pub mod storage;
