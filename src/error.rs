//! Error types for todo-cli
//!
//! Every failure ends the command with exit code 1; success is 0.

use thiserror::Error;

/// Exit codes for the `todo` binary
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Todo CLI is not set up yet. Run `todo task:install` first.")]
    NotInstalled,

    #[error("{0}")]
    Validation(String),

    #[error("{kind} {value} not found.")]
    NotFound { kind: &'static str, value: String },

    /// Reference data lacks something a workflow step needs, e.g. no status
    /// in the Done category. Reported per task, never fatal to a review.
    #[error("{0}")]
    ConfigurationGap(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn task_not_found(id: i64) -> Self {
        Error::NotFound {
            kind: "Task",
            value: format!("#{id}"),
        }
    }

    pub fn status_not_found(name: &str) -> Self {
        Error::NotFound {
            kind: "Status",
            value: format!("\"{name}\""),
        }
    }

    pub fn exit_code(&self) -> i32 {
        exit_codes::FAILURE
    }
}

pub type Result<T> = std::result::Result<T, Error>;
