use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Final state of one user's import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    /// The time budget ran out; `last_message_id` is the resumable
    /// watermark and the remaining messages stay unread.
    TimedOut,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::TimedOut => "timed_out",
            RunStatus::Failed => "failed",
        }
    }
}

/// Why a message was skipped instead of imported. Skips are outcomes,
/// not errors: they are counted and logged, never propagated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum SkipReason {
    FetchError(String),
    UnmatchedDomain(String),
    AmbiguousDomain(String),
    ParseFailure(String),
    Duplicate(String),
    PersistenceError(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::FetchError(detail) => write!(f, "fetch error: {}", detail),
            SkipReason::UnmatchedDomain(sender) => {
                write!(f, "no account linked to sender '{}'", sender)
            }
            SkipReason::AmbiguousDomain(domain) => {
                write!(f, "domain '{}' is linked to multiple accounts", domain)
            }
            SkipReason::ParseFailure(detail) => write!(f, "parse failure: {}", detail),
            SkipReason::Duplicate(email_id) => {
                write!(f, "already imported from message '{}'", email_id)
            }
            SkipReason::PersistenceError(detail) => {
                write!(f, "persistence error: {}", detail)
            }
        }
    }
}

/// Outcome of one message moving through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageOutcome {
    Imported(String),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedMessage {
    pub message_id: String,
    pub reason: SkipReason,
}

/// Per-user result folded into the run summary. Failures for one user
/// never abort the others.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRunSummary {
    pub user_id: String,
    pub status: RunStatus,
    pub imported: usize,
    pub skipped: Vec<SkippedMessage>,
    /// Watermark: the last message the commit stage got to.
    pub last_message_id: Option<String>,
    pub error: Option<String>,
}

impl UserRunSummary {
    pub fn failed(user_id: &str, error: impl Into<String>) -> Self {
        Self {
            user_id: user_id.to_string(),
            status: RunStatus::Failed,
            imported: 0,
            skipped: Vec::new(),
            last_message_id: None,
            error: Some(error.into()),
        }
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Whole-run summary returned to the trigger surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub users: Vec<UserRunSummary>,
}

impl RunSummary {
    pub fn imported(&self) -> usize {
        self.users.iter().map(|u| u.imported).sum()
    }

    pub fn skipped(&self) -> usize {
        self.users.iter().map(|u| u.skipped_count()).sum()
    }
}

/// Database row bookkeeping one user's run.
#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone,
)]
#[diesel(table_name = crate::schema::import_runs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ImportRun {
    pub id: String,
    pub user_id: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub status: String,
    pub imported_count: i32,
    pub skipped_count: i32,
    pub last_message_id: Option<String>,
}
