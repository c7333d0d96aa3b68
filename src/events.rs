//! Audit event log for dqueue.
//!
//! Mutating commands append one event per call to an NDJSON file (one JSON
//! object per line) when `events_path` is configured. The log records who
//! changed the pool and what the store reported back, so a team can see why
//! a pid moved between queues.
//!
//! # Event Format
//!
//! Each event is a JSON object with the following fields:
//! - `ts`: RFC3339 timestamp
//! - `action`: The action performed (lock, remove, remove_all)
//! - `actor`: The owner string of the process (e.g., `user@HOST`)
//! - `user_id`: The queue user the action was performed for
//! - `details`: Freeform object with action-specific details
//!
//! ```no_run
//! use dqueue::events::{Event, EventAction, append_event};
//! use serde_json::json;
//! use std::path::Path;
//!
//! let event = Event::new(EventAction::Lock, 1)
//!     .with_details(json!({"requested": [1, 2], "locked": [1]}));
//! append_event(Path::new("events.ndjson"), &event)?;
//! # Ok::<(), dqueue::error::QueueError>(())
//! ```

use crate::claims::UserId;
use crate::error::{QueueError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Pids locked for a user
    Lock,
    /// Pids removed from a user's queue
    Remove,
    /// A user's whole queue removed
    RemoveAll,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::Lock => write!(f, "lock"),
            EventAction::Remove => write!(f, "remove"),
            EventAction::RemoveAll => write!(f, "remove_all"),
        }
    }
}

/// An event record for the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    /// The action that was performed.
    pub action: EventAction,

    /// The process owner who performed the action (e.g., `user@HOST`).
    pub actor: String,

    /// The queue user the action was performed for.
    pub user_id: UserId,

    /// Freeform details object with action-specific information.
    pub details: Value,
}

impl Event {
    /// Create a new event with the given action for `user_id`.
    ///
    /// The timestamp is set to the current time, and the actor is
    /// determined from the environment (USER@HOSTNAME).
    pub fn new(action: EventAction, user_id: UserId) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: get_actor_string(),
            user_id,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the details object for this event.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| QueueError::UserError(format!("failed to serialize event to JSON: {}", e)))
    }
}

/// Get the actor string for event metadata.
fn get_actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append an event to the events log at `path`.
///
/// The file and its parent directory are created if missing. Each append
/// writes exactly one line with a trailing newline.
pub fn append_event(path: &Path, event: &Event) -> Result<()> {
    let json_line = event.to_ndjson_line()?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            QueueError::UserError(format!(
                "failed to create events directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            QueueError::UserError(format!(
                "failed to open events file '{}': {}",
                path.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        QueueError::UserError(format!(
            "failed to write event to '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.sync_all().map_err(|e| {
        QueueError::UserError(format!(
            "failed to sync events file '{}': {}",
            path.display(),
            e
        ))
    })?;

    Ok(())
}

/// Read every event from the log at `path`.
pub fn read_events(path: &Path) -> Result<Vec<Event>> {
    let content = fs::read_to_string(path).map_err(|e| {
        QueueError::UserError(format!(
            "failed to read events file '{}': {}",
            path.display(),
            e
        ))
    })?;

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).map_err(|e| {
                QueueError::UserError(format!(
                    "failed to parse event in '{}': {}",
                    path.display(),
                    e
                ))
            })
        })
        .collect()
}
