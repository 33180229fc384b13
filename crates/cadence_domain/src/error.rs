use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// Failures surfaced by an [`ActivityStore`](crate::store::ActivityStore).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to access store at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store contents are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("activity {0} not found")]
    NotFound(Uuid),

    #[error("activity rejected: {0}")]
    Invalid(#[from] ValidationError),
}

/// Failures reported by a [`NotificationSink`](crate::notifications::NotificationSink).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    #[error("notification `{key}` rejected: {reason}")]
    Rejected { key: String, reason: String },

    #[error("notification service unavailable")]
    Unavailable,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("hour {0} is outside 0..=23")]
    Hour(u32),

    #[error("minute {0} is outside 0..=59")]
    Minute(u32),

    #[error("weekday code {0} is outside 1..=7")]
    Weekday(u32),

    #[error("end date {end} is before start date {start}")]
    DateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("activity name must not be empty")]
    EmptyName,

    #[error("reminder offset {0}s is outside one week either side of the start")]
    ReminderOffset(i64),

    #[error("activity is not scheduled on {0}")]
    NotScheduled(chrono::NaiveDate),
}
