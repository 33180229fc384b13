use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::activity::Activity;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    Created,
    Edited,
    Completed,
    Skipped,
}

/// Append-only log record. The activity's display fields are copied in so the
/// record stays meaningful after the activity itself is deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEvent {
    id: Uuid,
    date: NaiveDateTime,
    kind: HistoryKind,
    activity_id: Option<Uuid>,
    activity_name: String,
    #[serde(default)]
    activity_symbol: String,
    #[serde(default)]
    activity_color: String,
    #[serde(default)]
    end_date: Option<NaiveDateTime>,
}

impl HistoryEvent {
    pub fn for_activity(activity: &Activity, kind: HistoryKind, at: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: at,
            kind,
            activity_id: Some(activity.id),
            activity_name: activity.name.clone(),
            activity_symbol: activity.symbol.clone(),
            activity_color: activity.color.clone(),
            end_date: None,
        }
    }

    /// Record for an activity that is no longer available, keyed by name only.
    #[cfg(test)]
    pub(crate) fn detached(name: impl Into<String>, kind: HistoryKind, at: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: at,
            kind,
            activity_id: None,
            activity_name: name.into(),
            activity_symbol: String::new(),
            activity_color: String::new(),
            end_date: None,
        }
    }

    pub fn with_end_date(mut self, end: NaiveDateTime) -> Self {
        self.end_date = Some(end);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn date(&self) -> NaiveDateTime {
        self.date
    }

    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }

    pub fn kind(&self) -> HistoryKind {
        self.kind
    }

    pub fn is_completion(&self) -> bool {
        self.kind == HistoryKind::Completed
    }

    pub fn activity_id(&self) -> Option<Uuid> {
        self.activity_id
    }

    pub fn activity_name(&self) -> &str {
        &self.activity_name
    }

    pub fn activity_symbol(&self) -> &str {
        &self.activity_symbol
    }

    pub fn activity_color(&self) -> &str {
        &self.activity_color
    }

    pub fn end_date(&self) -> Option<NaiveDateTime> {
        self.end_date
    }

    /// Time between `date` and `end_date`; zero when open-ended or inverted.
    pub fn duration(&self) -> Duration {
        match self.end_date {
            Some(end) if end > self.date => end - self.date,
            _ => Duration::zero(),
        }
    }
}
