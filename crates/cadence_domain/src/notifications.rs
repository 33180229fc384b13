use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{activity::Activity, agenda::upcoming_occurrences, error::NotificationError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationRequest {
    /// `"{activity_id}-{occurrence_marker}-{offset_seconds}"`.
    pub key: String,
    pub activity_id: Uuid,
    pub title: String,
    pub body: String,
    pub fire_at: NaiveDateTime,
}

/// Platform notification adapters implement this trait.
pub trait NotificationSink: Send + Sync {
    fn schedule(&self, notification: NotificationRequest) -> Result<(), NotificationError>;
    fn cancel_with_prefix(&self, prefix: &str);
    fn pending_keys(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderPolicy {
    pub lookahead_days: u32,
    pub max_pending: usize,
}

impl Default for ReminderPolicy {
    fn default() -> Self {
        Self {
            lookahead_days: 30,
            max_pending: 64,
        }
    }
}

const AT_START: [i64; 1] = [0];

pub fn key_prefix(activity_id: Uuid) -> String {
    format!("{activity_id}-")
}

/// Reminders for the activity's occurrences within the look-ahead window,
/// earliest first and capped at `policy.max_pending`.
pub fn plan_reminders(
    activity: &Activity,
    now: NaiveDateTime,
    policy: ReminderPolicy,
) -> Vec<NotificationRequest> {
    let offsets: &[i64] = if activity.reminder_offsets.is_empty() {
        &AT_START
    } else {
        &activity.reminder_offsets
    };

    let mut planned = Vec::new();
    for occurrence in upcoming_occurrences(activity, now.date(), policy.lookahead_days) {
        let Some(at) = occurrence.time else {
            continue;
        };
        let marker = if activity.is_recurring() {
            occurrence.date.format("%Y%m%d").to_string()
        } else {
            "once".to_string()
        };
        for offset in offsets {
            let Some(fire_at) =
                Duration::try_seconds(*offset).and_then(|lead| at.checked_sub_signed(lead))
            else {
                tracing::warn!(activity_id = %activity.id, offset, "reminder offset out of range");
                continue;
            };
            if fire_at <= now {
                continue;
            }
            planned.push(NotificationRequest {
                key: format!("{}-{marker}-{offset}", activity.id),
                activity_id: activity.id,
                title: reminder_title(activity),
                body: reminder_body(activity, *offset),
                fire_at,
            });
        }
    }

    planned.sort_by(|a, b| a.fire_at.cmp(&b.fire_at).then_with(|| a.key.cmp(&b.key)));
    planned.dedup_by(|a, b| a.key == b.key);
    planned.truncate(policy.max_pending);
    planned
}

fn reminder_title(activity: &Activity) -> String {
    if activity.symbol.is_empty() {
        activity.name.clone()
    } else {
        format!("{} {}", activity.symbol, activity.name)
    }
}

fn reminder_body(activity: &Activity, offset: i64) -> String {
    let lead = match offset {
        0 => "Time to start".to_string(),
        s if s % 3600 == 0 => format!("Starts in {} h", s / 3600),
        s if s >= 60 => format!("Starts in {} min", s / 60),
        s => format!("Starts in {s} s"),
    };
    if activity.motivation.trim().is_empty() {
        lead
    } else {
        format!("{lead}. {}", activity.motivation.trim())
    }
}

/// Schedules every request, logging and skipping the ones the sink rejects.
pub fn schedule_all(sink: &dyn NotificationSink, requests: Vec<NotificationRequest>) -> usize {
    let mut scheduled = 0;
    for request in requests {
        let key = request.key.clone();
        match sink.schedule(request) {
            Ok(()) => scheduled += 1,
            Err(err) => tracing::warn!(%key, %err, "failed to schedule reminder"),
        }
    }
    scheduled
}

/// Keeps pending requests in process, keyed by request key.
#[derive(Debug, Default)]
pub struct MemorySink {
    pending: Mutex<BTreeMap<String, NotificationRequest>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> Vec<NotificationRequest> {
        let mut requests: Vec<NotificationRequest> =
            self.pending.lock().values().cloned().collect();
        requests.sort_by(|a, b| a.fire_at.cmp(&b.fire_at));
        requests
    }
}

impl NotificationSink for MemorySink {
    fn schedule(&self, notification: NotificationRequest) -> Result<(), NotificationError> {
        self.pending
            .lock()
            .insert(notification.key.clone(), notification);
        Ok(())
    }

    fn cancel_with_prefix(&self, prefix: &str) {
        self.pending.lock().retain(|key, _| !key.starts_with(prefix));
    }

    fn pending_keys(&self) -> Vec<String> {
        self.pending.lock().keys().cloned().collect()
    }
}

/// Sink for headless runs: records requests like [`MemorySink`] and logs them.
#[derive(Debug, Default)]
pub struct LogSink {
    inner: MemorySink,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NotificationSink for LogSink {
    fn schedule(&self, notification: NotificationRequest) -> Result<(), NotificationError> {
        tracing::info!(
            key = %notification.key,
            fire_at = %notification.fire_at,
            title = %notification.title,
            "reminder scheduled"
        );
        self.inner.schedule(notification)
    }

    fn cancel_with_prefix(&self, prefix: &str) {
        tracing::debug!(%prefix, "reminders cancelled");
        self.inner.cancel_with_prefix(prefix);
    }

    fn pending_keys(&self) -> Vec<String> {
        self.inner.pending_keys()
    }
}
