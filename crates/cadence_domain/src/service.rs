use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    activity::Activity,
    agenda::{self, Occurrence},
    history::{HistoryEvent, HistoryKind},
    insights::InsightsSnapshot,
    notifications::{key_prefix, plan_reminders, schedule_all, NotificationSink, ReminderPolicy},
    store::ActivityStore,
};

/// Facade the presentation layer talks to.
///
/// Reads degrade to empty lists when the store fails so views show stale or
/// empty data until the next refresh. Writes report their errors.
pub struct HabitService {
    store: Box<dyn ActivityStore>,
    notification_sink: Option<Box<dyn NotificationSink>>,
    reminder_policy: ReminderPolicy,
}

pub struct HabitServiceBuilder {
    store: Option<Box<dyn ActivityStore>>,
    notification_sink: Option<Box<dyn NotificationSink>>,
    reminder_policy: ReminderPolicy,
}

impl Default for HabitServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HabitServiceBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            notification_sink: None,
            reminder_policy: ReminderPolicy::default(),
        }
    }

    pub fn with_store(mut self, store: Box<dyn ActivityStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_notification_sink(mut self, sink: Box<dyn NotificationSink>) -> Self {
        self.notification_sink = Some(sink);
        self
    }

    pub fn with_reminder_policy(mut self, policy: ReminderPolicy) -> Self {
        self.reminder_policy = policy;
        self
    }

    pub fn build(self) -> Result<HabitService> {
        let store = self
            .store
            .ok_or_else(|| anyhow!("habit service requires an activity store"))?;
        Ok(HabitService {
            store,
            notification_sink: self.notification_sink,
            reminder_policy: self.reminder_policy,
        })
    }
}

impl HabitService {
    pub fn builder() -> HabitServiceBuilder {
        HabitServiceBuilder::new()
    }

    pub fn activities(&self) -> Vec<Activity> {
        self.store.fetch_activities().unwrap_or_else(|err| {
            tracing::warn!(%err, "failed to fetch activities");
            Vec::new()
        })
    }

    pub fn history(&self) -> Vec<HistoryEvent> {
        self.store.fetch_history().unwrap_or_else(|err| {
            tracing::warn!(%err, "failed to fetch history");
            Vec::new()
        })
    }

    pub fn activity(&self, id: Uuid) -> Option<Activity> {
        self.activities().into_iter().find(|activity| activity.id == id)
    }

    #[instrument(skip(self))]
    pub fn insights(&self, today: NaiveDate) -> InsightsSnapshot {
        let activities = self.activities();
        let history = self.history();
        tracing::debug!(
            activities = activities.len(),
            events = history.len(),
            "computing insights"
        );
        InsightsSnapshot::compute(&activities, &history, today)
    }

    pub fn agenda(&self, date: NaiveDate) -> Vec<Occurrence> {
        agenda::occurrences_on(&self.activities(), date)
    }

    #[instrument(skip(self, activity), fields(activity_id = %activity.id))]
    pub fn save_activity(&self, activity: Activity, now: NaiveDateTime) -> Result<()> {
        let kind = if self.activity(activity.id).is_some() {
            HistoryKind::Edited
        } else {
            HistoryKind::Created
        };
        self.store
            .save_activity(activity.clone())
            .with_context(|| format!("saving activity `{}`", activity.name))?;
        self.update_reminders(&activity, now);
        if let Err(err) = self
            .store
            .append_history(HistoryEvent::for_activity(&activity, kind, now))
        {
            tracing::warn!(%err, ?kind, "failed to log activity change");
        }
        Ok(())
    }

    /// Logs a completed occurrence spanning `started_at..ended_at`.
    #[instrument(skip(self))]
    pub fn complete(
        &self,
        activity_id: Uuid,
        started_at: NaiveDateTime,
        ended_at: Option<NaiveDateTime>,
    ) -> Result<HistoryEvent> {
        self.log_event(activity_id, HistoryKind::Completed, started_at, ended_at)
    }

    #[instrument(skip(self))]
    pub fn skip(&self, activity_id: Uuid, at: NaiveDateTime) -> Result<HistoryEvent> {
        self.log_event(activity_id, HistoryKind::Skipped, at, None)
    }

    fn log_event(
        &self,
        activity_id: Uuid,
        kind: HistoryKind,
        at: NaiveDateTime,
        ended_at: Option<NaiveDateTime>,
    ) -> Result<HistoryEvent> {
        let activity = self
            .activity(activity_id)
            .ok_or_else(|| anyhow!("unknown activity {activity_id}"))?;
        let mut event = HistoryEvent::for_activity(&activity, kind, at);
        if let Some(end) = ended_at {
            event = event.with_end_date(end);
        }
        self.store.append_history(event.clone())?;
        Ok(event)
    }

    /// Moves a single occurrence and refreshes that activity's reminders.
    #[instrument(skip(self))]
    pub fn reschedule_occurrence(
        &self,
        activity_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        now: NaiveDateTime,
    ) -> Result<()> {
        let mut activity = self
            .activity(activity_id)
            .ok_or_else(|| anyhow!("unknown activity {activity_id}"))?;
        agenda::reschedule_occurrence(&mut activity, date, time)?;
        self.store.save_activity(activity.clone())?;
        self.update_reminders(&activity, now);
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn delete_activity(&self, activity_id: Uuid) -> Result<()> {
        self.cancel_reminders(activity_id);
        self.store.delete_activity(activity_id)?;
        Ok(())
    }

    pub fn cancel_reminders(&self, activity_id: Uuid) {
        if let Some(sink) = &self.notification_sink {
            sink.cancel_with_prefix(&key_prefix(activity_id));
        }
    }

    /// Replaces the pending reminders of `activity` with a fresh plan.
    pub fn update_reminders(&self, activity: &Activity, now: NaiveDateTime) -> usize {
        let Some(sink) = &self.notification_sink else {
            return 0;
        };
        sink.cancel_with_prefix(&key_prefix(activity.id));
        schedule_all(
            &**sink,
            plan_reminders(activity, now, self.reminder_policy),
        )
    }

    /// Re-plans reminders for every activity; returns how many were scheduled.
    #[instrument(skip(self))]
    pub fn refresh_reminders(&self, now: NaiveDateTime) -> usize {
        let activities = self.activities();
        let scheduled: usize = activities
            .iter()
            .map(|activity| self.update_reminders(activity, now))
            .sum();
        tracing::info!(
            activities = activities.len(),
            scheduled,
            "reminders refreshed"
        );
        scheduled
    }

    pub fn pending_reminders(&self) -> Vec<String> {
        self.notification_sink
            .as_ref()
            .map(|sink| sink.pending_keys())
            .unwrap_or_default()
    }
}
