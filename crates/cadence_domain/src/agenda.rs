use std::cmp::Ordering;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    activity::Activity,
    error::ValidationError,
    schedule::{has_override, is_scheduled_for, scheduled_time_for},
};

/// One calendar-day instance of an activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Occurrence {
    pub activity_id: Uuid,
    pub name: String,
    pub symbol: String,
    pub color: String,
    pub date: NaiveDate,
    pub time: Option<NaiveDateTime>,
    pub rescheduled: bool,
}

impl Occurrence {
    fn resolve(activity: &Activity, date: NaiveDate) -> Self {
        Self {
            activity_id: activity.id,
            name: activity.name.clone(),
            symbol: activity.symbol.clone(),
            color: activity.color.clone(),
            date,
            time: scheduled_time_for(activity, date),
            rescheduled: has_override(activity, date),
        }
    }
}

impl PartialOrd for Occurrence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Occurrence {
    fn cmp(&self, other: &Self) -> Ordering {
        // Untimed occurrences sink to the end of the day.
        let by_time = match (self.time, other.time) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        self.date
            .cmp(&other.date)
            .then(by_time)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.activity_id.cmp(&other.activity_id))
    }
}

/// Every activity scheduled on `date`, ordered as a day timeline.
pub fn occurrences_on(activities: &[Activity], date: NaiveDate) -> Vec<Occurrence> {
    let mut items: Vec<Occurrence> = activities
        .iter()
        .filter(|activity| is_scheduled_for(activity, date))
        .map(|activity| Occurrence::resolve(activity, date))
        .collect();
    items.sort();
    items
}

/// Occurrences of a single activity in `[from, from + days)`.
pub fn upcoming_occurrences(activity: &Activity, from: NaiveDate, days: u32) -> Vec<Occurrence> {
    (0..i64::from(days))
        .filter_map(|offset| from.checked_add_signed(Duration::days(offset)))
        .filter(|date| is_scheduled_for(activity, *date))
        .map(|date| Occurrence::resolve(activity, date))
        .collect()
}

/// Moves the occurrence on `date` to `time` without touching other days.
///
/// Moving it back onto the default time of day drops the override. Seconds
/// are ignored.
pub fn reschedule_occurrence(
    activity: &mut Activity,
    date: NaiveDate,
    time: NaiveTime,
) -> Result<(), ValidationError> {
    if !is_scheduled_for(activity, date) {
        return Err(ValidationError::NotScheduled(date));
    }
    let time = NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time);
    if activity.default_time() == Some(time) {
        activity.remove_exception(date);
        return Ok(());
    }
    activity.set_exception(date, time.hour(), time.minute())?;
    tracing::debug!(activity_id = %activity.id, %date, %time, "occurrence rescheduled");
    Ok(())
}
