use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// A trackable habit together with its recurrence rule.
///
/// An activity with an empty `recurring_days` set is non-recurring and only
/// occurs on the calendar day of its legacy `scheduled_time`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub id: Uuid,
    pub name: String,
    pub symbol: String,
    pub color: String,
    #[serde(default)]
    pub motivation: String,
    #[serde(default)]
    pub motivation_author: Option<String>,
    /// Weekday codes, 1 = Sunday through 7 = Saturday.
    #[serde(default)]
    pub recurring_days: BTreeSet<u32>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub scheduled_hour: Option<u32>,
    #[serde(default)]
    pub scheduled_minute: Option<u32>,
    #[serde(default)]
    pub scheduled_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub goal: Option<Goal>,
    #[serde(default)]
    pub exceptions: BTreeMap<NaiveDate, ScheduleException>,
    /// Seconds before an occurrence at which a reminder fires.
    #[serde(default)]
    pub reminder_offsets: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Goal {
    Duration { seconds: u64 },
    Count { target: u32 },
    Metric { target: f64, unit: String },
}

/// Replacement time of day for a single occurrence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleException {
    pub id: Uuid,
    pub original_date: NaiveDate,
    pub hour: u32,
    pub minute: u32,
}

impl ScheduleException {
    pub fn time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0)
    }
}

impl Activity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            symbol: String::new(),
            color: String::new(),
            motivation: String::new(),
            motivation_author: None,
            recurring_days: BTreeSet::new(),
            start_date: None,
            end_date: None,
            scheduled_hour: None,
            scheduled_minute: None,
            scheduled_time: None,
            goal: None,
            exceptions: BTreeMap::new(),
            reminder_offsets: Vec::new(),
        }
    }

    pub fn with_appearance(mut self, symbol: impl Into<String>, color: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self.color = color.into();
        self
    }

    pub fn with_recurring_days(mut self, days: impl IntoIterator<Item = u32>) -> Self {
        self.recurring_days = days.into_iter().collect();
        self
    }

    pub fn with_time_of_day(mut self, hour: u32, minute: u32) -> Self {
        self.scheduled_hour = Some(hour);
        self.scheduled_minute = Some(minute);
        self
    }

    pub fn with_date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_scheduled_time(mut self, at: NaiveDateTime) -> Self {
        self.scheduled_time = Some(at);
        self
    }

    pub fn with_goal(mut self, goal: Goal) -> Self {
        self.goal = Some(goal);
        self
    }

    pub fn with_reminder_offsets(mut self, offsets: impl IntoIterator<Item = i64>) -> Self {
        self.reminder_offsets = offsets.into_iter().collect();
        self
    }

    pub fn is_recurring(&self) -> bool {
        !self.recurring_days.is_empty()
    }

    pub fn exception_for(&self, date: NaiveDate) -> Option<&ScheduleException> {
        self.exceptions.get(&date)
    }

    /// Overrides the time of the occurrence on `date`, replacing any earlier override.
    pub fn set_exception(
        &mut self,
        date: NaiveDate,
        hour: u32,
        minute: u32,
    ) -> Result<&ScheduleException, ValidationError> {
        check_time(hour, minute)?;
        let id = self
            .exceptions
            .get(&date)
            .map(|existing| existing.id)
            .unwrap_or_else(Uuid::new_v4);
        let exception = ScheduleException {
            id,
            original_date: date,
            hour,
            minute,
        };
        self.exceptions.insert(date, exception);
        Ok(&self.exceptions[&date])
    }

    pub fn remove_exception(&mut self, date: NaiveDate) -> Option<ScheduleException> {
        self.exceptions.remove(&date)
    }

    /// Default time of day, present only when both hour and minute are set.
    pub fn default_time(&self) -> Option<NaiveTime> {
        match (self.scheduled_hour, self.scheduled_minute) {
            (Some(hour), Some(minute)) => NaiveTime::from_hms_opt(hour, minute, 0),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if let Some(code) = self.recurring_days.iter().find(|code| !(1..=7).contains(*code)) {
            return Err(ValidationError::Weekday(*code));
        }
        if let Some(hour) = self.scheduled_hour {
            if hour > 23 {
                return Err(ValidationError::Hour(hour));
            }
        }
        if let Some(minute) = self.scheduled_minute {
            if minute > 59 {
                return Err(ValidationError::Minute(minute));
            }
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(ValidationError::DateRange { start, end });
            }
        }
        for exception in self.exceptions.values() {
            check_time(exception.hour, exception.minute)?;
        }
        if let Some(offset) = self
            .reminder_offsets
            .iter()
            .find(|offset| !(-MAX_REMINDER_OFFSET..=MAX_REMINDER_OFFSET).contains(*offset))
        {
            return Err(ValidationError::ReminderOffset(*offset));
        }
        Ok(())
    }
}

/// Largest reminder lead (or lag) in seconds: one week.
pub const MAX_REMINDER_OFFSET: i64 = 7 * 24 * 60 * 60;

fn check_time(hour: u32, minute: u32) -> Result<(), ValidationError> {
    if hour > 23 {
        return Err(ValidationError::Hour(hour));
    }
    if minute > 59 {
        return Err(ValidationError::Minute(minute));
    }
    Ok(())
}

/// Truncates a timestamp to whole minutes.
pub(crate) fn at_minute(date: NaiveDate, time: NaiveTime) -> NaiveDateTime {
    date.and_hms_opt(time.hour(), time.minute(), 0)
        .unwrap_or_else(|| date.and_time(time))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn set_exception_keeps_one_override_per_day() {
        let mut activity = Activity::new("Read");
        let first_id = activity.set_exception(day(2025, 3, 4), 7, 15).unwrap().id;
        let second = *activity.set_exception(day(2025, 3, 4), 18, 0).unwrap();

        assert_eq!(activity.exceptions.len(), 1);
        assert_eq!(second.id, first_id);
        assert_eq!((second.hour, second.minute), (18, 0));
    }

    #[test]
    fn set_exception_rejects_invalid_time() {
        let mut activity = Activity::new("Read");
        assert_eq!(
            activity.set_exception(day(2025, 3, 4), 24, 0).unwrap_err(),
            ValidationError::Hour(24)
        );
        assert!(activity.exceptions.is_empty());
    }

    #[test]
    fn default_time_requires_hour_and_minute() {
        let mut activity = Activity::new("Stretch");
        activity.scheduled_hour = Some(6);
        assert!(activity.default_time().is_none());
        activity.scheduled_minute = Some(45);
        assert_eq!(
            activity.default_time(),
            NaiveTime::from_hms_opt(6, 45, 0)
        );
    }

    #[test]
    fn validate_flags_bad_weekday_and_range() {
        let activity = Activity::new("Run").with_recurring_days([2, 8]);
        assert_eq!(activity.validate(), Err(ValidationError::Weekday(8)));

        let activity =
            Activity::new("Run").with_date_range(Some(day(2025, 5, 2)), Some(day(2025, 5, 1)));
        assert!(matches!(
            activity.validate(),
            Err(ValidationError::DateRange { .. })
        ));

        assert!(Activity::new("Run").with_recurring_days(1..=7).validate().is_ok());
    }

    #[test]
    fn validate_bounds_reminder_offsets() {
        let activity = Activity::new("Run").with_reminder_offsets([900, i64::MAX / 100]);
        assert_eq!(
            activity.validate(),
            Err(ValidationError::ReminderOffset(i64::MAX / 100))
        );

        let activity =
            Activity::new("Run").with_reminder_offsets([-MAX_REMINDER_OFFSET, MAX_REMINDER_OFFSET]);
        assert!(activity.validate().is_ok());
    }

    #[test]
    fn goal_serializes_with_kind_tag() {
        let activity = Activity::new("Water").with_goal(Goal::Metric {
            target: 2.5,
            unit: "l".into(),
        });
        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["goal"]["kind"], "metric");
        assert_eq!(json["goal"]["unit"], "l");
    }
}
