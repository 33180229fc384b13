use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

use crate::activity::{at_minute, Activity};

/// Weekday code of `date`: 1 = Sunday through 7 = Saturday.
pub fn weekday_code(date: NaiveDate) -> u32 {
    date.weekday().number_from_sunday()
}

/// Whether `activity` has an occurrence on `date`.
pub fn is_scheduled_for(activity: &Activity, date: NaiveDate) -> bool {
    if let Some(start) = activity.start_date {
        if date < start {
            return false;
        }
    }
    if let Some(end) = activity.end_date {
        if date > end {
            return false;
        }
    }
    if activity.is_recurring() {
        return activity.recurring_days.contains(&weekday_code(date));
    }
    match activity.scheduled_time {
        Some(legacy) => legacy.date() == date,
        None => false,
    }
}

/// Resolves when the occurrence on `date` takes place.
///
/// A per-day exception wins over the default time of day, which in turn wins
/// over the legacy timestamp. The legacy timestamp is returned as stored and
/// does not depend on `date`.
pub fn scheduled_time_for(activity: &Activity, date: NaiveDate) -> Option<NaiveDateTime> {
    if let Some(exception) = activity.exception_for(date) {
        match exception.time() {
            Some(time) => return Some(at_minute(date, time)),
            None => tracing::debug!(
                activity_id = %activity.id,
                %date,
                hour = exception.hour,
                minute = exception.minute,
                "ignoring out-of-range schedule exception"
            ),
        }
    }
    if let (Some(hour), Some(minute)) = (activity.scheduled_hour, activity.scheduled_minute) {
        match NaiveTime::from_hms_opt(hour, minute, 0) {
            Some(time) => return Some(at_minute(date, time)),
            None => tracing::debug!(
                activity_id = %activity.id,
                hour,
                minute,
                "ignoring out-of-range time of day"
            ),
        }
    }
    activity.scheduled_time
}

/// Whether the time for `date` comes from a per-day override.
pub fn has_override(activity: &Activity, date: NaiveDate) -> bool {
    activity
        .exception_for(date)
        .and_then(|exception| exception.time())
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        date.and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn weekday_codes_start_on_sunday() {
        // 2025-06-01 is a Sunday.
        assert_eq!(weekday_code(day(2025, 6, 1)), 1);
        assert_eq!(weekday_code(day(2025, 6, 2)), 2);
        assert_eq!(weekday_code(day(2025, 6, 7)), 7);
    }

    #[test]
    fn recurring_days_respect_date_bounds() {
        // Mon, Wed, Fri between 2025-06-04 and 2025-06-20.
        let activity = Activity::new("Gym")
            .with_recurring_days([2, 4, 6])
            .with_date_range(Some(day(2025, 6, 4)), Some(day(2025, 6, 20)));

        let mut current = day(2025, 5, 20);
        while current <= day(2025, 7, 10) {
            let in_range = current >= day(2025, 6, 4) && current <= day(2025, 6, 20);
            let expected = in_range && [2, 4, 6].contains(&weekday_code(current));
            assert_eq!(
                is_scheduled_for(&activity, current),
                expected,
                "mismatch on {current}"
            );
            current += Duration::days(1);
        }
    }

    #[test]
    fn non_recurring_falls_back_to_legacy_day() {
        let legacy = at(day(2025, 6, 10), 17, 5);
        let activity = Activity::new("Dentist").with_scheduled_time(legacy);
        assert!(is_scheduled_for(&activity, day(2025, 6, 10)));
        assert!(!is_scheduled_for(&activity, day(2025, 6, 11)));
        assert!(!is_scheduled_for(&Activity::new("Nothing"), day(2025, 6, 10)));
    }

    #[test]
    fn bounds_apply_to_legacy_occurrence() {
        let activity = Activity::new("Dentist")
            .with_scheduled_time(at(day(2025, 6, 10), 9, 0))
            .with_date_range(Some(day(2025, 6, 11)), None);
        assert!(!is_scheduled_for(&activity, day(2025, 6, 10)));
    }

    #[test]
    fn exception_overrides_default_time() {
        let mut activity = Activity::new("Piano")
            .with_recurring_days(1..=7)
            .with_time_of_day(9, 30);
        activity.set_exception(day(2025, 6, 12), 19, 45).unwrap();

        assert_eq!(
            scheduled_time_for(&activity, day(2025, 6, 12)),
            Some(at(day(2025, 6, 12), 19, 45))
        );
        assert!(has_override(&activity, day(2025, 6, 12)));
        assert_eq!(
            scheduled_time_for(&activity, day(2025, 6, 13)),
            Some(at(day(2025, 6, 13), 9, 30))
        );
        assert!(!has_override(&activity, day(2025, 6, 13)));
    }

    #[test]
    fn default_time_applies_on_every_weekday() {
        let activity = Activity::new("Piano").with_time_of_day(9, 30);
        for offset in 0..7 {
            let date = day(2025, 6, 1) + Duration::days(offset);
            assert_eq!(scheduled_time_for(&activity, date), Some(at(date, 9, 30)));
        }
    }

    #[test]
    fn lone_hour_falls_through_to_legacy() {
        let legacy = at(day(2025, 1, 2), 7, 0);
        let mut activity = Activity::new("Tea").with_scheduled_time(legacy);
        activity.scheduled_hour = Some(15);
        assert_eq!(scheduled_time_for(&activity, day(2025, 6, 12)), Some(legacy));

        activity.scheduled_hour = None;
        activity.scheduled_minute = Some(10);
        assert_eq!(scheduled_time_for(&activity, day(2025, 6, 12)), Some(legacy));
    }

    #[test]
    fn out_of_range_time_of_day_falls_through() {
        let mut activity = Activity::new("Tea");
        activity.scheduled_hour = Some(31);
        activity.scheduled_minute = Some(0);
        assert_eq!(scheduled_time_for(&activity, day(2025, 6, 12)), None);
    }
}
