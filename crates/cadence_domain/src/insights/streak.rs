use std::collections::HashMap;

use chrono::{Duration, NaiveDate};

use crate::{activity::Activity, history::HistoryEvent, schedule::is_scheduled_for};

/// Upper bound on how far back a streak walk looks.
pub const MAX_STREAK_DAYS: u32 = 365;

/// Effect of a single day on the running streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOutcome {
    Increment,
    Break,
    Skip,
}

/// Classifies one day of the backward walk.
///
/// Completions always count, even on days with nothing scheduled. A scheduled
/// day without completions breaks the streak unless it is the reference day,
/// which is still in progress.
pub fn evaluate_day(scheduled: usize, completed: usize, is_reference_day: bool) -> DayOutcome {
    match (scheduled, completed) {
        (_, c) if c > 0 => DayOutcome::Increment,
        (0, _) => DayOutcome::Skip,
        _ if is_reference_day => DayOutcome::Skip,
        _ => DayOutcome::Break,
    }
}

/// Consecutive qualifying days ending at `as_of`.
pub fn current_streak(activities: &[Activity], history: &[HistoryEvent], as_of: NaiveDate) -> u32 {
    let completions = completions_by_day(history);
    let mut streak = 0;

    for offset in 0..MAX_STREAK_DAYS {
        let Some(day) = as_of.checked_sub_signed(Duration::days(i64::from(offset))) else {
            break;
        };
        let scheduled = activities
            .iter()
            .filter(|activity| is_scheduled_for(activity, day))
            .count();
        let completed = completions.get(&day).copied().unwrap_or(0);

        match evaluate_day(scheduled, completed, offset == 0) {
            DayOutcome::Increment => streak += 1,
            DayOutcome::Skip => {}
            DayOutcome::Break => break,
        }
    }

    streak
}

pub(crate) fn completions_by_day(history: &[HistoryEvent]) -> HashMap<NaiveDate, usize> {
    let mut by_day = HashMap::new();
    for event in history.iter().filter(|event| event.is_completion()) {
        *by_day.entry(event.day()).or_insert(0) += 1;
    }
    by_day
}
