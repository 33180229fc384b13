use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::{
    activity::Activity, history::HistoryEvent, insights::streak::completions_by_day,
    schedule::is_scheduled_for,
};

/// Trailing window, today included.
pub const CONSISTENCY_WINDOW_DAYS: u32 = 30;

const WEEK: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeekdayStats {
    pub weekday: Weekday,
    pub scheduled: u32,
    pub completed: u32,
}

impl WeekdayStats {
    /// Completed over scheduled, 0 when the weekday never came up.
    pub fn ratio(&self) -> f64 {
        if self.scheduled == 0 {
            0.0
        } else {
            f64::from(self.completed) / f64::from(self.scheduled)
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BestDay {
    pub weekday: Weekday,
    pub ratio: f64,
    pub improvement_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeeklyPerformance {
    /// Sunday through Saturday.
    pub days: [WeekdayStats; 7],
    pub best: Option<BestDay>,
}

impl WeeklyPerformance {
    pub fn ratio(&self, weekday: Weekday) -> f64 {
        self.days[weekday.num_days_from_sunday() as usize].ratio()
    }
}

/// Weekday consistency over the trailing [`CONSISTENCY_WINDOW_DAYS`].
pub fn weekly_performance(
    activities: &[Activity],
    history: &[HistoryEvent],
    today: NaiveDate,
) -> WeeklyPerformance {
    let completions = completions_by_day(history);
    let mut days = WEEK.map(|weekday| WeekdayStats {
        weekday,
        scheduled: 0,
        completed: 0,
    });

    for offset in 0..CONSISTENCY_WINDOW_DAYS {
        let Some(day) = today.checked_sub_signed(Duration::days(i64::from(offset))) else {
            break;
        };
        let scheduled = activities
            .iter()
            .filter(|activity| is_scheduled_for(activity, day))
            .count() as u32;
        let completed = completions.get(&day).copied().unwrap_or(0) as u32;

        let bucket = &mut days[day.weekday().num_days_from_sunday() as usize];
        bucket.scheduled += scheduled;
        bucket.completed += completed.min(scheduled);
    }

    let best = best_day(&days);
    WeeklyPerformance { days, best }
}

fn best_day(days: &[WeekdayStats; 7]) -> Option<BestDay> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, stats) in days.iter().enumerate() {
        let ratio = stats.ratio();
        if ratio > best.map_or(0.0, |(_, current)| current) {
            best = Some((idx, ratio));
        }
    }
    let (best_idx, best_ratio) = best?;

    let others: f64 = days
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != best_idx)
        .map(|(_, stats)| stats.ratio())
        .sum::<f64>()
        / (days.len() - 1) as f64;
    let improvement_percent = if others == 0.0 {
        100.0
    } else {
        (best_ratio - others) / others * 100.0
    };

    Some(BestDay {
        weekday: days[best_idx].weekday,
        ratio: best_ratio,
        improvement_percent,
    })
}
