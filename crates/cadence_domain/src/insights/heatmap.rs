use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::history::HistoryEvent;

/// Days covered by the heatmap, today included.
pub const HEATMAP_DAYS: u32 = 92;

/// Daily totals above this many seconds render as [`Intensity::Heavy`].
pub const HEAVY_DAY_SECONDS: i64 = 1800;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Intensity {
    None,
    Light,
    Heavy,
}

impl Intensity {
    pub fn level(self) -> u8 {
        match self {
            Intensity::None => 0,
            Intensity::Light => 1,
            Intensity::Heavy => 2,
        }
    }

    /// A day whose completions add up to no time at all stays empty.
    fn classify(total_seconds: i64) -> Self {
        if total_seconds <= 0 {
            Intensity::None
        } else if total_seconds > HEAVY_DAY_SECONDS {
            Intensity::Heavy
        } else {
            Intensity::Light
        }
    }
}

/// Intensity of completed work for each of the last [`HEATMAP_DAYS`] days.
pub fn heatmap(history: &[HistoryEvent], today: NaiveDate) -> BTreeMap<NaiveDate, Intensity> {
    let Some(first) = today.checked_sub_signed(Duration::days(i64::from(HEATMAP_DAYS) - 1)) else {
        return BTreeMap::new();
    };

    let mut totals: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for event in history.iter().filter(|event| event.is_completion()) {
        let day = event.day();
        if day < first || day > today {
            continue;
        }
        *totals.entry(day).or_insert(0) += event.duration().num_seconds();
    }

    first
        .iter_days()
        .take(HEATMAP_DAYS as usize)
        .map(|day| {
            let seconds = totals.get(&day).copied().unwrap_or(0);
            (day, Intensity::classify(seconds))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryKind;
    use chrono::NaiveDateTime;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn session(date: NaiveDate, start_hour: u32, seconds: i64) -> HistoryEvent {
        let start: NaiveDateTime = date.and_hms_opt(start_hour, 0, 0).unwrap();
        HistoryEvent::detached("Focus", HistoryKind::Completed, start)
            .with_end_date(start + Duration::seconds(seconds))
    }

    #[test]
    fn covers_ninety_two_days_ending_today() {
        let today = day(2025, 6, 11);
        let map = heatmap(&[], today);
        assert_eq!(map.len(), 92);
        assert_eq!(map.keys().next_back(), Some(&today));
        assert_eq!(map.keys().next(), Some(&(today - Duration::days(91))));
        assert!(map.values().all(|intensity| *intensity == Intensity::None));
    }

    #[test]
    fn thresholds_split_at_half_an_hour() {
        let today = day(2025, 6, 11);
        let heavy_day = today - Duration::days(1);
        let light_day = today - Duration::days(2);
        let zero_day = today - Duration::days(3);
        let history = vec![
            session(heavy_day, 7, 900),
            session(heavy_day, 18, 901),
            session(light_day, 7, 900),
            session(light_day, 18, 900),
            session(zero_day, 7, 0),
            session(zero_day, 18, 0),
        ];

        let map = heatmap(&history, today);
        assert_eq!(map[&heavy_day].level(), 2);
        assert_eq!(map[&light_day].level(), 1);
        assert_eq!(map[&zero_day].level(), 0);
        assert_eq!(map[&today].level(), 0);
    }

    #[test]
    fn ignores_non_completions_and_out_of_window_days() {
        let today = day(2025, 6, 11);
        let skipped = HistoryEvent::detached(
            "Focus",
            HistoryKind::Skipped,
            today.and_hms_opt(9, 0, 0).unwrap(),
        )
        .with_end_date(today.and_hms_opt(11, 0, 0).unwrap());
        let ancient = session(today - Duration::days(92), 9, 4000);
        let future = session(today + Duration::days(1), 9, 4000);

        let map = heatmap(&[skipped, ancient, future], today);
        assert_eq!(map.len(), 92);
        assert!(map.values().all(|intensity| *intensity == Intensity::None));
    }
}
