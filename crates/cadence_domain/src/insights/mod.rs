//! Aggregations over completion history.
//!
//! Every function here is a pure computation over a point-in-time snapshot of
//! activities and history. Callers recompute on refresh rather than updating
//! results incrementally.

pub mod fun_fact;
pub mod heatmap;
pub mod streak;
pub mod weekly;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{activity::Activity, history::HistoryEvent};

pub use fun_fact::{fun_fact, FunFact, FunFactTier};
pub use heatmap::{heatmap, Intensity};
pub use streak::{current_streak, evaluate_day, DayOutcome};
pub use weekly::{weekly_performance, BestDay, WeekdayStats, WeeklyPerformance};

/// Read-only view model for an insights screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsightsSnapshot {
    pub as_of: NaiveDate,
    pub streak: u32,
    pub heatmap: BTreeMap<NaiveDate, Intensity>,
    pub weekly: WeeklyPerformance,
    pub fun_fact: FunFact,
}

impl InsightsSnapshot {
    pub fn compute(activities: &[Activity], history: &[HistoryEvent], today: NaiveDate) -> Self {
        Self {
            as_of: today,
            streak: current_streak(activities, history, today),
            heatmap: heatmap(history, today),
            weekly: weekly_performance(activities, history, today),
            fun_fact: fun_fact(history),
        }
    }
}
