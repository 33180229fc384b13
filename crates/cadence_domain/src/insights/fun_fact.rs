use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::history::HistoryEvent;

/// Length of a long-haul flight, the yardstick for the mastery tier.
pub const REFERENCE_HOURS: f64 = 11.4;

const MASTERY_HOURS: f64 = 10.0;
const GOOD_START_HOURS: f64 = 2.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FunFactTier {
    Empty,
    FirstSteps,
    GoodStart,
    Mastery,
}

impl FunFactTier {
    pub fn for_hours(hours: f64) -> Self {
        if hours > MASTERY_HOURS {
            FunFactTier::Mastery
        } else if hours > GOOD_START_HOURS {
            FunFactTier::GoodStart
        } else {
            FunFactTier::FirstSteps
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunFact {
    pub tier: FunFactTier,
    pub activity_name: Option<String>,
    pub hours: f64,
    pub title: String,
    pub description: String,
}

/// Picks the activity with the most completed time and narrates it.
pub fn fun_fact(history: &[HistoryEvent]) -> FunFact {
    let mut totals: BTreeMap<&str, i64> = BTreeMap::new();
    for event in history.iter().filter(|event| event.is_completion()) {
        *totals.entry(event.activity_name()).or_insert(0) += event.duration().num_seconds();
    }

    // BTreeMap iterates names in ascending order, so the first maximum wins ties.
    let top = totals
        .into_iter()
        .fold(None::<(&str, i64)>, |best, (name, seconds)| match best {
            Some((_, best_seconds)) if best_seconds >= seconds => best,
            _ => Some((name, seconds)),
        });

    let Some((name, seconds)) = top else {
        return FunFact {
            tier: FunFactTier::Empty,
            activity_name: None,
            hours: 0.0,
            title: "Your story starts here".to_string(),
            description: "Complete an activity to unlock your first fun fact.".to_string(),
        };
    };

    let hours = seconds as f64 / 3600.0;
    let tier = FunFactTier::for_hours(hours);
    let (title, description) = match tier {
        FunFactTier::Mastery => (
            format!("{name} master"),
            format!(
                "You've spent {hours:.1} hours on {name}. That's {:.1}x the length of a long-haul flight.",
                hours / REFERENCE_HOURS
            ),
        ),
        FunFactTier::GoodStart => (
            format!("Building momentum with {name}"),
            format!("{hours:.1} hours of {name} so far. A good start, keep it going."),
        ),
        FunFactTier::FirstSteps | FunFactTier::Empty => (
            format!("First steps in {name}"),
            format!("{hours:.1} hours of {name} logged. Every habit begins with a first step."),
        ),
    };

    FunFact {
        tier,
        activity_name: Some(name.to_string()),
        hours,
        title,
        description,
    }
}
