use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use cadence_domain::{
    agenda::Occurrence,
    insights::{FunFactTier, InsightsSnapshot, Intensity},
    notifications::{LogSink, ReminderPolicy},
    store::SnapshotStore,
    HabitService,
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub(crate) store_path: PathBuf,
    pub(crate) today: Option<NaiveDate>,
    pub(crate) reminder_policy: ReminderPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_lookup(|key| std::env::var(key).ok()))
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup("CADENCE_STORE") {
            if !path.trim().is_empty() {
                config.store_path = PathBuf::from(path.trim());
            }
        }
        if let Some(raw) = lookup("CADENCE_TODAY") {
            match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
                Ok(date) => config.today = Some(date),
                Err(err) => warn!(value = %raw, %err, "ignoring CADENCE_TODAY"),
            }
        }
        if let Some(raw) = lookup("CADENCE_LOOKAHEAD_DAYS") {
            match raw.trim().parse::<u32>() {
                Ok(value) if value > 0 => config.reminder_policy.lookahead_days = value,
                _ => warn!(value = %raw, "ignoring CADENCE_LOOKAHEAD_DAYS"),
            }
        }
        if let Some(raw) = lookup("CADENCE_MAX_PENDING") {
            match raw.trim().parse::<usize>() {
                Ok(value) if value > 0 => config.reminder_policy.max_pending = value,
                _ => warn!(value = %raw, "ignoring CADENCE_MAX_PENDING"),
            }
        }
        config
    }

    fn now(&self) -> NaiveDateTime {
        let local = Local::now().naive_local();
        match self.today {
            Some(date) => date.and_time(local.time()),
            None => local,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("cadence.json"),
            today: None,
            reminder_policy: ReminderPolicy::default(),
        }
    }
}

pub fn run(config: AppConfig) -> Result<()> {
    let store = SnapshotStore::open(&config.store_path)
        .with_context(|| format!("failed to open {}", config.store_path.display()))?;
    if let Some(path) = store.path() {
        info!(store = %path.display(), "activity store opened");
    }
    let service = HabitService::builder()
        .with_store(Box::new(store))
        .with_notification_sink(Box::new(LogSink::new()))
        .with_reminder_policy(config.reminder_policy)
        .build()?;

    let now = config.now();
    let today = now.date();
    service.refresh_reminders(now);
    let agenda = service.agenda(today);
    let insights = service.insights(today);

    print!("{}", render_summary(&agenda, &insights));
    Ok(())
}

pub(crate) fn render_summary(agenda: &[Occurrence], insights: &InsightsSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", insights.as_of.format("%A, %B %d, %Y"));

    if agenda.is_empty() {
        let _ = writeln!(out, "  Nothing scheduled today");
    }
    for item in agenda {
        let time = item
            .time
            .map(|at| at.format("%H:%M").to_string())
            .unwrap_or_else(|| "--:--".to_string());
        let marker = if item.rescheduled { " (moved)" } else { "" };
        let _ = writeln!(out, "  {time}  {}{marker}", item.name);
    }

    let _ = writeln!(
        out,
        "Streak: {} day{}",
        insights.streak,
        if insights.streak == 1 { "" } else { "s" }
    );

    let graph: String = insights
        .heatmap
        .values()
        .map(|intensity| match intensity {
            Intensity::None => '_',
            Intensity::Light => 'o',
            Intensity::Heavy => 'X',
        })
        .collect();
    let _ = writeln!(out, "History {graph}");

    match &insights.weekly.best {
        Some(best) => {
            let _ = writeln!(
                out,
                "Best day: {} ({:.0}% done, {:+.0}% vs other days)",
                best.weekday,
                best.ratio * 100.0,
                best.improvement_percent
            );
        }
        None => {
            let _ = writeln!(out, "Best day: not enough data yet");
        }
    }

    if insights.fun_fact.tier != FunFactTier::Empty {
        let _ = writeln!(out, "{}", insights.fun_fact.title);
    }
    let _ = writeln!(out, "{}", insights.fun_fact.description);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use cadence_domain::{Activity, HistoryEvent, HistoryKind};

    #[test]
    fn lookup_overrides_defaults_and_ignores_garbage() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("CADENCE_STORE", "/tmp/habits.json"),
            ("CADENCE_TODAY", "2025-06-11"),
            ("CADENCE_LOOKAHEAD_DAYS", "0"),
            ("CADENCE_MAX_PENDING", "12"),
        ]);
        let config = AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.store_path, PathBuf::from("/tmp/habits.json"));
        assert_eq!(config.today, NaiveDate::from_ymd_opt(2025, 6, 11));
        assert_eq!(config.reminder_policy.lookahead_days, 30);
        assert_eq!(config.reminder_policy.max_pending, 12);
        assert_eq!(config.now().date(), NaiveDate::from_ymd_opt(2025, 6, 11).unwrap());
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(AppConfig::from_lookup(|_| None), AppConfig::default());
    }

    #[test]
    fn summary_lists_agenda_and_insights() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 11).unwrap();
        let activity = Activity::new("Piano")
            .with_recurring_days(1..=7)
            .with_time_of_day(9, 30);
        let start = today.and_hms_opt(9, 30, 0).unwrap();
        let history = vec![HistoryEvent::for_activity(&activity, HistoryKind::Completed, start)
            .with_end_date(start + chrono::Duration::minutes(20))];

        let agenda = cadence_domain::agenda::occurrences_on(std::slice::from_ref(&activity), today);
        let insights = InsightsSnapshot::compute(&[activity], &history, today);
        let summary = render_summary(&agenda, &insights);

        assert!(summary.contains("09:30  Piano"));
        assert!(summary.contains("Streak: 1 day\n"));
        assert!(summary.contains("First steps in Piano"));
        assert!(summary.lines().any(|line| line.starts_with("History ") && line.ends_with('o')));
    }
}
