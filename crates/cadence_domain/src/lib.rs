pub mod activity;
pub mod agenda;
pub mod error;
pub mod history;
pub mod insights;
pub mod notifications;
pub mod schedule;
pub mod service;
pub mod store;

pub use crate::activity::{Activity, Goal, ScheduleException};
pub use crate::history::{HistoryEvent, HistoryKind};
pub use crate::service::{HabitService, HabitServiceBuilder};
