use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{activity::Activity, error::StoreError, history::HistoryEvent};

/// Object store the core reads activities and history from.
pub trait ActivityStore: Send + Sync {
    fn fetch_activities(&self) -> Result<Vec<Activity>, StoreError>;
    /// History ordered by event date, oldest first.
    fn fetch_history(&self) -> Result<Vec<HistoryEvent>, StoreError>;
    fn save_activity(&self, activity: Activity) -> Result<(), StoreError>;
    /// Removes the activity and its exceptions; history is kept.
    fn delete_activity(&self, id: Uuid) -> Result<(), StoreError>;
    fn append_history(&self, event: HistoryEvent) -> Result<(), StoreError>;
    fn purge_history(&self, activity_id: Uuid) -> Result<usize, StoreError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub history: Vec<HistoryEvent>,
}

/// Whole-snapshot store, optionally mirrored to a JSON file after each write.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    path: Option<PathBuf>,
    data: RwLock<StoreSnapshot>,
}

impl SnapshotStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the JSON file at `path`; a missing file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let snapshot = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str(&raw)?
        } else {
            tracing::debug!(path = %path.display(), "store file missing, starting empty");
            StoreSnapshot::default()
        };
        Ok(Self {
            path: Some(path),
            data: RwLock::new(snapshot),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn persist(&self, snapshot: &StoreSnapshot) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let payload = serde_json::to_string_pretty(snapshot)?;
        fs::write(path, payload).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })
    }
}

impl ActivityStore for SnapshotStore {
    fn fetch_activities(&self) -> Result<Vec<Activity>, StoreError> {
        Ok(self.data.read().activities.clone())
    }

    fn fetch_history(&self) -> Result<Vec<HistoryEvent>, StoreError> {
        let mut history = self.data.read().history.clone();
        history.sort_by_key(|event| event.date());
        Ok(history)
    }

    fn save_activity(&self, activity: Activity) -> Result<(), StoreError> {
        activity.validate()?;
        let mut data = self.data.write();
        match data
            .activities
            .iter()
            .position(|existing| existing.id == activity.id)
        {
            Some(idx) => data.activities[idx] = activity,
            None => data.activities.push(activity),
        }
        self.persist(&data)
    }

    fn delete_activity(&self, id: Uuid) -> Result<(), StoreError> {
        let mut data = self.data.write();
        let before = data.activities.len();
        data.activities.retain(|activity| activity.id != id);
        if data.activities.len() == before {
            return Err(StoreError::NotFound(id));
        }
        self.persist(&data)
    }

    fn append_history(&self, event: HistoryEvent) -> Result<(), StoreError> {
        let mut data = self.data.write();
        data.history.push(event);
        self.persist(&data)
    }

    fn purge_history(&self, activity_id: Uuid) -> Result<usize, StoreError> {
        let mut data = self.data.write();
        let before = data.history.len();
        data.history
            .retain(|event| event.activity_id() != Some(activity_id));
        let removed = before - data.history.len();
        self.persist(&data)?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryKind;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn history_is_returned_in_date_order() {
        let store = SnapshotStore::in_memory();
        let activity = Activity::new("Walk");
        store
            .append_history(HistoryEvent::for_activity(&activity, HistoryKind::Completed, at(3, 8)))
            .unwrap();
        store
            .append_history(HistoryEvent::for_activity(&activity, HistoryKind::Created, at(1, 8)))
            .unwrap();

        let history = store.fetch_history().unwrap();
        assert_eq!(history[0].kind(), HistoryKind::Created);
        assert_eq!(history[1].kind(), HistoryKind::Completed);
    }

    #[test]
    fn save_replaces_existing_activity() {
        let store = SnapshotStore::in_memory();
        let mut activity = Activity::new("Walk");
        store.save_activity(activity.clone()).unwrap();
        activity.name = "Evening walk".into();
        store.save_activity(activity.clone()).unwrap();

        let activities = store.fetch_activities().unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].name, "Evening walk");
    }

    #[test]
    fn save_rejects_invalid_activity() {
        let store = SnapshotStore::in_memory();
        let activity = Activity::new("Walk").with_time_of_day(25, 0);
        assert!(matches!(
            store.save_activity(activity),
            Err(StoreError::Invalid(_))
        ));
        assert!(store.fetch_activities().unwrap().is_empty());
    }

    #[test]
    fn delete_keeps_history_and_reports_missing() {
        let store = SnapshotStore::in_memory();
        let activity = Activity::new("Walk");
        store.save_activity(activity.clone()).unwrap();
        store
            .append_history(HistoryEvent::for_activity(&activity, HistoryKind::Completed, at(2, 7)))
            .unwrap();

        store.delete_activity(activity.id).unwrap();
        assert!(store.fetch_activities().unwrap().is_empty());
        assert_eq!(store.fetch_history().unwrap().len(), 1);
        assert!(matches!(
            store.delete_activity(activity.id),
            Err(StoreError::NotFound(id)) if id == activity.id
        ));
    }

    #[test]
    fn purge_removes_only_that_activity() {
        let store = SnapshotStore::in_memory();
        let walk = Activity::new("Walk");
        let read = Activity::new("Read");
        for (activity, day) in [(&walk, 1), (&walk, 2), (&read, 2)] {
            store
                .append_history(HistoryEvent::for_activity(activity, HistoryKind::Completed, at(day, 9)))
                .unwrap();
        }
        assert_eq!(store.purge_history(walk.id).unwrap(), 2);
        let history = store.fetch_history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].activity_name(), "Read");
    }
}
