//! Durable list preferences, stored as one JSON record per namespace.
//!
//! Storage problems are logged and otherwise ignored; reads fall back to defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::models::{MakeId, SortDirection, SortField, DEFAULT_PAGE_SIZE};

pub const NAMESPACE: &str = "vehicle-management-filters";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterPreferences {
    pub search: String,
    pub make_id: Option<MakeId>,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    pub page_size: u32,
}

impl Default for FilterPreferences {
    fn default() -> Self {
        Self {
            search: String::new(),
            make_id: None,
            sort_field: SortField::Name,
            sort_direction: SortDirection::Asc,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    /// Store the record at `{dir}/vehicle-management-filters.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{NAMESPACE}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing fields take their defaults; unreadable records yield defaults.
    pub fn load(&self) -> FilterPreferences {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return FilterPreferences::default()
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "failed to read list preferences");
                return FilterPreferences::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|err| {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to parse list preferences");
            FilterPreferences::default()
        })
    }

    pub fn save(&self, preferences: &FilterPreferences) {
        if let Err(err) = self.try_save(preferences) {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to save list preferences");
        }
    }

    pub fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "failed to clear list preferences")
            }
        }
    }

    fn try_save(&self, preferences: &FilterPreferences) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(preferences)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_record_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::in_dir(dir.path());
        let prefs = store.load();
        assert_eq!(prefs, FilterPreferences::default());
        assert_eq!(prefs.page_size, 10);
        assert_eq!(prefs.sort_field, SortField::Name);
    }

    #[test]
    fn saved_record_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::in_dir(dir.path().join("nested"));
        let prefs = FilterPreferences {
            search: "class".into(),
            make_id: Some(2),
            sort_field: SortField::MakeName,
            sort_direction: SortDirection::Desc,
            page_size: 20,
        };
        store.save(&prefs);
        assert_eq!(store.load(), prefs);

        store.clear();
        assert_eq!(store.load(), FilterPreferences::default());
    }

    #[test]
    fn partial_record_merges_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::in_dir(dir.path());
        std::fs::write(store.path(), r#"{"pageSize": 50}"#).unwrap();

        let prefs = store.load();
        assert_eq!(prefs.page_size, 50);
        assert_eq!(prefs.search, "");
        assert_eq!(prefs.sort_direction, SortDirection::Asc);
    }

    #[test]
    fn corrupt_record_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::in_dir(dir.path());
        std::fs::write(store.path(), "{not json").unwrap();
        assert_eq!(store.load(), FilterPreferences::default());
    }

    #[test]
    fn unwritable_location_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let store = PreferenceStore::in_dir(blocker.join("below"));
        store.save(&FilterPreferences::default());
        assert_eq!(store.load(), FilterPreferences::default());
    }
}
