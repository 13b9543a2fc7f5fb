//! Per-project overrides persisted under `projectSetting`.
//!
//! Pure data access: the map is read and written whole through the
//! [`ConfigStore`], keyed by the exact root path string.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::ConfigStore;
use crate::project::project_key;

/// Configuration key of the override map.
pub const PROJECT_SETTING_KEY: &str = "projectSetting";

/// User customization for one project. Empty strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl ProjectOverride {
    pub fn name(&self) -> Option<&str> {
        non_empty(&self.name)
    }

    pub fn color(&self) -> Option<&str> {
        non_empty(&self.color)
    }

    pub fn icon(&self) -> Option<&str> {
        non_empty(&self.icon)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Overrides keyed by exact project path string.
pub type ProjectSettings = BTreeMap<String, ProjectOverride>;

/// Read the override map. A missing key is an empty map.
pub fn load_overrides(store: &dyn ConfigStore) -> Result<ProjectSettings> {
    match store.section()?.remove(PROJECT_SETTING_KEY) {
        None | Some(serde_json::Value::Null) => Ok(ProjectSettings::new()),
        Some(value) => serde_json::from_value(value).context("Invalid projectSetting map"),
    }
}

/// Write the whole override map back at global scope.
pub fn save_overrides(store: &mut dyn ConfigStore, overrides: &ProjectSettings) -> Result<()> {
    store.update(PROJECT_SETTING_KEY, serde_json::to_value(overrides)?)
}

/// Override for `project_path`, matched on the exact path string.
pub fn lookup<'a>(overrides: &'a ProjectSettings, project_path: &Path) -> Option<&'a ProjectOverride> {
    overrides.get(&project_key(project_path))
}

/// Replace the override of one project, leaving every other entry intact.
pub fn store_override(
    store: &mut dyn ConfigStore,
    project_path: &Path,
    entry: ProjectOverride,
) -> Result<()> {
    let mut overrides = load_overrides(store)?;
    overrides.insert(project_key(project_path), entry);
    save_overrides(store, &overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_missing_map_is_empty() {
        let store = MemoryStore::default();
        assert!(load_overrides(&store).unwrap().is_empty());

        let store = MemoryStore::default().with(PROJECT_SETTING_KEY, serde_json::Value::Null);
        assert!(load_overrides(&store).unwrap().is_empty());
    }

    #[test]
    fn test_lookup_uses_exact_path() {
        let store = MemoryStore::default().with(
            PROJECT_SETTING_KEY,
            json!({ "/proj": { "name": "Project", "icon": "rocket" } }),
        );
        let overrides = load_overrides(&store).unwrap();

        let entry = lookup(&overrides, Path::new("/proj")).unwrap();
        assert_eq!(entry.name(), Some("Project"));
        assert_eq!(entry.icon(), Some("rocket"));
        assert_eq!(entry.color(), None);

        assert!(lookup(&overrides, Path::new("/proj/")).is_none());
        assert!(lookup(&overrides, Path::new("/Proj")).is_none());
    }

    #[test]
    fn test_empty_strings_are_unset() {
        let entry = ProjectOverride {
            color: Some(String::new()),
            name: Some(String::new()),
            icon: None,
        };
        assert_eq!(entry.name(), None);
        assert_eq!(entry.color(), None);
    }

    #[test]
    fn test_store_override_keeps_other_projects() {
        let mut store = MemoryStore::default().with(
            PROJECT_SETTING_KEY,
            json!({ "/other": { "color": "#ffffff" } }),
        );

        store_override(
            &mut store,
            Path::new("/proj"),
            ProjectOverride {
                name: Some("Proj".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let overrides = load_overrides(&store).unwrap();
        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides["/other"].color(), Some("#ffffff"));
        assert_eq!(overrides["/proj"].name(), Some("Proj"));
        assert_eq!(
            store.get(PROJECT_SETTING_KEY).unwrap()["/proj"],
            json!({ "name": "Proj" })
        );
    }

    #[test]
    fn test_invalid_map_is_an_error() {
        let store = MemoryStore::default().with(PROJECT_SETTING_KEY, json!(["/proj"]));
        assert!(load_overrides(&store).is_err());
    }
}
