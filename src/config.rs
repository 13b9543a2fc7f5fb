//! Configuration for the indicator.
//!
//! Options live in the `where-am-i` section of a key-value [`ConfigStore`].
//! Nothing is cached: every recompute takes a fresh [`Settings`] snapshot and
//! threads it through the resolvers.

use anyhow::{bail, Context as _, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::transform::TextTransform;

/// Configuration section name.
pub const SECTION: &str = "where-am-i";

pub const DEFAULT_ALIGN_PRIORITY: i64 = 100_000;
pub const DEFAULT_TEMPLATE: &str = "{icon} {project-name}";
pub const DEFAULT_ICON: &str = "folder-opened";

/// Key-value configuration with global-scope writes.
pub trait ConfigStore {
    /// All keys currently set in the section, without the section prefix.
    fn section(&self) -> Result<Map<String, Value>>;

    /// Write `value` under `key` at global scope.
    fn update(&mut self, key: &str, value: Value) -> Result<()>;
}

/// Side of the status area the widgets are placed on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Right,
    /// Unknown values mean left.
    #[default]
    #[serde(other)]
    Left,
}

/// Snapshot of every recognized option.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Gate for all branch logic
    pub enable_git_branch: bool,

    /// Gate for the diagnostic log
    pub enable_debug_logs: bool,

    /// Color of the branch widget
    pub git_branch_color: String,

    /// Casing for names derived from the folder (the key keeps its historical spelling)
    #[serde(rename = "textTransfrom", alias = "textTransform")]
    pub text_transform: TextTransform,

    /// Default icon when no override exists
    pub icon: String,

    /// Sort priority of the primary widget; the branch widget uses one less
    #[serde(deserialize_with = "lenient_priority")]
    pub align_priority: i64,

    /// Primary widget template
    pub template: String,

    /// Derive a color for projects without one
    pub colorful: bool,

    /// Explicit color, wins over derivation
    pub color: String,

    /// Widget side
    pub align: Alignment,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_git_branch: true,
            enable_debug_logs: false,
            git_branch_color: String::new(),
            text_transform: TextTransform::Capitalize,
            icon: DEFAULT_ICON.to_string(),
            align_priority: DEFAULT_ALIGN_PRIORITY,
            template: DEFAULT_TEMPLATE.to_string(),
            colorful: true,
            color: String::new(),
            align: Alignment::Left,
        }
    }
}

impl Settings {
    /// Take a snapshot from `store`.
    pub fn load(store: &dyn ConfigStore) -> Result<Self> {
        Self::from_section(store.section()?)
    }

    pub fn from_section(section: Map<String, Value>) -> Result<Self> {
        serde_json::from_value(Value::Object(section)).context("Invalid where-am-i settings")
    }

    pub fn git_branch_color(&self) -> Option<&str> {
        Some(self.git_branch_color.as_str()).filter(|c| !c.is_empty())
    }
}

/// Numbers and numeric strings are accepted; anything else means the default.
fn lenient_priority<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let priority = match &value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64),
        _ => None,
    };
    Ok(priority.unwrap_or(DEFAULT_ALIGN_PRIORITY))
}

/// Settings file in the layout editors use for `settings.json`.
///
/// Keys are read both flat (`"where-am-i.icon"`) and nested under a
/// `"where-am-i"` object; flat keys win. Writes always use the flat form.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `settings.json` in the user config directory (`~/.config/where-am-i` on Linux).
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", SECTION)
            .context("No home directory found, pass --config to locate the settings file")?;
        Ok(dirs.config_dir().join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_root(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?
        {
            Value::Object(root) => Ok(root),
            _ => bail!("{} must contain a JSON object", self.path.display()),
        }
    }
}

impl ConfigStore for JsonFileStore {
    fn section(&self) -> Result<Map<String, Value>> {
        let root = self.read_root()?;
        let prefix = format!("{SECTION}.");

        let mut section = match root.get(SECTION) {
            Some(Value::Object(nested)) => nested.clone(),
            _ => Map::new(),
        };
        for (key, value) in root {
            if let Some(name) = key.strip_prefix(&prefix) {
                section.insert(name.to_string(), value);
            }
        }
        Ok(section)
    }

    fn update(&mut self, key: &str, value: Value) -> Result<()> {
        let mut root = self.read_root()?;
        if let Some(Value::Object(nested)) = root.get_mut(SECTION) {
            nested.remove(key);
        }
        root.insert(format!("{SECTION}.{key}"), value);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&Value::Object(root))?)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

/// In-memory store for embedding hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Map<String, Value>,
}

impl MemoryStore {
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

impl ConfigStore for MemoryStore {
    fn section(&self) -> Result<Map<String, Value>> {
        Ok(self.values.clone())
    }

    fn update(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}
