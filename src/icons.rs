//! Fixed icon catalog offered by the configure flow.

/// Codicon identifiers, rendered by hosts as `$(name)`.
pub const ICONS: &[&str] = &[
    "account", "archive", "beaker", "bell", "bookmark", "briefcase", "browser", "bug",
    "calendar", "check", "checklist", "circuit-board", "cloud", "code", "coffee", "cog",
    "comment", "copilot", "database", "debug", "desktop-download", "device-camera",
    "device-mobile", "docker", "edit", "extensions", "eye", "file", "file-code",
    "file-media", "file-zip", "flame", "folder", "folder-active", "folder-library",
    "folder-opened", "game", "gear", "gift", "git-branch", "git-commit", "git-merge",
    "github", "globe", "graph", "heart", "home", "hubot", "inbox", "key", "library",
    "lightbulb", "link", "lock", "mail", "megaphone", "mortar-board", "music", "notebook",
    "organization", "package", "paintcan", "pulse", "rocket", "ruby", "server",
    "shield", "smiley", "squirrel", "star", "star-full", "symbol-class", "symbol-color",
    "symbol-event", "symbol-misc", "terminal", "tools", "vm", "wand", "zap",
];

/// An entry of the icon picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickItem {
    pub label: String,
    pub description: String,
}

impl PickItem {
    pub fn icon(name: &str) -> Self {
        Self {
            label: format!("$({})", name),
            description: name.to_string(),
        }
    }
}

/// Picker entries for the whole catalog.
pub fn icon_items() -> Vec<PickItem> {
    ICONS.iter().map(|name| PickItem::icon(name)).collect()
}

/// Icons whose name contains `query`, case-insensitively, in catalog order.
pub fn search_icons(query: &str) -> Vec<&'static str> {
    let query = query.trim().to_lowercase();
    ICONS
        .iter()
        .copied()
        .filter(|name| name.contains(&query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search() {
        assert_eq!(search_icons("git"), vec!["git-branch", "git-commit", "git-merge", "github"]);
        assert_eq!(search_icons(" ROCK "), vec!["rocket"]);
        assert_eq!(search_icons("").len(), ICONS.len());
        assert!(search_icons("no-such-icon").is_empty());
    }

    #[test]
    fn test_items() {
        let items = icon_items();
        assert_eq!(items.len(), ICONS.len());
        assert_eq!(items[0], PickItem::icon("account"));
        assert_eq!(items[0].label, "$(account)");
    }

    #[test]
    fn test_catalog_has_defaults() {
        assert!(ICONS.contains(&"folder-opened"));
        assert!(ICONS.contains(&"folder"));
        assert!(!ICONS.contains(&"Folder"));
    }
}
