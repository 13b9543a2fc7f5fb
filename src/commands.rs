//! Host commands: configure the current project.

use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::config::{ConfigStore, Settings};
use crate::engine::DisplayState;
use crate::icons::{icon_items, search_icons, PickItem};
use crate::settings::{store_override, ProjectOverride};

/// Interactive prompts supplied by the host. `Ok(None)` means cancelled.
pub trait Prompter {
    fn input(&mut self, prompt: &str, value: Option<&str>) -> Result<Option<String>>;

    fn pick(&mut self, items: &[PickItem], placeholder: Option<&str>) -> Result<Option<PickItem>>;
}

/// Prompt for name, color (when colorful) and icon of the current project and
/// persist them as its override.
///
/// Does nothing and returns `None` while no project is resolved. Cancelled
/// prompts keep the value currently shown.
pub fn configure_project(
    state: &DisplayState,
    settings: &Settings,
    store: &mut dyn ConfigStore,
    prompter: &mut dyn Prompter,
) -> Result<Option<ProjectOverride>> {
    let Some(project_path) = state.resolved_project_path.as_deref() else {
        return Ok(None);
    };
    if state.project_name.is_empty() {
        return Ok(None);
    }

    let name = prompter
        .input("Project Name", Some(&state.project_name))?
        .unwrap_or_else(|| state.project_name.clone());

    let mut color = state.color.clone();
    if settings.colorful {
        if let Some(entered) = prompter.input("Project Color", color.as_deref())? {
            color = Some(entered);
        }
    }

    let icon = prompter
        .pick(&icon_items(), state.icon.as_deref())?
        .map(|item| item.description)
        .filter(|d| !d.is_empty())
        .or_else(|| state.icon.clone());

    let entry = ProjectOverride {
        color,
        name: Some(name),
        icon,
    };
    store_override(store, Path::new(project_path), entry.clone())?;
    tracing::info!(project = %project_path, "Project settings saved");
    Ok(Some(entry))
}

/// Line-based prompter over any reader/writer pair.
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn input(&mut self, prompt: &str, value: Option<&str>) -> Result<Option<String>> {
        match value {
            Some(v) if !v.is_empty() => write!(self.output, "{} [{}]: ", prompt, v)?,
            _ => write!(self.output, "{}: ", prompt)?,
        }
        self.output.flush()?;

        Ok(self.read_line()?.map(|line| match (line.is_empty(), value) {
            (true, Some(v)) => v.to_string(),
            _ => line,
        }))
    }

    /// Type part of a name to filter, a number to choose from the last list,
    /// or an exact name. An empty line keeps the current choice.
    fn pick(&mut self, items: &[PickItem], placeholder: Option<&str>) -> Result<Option<PickItem>> {
        let mut shown: Vec<&PickItem> = Vec::new();
        loop {
            match placeholder {
                Some(p) => write!(self.output, "Icon (search) [{}]: ", p)?,
                None => write!(self.output, "Icon (search): ")?,
            }
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            if line.is_empty() {
                return Ok(None);
            }

            if let Ok(n) = line.parse::<usize>() {
                if let Some(item) = n.checked_sub(1).and_then(|i| shown.get(i)) {
                    return Ok(Some((*item).clone()));
                }
            }
            if let Some(item) = items.iter().find(|i| i.description == line) {
                return Ok(Some(item.clone()));
            }

            let matches = search_icons(&line);
            shown = items
                .iter()
                .filter(|i| matches.contains(&i.description.as_str()))
                .take(20)
                .collect();
            if shown.is_empty() {
                writeln!(self.output, "  no icon matches \"{}\"", line)?;
            }
            for (i, item) in shown.iter().enumerate() {
                writeln!(self.output, "  {:>2}. {}", i + 1, item.description)?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryStore;
    use crate::settings::{load_overrides, ProjectSettings};
    use std::collections::VecDeque;
    use std::io::Cursor;

    struct ScriptedPrompter {
        inputs: VecDeque<Option<String>>,
        pick: Option<&'static str>,
        prompts: Vec<String>,
    }

    impl ScriptedPrompter {
        fn new(inputs: &[Option<&str>], pick: Option<&'static str>) -> Self {
            Self {
                inputs: inputs.iter().map(|i| i.map(str::to_string)).collect(),
                pick,
                prompts: Vec::new(),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn input(&mut self, prompt: &str, _value: Option<&str>) -> Result<Option<String>> {
            self.prompts.push(prompt.to_string());
            Ok(self.inputs.pop_front().flatten())
        }

        fn pick(&mut self, items: &[PickItem], _placeholder: Option<&str>) -> Result<Option<PickItem>> {
            Ok(self
                .pick
                .and_then(|name| items.iter().find(|i| i.description == name).cloned()))
        }
    }

    fn visible_state() -> DisplayState {
        DisplayState {
            resolved_project_path: Some("/proj".into()),
            project_name: "Proj".into(),
            icon: Some("folder".into()),
            color: Some("#0cf4ca".into()),
            branch: None,
        }
    }

    #[test]
    fn test_configure_persists_all_fields() {
        let mut store = MemoryStore::default();
        let mut prompter = ScriptedPrompter::new(&[Some("Renamed"), Some("#ff0000")], Some("rocket"));

        let entry = configure_project(&visible_state(), &Settings::default(), &mut store, &mut prompter)
            .unwrap()
            .unwrap();

        assert_eq!(prompter.prompts, vec!["Project Name", "Project Color"]);
        assert_eq!(entry.name(), Some("Renamed"));
        assert_eq!(entry.color(), Some("#ff0000"));
        assert_eq!(entry.icon(), Some("rocket"));

        let overrides: ProjectSettings = load_overrides(&store).unwrap();
        assert_eq!(overrides["/proj"], entry);
    }

    #[test]
    fn test_cancelled_prompts_keep_current_values() {
        let mut store = MemoryStore::default();
        let mut prompter = ScriptedPrompter::new(&[None, None], None);

        let entry = configure_project(&visible_state(), &Settings::default(), &mut store, &mut prompter)
            .unwrap()
            .unwrap();
        assert_eq!(entry.name(), Some("Proj"));
        assert_eq!(entry.color(), Some("#0cf4ca"));
        assert_eq!(entry.icon(), Some("folder"));
    }

    #[test]
    fn test_color_not_prompted_when_not_colorful() {
        let settings = Settings {
            colorful: false,
            ..Default::default()
        };
        let mut state = visible_state();
        state.color = None;
        let mut store = MemoryStore::default();
        let mut prompter = ScriptedPrompter::new(&[Some("Name")], None);

        let entry = configure_project(&state, &settings, &mut store, &mut prompter)
            .unwrap()
            .unwrap();
        assert_eq!(prompter.prompts, vec!["Project Name"]);
        assert_eq!(entry.color, None);
    }

    #[test]
    fn test_no_project_is_a_no_op() {
        let mut store = MemoryStore::default();
        let mut prompter = ScriptedPrompter::new(&[Some("x")], None);

        let result =
            configure_project(&DisplayState::default(), &Settings::default(), &mut store, &mut prompter)
                .unwrap();
        assert!(result.is_none());
        assert!(prompter.prompts.is_empty());
        assert!(load_overrides(&store).unwrap().is_empty());
    }

    #[test]
    fn test_terminal_input_defaults() {
        let mut prompter = TerminalPrompter::new(Cursor::new("\nNew\n"), Vec::new());
        assert_eq!(
            prompter.input("Project Name", Some("Proj")).unwrap().as_deref(),
            Some("Proj")
        );
        assert_eq!(prompter.input("Project Name", Some("Proj")).unwrap().as_deref(), Some("New"));
        assert_eq!(prompter.input("Project Name", Some("Proj")).unwrap(), None);

        let output = String::from_utf8(prompter.output).unwrap();
        assert!(output.starts_with("Project Name [Proj]: "));
    }

    #[test]
    fn test_terminal_pick() {
        let items = icon_items();

        let mut prompter = TerminalPrompter::new(Cursor::new("git\n2\n"), Vec::new());
        let picked = prompter.pick(&items, None).unwrap().unwrap();
        assert_eq!(picked.description, "git-commit");

        let mut prompter = TerminalPrompter::new(Cursor::new("rocket\n"), Vec::new());
        assert_eq!(prompter.pick(&items, None).unwrap().unwrap().description, "rocket");

        let mut prompter = TerminalPrompter::new(Cursor::new("\n"), Vec::new());
        assert_eq!(prompter.pick(&items, Some("folder")).unwrap(), None);
    }
}
