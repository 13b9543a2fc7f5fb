//! Display state engine
//!
//! Owns the one mutable [`DisplayState`] and the transition that recomputes it.
//! [`transition`] is pure: it takes the previous state plus everything that was
//! resolved for this event and returns the next state together with the
//! ordered [`Effect`]s the host must apply. [`DisplayStateEngine::recompute`]
//! performs the resolution (project, branch query) around it.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::branch::{Branch, BranchResolver};
use crate::color::project_color;
use crate::config::Settings;
use crate::project::{project_basename, project_key, Workspace};
use crate::settings::{self, ProjectSettings};
use crate::transform::transform;

/// Command run when the primary widget is clicked.
pub const QUICK_SWITCH_COMMAND: &str = "workbench.action.quickSwitchWindow";

/// What the indicator currently shows.
///
/// Hidden when `resolved_project_path` is `None`; `project_name` is never empty
/// otherwise. `branch` is only set when detection is enabled and succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DisplayState {
    pub resolved_project_path: Option<String>,
    pub project_name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub branch: Option<String>,
}

impl DisplayState {
    pub fn is_visible(&self) -> bool {
        self.resolved_project_path.is_some()
    }
}

/// Text, color and click command for one widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetContent {
    pub text: String,
    pub color: Option<String>,
    pub command: Option<String>,
}

/// Side effect requested by a transition, in application order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Dispose the current head watcher and watch this project instead.
    RearmWatcher { project_path: PathBuf },
    /// Branch differs from the last recorded one. Diagnostic only.
    LogBranchChange { from: Option<String>, to: Option<String> },
    /// Clear and hide the primary widget.
    HidePrimary,
    RenderPrimary(WidgetContent),
    ShowBranch(WidgetContent),
    HideBranch,
}

/// Result of one [`transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: DisplayState,
    pub effects: Vec<Effect>,
}

/// Fill the primary widget template.
///
/// `{git-branch}` is always replaced with nothing: the branch has its own widget.
pub fn render_template(template: &str, project_name: &str, icon: Option<&str>) -> String {
    let icon = icon.map(|i| format!("$({})", i)).unwrap_or_default();
    template
        .replace("{project-name}", project_name)
        .replace("{icon}", &icon)
        .replace("{git-branch}", "")
        .trim()
        .to_string()
}

/// Compute the next state and its effects.
pub fn transition(
    prev: &DisplayState,
    resolved: Option<&Path>,
    branch: &Branch,
    settings: &Settings,
    overrides: &ProjectSettings,
) -> Transition {
    let Some(project_path) = resolved else {
        return Transition {
            state: DisplayState::default(),
            effects: vec![Effect::HidePrimary, Effect::HideBranch],
        };
    };

    let key = project_key(project_path);
    let mut effects = Vec::new();

    if prev.resolved_project_path.as_deref() != Some(key.as_str()) {
        effects.push(Effect::RearmWatcher {
            project_path: project_path.to_path_buf(),
        });
    }

    let entry = settings::lookup(overrides, project_path);
    let project_name = entry
        .and_then(|e| e.name())
        .map(str::to_string)
        .unwrap_or_else(|| {
            let basename = project_basename(project_path);
            match transform(&basename, settings.text_transform) {
                name if name.is_empty() => basename,
                name => name,
            }
        });
    let icon = entry
        .and_then(|e| e.icon())
        .or(Some(settings.icon.as_str()).filter(|i| !i.is_empty()))
        .map(str::to_string);
    // Derived colors are keyed on the path, not on the display name.
    let color = entry
        .and_then(|e| e.color())
        .map(str::to_string)
        .or_else(|| project_color(settings, &key));
    let branch = if settings.enable_git_branch {
        branch.name().map(str::to_string)
    } else {
        None
    };

    if branch != prev.branch {
        effects.push(Effect::LogBranchChange {
            from: prev.branch.clone(),
            to: branch.clone(),
        });
    }

    effects.push(Effect::RenderPrimary(WidgetContent {
        text: render_template(&settings.template, &project_name, icon.as_deref()),
        color: color.clone(),
        command: Some(QUICK_SWITCH_COMMAND.to_string()),
    }));

    effects.push(match &branch {
        Some(name) => Effect::ShowBranch(WidgetContent {
            text: format!(" {}", name),
            color: settings.git_branch_color().map(str::to_string),
            command: None,
        }),
        None => Effect::HideBranch,
    });

    Transition {
        state: DisplayState {
            resolved_project_path: Some(key),
            project_name,
            icon,
            color,
            branch,
        },
        effects,
    }
}

/// Owner of the display state.
pub struct DisplayStateEngine {
    state: DisplayState,
    branches: BranchResolver,
}

impl DisplayStateEngine {
    pub fn new(branches: BranchResolver) -> Self {
        Self {
            state: DisplayState::default(),
            branches,
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Re-derive the display state for `workspace`. Never fails; the worst case is Hidden.
    pub async fn recompute(
        &mut self,
        workspace: &Workspace,
        settings: &Settings,
        overrides: &ProjectSettings,
    ) -> Vec<Effect> {
        let resolved = workspace.resolve_project();
        let branch = match resolved {
            Some(path) => self.branches.resolve(path, settings.enable_git_branch).await,
            None => Branch::Unavailable,
        };

        let Transition { state, effects } =
            transition(&self.state, resolved, &branch, settings, overrides);

        if state.is_visible() {
            tracing::debug!(
                project = ?state.resolved_project_path,
                name = %state.project_name,
                branch = ?state.branch,
                "Display state recomputed"
            );
        } else {
            tracing::debug!(roots = workspace.roots.len(), "No project resolved, hiding indicator");
        }

        self.state = state;
        effects
    }
}
