//! Event loop
//!
//! A [`Session`] owns the engine, the head watcher and the widgets. Events are
//! handled one at a time and every recompute, branch query included, runs to
//! completion before the next event is taken, so recomputes never overlap.

use serde::Deserialize;
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::commands::{configure_project, Prompter};
use crate::config::{ConfigStore, Settings};
use crate::engine::{DisplayState, DisplayStateEngine, Effect};
use crate::error::{swallow, ErrorCategory};
use crate::logging::LogControl;
use crate::project::Workspace;
use crate::settings::{load_overrides, ProjectOverride};
use crate::watcher::{ChangeWatcherManager, WatchEvent};
use crate::widget::{StatusBar, StatusItem};

/// Something that may change what the indicator shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    WorkspaceFoldersChanged(Vec<PathBuf>),
    ActiveDocumentChanged(Option<PathBuf>),
    ConfigurationChanged,
    HeadChanged,
    Refresh,
}

impl From<WatchEvent> for Event {
    fn from(event: WatchEvent) -> Self {
        match event {
            WatchEvent::HeadChanged => Event::HeadChanged,
            WatchEvent::ConfigChanged => Event::ConfigurationChanged,
        }
    }
}

/// One line of the editor protocol read by the CLI host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum EditorMessage {
    WorkspaceFolders { roots: Vec<PathBuf> },
    ActiveDocument {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    Configuration,
    Refresh,
}

impl From<EditorMessage> for Event {
    fn from(message: EditorMessage) -> Self {
        match message {
            EditorMessage::WorkspaceFolders { roots } => Event::WorkspaceFoldersChanged(roots),
            EditorMessage::ActiveDocument { path } => Event::ActiveDocumentChanged(path),
            EditorMessage::Configuration => Event::ConfigurationChanged,
            EditorMessage::Refresh => Event::Refresh,
        }
    }
}

pub struct Session<I: StatusItem> {
    workspace: Workspace,
    config: Box<dyn ConfigStore>,
    engine: DisplayStateEngine,
    watcher: ChangeWatcherManager,
    bar: StatusBar<I>,
    logs: Option<LogControl>,
}

impl<I: StatusItem> Session<I> {
    pub fn new(
        workspace: Workspace,
        config: Box<dyn ConfigStore>,
        engine: DisplayStateEngine,
        watcher: ChangeWatcherManager,
        bar: StatusBar<I>,
    ) -> Self {
        Self {
            workspace,
            config,
            engine,
            watcher,
            bar,
            logs: None,
        }
    }

    /// Let the session switch debug logging as `enableDebugLogs` changes.
    pub fn with_log_control(mut self, logs: LogControl) -> Self {
        self.logs = Some(logs);
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn state(&self) -> &DisplayState {
        self.engine.state()
    }

    pub fn bar(&self) -> &StatusBar<I> {
        &self.bar
    }

    pub fn watcher(&self) -> &ChangeWatcherManager {
        &self.watcher
    }

    pub fn config_mut(&mut self) -> &mut dyn ConfigStore {
        self.config.as_mut()
    }

    /// Handle one event. Returns whether a recompute ran.
    ///
    /// Focus changes only matter with several roots; with one root the
    /// document is recorded and nothing is recomputed.
    pub async fn handle(&mut self, event: Event) -> bool {
        tracing::debug!(event = ?event, "Handling event");
        match event {
            Event::WorkspaceFoldersChanged(roots) => {
                self.workspace.roots = roots;
            }
            Event::ActiveDocumentChanged(path) => {
                self.workspace.active_document = path;
                if !self.workspace.is_multi_root() {
                    return false;
                }
            }
            Event::ConfigurationChanged | Event::HeadChanged | Event::Refresh => {}
        }

        self.recompute().await;
        true
    }

    /// Snapshot the configuration, recompute and apply every effect.
    pub async fn recompute(&mut self) {
        let settings = self.settings();
        let overrides =
            swallow(ErrorCategory::Configuration, load_overrides(self.config.as_ref())).unwrap_or_default();

        if let Some(logs) = &self.logs {
            logs.set_debug(settings.enable_debug_logs);
        }

        let effects = self.engine.recompute(&self.workspace, &settings, &overrides).await;

        for effect in &effects {
            match effect {
                Effect::RearmWatcher { project_path } => self.watcher.arm(project_path),
                Effect::LogBranchChange { from, to } => {
                    tracing::debug!(from = ?from, to = ?to, "Git branch changed");
                }
                _ => {}
            }
        }

        self.bar.place(&settings);
        self.bar.apply(&effects);
    }

    /// Run the interactive configure flow for the current project, then recompute.
    pub async fn configure(&mut self, prompter: &mut dyn Prompter) -> anyhow::Result<Option<ProjectOverride>> {
        let settings = Settings::load(self.config.as_ref())?;
        let saved = configure_project(self.engine.state(), &settings, self.config.as_mut(), prompter)?;
        if saved.is_some() {
            self.recompute().await;
        }
        Ok(saved)
    }

    /// Process events until the future is dropped, calling `on_change` after
    /// every recompute.
    ///
    /// The head watcher keeps the watch channel open, so closing the editor
    /// channel does not end the loop; hosts cancel it (Ctrl-C in the CLI).
    pub async fn run(
        &mut self,
        mut editor: UnboundedReceiver<Event>,
        mut watch: UnboundedReceiver<WatchEvent>,
        mut on_change: impl FnMut(&Self),
    ) {
        self.recompute().await;
        on_change(self);

        let mut editor_open = true;
        loop {
            let event = tokio::select! {
                received = editor.recv(), if editor_open => match received {
                    Some(event) => event,
                    None => {
                        editor_open = false;
                        continue;
                    }
                },
                received = watch.recv() => match received {
                    Some(event) => Event::from(event),
                    None => break,
                },
            };

            if self.handle(event).await {
                on_change(self);
            }
        }
    }

    fn settings(&self) -> Settings {
        swallow(ErrorCategory::Configuration, Settings::load(self.config.as_ref())).unwrap_or_default()
    }
}
