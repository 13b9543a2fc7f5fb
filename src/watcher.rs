//! Head reference watching
//!
//! Exactly one watcher is live at a time, keyed by the resolved project. It
//! covers `<project>/.git/HEAD` and the `refs/heads` namespace and only acts as
//! a trigger: any change there asks the session for a full recompute.
//!
//! The settings file of the CLI host is watched with the same machinery.

use anyhow::{Context as _, Result};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::{swallow, ErrorCategory};

/// Directory holding the version-control metadata of a project.
pub const VCS_DIR: &str = ".git";

const HEAD_DEBOUNCE: Duration = Duration::from_millis(100);
const CONFIG_DEBOUNCE: Duration = Duration::from_millis(200);

/// Trigger sent by a watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    HeadChanged,
    ConfigChanged,
}

/// A live registration. Disposing it stops all notifications.
pub trait WatchHandle: Send {
    fn dispose(self: Box<Self>);
}

/// File-change notification primitive.
pub trait WatchBackend {
    /// Watch the head reference of `project_path`, sending [`WatchEvent::HeadChanged`] on change.
    fn register(
        &mut self,
        project_path: &Path,
        events: UnboundedSender<WatchEvent>,
    ) -> Result<Box<dyn WatchHandle>>;
}

/// Whether `path` is `.git/HEAD` or lives under `.git/refs/heads/`.
pub fn is_head_reference(path: &Path) -> bool {
    let parts: Vec<&OsStr> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();

    let Some(vcs) = parts.iter().rposition(|p| *p == OsStr::new(VCS_DIR)) else {
        return false;
    };

    match &parts[vcs + 1..] {
        [head] => *head == OsStr::new("HEAD"),
        [refs, heads, _, ..] => *refs == OsStr::new("refs") && *heads == OsStr::new("heads"),
        _ => false,
    }
}

/// Debounced notify registration.
pub struct NotifyHandle {
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    target: PathBuf,
}

impl WatchHandle for NotifyHandle {
    fn dispose(self: Box<Self>) {
        tracing::debug!(target = %self.target.display(), "Disposing watcher");
        self.debouncer.stop();
    }
}

/// [`WatchBackend`] on top of notify.
#[derive(Debug, Default)]
pub struct NotifyBackend;

impl WatchBackend for NotifyBackend {
    fn register(
        &mut self,
        project_path: &Path,
        events: UnboundedSender<WatchEvent>,
    ) -> Result<Box<dyn WatchHandle>> {
        let vcs_dir = project_path.join(VCS_DIR);
        if !vcs_dir.is_dir() {
            anyhow::bail!("{} is not a git working tree", project_path.display());
        }

        let mut debouncer = new_debouncer(
            HEAD_DEBOUNCE,
            None,
            move |result: DebounceEventResult| match result {
                Ok(batch) => {
                    let head_moved = batch
                        .iter()
                        .any(|event| event.paths.iter().any(|p| is_head_reference(p)));
                    if head_moved {
                        tracing::debug!("Git head reference changed");
                        let _ = events.send(WatchEvent::HeadChanged);
                    }
                }
                Err(errors) => {
                    for e in errors {
                        tracing::warn!(error = %e, "Head watcher error");
                    }
                }
            },
        )?;

        // Git rewrites HEAD by renaming a lock file over it, so watch the directory.
        debouncer
            .watch(&vcs_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch: {}", vcs_dir.display()))?;

        let heads = vcs_dir.join("refs").join("heads");
        if heads.is_dir() {
            debouncer
                .watch(&heads, RecursiveMode::Recursive)
                .with_context(|| format!("Failed to watch: {}", heads.display()))?;
        }

        tracing::debug!(target = %vcs_dir.join("HEAD").display(), "Head watcher registered");
        Ok(Box::new(NotifyHandle {
            debouncer,
            target: vcs_dir,
        }))
    }
}

/// Backend for one-shot hosts: registrations succeed and never fire.
#[derive(Debug, Default)]
pub struct NoWatch;

struct InertHandle;

impl WatchHandle for InertHandle {
    fn dispose(self: Box<Self>) {}
}

impl WatchBackend for NoWatch {
    fn register(
        &mut self,
        _project_path: &Path,
        _events: UnboundedSender<WatchEvent>,
    ) -> Result<Box<dyn WatchHandle>> {
        Ok(Box::new(InertHandle))
    }
}

/// Watch one settings file, sending [`WatchEvent::ConfigChanged`] when it changes.
pub fn watch_config_file(path: &Path, events: UnboundedSender<WatchEvent>) -> Result<NotifyHandle> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let file_name = path.file_name().map(OsStr::to_os_string);

    let mut debouncer = new_debouncer(
        CONFIG_DEBOUNCE,
        None,
        move |result: DebounceEventResult| {
            if let Ok(batch) = result {
                let touched = batch
                    .iter()
                    .any(|event| event.paths.iter().any(|p| p.file_name() == file_name.as_deref()));
                if touched {
                    let _ = events.send(WatchEvent::ConfigChanged);
                }
            }
        },
    )?;
    debouncer
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch: {}", dir.display()))?;

    Ok(NotifyHandle {
        debouncer,
        target: path.to_path_buf(),
    })
}

/// Owner of the single head watcher slot.
pub struct ChangeWatcherManager {
    backend: Box<dyn WatchBackend>,
    events: UnboundedSender<WatchEvent>,
    handle: Option<Box<dyn WatchHandle>>,
    armed: Option<PathBuf>,
}

impl ChangeWatcherManager {
    pub fn new(backend: impl WatchBackend + 'static, events: UnboundedSender<WatchEvent>) -> Self {
        Self {
            backend: Box::new(backend),
            events,
            handle: None,
            armed: None,
        }
    }

    /// Project whose head is currently watched.
    pub fn armed_path(&self) -> Option<&Path> {
        self.armed.as_deref()
    }

    /// Replace the live watcher with one for `project_path`.
    ///
    /// The previous registration is always disposed first. Registration failures
    /// are logged and leave the manager disarmed.
    pub fn arm(&mut self, project_path: &Path) {
        self.disarm();

        let registered = self.backend.register(project_path, self.events.clone());
        if let Some(handle) = swallow(ErrorCategory::WatcherRegistration, registered) {
            self.handle = Some(handle);
            self.armed = Some(project_path.to_path_buf());
        }
    }

    pub fn disarm(&mut self) {
        if let Some(handle) = self.handle.take() {
            tracing::debug!(project = ?self.armed, "Clearing previous head watcher");
            handle.dispose();
        }
        self.armed = None;
    }
}

impl Drop for ChangeWatcherManager {
    fn drop(&mut self) {
        self.disarm();
    }
}
