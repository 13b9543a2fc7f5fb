//! # where-am-i - project and branch indicator engine
//!
//! Resolves which project of a (possibly multi-root) workspace is current,
//! derives a display name, icon and color for it, detects the checked-out git
//! branch, and keeps two status widgets in sync with a stream of editor events.
//!
//! ## Features
//!
//! - **Project resolution**: single-root and multi-root workspaces, driven by the focused document
//! - **Per-project overrides**: name, color and icon persisted in the settings file
//! - **Branch detection**: short-lived `git rev-parse` with a hard one second bound
//! - **Head watching**: one file watcher on `.git/HEAD`, re-armed on project switch
//! - **Fail silent**: every degradation is logged, nothing interrupts the host
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use where_am_i::{BranchResolver, DisplayStateEngine, MemoryStore, Settings, Workspace};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let store = MemoryStore::default();
//!     let settings = Settings::load(&store)?;
//!     let overrides = where_am_i::settings::load_overrides(&store)?;
//!
//!     let mut engine = DisplayStateEngine::new(BranchResolver::git());
//!     let workspace = Workspace::single("/home/me/my-app");
//!     for effect in engine.recompute(&workspace, &settings, &overrides).await {
//!         println!("{:?}", effect);
//!     }
//!     Ok(())
//! }
//! ```

pub mod branch;
pub mod color;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod icons;
pub mod logging;
pub mod project;
pub mod session;
pub mod settings;
pub mod transform;
pub mod watcher;
pub mod widget;

// Re-export main types for library consumers
pub use branch::{Branch, BranchQuery, BranchResolver, GitCli};
pub use config::{Alignment, ConfigStore, JsonFileStore, MemoryStore, Settings};
pub use engine::{DisplayState, DisplayStateEngine, Effect, Transition, WidgetContent};
pub use project::Workspace;
pub use session::{EditorMessage, Event, Session};
pub use settings::{ProjectOverride, ProjectSettings};
pub use transform::TextTransform;
pub use watcher::{ChangeWatcherManager, NotifyBackend, WatchBackend, WatchEvent, WatchHandle};
pub use widget::{ItemState, Placement, StatusBar, StatusItem};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
