use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

use where_am_i::commands::TerminalPrompter;
use where_am_i::error::EnhancedError;
use where_am_i::icons::search_icons;
use where_am_i::logging::{self, LogControl};
use where_am_i::watcher::{watch_config_file, NoWatch};
use where_am_i::widget::{render_line, LineFormat};
use where_am_i::{
    BranchResolver, ChangeWatcherManager, DisplayStateEngine, EditorMessage, Event,
    ItemState, JsonFileStore, NotifyBackend, Session, Settings, StatusBar, WatchBackend, WatchEvent,
    Workspace,
};

#[derive(Parser)]
#[command(name = "where-am-i")]
#[command(about = "Shows which project and git branch you are working in", version)]
#[command(after_help = "Editor events are read from stdin by `watch`, one JSON object per line:
   {\"event\":\"workspaceFolders\",\"roots\":[\"/home/me/api\",\"/home/me/web\"]}
   {\"event\":\"activeDocument\",\"path\":\"/home/me/web/src/App.tsx\"}
   {\"event\":\"configuration\"}
   {\"event\":\"refresh\"}")]
struct Cli {
    /// Settings file (defaults to $XDG_CONFIG_HOME/where-am-i/settings.json)
    #[arg(long, global = true, env = "WHERE_AM_I_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Keep the indicator up to date and print it whenever it changes
    Watch {
        #[command(flatten)]
        workspace: WorkspaceArgs,
    },

    /// Print the indicator once
    Status {
        #[command(flatten)]
        workspace: WorkspaceArgs,
    },

    /// Set name, color and icon of the current project
    Configure {
        #[command(flatten)]
        workspace: WorkspaceArgs,
    },

    /// Show the diagnostic log
    Logs,

    /// List the icons offered by `configure`
    Icons {
        /// Only icons whose name contains this
        query: Option<String>,
    },
}

#[derive(Args, Clone, Default)]
struct WorkspaceArgs {
    /// Workspace root; repeat for a multi-root workspace (defaults to the current directory)
    #[arg(short, long = "root", value_name = "DIR")]
    roots: Vec<PathBuf>,

    /// Document that has focus
    #[arg(short, long, value_name = "FILE")]
    active: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Plain)]
    format: Format,
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum Format {
    #[default]
    Plain,
    Json,
}

impl From<Format> for LineFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Plain => LineFormat::Plain,
            Format::Json => LineFormat::Json,
        }
    }
}

impl WorkspaceArgs {
    fn workspace(&self) -> Result<Workspace> {
        let roots = if self.roots.is_empty() {
            vec![std::env::current_dir()?]
        } else {
            self.roots.clone()
        };
        Ok(Workspace::new(roots, self.active.clone()))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprint!("{}", EnhancedError::new(e).display().red());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.config;
    let config_path = move || config.map(Ok).unwrap_or_else(JsonFileStore::default_path);
    let command = cli.command.unwrap_or(Commands::Watch {
        workspace: WorkspaceArgs::default(),
    });

    match command {
        Commands::Watch { workspace } => watch(config_path()?, workspace).await,
        Commands::Status { workspace } => {
            let (mut session, _watch_rx) = start_session(config_path()?, &workspace, NoWatch)?;
            session.recompute().await;
            println!("{}", render_line(session.bar(), workspace.format.into(), terminal_width()));
            Ok(())
        }
        Commands::Configure { workspace } => {
            let (mut session, _watch_rx) = start_session(config_path()?, &workspace, NoWatch)?;
            session.recompute().await;
            if !session.state().is_visible() {
                println!("{}", "No project is open, nothing to configure.".yellow());
                return Ok(());
            }

            let stdin = std::io::stdin();
            let mut prompter = TerminalPrompter::new(stdin.lock(), std::io::stdout());
            match session.configure(&mut prompter).await? {
                Some(_) => {
                    println!("{} Project settings saved", "✓".green());
                    println!("{}", render_line(session.bar(), workspace.format.into(), terminal_width()));
                }
                None => println!("Nothing changed"),
            }
            Ok(())
        }
        Commands::Logs => {
            let mut out = std::io::stdout().lock();
            logging::show_logs(&logging::log_dir()?, &mut out)?;
            out.flush()?;
            Ok(())
        }
        Commands::Icons { query } => {
            for name in search_icons(query.as_deref().unwrap_or("")) {
                println!("{}  {}", format!("$({})", name).bright_white(), name.dimmed());
            }
            Ok(())
        }
    }
}

fn start_session(
    config_path: PathBuf,
    args: &WorkspaceArgs,
    backend: impl WatchBackend + 'static,
) -> Result<(Session<ItemState>, mpsc::UnboundedReceiver<WatchEvent>)> {
    let store = JsonFileStore::new(config_path);
    let debug = Settings::load(&store).map(|s| s.enable_debug_logs).unwrap_or(false);
    let logs = init_logging(debug);

    let (watch_tx, watch_rx) = mpsc::unbounded_channel();
    let mut session = Session::new(
        args.workspace()?,
        Box::new(store),
        DisplayStateEngine::new(BranchResolver::git()),
        ChangeWatcherManager::new(backend, watch_tx),
        StatusBar::default(),
    );
    if let Some(logs) = logs {
        session = session.with_log_control(logs);
    }
    Ok((session, watch_rx))
}

fn init_logging(debug: bool) -> Option<LogControl> {
    match logging::log_dir().and_then(|dir| logging::init(&dir, debug)) {
        Ok(logs) => {
            tracing::info!(version = where_am_i::VERSION, log = %logs.path().display(), "Activated");
            Some(logs)
        }
        Err(e) => {
            eprintln!("{} diagnostic log disabled: {:#}", "warning:".yellow(), e);
            None
        }
    }
}

async fn watch(config_path: PathBuf, args: WorkspaceArgs) -> Result<()> {
    let (mut session, watch_rx) = start_session(config_path.clone(), &args, NotifyBackend)?;

    let (config_tx, mut config_rx) = mpsc::unbounded_channel();
    let _config_watcher = match watch_config_file(&config_path, config_tx) {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %format!("{:#}", e), "Settings file not watched");
            None
        }
    };

    let (editor_tx, editor_rx) = mpsc::unbounded_channel();
    let config_events = editor_tx.clone();
    tokio::spawn(async move {
        while let Some(event) = config_rx.recv().await {
            if config_events.send(Event::from(event)).is_err() {
                break;
            }
        }
    });
    tokio::spawn(read_editor_events(editor_tx));

    let format = LineFormat::from(args.format);
    let mut last = None;
    let print_changes = |session: &Session<ItemState>| {
        let line = render_line(session.bar(), format, terminal_width());
        if last.as_ref() != Some(&line) {
            println!("{}", line);
            let _ = std::io::stdout().flush();
            last = Some(line);
        }
    };

    tokio::select! {
        _ = session.run(editor_rx, watch_rx, print_changes) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
        }
    }

    tracing::info!("Deactivated");
    Ok(())
}

/// Forward editor protocol lines from stdin. Malformed lines are logged and skipped.
async fn read_editor_events(events: mpsc::UnboundedSender<Event>) {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => match serde_json::from_str::<EditorMessage>(&line) {
                Ok(message) => {
                    if events.send(message.into()).is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!(error = %e, line = %line, "Ignoring malformed editor event"),
            },
            Ok(None) => {
                tracing::debug!("Editor input closed");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read editor input");
                break;
            }
        }
    }
}

fn terminal_width() -> Option<usize> {
    std::env::var("COLUMNS").ok().and_then(|c| c.parse().ok())
}
