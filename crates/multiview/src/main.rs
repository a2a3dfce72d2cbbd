//! mvw - manage multiview layouts from the command line.
//!
//! Every invocation drives the same lifecycle a host would: startup (load the
//! active workspace), the command, a save for mutating commands, then
//! shutdown.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing::debug;

use multiview_core::config::{self, Config, LogFormat};
use multiview_core::logging::init_logging;
use multiview_core::migration::EntryShape;
use multiview_core::{
    EventOutcome, HeadlessFactory, HostEvent, LifecycleHandler, LoadOutcome, MultiviewManager,
    SaveOutcome, StaticHost,
};

#[derive(Parser, Debug)]
#[command(name = "mvw")]
#[command(about = "Manage per-workspace multiview layouts")]
#[command(version)]
struct Cli {
    /// Path to multiview.toml (defaults to $MULTIVIEW_CONFIG, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Layout document to operate on, overriding [storage] in the config
    #[arg(long, global = true, env = "MULTIVIEW_FILE")]
    file: Option<PathBuf>,

    /// Active workspace (scene collection)
    #[arg(long, short = 'w', global = true, env = "MULTIVIEW_WORKSPACE", default_value = "default")]
    workspace: String,

    /// Log level filter (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Emit machine-readable JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List multiviews of the workspace
    List,
    /// Create a multiview and save it
    Create {
        /// Display name
        name: String,
        /// Keep it in memory only; never written to the layout file
        #[arg(long)]
        temporary: bool,
    },
    /// Rename a multiview (its id is kept)
    Rename { id: String, name: String },
    /// Remove a multiview
    Remove { id: String },
    /// Duplicate a multiview with its current layout
    Duplicate {
        id: String,
        /// Name of the copy (defaults to "<name> (Copy)")
        #[arg(long)]
        name: Option<String>,
    },
    /// Show, raise and focus a multiview
    Show { id: String },
    /// Rewrite legacy entries in the current schema
    Migrate {
        /// Migrate every workspace, not only the active one
        #[arg(long)]
        all: bool,
    },
    /// Print the stored entry of the workspace
    Inspect,
    /// List workspaces present in the layout file
    Workspaces,
}

impl Command {
    fn is_mutating(&self) -> bool {
        !matches!(self, Self::List | Self::Inspect | Self::Workspaces)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            if let Some(remediation) = err
                .downcast_ref::<multiview_core::Error>()
                .and_then(multiview_core::Error::remediation)
            {
                eprint!("{}", remediation.render_plain());
            }
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(file) = &cli.file {
        let name = file
            .file_name()
            .ok_or_else(|| anyhow!("--file must name a file: {}", file.display()))?;
        let dir = file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        config.storage.directory = Some(dir.to_path_buf());
        config.storage.file_name = name.to_string_lossy().into_owned();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    init_logging(&config.logging).context("failed to initialize logging")?;

    let module_dir = match &config.storage.directory {
        Some(dir) => dir.clone(),
        None => config::default_module_dir()?,
    };
    let host = StaticHost::new(cli.workspace.clone(), module_dir);
    let mut manager = MultiviewManager::new(
        host,
        config.storage.clone(),
        Box::new(HeadlessFactory::new()),
    );
    let mut handler = LifecycleHandler::new();

    let startup_shape = match handler.dispatch(&mut manager, HostEvent::StartupComplete) {
        EventOutcome::Loaded(LoadOutcome::Loaded(report)) => {
            debug!(workspace = %report.workspace, shape = ?report.shape, "Startup load finished");
            Some(report.shape)
        }
        _ => None,
    };

    let result = execute(&cli.command, &mut manager, startup_shape, cli.json);

    let result = result.and_then(|()| {
        if !cli.command.is_mutating() {
            return Ok(());
        }
        match handler.dispatch(&mut manager, HostEvent::AboutToPersist) {
            EventOutcome::SaveFailed(err) => Err(err.into()),
            EventOutcome::Saved(SaveOutcome::Written(report)) => {
                debug!(path = %report.path.display(), bytes = report.bytes, "Saved");
                Ok(())
            }
            _ => Ok(()),
        }
    });

    handler.dispatch(&mut manager, HostEvent::Shutdown);
    result
}

fn print_value(json_mode: bool, value: &Value, plain: impl FnOnce() -> String) -> Result<()> {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        let text = plain();
        if !text.is_empty() {
            println!("{text}");
        }
    }
    Ok(())
}

fn execute(
    command: &Command,
    manager: &mut MultiviewManager<StaticHost>,
    startup_shape: Option<EntryShape>,
    json_mode: bool,
) -> Result<()> {
    match command {
        Command::List => {
            let summaries = manager.summaries();
            let value = serde_json::to_value(&summaries)?;
            print_value(json_mode, &value, || {
                summaries
                    .iter()
                    .map(|s| format!("{}\t{}", s.id, s.display_text()))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        Command::Create { name, temporary } => {
            let id = manager.create_multiview(name, !temporary)?;
            print_value(json_mode, &json!({"id": id}), || id.clone())
        }
        Command::Rename { id, name } => {
            if !manager.rename_multiview(id, name)? {
                bail!("no multiview with id '{id}'");
            }
            print_value(json_mode, &json!({"id": id, "renamed": true}), || {
                format!("Renamed {id}")
            })
        }
        Command::Remove { id } => {
            if !manager.remove_multiview(id) {
                bail!("no multiview with id '{id}'");
            }
            print_value(json_mode, &json!({"id": id, "removed": true}), || {
                format!("Removed {id}")
            })
        }
        Command::Duplicate { id, name } => {
            let Some(copy) = manager.duplicate_multiview(id, name.as_deref())? else {
                bail!("no multiview with id '{id}'");
            };
            print_value(json_mode, &json!({"id": copy, "source": id}), || copy.clone())
        }
        Command::Show { id } => {
            if !manager.show_multiview(id) {
                bail!("no multiview with id '{id}'");
            }
            print_value(json_mode, &json!({"id": id, "visible": true}), || {
                format!("Showing {id}")
            })
        }
        Command::Migrate { all } => {
            // The active workspace was already migrated by the startup load.
            let mut migrated = Vec::new();
            if startup_shape == Some(EntryShape::Migrated) {
                migrated.push(manager.workspace());
            }
            if *all {
                migrated.extend(manager.migrate_all());
            }
            print_value(json_mode, &json!({"migrated": migrated}), || {
                if migrated.is_empty() {
                    "Nothing to migrate".to_string()
                } else {
                    migrated.join("\n")
                }
            })
        }
        Command::Inspect => {
            let workspace = manager.workspace();
            let entry = manager
                .document()
                .entry(&workspace)
                .cloned()
                .unwrap_or(Value::Null);
            println!("{}", serde_json::to_string_pretty(&entry)?);
            Ok(())
        }
        Command::Workspaces => {
            let names: Vec<String> = manager
                .document()
                .workspaces()
                .map(str::to_string)
                .collect();
            print_value(json_mode, &json!(names), || names.join("\n"))
        }
    }
}
