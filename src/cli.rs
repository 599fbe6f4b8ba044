//! Command Line Interface
//!
//! Scenario management over the persisted storage file, ticker list checks,
//! and a mass-fetch job watcher.

use crate::domain::job::{JobKind, JobState};
use crate::domain::ticker::TickerUpload;
use crate::eventing::AppEvent;
use crate::services::{HttpJobBackend, JobPoller, StalenessFilter, block_on, spawn_named, stream_job_events};
use crate::settings::AppSettings;
use crate::state::{ImportOutcome, MassFetchState, OverwritePolicy, SaveOutcome, ScenarioController};
use crate::storage::{FileStore, SharedStore};
use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use crossbeam_channel::Receiver;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "finalyze")]
#[command(version, about = "Analytics scenario store and mass-fetch client")]
pub struct FinalyzeCli {
    /// Settings file (defaults to finalyze.toml in the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage file (overrides the settings file)
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List saved scenarios
    List,
    /// Print a saved scenario as JSON
    Show { name: String },
    /// Save the live settings as a scenario
    Save {
        name: String,
        #[arg(long)]
        overwrite: bool,
    },
    /// Load a scenario into the live settings
    Activate { name: String },
    /// Delete a saved scenario (not the active one)
    Delete { name: String },
    /// Import a scenario from a .json file
    Import {
        file: PathBuf,
        #[arg(long)]
        overwrite: bool,
    },
    /// Export a scenario to a .json file
    Export {
        name: String,
        /// Output path (defaults to analytics_scenario_<name>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Parse a .txt ticker list
    Tickers { file: PathBuf },
    /// Trigger a mass-fetch job and follow it until it finishes
    WatchJob {
        /// yahoo, finviz or edgar
        kind: JobKind,
        /// Ticker list (.txt) for yahoo and finviz
        #[arg(long)]
        tickers: Option<PathBuf>,
        /// Follow the current run without triggering a new one
        #[arg(long)]
        no_trigger: bool,
        /// Also print the job's event stream
        #[arg(long)]
        stream: bool,
    },
}

pub fn run() -> anyhow::Result<()> {
    let cli = FinalyzeCli::parse();
    let stdout = std::io::stdout();
    execute(cli, &mut stdout.lock())
}

/// Run one parsed command, writing user output to `out`
pub fn execute<W: Write>(cli: FinalyzeCli, out: &mut W) -> anyhow::Result<()> {
    let settings = match &cli.config {
        Some(path) => AppSettings::load_from(path),
        None => AppSettings::load(),
    }
    .context("failed to load settings")?;

    match cli.command {
        Commands::Tickers { file } => {
            let upload = read_ticker_upload(&file)?;
            writeln!(out, "{}", upload.summary())?;
            for ticker in &upload.tickers {
                writeln!(out, "{ticker}")?;
            }
            Ok(())
        }
        Commands::WatchJob {
            kind,
            tickers,
            no_trigger,
            stream,
        } => watch_job(&settings, kind, tickers.as_deref(), no_trigger, stream, out),
        command => {
            let storage_path = match cli.storage {
                Some(path) => path,
                None => settings.storage_path()?,
            };
            let store: SharedStore = Arc::new(FileStore::open(&storage_path)?);
            let (mut controller, events) = ScenarioController::with_channel(store);
            controller.initialize()?;

            let result = run_scenario_command(&mut controller, command, out);
            print_status_events(&events, out)?;
            controller.shutdown();
            result
        }
    }
}

fn run_scenario_command<W: Write>(
    controller: &mut ScenarioController,
    command: Commands,
    out: &mut W,
) -> anyhow::Result<()> {
    match command {
        Commands::List => {
            let active = controller.active_name();
            let modified = controller.is_modified();
            let names = controller.names();
            if names.is_empty() {
                writeln!(out, "No saved scenarios")?;
            }
            for name in names {
                let is_active = active.as_deref() == Some(name.as_str());
                let marker = if is_active { "*" } else { " " };
                let suffix = if is_active && modified { " (modified)" } else { "" };
                writeln!(out, "{marker} {name}{suffix}")?;
            }
        }
        Commands::Show { name } => {
            let exported = controller.export(&name)?;
            writeln!(out, "{}", exported.contents)?;
        }
        Commands::Save { name, overwrite } => {
            match controller.save_current_as(&name, policy(overwrite))? {
                SaveOutcome::Saved { .. } => {}
                SaveOutcome::ConfirmOverwrite { name } => {
                    bail!("scenario '{name}' already exists; pass --overwrite to replace it")
                }
            }
        }
        Commands::Activate { name } => controller.activate(&name)?,
        Commands::Delete { name } => {
            controller.delete(&name)?;
        }
        Commands::Import { file, overwrite } => {
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .with_context(|| format!("invalid file path {}", file.display()))?
                .to_string();
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;

            match controller.import(&file_name, &contents, policy(overwrite))? {
                ImportOutcome::Imported { .. } => {}
                ImportOutcome::ConfirmOverwrite { name } => {
                    bail!("scenario '{name}' already exists; pass --overwrite to replace it")
                }
            }
        }
        Commands::Export { name, output } => {
            let exported = controller.export(&name)?;
            let path = output.unwrap_or_else(|| PathBuf::from(&exported.file_name));
            std::fs::write(&path, &exported.contents)
                .with_context(|| format!("failed to write {}", path.display()))?;
            writeln!(out, "Exported to {}", path.display())?;
        }
        Commands::Tickers { .. } | Commands::WatchJob { .. } => {}
    }
    Ok(())
}

fn policy(overwrite: bool) -> OverwritePolicy {
    if overwrite {
        OverwritePolicy::Overwrite
    } else {
        OverwritePolicy::Ask
    }
}

fn print_status_events<W: Write>(events: &Receiver<AppEvent>, out: &mut W) -> std::io::Result<()> {
    for event in events.try_iter() {
        if let Some((level, message)) = event.as_status() {
            writeln!(out, "[{}] {message}", level.label())?;
        }
    }
    Ok(())
}

fn read_ticker_upload(path: &Path) -> anyhow::Result<TickerUpload> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid file path {}", path.display()))?;
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(TickerUpload::from_file(file_name, &contents)?)
}

fn watch_job<W: Write>(
    settings: &AppSettings,
    kind: JobKind,
    tickers: Option<&Path>,
    no_trigger: bool,
    stream: bool,
    out: &mut W,
) -> anyhow::Result<()> {
    let mut state = MassFetchState::default();
    if let Some(path) = tickers {
        state.set_upload(kind, read_ticker_upload(path)?)?;
    }

    let backend = Arc::new(HttpJobBackend::new(
        &settings.api_base_url,
        settings.request_timeout(),
    )?);
    let interval = settings.poll_interval();
    let (tx, rx) = crossbeam_channel::unbounded();

    let poller = if no_trigger {
        block_on(async { JobPoller::spawn(backend.clone(), kind, StalenessFilter::new(), interval, tx.clone()) })??
    } else {
        let pending = state.pending_tickers(kind);
        state.on_triggered(kind);
        let triggered = block_on(JobPoller::trigger_and_poll(
            backend.clone(),
            kind,
            &pending,
            interval,
            tx.clone(),
        ))?;
        match triggered {
            Ok(handle) => handle,
            Err(e) => {
                state.on_trigger_failed(kind, e.to_string());
                return Err(e).context(format!("failed to trigger {} fetch", kind.label()));
            }
        }
    };

    let sse = if stream {
        let client = backend.client().clone();
        let url = backend.stream_url(kind.job_id());
        let sink = tx.clone();
        Some(spawn_named("job-stream", async move {
            if let Err(e) = stream_job_events(&client, &url, kind, &sink).await {
                tracing::warn!(job = kind.job_id(), error = %e, "Job event stream failed");
            }
        })?)
    } else {
        None
    };
    drop(tx);

    for event in rx.iter() {
        state.apply(&event);
        match &event {
            AppEvent::JobStatus { status, .. } => {
                writeln!(out, "{}: {}", kind.label(), status.progress_text())?;
                if status.status.is_terminal() {
                    break;
                }
            }
            AppEvent::JobProgress { message, .. } => writeln!(out, "  {message}")?,
            other => {
                if let Some((level, message)) = other.as_status() {
                    writeln!(out, "[{}] {message}", level.label())?;
                }
            }
        }
    }

    if let Some(task) = sse {
        task.abort();
    }
    drop(poller);

    let panel = state.panel(kind);
    match panel.and_then(|p| p.status()).map(|s| &s.status) {
        Some(JobState::Failed) => bail!(
            "{} fetch failed: {}",
            kind.label(),
            panel.and_then(|p| p.last_error()).unwrap_or("no details")
        ),
        Some(JobState::PartialFailure) => {
            writeln!(
                out,
                "{} fetch finished with errors: {}",
                kind.label(),
                panel.and_then(|p| p.last_error()).unwrap_or("no details")
            )?;
            Ok(())
        }
        _ => Ok(()),
    }
}
