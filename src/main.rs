//! Ephemera CLI - inspect and simulate the container lifecycle engine

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use ephemera::cli::{Args, SubCommand};
use ephemera::container::DEFAULT_IDENTITY;
use ephemera::host::InMemoryHost;
use ephemera::scenario::{Scenario, ScenarioRunner};
use ephemera::storage::{JsonFileStore, MemoryStore, StateStore};
use ephemera::{format_output, Lifecycle, OutputFormat, Preferences, Snapshot};

const DEFAULT_STATE_FILE: &str = "ephemera-state.json";

fn main() {
    let args = Args::parse();
    ephemera::logging::init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_preferences(path: Option<&Path>) -> anyhow::Result<Preferences> {
    match path {
        Some(path) => Preferences::load(path)
            .with_context(|| format!("loading preferences from {}", path.display())),
        None => Ok(Preferences::default()),
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let preferences = load_preferences(args.config.as_deref())?;
    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match args.command {
        SubCommand::Simulate { scenario } => {
            let scenario = Scenario::load(&scenario)?;
            let store: Arc<dyn StateStore> = match args.state {
                Some(path) => Arc::new(JsonFileStore::new(path)),
                None => Arc::new(MemoryStore::new()),
            };
            let runtime = tokio::runtime::Runtime::new()?;
            let snapshot = runtime.block_on(simulate(preferences, store, &scenario))?;
            println!("{}", format_output(&snapshot, format));
            Ok(())
        }

        SubCommand::Status => {
            let path = args
                .state
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE));
            let state = JsonFileStore::new(&path)
                .load()
                .with_context(|| format!("reading state from {}", path.display()))?
                .unwrap_or_default();
            println!("{}", format_output(&Snapshot::from_stored(&state), format));
            Ok(())
        }

        SubCommand::Preferences => {
            println!("{}", serde_json::to_string_pretty(&preferences)?);
            Ok(())
        }
    }
}

async fn simulate(
    preferences: Preferences,
    store: Arc<dyn StateStore>,
    scenario: &Scenario,
) -> anyhow::Result<Snapshot> {
    let host = Arc::new(InMemoryHost::new());
    // the browser window the scenario's tabs are opened from
    host.open_tab(DEFAULT_IDENTITY, None);
    let lifecycle = Lifecycle::new(host, preferences, store)?;
    let sweeper = lifecycle.start();

    let result = ScenarioRunner::new(&lifecycle).run(scenario).await;
    sweeper.abort();
    result?;

    Ok(lifecycle.snapshot())
}
