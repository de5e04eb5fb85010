mod cli;
mod config;
mod logging;
mod report;
mod run;

use anyhow::{anyhow, Result};
use clap::Parser;
use topicsim_core::GibbsLda;
use topicsim_store::SimStore;
use tracing::{error, info};

use crate::cli::{Cli, Command};
use crate::config::{load_config, AppConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose || logging::env_flag());
    let result = dispatch(cli);
    if let Err(err) = &result {
        error!("{err:#}");
    }
    result
}

fn dispatch(cli: Cli) -> Result<()> {
    let mut app = load_config(cli.config.as_deref())?;
    app.apply_env()?;

    match cli.command {
        Command::Run { overrides } => {
            app.apply_overrides(cli.db.as_deref(), &overrides);
            app.simulation.validate()?;
            let store = SimStore::open(&app.database.path)?;
            info!(
                db = %store.path().display(),
                topics = app.simulation.topics,
                vocab_size = app.simulation.vocab_size,
                docs = app.simulation.docs,
                alpha = app.simulation.alpha,
                "starting simulation"
            );
            let inference = Box::new(GibbsLda::from_config(&app.simulation.inference));
            let outcome = run::execute(app.simulation, store, inference)?;
            print!("{}", report::format_outcome(&outcome));
        }
        Command::Init => {
            let store = open_store(&app, cli.db.as_deref())?;
            println!(
                "[topicsim] Initialized store at {}",
                store.path().display()
            );
        }
        Command::Runs => {
            let store = open_store(&app, cli.db.as_deref())?;
            print!("{}", report::format_run_table(&store.list_runs()?));
        }
        Command::Show { run_id, limit } => {
            let store = open_store(&app, cli.db.as_deref())?;
            let run = store
                .fetch_run(run_id)?
                .ok_or_else(|| anyhow!("run {run_id} not found"))?;
            let results = store.fetch_analysis_results(run_id)?;
            print!("{}", report::format_run_detail(&run, &results, limit));
        }
        Command::Config { overrides } => {
            app.apply_overrides(cli.db.as_deref(), &overrides);
            print!("{}", toml::to_string_pretty(&app)?);
        }
    }
    Ok(())
}

fn open_store(app: &AppConfig, db: Option<&std::path::Path>) -> Result<SimStore> {
    let path = db.unwrap_or(&app.database.path);
    SimStore::open(path)
}
