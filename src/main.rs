mod analysis;
mod config;
mod engine;
mod manager;
mod population;
mod stats;

use crate::manager::Manager;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Couple immature-stage mosquito models to a synthetic adult population.
#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    /// Directory holding `config.toml` and the run directories.
    #[arg(long)]
    sim_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start a new run and write its first trajectory file.
    Create,

    /// Continue a run from its checkpoint.
    Resume {
        #[arg(long)]
        run_idx: usize,
    },

    /// Print the current day and stage counts of a run.
    Status {
        #[arg(long)]
        run_idx: usize,
    },

    /// Summarize the trajectories of every run.
    Analyze,

    /// Remove every run directory.
    Clean,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(&args.sim_dir)
        .with_context(|| format!("failed to load simulation in {:?}", args.sim_dir))?;

    match args.command {
        Command::Create => mgr.create_run()?,
        Command::Resume { run_idx } => mgr.resume_run(run_idx)?,
        Command::Status { run_idx } => mgr.status_run(run_idx)?,
        Command::Analyze => mgr.analyze_sim()?,
        Command::Clean => mgr.clean_sim()?,
    }

    Ok(())
}
