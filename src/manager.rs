use crate::analysis::Analyzer;
use crate::config::Config;
use crate::engine::Engine;
use anyhow::{Context, Result, bail};
use glob::glob;
use mosquito_ode::coordinator::category_of;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    pub fn create_run(&self) -> Result<()> {
        let run_idx = self.run_dirs().context("failed to list run dirs")?.len();

        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        let engine = Engine::generate_initial_condition(self.cfg.clone())
            .context("failed to generate initial condition")?;

        self.run_engine(engine, run_idx, 0)
    }

    pub fn resume_run(&self, run_idx: usize) -> Result<()> {
        let file_idx = self
            .trajectory_files(run_idx)
            .context("failed to list trajectory files")?
            .len();

        let checkpoint_file = self.checkpoint_file(run_idx);
        let engine = Engine::load_checkpoint(&checkpoint_file)
            .with_context(|| format!("failed to load {checkpoint_file:?}"))?;
        if engine.cfg() != &self.cfg {
            bail!("checkpoint config differs from the current config");
        }
        log::info!("loaded {checkpoint_file:?}");

        self.run_engine(engine, run_idx, file_idx)
    }

    pub fn status_run(&self, run_idx: usize) -> Result<()> {
        let checkpoint_file = self.checkpoint_file(run_idx);
        let engine = Engine::load_checkpoint(&checkpoint_file)
            .with_context(|| format!("failed to load {checkpoint_file:?}"))?;

        log::info!("run {run_idx} completed {} days", engine.day());
        for (slot, model) in engine.models().iter().enumerate() {
            let [egg, larva, pupa] = model.state().to_array();
            log::info!(
                "variety {}: egg {egg:.3} larva {larva:.3} pupa {pupa:.3} adults {}",
                category_of(slot),
                model.total_m()
            );
        }

        Ok(())
    }

    pub fn analyze_sim(&self) -> Result<()> {
        let n_runs = self.run_dirs().context("failed to list run dirs")?.len();
        for run_idx in 0..n_runs {
            let mut analyzer = Analyzer::new(self.cfg.clone());

            for file in self
                .trajectory_files(run_idx)
                .context("failed to list trajectory files")?
            {
                analyzer
                    .add_file(&file)
                    .with_context(|| format!("failed to add {file:?}"))?;
            }

            let results_file = self.results_file(run_idx);
            analyzer
                .save_results(&results_file)
                .context("failed to save results")?;
            log::info!("saved {results_file:?}");
        }

        Ok(())
    }

    pub fn clean_sim(&self) -> Result<()> {
        for run_dir in self.run_dirs().context("failed to list run dirs")? {
            fs::remove_dir_all(&run_dir)
                .with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }
        Ok(())
    }

    fn run_engine(&self, mut engine: Engine, run_idx: usize, file_idx: usize) -> Result<()> {
        engine
            .perform_simulation(self.trajectory_file(run_idx, file_idx))
            .context("failed to perform simulation")?;

        engine
            .save_checkpoint(self.checkpoint_file(run_idx))
            .context("failed to save checkpoint")?;

        Ok(())
    }

    fn run_dirs(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.sim_dir.join("run-*");
        glob_sorted(&pattern, |path| path.is_dir())
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }

    fn trajectory_files(&self, run_idx: usize) -> Result<Vec<PathBuf>> {
        let pattern = self.run_dir(run_idx).join("trajectory-*.msgpack");
        glob_sorted(&pattern, |path| path.is_file())
    }

    fn checkpoint_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("checkpoint.msgpack")
    }

    fn trajectory_file(&self, run_idx: usize, file_idx: usize) -> PathBuf {
        self.run_dir(run_idx)
            .join(format!("trajectory-{file_idx:04}.msgpack"))
    }

    fn results_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("results.msgpack")
    }
}

fn glob_sorted(pattern: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
    let mut paths: Vec<_> = glob(pattern)
        .with_context(|| format!("failed to glob {pattern:?}"))?
        .filter_map(|entry| entry.ok())
        .filter(|path| keep(path.as_path()))
        .collect();
    paths.sort();
    Ok(paths)
}
