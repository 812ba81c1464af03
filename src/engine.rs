use crate::config::Config;
use crate::population::{INDIVIDUAL, Population, VARIETY};
use anyhow::{Context, Result};
use mosquito_ode::{PopulationModel, PopulationState, ProcessNames, Render, SteppingProcess};
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Simulation engine.
///
/// Holds the configuration, the adult population and the stepping process
/// owning one immature-stage model per species, and provides methods to
/// initialize, run, save, and load simulations.
#[derive(Serialize, Deserialize)]
pub struct Engine {
    cfg: Config,
    population: Population,
    process: SteppingProcess,
    day: usize,
}

/// Record of the simulation at a saved day.
#[derive(Debug, Serialize, Deserialize)]
pub struct Record {
    /// Number of completed days.
    pub day: usize,
    /// Labelled outputs rendered during the last day.
    pub outputs: Vec<(String, f64)>,
    /// Immature-stage state of every species.
    pub states: Vec<PopulationState>,
}

#[derive(Default)]
struct Outputs(Vec<(String, f64)>);

impl Render for Outputs {
    fn render(&mut self, label: &str, value: f64) {
        self.0.push((label.to_string(), value));
    }
}

impl Engine {
    /// Create a new `Engine` from the configured initial states.
    pub fn generate_initial_condition(cfg: Config) -> Result<Self> {
        let population =
            Population::generate(&cfg.population).context("failed to generate population")?;

        let mut models = Vec::with_capacity(cfg.species.len());
        for (i_species, species) in cfg.species.iter().enumerate() {
            let model =
                PopulationModel::new(&species.init, species.model_params(), species.total_m)
                    .with_context(|| format!("failed to construct model {i_species}"))?;
            models.push(model);
        }

        let names = ProcessNames {
            individual: INDIVIDUAL.to_string(),
            adult_states: cfg.population.adult_states.clone(),
            variety: VARIETY.to_string(),
        };
        let process = SteppingProcess::new(models, names);

        Ok(Self {
            cfg,
            population,
            process,
            day: 0,
        })
    }

    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    pub fn day(&self) -> usize {
        self.day
    }

    pub fn models(&self) -> &[PopulationModel] {
        self.process.models()
    }

    /// Perform the simulation and save the resulting records to a binary file.
    pub fn perform_simulation<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);

        let mut outputs = Outputs::default();

        for i_save in 0..self.cfg.output.saves_per_file {
            for _ in 0..self.cfg.output.steps_per_save {
                self.perform_step(&mut outputs)
                    .with_context(|| format!("failed to perform day {}", self.day))?;
            }

            let record = Record {
                day: self.day,
                outputs: outputs.0.clone(),
                states: self.states(),
            };
            encode::write(&mut writer, &record).context("failed to serialize record")?;

            let progress = 100.0 * (i_save + 1) as f64 / self.cfg.output.saves_per_file as f64;
            log::info!("completed {progress:06.2}%");
        }

        writer.flush().context("failed to flush writer stream")?;

        Ok(())
    }

    /// Save a checkpoint of the entire engine state.
    ///
    /// Can be used to resume the simulation later.
    pub fn save_checkpoint<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, &self).context("failed to serialize engine")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    /// Load a previously saved engine checkpoint.
    pub fn load_checkpoint<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);
        let engine = decode::from_read(&mut reader).context("failed to deserialize engine")?;
        Ok(engine)
    }

    fn states(&self) -> Vec<PopulationState> {
        self.models().iter().map(|model| model.state()).collect()
    }

    fn perform_step(&mut self, outputs: &mut Outputs) -> Result<()> {
        // Adults change state before the immature stages see them.
        self.population
            .update()
            .context("failed to update population")?;

        outputs.0.clear();
        self.process
            .run(&self.population, outputs)
            .context("failed to step models")?;

        self.day += 1;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::CONFIG;

    fn engine() -> Engine {
        let cfg: Config = toml::from_str(CONFIG).unwrap();
        Engine::generate_initial_condition(cfg).unwrap()
    }

    #[test]
    fn steps_every_species_once_per_day() {
        let mut engine = engine();
        let mut outputs = Outputs::default();
        for _ in 0..3 {
            engine.perform_step(&mut outputs).unwrap();
        }

        assert_eq!(engine.day, 3);
        assert!(engine.process.models().iter().all(|m| m.timestep() == 3));

        let labels: Vec<_> = outputs.0.iter().map(|(label, _)| label.as_str()).collect();
        assert_eq!(labels, ["total_M_1", "total_M_2"]);
        for (slot, (_, value)) in outputs.0.iter().enumerate() {
            assert_eq!(*value, engine.process.models()[slot].total_m() as f64);
        }
    }

    #[test]
    fn seeded_engines_agree() {
        let mut a = engine();
        let mut b = engine();
        let mut outputs = Outputs::default();
        for _ in 0..5 {
            a.perform_step(&mut outputs).unwrap();
            b.perform_step(&mut outputs).unwrap();
        }
        assert_eq!(a.states(), b.states());
    }
}
