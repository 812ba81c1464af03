use crate::config::Config;
use crate::engine::Record;
use crate::stats::{Accumulator, AccumulatorReport};
use anyhow::{Context, Result, bail};
use mosquito_ode::coordinator::category_of;
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

struct SpeciesObs {
    egg: Accumulator,
    larva: Accumulator,
    pupa: Accumulator,
    total_m: Accumulator,
}

/// Summary statistics of one species over a run.
#[derive(Debug, Serialize, Deserialize)]
pub struct SpeciesReport {
    pub variety: usize,
    pub egg: AccumulatorReport,
    pub larva: AccumulatorReport,
    pub pupa: AccumulatorReport,
    pub total_m: AccumulatorReport,
}

pub struct Analyzer {
    cfg: Config,
    obs_vec: Vec<SpeciesObs>,
}

impl Analyzer {
    pub fn new(cfg: Config) -> Self {
        let obs_vec = (0..cfg.species.len())
            .map(|_| SpeciesObs {
                egg: Accumulator::new(),
                larva: Accumulator::new(),
                pupa: Accumulator::new(),
                total_m: Accumulator::new(),
            })
            .collect();
        Self { cfg, obs_vec }
    }

    pub fn add_file<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);

        for _ in 0..self.cfg.output.saves_per_file {
            let record: Record = decode::from_read(&mut reader).context("failed to read record")?;
            self.add_record(&record)
                .with_context(|| format!("invalid record of day {}", record.day))?;
        }
        Ok(())
    }

    fn add_record(&mut self, record: &Record) -> Result<()> {
        let n_species = self.obs_vec.len();
        if record.states.len() != n_species || record.outputs.len() != n_species {
            bail!("record must describe {n_species} species");
        }

        for ((obs, state), (_, total_m)) in self
            .obs_vec
            .iter_mut()
            .zip(&record.states)
            .zip(&record.outputs)
        {
            obs.egg.add(state.egg);
            obs.larva.add(state.larva);
            obs.pupa.add(state.pupa);
            obs.total_m.add(*total_m);
        }
        Ok(())
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);

        let reports: Vec<_> = self
            .obs_vec
            .iter()
            .enumerate()
            .map(|(slot, obs)| SpeciesReport {
                variety: category_of(slot),
                egg: obs.egg.report(),
                larva: obs.larva.report(),
                pupa: obs.pupa.report(),
                total_m: obs.total_m.report(),
            })
            .collect();
        encode::write(&mut writer, &reports).context("failed to serialize results")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }
}
