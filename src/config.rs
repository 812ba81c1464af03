use anyhow::{Context, Result, bail};
use mosquito_ode::{CarryingCapacity, ModelParams};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// One immature-stage model per species, in variety order.
    pub species: Vec<SpeciesConfig>,
    /// Synthetic adult population driving the models.
    pub population: PopulationConfig,
    /// Output parameters.
    pub output: OutputConfig,
}

/// Initial state and parameters of one species.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SpeciesConfig {
    /// Initial number of eggs, larvae and pupae.
    pub init: Vec<f64>,
    /// Adult count before the first step.
    #[serde(default)]
    pub total_m: usize,

    pub beta: f64,
    pub de: f64,
    pub mue: f64,
    pub dl: f64,
    pub mul: f64,
    pub dp: f64,
    pub mup: f64,
    pub gamma: f64,

    /// Baseline carrying capacity.
    pub k0: f64,
    #[serde(default)]
    pub model_seasonality: bool,
    #[serde(default = "default_days_per_timestep")]
    pub days_per_timestep: f64,
    #[serde(default)]
    pub g0: f64,
    #[serde(default)]
    pub g: Vec<f64>,
    #[serde(default)]
    pub h: Vec<f64>,
    /// Seasonal normalisation, computed from the coefficients when omitted.
    #[serde(default)]
    pub r_bar: Option<f64>,
}

fn default_days_per_timestep() -> f64 {
    1.0
}

impl SpeciesConfig {
    pub fn model_params(&self) -> ModelParams {
        let r_bar = self
            .r_bar
            .unwrap_or_else(|| CarryingCapacity::mean_rainfall(self.g0, &self.g, &self.h));
        ModelParams {
            beta: self.beta,
            de: self.de,
            mue: self.mue,
            dl: self.dl,
            mul: self.mul,
            dp: self.dp,
            mup: self.mup,
            gamma: self.gamma,
            capacity: CarryingCapacity {
                k0: self.k0,
                model_seasonality: self.model_seasonality,
                days_per_timestep: self.days_per_timestep,
                g0: self.g0,
                g: self.g.clone(),
                h: self.h.clone(),
                r_bar,
            },
        }
    }
}

/// Synthetic adult population.
///
/// Each individual belongs to one variety and moves between `states`
/// once per day according to `prob_trans`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of individuals of each variety.
    pub individuals: Vec<usize>,
    /// State labels.
    pub states: Vec<String>,
    /// States counted as egg-laying adults.
    pub adult_states: [String; 3],
    /// Initial state probabilities.
    pub prob_init: Vec<f64>,
    /// Daily state transition probabilities (matrix `n_states x n_states`).
    pub prob_trans: Vec<Vec<f64>>,
    /// Seed of the random number generator (drawn from the OS when omitted).
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Output parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Number of days between saved records.
    pub steps_per_save: usize,
    /// Number of records written per trajectory file.
    pub saves_per_file: usize,
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        check_num(self.species.len(), 1..100).context("invalid number of species")?;
        for (i_species, species) in self.species.iter().enumerate() {
            check_species(species).with_context(|| format!("invalid species {i_species}"))?;
        }

        let pop = &self.population;
        let n_species = self.species.len();
        if pop.individuals.len() != n_species {
            bail!(
                "population must list individuals for {n_species} varieties, but lists {}",
                pop.individuals.len()
            );
        }
        check_num(pop.individuals.iter().sum::<usize>(), 1..10_000_000)
            .context("invalid number of individuals")?;

        let n_states = pop.states.len();
        check_num(n_states, 3..100).context("invalid number of states")?;
        for state in &pop.adult_states {
            if !pop.states.contains(state) {
                bail!("adult state {state:?} is not one of {:?}", pop.states);
            }
        }
        check_vec(&pop.prob_init, n_states, true).context("invalid initial probabilities")?;
        check_mat(&pop.prob_trans, (n_states, n_states), true)
            .context("invalid transition probabilities")?;

        check_num(self.output.steps_per_save, 1..10_000)
            .context("invalid number of steps per save")?;
        check_num(self.output.saves_per_file, 1..100_000)
            .context("invalid number of saves per file")?;

        Ok(())
    }
}

fn check_species(species: &SpeciesConfig) -> Result<()> {
    let len = species.init.len();
    if len != 3 {
        bail!("initial state must have 3 values, but has {len}");
    }
    if species.init.iter().any(|&val| !val.is_finite() || val < 0.0) {
        bail!("initial state must be non-negative");
    }
    species.model_params().validate()?;
    Ok(())
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_vec(vec: &[f64], exp_len: usize, prob_vec: bool) -> Result<()> {
    let len = vec.len();
    if len != exp_len {
        bail!("vector length must be {exp_len}, but is {len}");
    }
    if !prob_vec {
        return Ok(());
    }
    if vec.iter().any(|&ele| !ele.is_finite() || ele < 0.0) {
        bail!("vector must have only non-negative elements");
    }
    let sum: f64 = vec.iter().sum();
    let tol = 1e-8;
    if (sum - 1.0).abs() > tol {
        bail!("vector must sum to 1.0 (tolerance: {tol}), but sums to {sum}");
    }
    Ok(())
}

fn check_mat(mat: &[Vec<f64>], exp_dim: (usize, usize), trans_mat: bool) -> Result<()> {
    let (exp_n_rows, exp_n_cols) = exp_dim;
    let n_rows = mat.len();
    if n_rows != exp_n_rows {
        bail!("matrix must have {exp_n_rows} rows, but has {n_rows}");
    }
    for (i_row, row) in mat.iter().enumerate() {
        check_vec(row, exp_n_cols, trans_mat).with_context(|| format!("invalid row {i_row}"))?;
    }
    Ok(())
}
