//! Population model of the immature stages of one species.

use crate::error::{Error, Result};
use crate::integrator::Integrator;
use crate::ode::{LarvalOde, PopulationState};
use crate::params::ModelParams;
use serde::{Deserialize, Serialize};

/// Immature-stage population of one species, stepped once per timestep.
///
/// Holds the current state, the number of completed timesteps and the adult
/// count used by the most recent step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationModel {
    params: ModelParams,
    state: PopulationState,
    timestep: usize,
    total_m: usize,
    integrator: Integrator,
}

impl PopulationModel {
    /// Create a model from a flat `[egg, larva, pupa]` initial state.
    ///
    /// # Errors
    /// Returns an error if `init` does not have exactly three values or if
    /// any parameter is invalid.
    pub fn new(init: &[f64], params: ModelParams, total_m: usize) -> Result<Self> {
        let state = PopulationState::from_slice(init)?;
        params.validate()?;
        Ok(Self {
            params,
            state,
            timestep: 0,
            total_m,
            integrator: Integrator::default(),
        })
    }

    /// Replace the default integrator settings.
    pub fn with_integrator(mut self, integrator: Integrator) -> Self {
        self.integrator = integrator;
        self
    }

    /// Advance the model by one timestep with `total_m` adults laying eggs.
    ///
    /// On failure the state and the clock are left as they were.
    pub fn step(&mut self, total_m: usize) -> Result<()> {
        self.total_m = total_m;

        let t = self.timestep as f64;
        let system = LarvalOde::new(&self.params, self.total_m);
        let next = self
            .integrator
            .integrate(system, t, t + 1.0, self.state.into())
            .map_err(|source| Error::Integration {
                timestep: self.timestep,
                source,
            })?;

        self.state = next.into();
        self.timestep += 1;
        log::debug!(
            "stepped to timestep {} with {} adults: {:?}",
            self.timestep,
            self.total_m,
            self.state
        );

        Ok(())
    }

    /// Current state of the immature stages.
    pub fn state(&self) -> PopulationState {
        self.state
    }

    /// Number of completed timesteps.
    pub fn timestep(&self) -> usize {
        self.timestep
    }

    /// Adult count used by the last step (or given at construction).
    pub fn total_m(&self) -> usize {
        self.total_m
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }
}
