//! Error type of the core library.

use ode_solvers::dop_shared::IntegrationError;
use thiserror::Error;

/// Result alias used throughout the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by model construction, stepping and aggregation.
#[derive(Debug, Error)]
pub enum Error {
    /// A model parameter is out of its valid range.
    #[error("invalid model parameters: {0}")]
    InvalidParams(String),

    /// The initial state does not have one value per stage.
    #[error("initial state must have 3 components, but has {0}")]
    InvalidState(usize),

    /// The integrator could not meet its tolerances within its budget.
    #[error("failed to integrate timestep {timestep}")]
    Integration {
        timestep: usize,
        #[source]
        source: IntegrationError,
    },

    /// A species has no counterpart category in the individual simulation.
    #[error("{individual} has no {variable} category {category}")]
    UnknownCategory {
        individual: String,
        variable: String,
        category: usize,
    },

    /// A state label is not known to the individual simulation.
    #[error("{individual} has no state {state:?}")]
    UnknownState { individual: String, state: String },
}
