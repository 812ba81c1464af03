//! Deterministic ODE model of the immature stages (egg, larva, pupa) of
//! mosquito populations, coupled once per timestep to an individual-based
//! adult simulation.
//!
//! - [`seasonality`]: carrying capacity of the larval habitat over the year.
//! - [`ode`]: stage vector and right-hand side of the equations.
//! - [`integrator`]: adaptive Dormand–Prince settings.
//! - [`model`]: a single species model advanced one timestep at a time.
//! - [`coordinator`]: counts adults per species and steps every model.

pub mod coordinator;
pub mod error;
pub mod integrator;
pub mod model;
pub mod ode;
pub mod params;
pub mod seasonality;

pub use coordinator::{IndividualQuery, ProcessNames, Render, SteppingProcess};
pub use error::{Error, Result};
pub use model::PopulationModel;
pub use ode::PopulationState;
pub use params::ModelParams;
pub use seasonality::CarryingCapacity;
