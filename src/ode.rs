//! Right-hand side of the egg, larva and pupa equations.

use crate::error::{Error, Result};
use crate::params::ModelParams;
use ode_solvers::{SVector, System};
use serde::{Deserialize, Serialize};

/// Vector type handed to the integrator, ordered egg, larva, pupa.
pub type StageVector = SVector<f64, 3>;

/// Number of individuals in each immature stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationState {
    pub egg: f64,
    pub larva: f64,
    pub pupa: f64,
}

impl PopulationState {
    pub fn new(egg: f64, larva: f64, pupa: f64) -> Self {
        Self { egg, larva, pupa }
    }

    /// Build a state from a flat `[egg, larva, pupa]` slice.
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        match *values {
            [egg, larva, pupa] => Ok(Self::new(egg, larva, pupa)),
            _ => Err(Error::InvalidState(values.len())),
        }
    }

    /// Flat `[egg, larva, pupa]` representation.
    pub fn to_array(self) -> [f64; 3] {
        [self.egg, self.larva, self.pupa]
    }
}

impl From<PopulationState> for StageVector {
    fn from(state: PopulationState) -> Self {
        StageVector::from(state.to_array())
    }
}

impl From<StageVector> for PopulationState {
    fn from(y: StageVector) -> Self {
        Self::new(y[0], y[1], y[2])
    }
}

/// Time derivative of `x` at integrator time `t` given `total_m` adults.
pub fn derivative(
    params: &ModelParams,
    total_m: usize,
    t: f64,
    x: &PopulationState,
) -> PopulationState {
    let k = params.capacity.at(t);
    let crowding = (x.egg + x.larva) / k;

    let laid = params.beta * total_m as f64;
    let egg_to_larva = x.egg / params.de;
    let larva_to_pupa = x.larva / params.dl;
    let pupa_to_adult = x.pupa / params.dp;

    PopulationState {
        egg: laid - egg_to_larva - x.egg * params.mue * (1.0 + crowding),
        larva: egg_to_larva
            - larva_to_pupa
            - x.larva * params.mul * (1.0 + params.gamma * crowding),
        pupa: larva_to_pupa - pupa_to_adult - x.pupa * params.mup,
    }
}

/// Immature-stage equations with the adult count frozen for one step.
pub struct LarvalOde<'a> {
    params: &'a ModelParams,
    total_m: usize,
}

impl<'a> LarvalOde<'a> {
    pub fn new(params: &'a ModelParams, total_m: usize) -> Self {
        Self { params, total_m }
    }
}

impl System<f64, StageVector> for LarvalOde<'_> {
    fn system(&self, t: f64, y: &StageVector, dy: &mut StageVector) {
        *dy = derivative(self.params, self.total_m, t, &(*y).into()).into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seasonality::CarryingCapacity;
    use approx::assert_relative_eq;

    fn params() -> ModelParams {
        ModelParams {
            beta: 20.0,
            de: 2.0,
            mue: 0.1,
            dl: 10.0,
            mul: 0.1,
            dp: 2.0,
            mup: 0.1,
            gamma: 1.0,
            capacity: CarryingCapacity::constant(10.0, 1.0),
        }
    }

    #[test]
    fn empty_habitat_only_gains_eggs() {
        let dx = derivative(&params(), 100, 0.0, &PopulationState::default());
        assert_eq!(dx, PopulationState::new(2000.0, 0.0, 0.0));
    }

    #[test]
    fn matches_hand_computed_rates() {
        let x = PopulationState::new(4.0, 6.0, 2.0);
        let dx = derivative(&params(), 1, 3.0, &x);

        // (E + L) / K = 1
        assert_relative_eq!(dx.egg, 20.0 - 2.0 - 4.0 * 0.1 * 2.0, epsilon = 1e-12);
        assert_relative_eq!(dx.larva, 2.0 - 0.6 - 6.0 * 0.1 * 2.0, epsilon = 1e-12);
        assert_relative_eq!(dx.pupa, 0.6 - 1.0 - 0.2, epsilon = 1e-12);
    }

    #[test]
    fn density_dependence_follows_seasonal_capacity() {
        let mut par = params();
        par.capacity = CarryingCapacity::seasonal(10.0, 1.0, 0.0, vec![1.0], vec![0.0]);
        let x = PopulationState::new(5.0, 5.0, 0.0);

        let summer = derivative(&par, 0, 0.0, &x);
        let winter = derivative(&par, 0, 182.5, &x);
        assert!(summer.larva > winter.larva);
    }

    #[test]
    fn system_agrees_with_derivative() {
        let par = params();
        let x = PopulationState::new(1.5, 2.5, 3.5);
        let mut dy = StageVector::zeros();
        LarvalOde::new(&par, 7).system(0.25, &x.into(), &mut dy);
        assert_eq!(PopulationState::from(dy), derivative(&par, 7, 0.25, &x));
    }

    #[test]
    fn from_slice_requires_three_stages() {
        assert!(matches!(
            PopulationState::from_slice(&[1.0, 2.0]),
            Err(Error::InvalidState(2))
        ));
        assert!(PopulationState::from_slice(&[1.0, 2.0, 3.0, 4.0]).is_err());
        assert_eq!(
            PopulationState::from_slice(&[1.0, 2.0, 3.0]).unwrap().to_array(),
            [1.0, 2.0, 3.0]
        );
    }
}
