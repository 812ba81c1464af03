use crate::config::PopulationConfig;
use anyhow::{Context, Result};
use mosquito_ode::coordinator::category_of;
use mosquito_ode::{Error, IndividualQuery};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Name of the individual type in the population.
pub const INDIVIDUAL: &str = "mosquito";
/// Name of the categorical variable holding each individual's variety.
pub const VARIETY: &str = "variety";

/// Adult mosquitoes of every variety, each in one of a fixed set of states.
///
/// Stands in for a full individual-based simulation: it only tracks the
/// variety and the state of each individual.
#[derive(Serialize, Deserialize)]
pub struct Population {
    states: Vec<String>,
    prob_trans: Vec<Vec<f64>>,
    n_varieties: usize,
    variety: Vec<usize>,
    state: Vec<usize>,
    rng: ChaCha12Rng,
}

impl Population {
    /// Create a population with states drawn from the initial probabilities.
    pub fn generate(cfg: &PopulationConfig) -> Result<Self> {
        let mut rng = match cfg.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::try_from_os_rng()?,
        };

        let n_ind: usize = cfg.individuals.iter().sum();
        let mut variety = Vec::with_capacity(n_ind);
        for (slot, &n) in cfg.individuals.iter().enumerate() {
            variety.extend(std::iter::repeat_n(category_of(slot), n));
        }

        let state_dist = WeightedIndex::new(&cfg.prob_init)?;
        let state = (0..n_ind).map(|_| state_dist.sample(&mut rng)).collect();

        Ok(Self {
            states: cfg.states.clone(),
            prob_trans: cfg.prob_trans.clone(),
            n_varieties: cfg.individuals.len(),
            variety,
            state,
            rng,
        })
    }

    /// Move every individual to its state for the next day.
    pub fn update(&mut self) -> Result<()> {
        let trans_dists = self
            .prob_trans
            .iter()
            .map(WeightedIndex::new)
            .collect::<Result<Vec<_>, _>>()
            .context("failed to build transition distributions")?;

        for state in self.state.iter_mut() {
            *state = trans_dists[*state].sample(&mut self.rng);
        }

        Ok(())
    }

    #[cfg(test)]
    pub fn n_individuals(&self) -> usize {
        self.state.len()
    }

    fn state_index(&self, label: &str) -> Option<usize> {
        self.states.iter().position(|state| state == label)
    }
}

impl IndividualQuery for Population {
    fn variable_members(
        &self,
        individual: &str,
        variable: &str,
        category: usize,
    ) -> mosquito_ode::Result<BTreeSet<usize>> {
        let known = (1..=self.n_varieties).contains(&category);
        if individual != INDIVIDUAL || variable != VARIETY || !known {
            return Err(Error::UnknownCategory {
                individual: individual.to_string(),
                variable: variable.to_string(),
                category,
            });
        }

        Ok(self
            .variety
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v == category)
            .map(|(i_ind, _)| i_ind)
            .collect())
    }

    fn state_members(
        &self,
        individual: &str,
        state: &str,
    ) -> mosquito_ode::Result<BTreeSet<usize>> {
        let i_state = self
            .state_index(state)
            .filter(|_| individual == INDIVIDUAL)
            .ok_or_else(|| Error::UnknownState {
                individual: individual.to_string(),
                state: state.to_string(),
            })?;

        Ok(self
            .state
            .iter()
            .enumerate()
            .filter(|&(_, &s)| s == i_state)
            .map(|(i_ind, _)| i_ind)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, tests::CONFIG};

    fn population() -> Population {
        let cfg: Config = toml::from_str(CONFIG).unwrap();
        Population::generate(&cfg.population).unwrap()
    }

    #[test]
    fn varieties_are_one_based_and_sized() {
        let pop = population();
        assert_eq!(pop.n_individuals(), 100);
        assert_eq!(pop.variable_members(INDIVIDUAL, VARIETY, 1).unwrap().len(), 60);
        assert_eq!(pop.variable_members(INDIVIDUAL, VARIETY, 2).unwrap().len(), 40);
        assert!(pop.variable_members(INDIVIDUAL, VARIETY, 0).is_err());
        assert!(pop.variable_members(INDIVIDUAL, VARIETY, 3).is_err());
        assert!(pop.variable_members(INDIVIDUAL, "species", 1).is_err());
    }

    #[test]
    fn states_partition_individuals() {
        let mut pop = population();
        for _ in 0..3 {
            let total: usize = ["Sm", "Pm", "Im", "NonExistent"]
                .iter()
                .map(|state| pop.state_members(INDIVIDUAL, state).unwrap().len())
                .sum();
            assert_eq!(total, pop.n_individuals());
            pop.update().unwrap();
        }
        assert!(matches!(
            pop.state_members(INDIVIDUAL, "Em"),
            Err(Error::UnknownState { .. })
        ));
        assert!(pop.state_members("human", "Sm").is_err());
    }

    #[test]
    fn seeded_populations_agree() {
        let mut a = population();
        let mut b = population();
        for _ in 0..5 {
            a.update().unwrap();
            b.update().unwrap();
        }
        assert_eq!(a.state, b.state);
    }
}
