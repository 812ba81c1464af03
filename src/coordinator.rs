//! Daily coupling between the individual-based adult simulation and the
//! immature-stage models.

use crate::error::Result;
use crate::model::PopulationModel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Read-only queries into the individual-based simulation.
pub trait IndividualQuery {
    /// Individuals of type `individual` whose categorical `variable` equals `category`.
    fn variable_members(
        &self,
        individual: &str,
        variable: &str,
        category: usize,
    ) -> Result<BTreeSet<usize>>;

    /// Individuals of type `individual` currently in `state`.
    fn state_members(&self, individual: &str, state: &str) -> Result<BTreeSet<usize>>;
}

/// Sink for labelled per-timestep outputs.
pub trait Render {
    fn render(&mut self, label: &str, value: f64);
}

/// Names used to look up adults in the individual-based simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessNames {
    /// Individual type holding the adult mosquitoes.
    pub individual: String,
    /// States counted as egg-laying adults.
    pub adult_states: [String; 3],
    /// Categorical variable holding the 1-based species of each individual.
    pub variety: String,
}

/// External (1-based) variety category of the model in `slot`.
pub fn category_of(slot: usize) -> usize {
    slot + 1
}

/// Label under which the adult count of the model in `slot` is rendered.
pub fn total_m_label(slot: usize) -> String {
    format!("total_M_{}", category_of(slot))
}

/// Recurring process stepping one model per species.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SteppingProcess {
    models: Vec<PopulationModel>,
    names: ProcessNames,
}

impl SteppingProcess {
    pub fn new(models: Vec<PopulationModel>, names: ProcessNames) -> Self {
        Self { models, names }
    }

    pub fn models(&self) -> &[PopulationModel] {
        &self.models
    }

    /// Count, for every model slot, the adults of the matching variety.
    pub fn count_adults<Q: IndividualQuery>(&self, sim: &Q) -> Result<Vec<usize>> {
        let ProcessNames {
            individual,
            adult_states,
            variety,
        } = &self.names;

        let mut adults = BTreeSet::new();
        for state in adult_states {
            adults.extend(sim.state_members(individual, state)?);
        }

        (0..self.models.len())
            .map(|slot| {
                let members = sim.variable_members(individual, variety, category_of(slot))?;
                Ok(members.intersection(&adults).count())
            })
            .collect()
    }

    /// Perform one simulated day.
    ///
    /// All counts are gathered before any model is stepped, so a failed
    /// lookup leaves every model untouched.
    pub fn run<Q, R>(&mut self, sim: &Q, renderer: &mut R) -> Result<()>
    where
        Q: IndividualQuery,
        R: Render,
    {
        let total_m = self.count_adults(sim)?;

        for (slot, (model, &count)) in self.models.iter_mut().zip(&total_m).enumerate() {
            renderer.render(&total_m_label(slot), count as f64);
            model.step(count)?;
        }

        Ok(())
    }
}
