use crate::error::{Error, Result};
use crate::seasonality::CarryingCapacity;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, ops::RangeBounds};

/// Parameters of the immature-stage model of one species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Eggs laid per adult per timestep.
    pub beta: f64,
    /// Egg (early larval) development time.
    pub de: f64,
    /// Egg mortality rate.
    pub mue: f64,
    /// Larval development time.
    pub dl: f64,
    /// Larval mortality rate.
    pub mul: f64,
    /// Pupal development time.
    pub dp: f64,
    /// Pupal mortality rate.
    pub mup: f64,
    /// Relative strength of larval density dependence.
    pub gamma: f64,
    /// Carrying capacity of the larval habitat.
    pub capacity: CarryingCapacity,
}

impl ModelParams {
    pub fn validate(&self) -> Result<()> {
        check_num("egg laying rate", self.beta, 0.0..)?;
        check_num("egg development time", self.de, f64::MIN_POSITIVE..)?;
        check_num("larval development time", self.dl, f64::MIN_POSITIVE..)?;
        check_num("pupal development time", self.dp, f64::MIN_POSITIVE..)?;
        check_num("egg mortality", self.mue, 0.0..)?;
        check_num("larval mortality", self.mul, 0.0..)?;
        check_num("pupal mortality", self.mup, 0.0..)?;
        check_num("density dependence", self.gamma, 0.0..)?;
        self.capacity.validate()
    }
}

fn check_num<R>(name: &str, num: f64, range: R) -> Result<()>
where
    R: RangeBounds<f64> + Debug,
{
    if !num.is_finite() || !range.contains(&num) {
        return Err(Error::InvalidParams(format!(
            "{name} must be in the range {range:?}, but is {num:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ModelParams {
        ModelParams {
            beta: 21.2,
            de: 6.64,
            mue: 0.034,
            dl: 3.72,
            mul: 0.035,
            dp: 0.643,
            mup: 0.249,
            gamma: 13.25,
            capacity: CarryingCapacity::constant(1000.0, 1.0),
        }
    }

    #[test]
    fn accepts_typical_values() {
        assert!(params().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cases = [
            ModelParams { de: 0.0, ..params() },
            ModelParams { dl: -1.0, ..params() },
            ModelParams { mup: -0.1, ..params() },
            ModelParams { beta: f64::NAN, ..params() },
            ModelParams {
                capacity: CarryingCapacity::constant(0.0, 1.0),
                ..params()
            },
        ];
        for par in cases {
            assert!(matches!(par.validate(), Err(Error::InvalidParams(_))));
        }
    }
}
