use crate::ode::StageVector;
use ode_solvers::dop_shared::{IntegrationError, OutputType};
use ode_solvers::{Dopri5, System};
use serde::{Deserialize, Serialize};

/// Absolute error tolerance of each step.
pub const ABS_TOLERANCE: f64 = 1e-6;
/// Relative error tolerance of each step.
pub const REL_TOLERANCE: f64 = 1e-6;
/// Maximum number of internal steps per integration span.
pub const MAX_STEPS: u32 = 100_000;

const SAFETY_FACTOR: f64 = 0.9;
const STABILIZATION: f64 = 0.04;
const FAC_MIN: f64 = 0.2;
const FAC_MAX: f64 = 10.0;
// Only the step budget or a vanishing step size may fail a span.
const STIFFNESS_CHECKS: u32 = u32::MAX;

/// Adaptive Dormand–Prince 5(4) integrator settings.
///
/// The step size is chosen automatically inside each requested span so the
/// local error estimate stays below `abs_tol + rel_tol * |y|`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Integrator {
    pub abs_tol: f64,
    pub rel_tol: f64,
    pub max_steps: u32,
}

impl Default for Integrator {
    fn default() -> Self {
        Self {
            abs_tol: ABS_TOLERANCE,
            rel_tol: REL_TOLERANCE,
            max_steps: MAX_STEPS,
        }
    }
}

impl Integrator {
    /// Integrate `system` from `y0` at `t0` and return the solution at `t1`.
    pub fn integrate<F>(
        &self,
        system: F,
        t0: f64,
        t1: f64,
        y0: StageVector,
    ) -> Result<StageVector, IntegrationError>
    where
        F: System<f64, StageVector>,
    {
        let span = t1 - t0;
        let mut stepper = Dopri5::from_param(
            system,
            t0,
            t1,
            span,
            y0,
            self.rel_tol,
            self.abs_tol,
            SAFETY_FACTOR,
            STABILIZATION,
            FAC_MIN,
            FAC_MAX,
            span,
            0.0,
            self.max_steps,
            STIFFNESS_CHECKS,
            OutputType::Sparse,
        );
        let stats = stepper.integrate()?;
        log::trace!(
            "integrated [{t0}, {t1}] with {} evaluations",
            stats.num_eval
        );

        // Sparse output records every accepted step, the last one ends at `t1`.
        Ok(stepper.y_out().last().copied().unwrap_or(y0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Decay {
        rate: f64,
    }

    impl System<f64, StageVector> for Decay {
        fn system(&self, _t: f64, y: &StageVector, dy: &mut StageVector) {
            *dy = y * -self.rate;
        }
    }

    struct Clock;

    impl System<f64, StageVector> for Clock {
        fn system(&self, t: f64, _y: &StageVector, dy: &mut StageVector) {
            *dy = StageVector::from([1.0, 2.0 * t, 3.0 * t * t]);
        }
    }

    #[test]
    fn exponential_decay_meets_tolerance() {
        let y0 = StageVector::from([1.0, 10.0, 100.0]);
        let y1 = Integrator::default()
            .integrate(Decay { rate: 0.7 }, 0.0, 1.0, y0)
            .unwrap();
        for i in 0..3 {
            assert_relative_eq!(y1[i], y0[i] * (-0.7_f64).exp(), max_relative = 1e-5);
        }
    }

    #[test]
    fn span_ends_at_requested_time() {
        let y1 = Integrator::default()
            .integrate(Clock, 4.0, 5.0, StageVector::zeros())
            .unwrap();
        assert_relative_eq!(y1[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(y1[1], 25.0 - 16.0, epsilon = 1e-8);
        assert_relative_eq!(y1[2], 125.0 - 64.0, epsilon = 1e-7);
    }

    #[test]
    fn step_budget_is_enforced() {
        let integrator = Integrator {
            max_steps: 1,
            ..Integrator::default()
        };
        let result = integrator.integrate(Decay { rate: 1e4 }, 0.0, 1.0, StageVector::repeat(1.0));
        assert!(result.is_err());
    }
}
