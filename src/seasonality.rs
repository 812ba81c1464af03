//! Seasonal carrying capacity of the larval habitat.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Length of one seasonal cycle in days.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Parameters of the carrying capacity `K(t)`.
///
/// Without seasonality `K(t)` is the baseline `k0`. With seasonality the
/// baseline is modulated by the exponential of a truncated Fourier series in
/// calendar days and normalised by `r_bar`, the mean of that exponential over
/// one year, so that the long-run average capacity stays close to `k0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarryingCapacity {
    /// Baseline carrying capacity.
    pub k0: f64,
    /// Whether the seasonal curve is applied.
    pub model_seasonality: bool,
    /// Calendar days covered by one timestep.
    pub days_per_timestep: f64,
    /// Constant term of the Fourier series.
    pub g0: f64,
    /// Cosine coefficients, harmonic `k` at index `k - 1`.
    pub g: Vec<f64>,
    /// Sine coefficients, harmonic `k` at index `k - 1`.
    pub h: Vec<f64>,
    /// Mean of the exponentiated seasonal curve.
    pub r_bar: f64,
}

impl CarryingCapacity {
    /// Time-invariant capacity `k0`.
    pub fn constant(k0: f64, days_per_timestep: f64) -> Self {
        Self {
            k0,
            model_seasonality: false,
            days_per_timestep,
            g0: 0.0,
            g: Vec::new(),
            h: Vec::new(),
            r_bar: 1.0,
        }
    }

    /// Seasonal capacity with `r_bar` computed by [`CarryingCapacity::mean_rainfall`].
    pub fn seasonal(k0: f64, days_per_timestep: f64, g0: f64, g: Vec<f64>, h: Vec<f64>) -> Self {
        let r_bar = Self::mean_rainfall(g0, &g, &h);
        Self {
            k0,
            model_seasonality: true,
            days_per_timestep,
            g0,
            g,
            h,
            r_bar,
        }
    }

    /// Check that `K(t)` is positive and well defined for every `t`.
    pub fn validate(&self) -> Result<()> {
        if !(self.k0.is_finite() && self.k0 > 0.0) {
            return Err(Error::InvalidParams(format!(
                "baseline capacity must be positive, but is {}",
                self.k0
            )));
        }
        if !(self.days_per_timestep.is_finite() && self.days_per_timestep > 0.0) {
            return Err(Error::InvalidParams(format!(
                "days per timestep must be positive, but is {}",
                self.days_per_timestep
            )));
        }
        if self.g.len() != self.h.len() {
            return Err(Error::InvalidParams(format!(
                "harmonic coefficients must have equal lengths, but have {} and {}",
                self.g.len(),
                self.h.len()
            )));
        }
        if self.model_seasonality {
            let mut coefs = std::iter::once(&self.g0).chain(&self.g).chain(&self.h);
            if coefs.any(|c| !c.is_finite()) {
                return Err(Error::InvalidParams(
                    "harmonic coefficients must be finite".to_string(),
                ));
            }
            if !(self.r_bar.is_finite() && self.r_bar > 0.0) {
                return Err(Error::InvalidParams(format!(
                    "seasonal normalisation must be positive, but is {}",
                    self.r_bar
                )));
            }
        }
        Ok(())
    }

    /// Carrying capacity at integrator time `t` (in timesteps).
    pub fn at(&self, t: f64) -> f64 {
        if !self.model_seasonality {
            return self.k0;
        }
        let t_days = t * self.days_per_timestep;
        self.k0 * harmonic(t_days, self.g0, &self.g, &self.h).exp() / self.r_bar
    }

    /// Mean of `exp(harmonic(d))` over the days of one year.
    pub fn mean_rainfall(g0: f64, g: &[f64], h: &[f64]) -> f64 {
        let n_days = DAYS_PER_YEAR as usize;
        let sum: f64 = (0..n_days)
            .map(|day| harmonic(day as f64, g0, g, h).exp())
            .sum();
        sum / n_days as f64
    }
}

fn harmonic(t_days: f64, g0: f64, g: &[f64], h: &[f64]) -> f64 {
    let phase = 2.0 * PI * t_days / DAYS_PER_YEAR;
    g.iter()
        .zip(h)
        .enumerate()
        .fold(g0, |acc, (i, (g_k, h_k))| {
            let k = (i + 1) as f64;
            acc + g_k * (k * phase).cos() + h_k * (k * phase).sin()
        })
}
