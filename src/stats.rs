use serde::{Deserialize, Serialize};

/// Running mean, variance and range of a stream of values (Welford's algorithm).
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
    min: f64,
    max: f64,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub n_vals: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;
        self.diff_2_sum += diff_a * (val - self.mean);

        self.min = self.min.min(val);
        self.max = self.max.max(val);
    }

    pub fn report(&self) -> AccumulatorReport {
        let std_dev = if self.n_vals > 1 {
            (self.diff_2_sum / (self.n_vals - 1) as f64).sqrt()
        } else {
            f64::NAN
        };
        AccumulatorReport {
            n_vals: self.n_vals,
            mean: if self.n_vals > 0 { self.mean } else { f64::NAN },
            std_dev,
            min: self.min,
            max: self.max,
        }
    }
}
