//! Summary statistics over simulation outputs.
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::MemoriaError;
use crate::numbers::to_f64;

/// Population summary of a non-empty sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation (divides by `count`, not `count - 1`).
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    /// `|mean - expected| / |expected|`; the absolute gap when `expected` is zero.
    #[must_use]
    pub fn relative_error(&self, expected: f64) -> f64 {
        let gap = (self.mean - expected).abs();
        if expected == 0.0 {
            gap
        } else {
            gap / expected.abs()
        }
    }
}

/// Welford accumulator.
#[derive(Debug, Default, Clone)]
pub struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        let count = crate::numbers::usize_to_f64(self.count);
        let delta = value - self.mean;
        self.mean += delta / count;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub const fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    #[must_use]
    pub fn population_variance(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.m2 / crate::numbers::usize_to_f64(self.count)).max(0.0)
        }
    }

    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.population_variance().sqrt()
    }

    /// Freeze the accumulator into a [`Summary`].
    ///
    /// # Errors
    ///
    /// Returns [`MemoriaError::EmptyInput`] when nothing was added.
    pub fn summary(&self) -> Result<Summary, MemoriaError> {
        if self.count == 0 {
            return Err(MemoriaError::EmptyInput);
        }
        Ok(Summary {
            count: self.count,
            mean: self.mean,
            std_dev: self.std_dev(),
            min: self.min,
            max: self.max,
        })
    }
}

/// Population mean and standard deviation of a sample.
///
/// # Errors
///
/// Returns [`MemoriaError::EmptyInput`] for an empty slice and
/// [`MemoriaError::NonNumericSample`] for a value that does not convert to `f64`.
pub fn summarize<T: ToPrimitive + Copy>(values: &[T]) -> Result<Summary, MemoriaError> {
    let mut stats = RunningStats::default();
    for (index, &value) in values.iter().enumerate() {
        let value = to_f64(value).ok_or(MemoriaError::NonNumericSample { index })?;
        stats.add(value);
    }
    stats.summary()
}
