//! Numeric conversion helpers centralizing the lossy casts used by the engine.

use num_traits::ToPrimitive;
use num_traits::cast::cast;

/// Convert any primitive number to f64, returning `None` when it has no f64 representation.
#[must_use]
pub fn to_f64<T: ToPrimitive>(value: T) -> Option<f64> {
    value.to_f64()
}

/// Convert a count to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Convert a cumulative total to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Turn a raw percentage (0..=100) into a probability.
#[must_use]
pub fn percent_to_probability(percent: u8) -> f64 {
    f64::from(percent) / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_counts_and_totals() {
        assert!((usize_to_f64(6) - 6.0).abs() < f64::EPSILON);
        assert!((u64_to_f64(1_000) - 1_000.0).abs() < f64::EPSILON);
        assert_eq!(to_f64(3_u8), Some(3.0));
        assert_eq!(to_f64(-2_i64), Some(-2.0));
    }

    #[test]
    fn percent_maps_to_unit_interval() {
        assert!((percent_to_probability(30) - 0.3).abs() < 1e-12);
        assert!(percent_to_probability(0).abs() < f64::EPSILON);
        assert!((percent_to_probability(100) - 1.0).abs() < f64::EPSILON);
    }
}
