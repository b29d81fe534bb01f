//! Error types shared by the table, engine, simulator and statistics.
use thiserror::Error;

/// Errors raised when a caller supplies parameters outside the model's domain.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MemoriaError {
    #[error("gate level {level} is outside 1..=40")]
    InvalidLevel { level: u32 },
    #[error("roster of {roster_size} member(s) is too small (need at least {required})")]
    InvalidRosterSize { roster_size: usize, required: usize },
    #[error("bonus member index {index} is not a slot of a {roster_size}-member roster")]
    InvalidBonusMember { index: usize, roster_size: usize },
    #[error("statistics requested over an empty sample")]
    EmptyInput,
    #[error("sample value at index {index} has no f64 representation")]
    NonNumericSample { index: usize },
}

/// Errors raised when reward rule configuration cannot be loaded or is out of range.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: u32,
        max: u32,
        value: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        let err = MemoriaError::InvalidLevel { level: 41 };
        assert_eq!(err.to_string(), "gate level 41 is outside 1..=40");

        let err = MemoriaError::InvalidRosterSize {
            roster_size: 1,
            required: 2,
        };
        assert!(err.to_string().contains("need at least 2"));
    }

    #[test]
    fn parse_errors_convert() {
        let parse = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: ConfigError = parse.into();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
