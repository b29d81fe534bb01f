//! Gate level to visitor-count distribution table.
//!
//! Every draw session picks how many roster members visit from a small
//! distribution over {2, 3, 4, 5}. The distribution is piecewise linear in the
//! gate level: up to level 30 mass shifts from two visitors towards four and
//! five, past level 30 the remaining three-visitor mass shifts to five.
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::MemoriaError;
use crate::numbers::percent_to_probability;

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 40;
/// Visitor counts a session can produce, in sampling order.
pub const VISITOR_COUNTS: [u8; 4] = [2, 3, 4, 5];

const PIVOT_LEVEL: u8 = 30;

/// Check that a gate level lies in `MIN_LEVEL..=MAX_LEVEL`.
///
/// # Errors
///
/// Returns [`MemoriaError::InvalidLevel`] for any level outside the range.
pub fn validate_level(level: u8) -> Result<u8, MemoriaError> {
    if (MIN_LEVEL..=MAX_LEVEL).contains(&level) {
        Ok(level)
    } else {
        Err(MemoriaError::InvalidLevel {
            level: u32::from(level),
        })
    }
}

fn raw_percents(level: u8) -> [u8; 4] {
    if level <= PIVOT_LEVEL {
        [60 - 2 * level, 30, 10 + level, level]
    } else {
        let d = level - PIVOT_LEVEL;
        [0, 30 - d, 40, 30 + d]
    }
}

/// Visitor-count distribution of a single gate level, kept as raw percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorDistribution {
    level: u8,
    percents: [u8; 4],
}

impl VisitorDistribution {
    /// Build the distribution for one level.
    ///
    /// # Errors
    ///
    /// Returns [`MemoriaError::InvalidLevel`] when the level is out of range.
    pub fn for_level(level: u8) -> Result<Self, MemoriaError> {
        let level = validate_level(level)?;
        Ok(Self {
            level,
            percents: raw_percents(level),
        })
    }

    #[must_use]
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// Raw percentage for a visitor count, `None` for counts outside {2, 3, 4, 5}.
    #[must_use]
    pub fn raw_percent(&self, visitors: u8) -> Option<u8> {
        VISITOR_COUNTS
            .iter()
            .position(|&count| count == visitors)
            .map(|idx| self.percents[idx])
    }

    /// Probability of a visitor count; zero for counts the table never produces.
    #[must_use]
    pub fn probability(&self, visitors: u8) -> f64 {
        self.raw_percent(visitors)
            .map_or(0.0, percent_to_probability)
    }

    /// `(visitors, probability)` pairs in ascending visitor order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, f64)> + '_ {
        VISITOR_COUNTS
            .iter()
            .zip(self.percents.iter())
            .map(|(&visitors, &percent)| (visitors, percent_to_probability(percent)))
    }

    #[must_use]
    pub fn raw_percent_total(&self) -> u32 {
        self.percents.iter().map(|&p| u32::from(p)).sum()
    }

    /// Largest visitor count that carries nonzero probability.
    #[must_use]
    pub fn max_visitors(&self) -> u8 {
        VISITOR_COUNTS
            .iter()
            .zip(self.percents.iter())
            .filter(|&(_, &percent)| percent > 0)
            .map(|(&visitors, _)| visitors)
            .max()
            .unwrap_or(VISITOR_COUNTS[VISITOR_COUNTS.len() - 1])
    }

    #[must_use]
    pub fn mean_visitors(&self) -> f64 {
        self.iter()
            .map(|(visitors, probability)| f64::from(visitors) * probability)
            .sum()
    }
}

/// Immutable table of visitor distributions for every gate level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbabilityTable {
    levels: Vec<VisitorDistribution>,
}

impl ProbabilityTable {
    /// Build the table for levels `MIN_LEVEL..=MAX_LEVEL`.
    #[must_use]
    pub fn build() -> Self {
        let levels = (MIN_LEVEL..=MAX_LEVEL)
            .map(|level| VisitorDistribution {
                level,
                percents: raw_percents(level),
            })
            .collect();
        Self { levels }
    }

    /// Process-wide table, built on first use and read-only afterwards.
    #[must_use]
    pub fn shared() -> &'static Self {
        static TABLE: OnceLock<ProbabilityTable> = OnceLock::new();
        TABLE.get_or_init(Self::build)
    }

    /// Distribution for a gate level.
    ///
    /// # Errors
    ///
    /// Returns [`MemoriaError::InvalidLevel`] when the level is out of range.
    pub fn distribution(&self, level: u8) -> Result<&VisitorDistribution, MemoriaError> {
        let level = validate_level(level)?;
        self.levels
            .get(usize::from(level - MIN_LEVEL))
            .ok_or(MemoriaError::InvalidLevel {
                level: u32::from(level),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &VisitorDistribution> {
        self.levels.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl Default for ProbabilityTable {
    fn default() -> Self {
        Self::build()
    }
}

/// Build a fresh probability table.
#[must_use]
pub fn build_probability_table() -> ProbabilityTable {
    ProbabilityTable::build()
}
