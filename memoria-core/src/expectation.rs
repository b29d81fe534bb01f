//! Closed-form daily and multi-day memoria expectations.
//!
//! A roster member's daily reward only depends on whether it appears in at
//! least one of the day's sessions. Sessions are independent and identically
//! distributed, so a member's daily appearance probability is
//! `1 - E[miss]^sessions`, where `miss` is the chance of being left out of a
//! single session given its visitor count. With two sessions this equals the
//! pairwise sum `Σ p1·p2·(1 - m1·m2)` over every visitor-count pair.
use serde::{Deserialize, Serialize};

use crate::config::{RewardRules, Scenario};
use crate::error::MemoriaError;
use crate::numbers::usize_to_f64;
use crate::table::{ProbabilityTable, VisitorDistribution};

/// Expected daily units per member category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MemberBreakdown {
    /// No bonus member: every member shares the same expectation.
    All { all: f64 },
    /// Bonus member active: its flat reward and the expectation of each other member.
    Invited { invited: f64, others: f64 },
}

impl MemberBreakdown {
    /// Look up a category by name (`all`, `invited` or `others`).
    #[must_use]
    pub fn category(&self, name: &str) -> Option<f64> {
        self.categories()
            .into_iter()
            .find(|(label, _)| *label == name)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn categories(&self) -> Vec<(&'static str, f64)> {
        match *self {
            Self::All { all } => vec![("all", all)],
            Self::Invited { invited, others } => vec![("invited", invited), ("others", others)],
        }
    }

    fn scaled(self, factor: f64) -> Self {
        match self {
            Self::All { all } => Self::All { all: all * factor },
            Self::Invited { invited, others } => Self::Invited {
                invited: invited * factor,
                others: others * factor,
            },
        }
    }
}

/// Expected total reward with its per-category breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Expectation {
    pub total: f64,
    pub breakdown: MemberBreakdown,
}

impl Expectation {
    /// Scale a daily expectation to `days` independent days.
    #[must_use]
    pub fn over_days(&self, days: u32) -> Self {
        let factor = f64::from(days);
        Self {
            total: self.total * factor,
            breakdown: self.breakdown.scaled(factor),
        }
    }
}

/// Analytic expectation engine over a probability table.
#[derive(Debug, Clone, Copy)]
pub struct ExpectationEngine<'a> {
    table: &'a ProbabilityTable,
    rules: RewardRules,
}

impl<'a> ExpectationEngine<'a> {
    #[must_use]
    pub const fn new(table: &'a ProbabilityTable, rules: RewardRules) -> Self {
        Self { table, rules }
    }

    #[must_use]
    pub const fn rules(&self) -> RewardRules {
        self.rules
    }

    /// Expected reward of a single day.
    ///
    /// # Errors
    ///
    /// Returns an error when the scenario fails validation.
    pub fn daily(&self, scenario: &Scenario) -> Result<Expectation, MemoriaError> {
        scenario.validate()?;
        let dist = self.table.distribution(scenario.level)?;
        let members = scenario.roster_size;

        let expectation = if scenario.invited() {
            let invited = f64::from(self.rules.bonus_units);
            let others = appearance_probability(dist, members - 1, 1, self.rules.sessions_per_day);
            Expectation {
                total: invited + usize_to_f64(members - 1) * others,
                breakdown: MemberBreakdown::Invited { invited, others },
            }
        } else {
            let all = appearance_probability(dist, members, 0, self.rules.sessions_per_day);
            Expectation {
                total: usize_to_f64(members) * all,
                breakdown: MemberBreakdown::All { all },
            }
        };
        Ok(expectation)
    }

    /// Expected cumulative reward after `days` days.
    ///
    /// # Errors
    ///
    /// Returns an error when the scenario fails validation.
    pub fn after_days(&self, days: u32, scenario: &Scenario) -> Result<Expectation, MemoriaError> {
        Ok(self.daily(scenario)?.over_days(days))
    }
}

/// Probability that one member of a `pool`-sized sampling pool appears at least
/// once in a day. `reserved` visitor slots per session are taken before the
/// pool is sampled (the bonus member's slot).
fn appearance_probability(
    dist: &VisitorDistribution,
    pool: usize,
    reserved: u8,
    sessions: u32,
) -> f64 {
    let pool_size = usize_to_f64(pool);
    let expected_miss: f64 = dist
        .iter()
        .map(|(visitors, probability)| {
            let slots = usize::from(visitors.saturating_sub(reserved));
            let left_out = pool.saturating_sub(slots);
            probability * usize_to_f64(left_out) / pool_size
        })
        .sum();
    let sessions = i32::try_from(sessions).unwrap_or(i32::MAX);
    1.0 - expected_miss.powi(sessions)
}

/// Expected reward of one day using the shared table and default rules.
///
/// # Errors
///
/// Returns [`MemoriaError::InvalidLevel`] or [`MemoriaError::InvalidRosterSize`]
/// for parameters outside the model's domain.
pub fn daily_expectation(
    level: u8,
    unit_size: usize,
    invited: bool,
) -> Result<Expectation, MemoriaError> {
    ExpectationEngine::new(ProbabilityTable::shared(), RewardRules::default_config())
        .daily(&Scenario::new(level, unit_size, invited))
}

/// Expected cumulative reward after `days` days using the shared table and default rules.
///
/// # Errors
///
/// Returns [`MemoriaError::InvalidLevel`] or [`MemoriaError::InvalidRosterSize`]
/// for parameters outside the model's domain.
pub fn expectation_after_days(
    days: u32,
    level: u8,
    unit_size: usize,
    invited: bool,
) -> Result<Expectation, MemoriaError> {
    ExpectationEngine::new(ProbabilityTable::shared(), RewardRules::default_config())
        .after_days(days, &Scenario::new(level, unit_size, invited))
}
