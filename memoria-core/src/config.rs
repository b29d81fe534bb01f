//! Reward rules and scenario parameters.
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, MemoriaError};
use crate::table::validate_level;

/// Smallest roster the model accepts.
pub const MIN_ROSTER_SIZE: usize = 2;
/// Roster slot used as the bonus member when a caller only says "invited".
pub const DEFAULT_BONUS_MEMBER: usize = 0;

const MAX_SESSIONS_PER_DAY: u32 = 8;
const MAX_BONUS_UNITS: u32 = 100;

/// Daily reward rules shared by the analytic engine and the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRules {
    /// Independent draw sessions per day (morning and evening).
    #[serde(default = "RewardRules::default_sessions_per_day")]
    pub sessions_per_day: u32,
    /// Flat units the bonus member yields every day.
    #[serde(default = "RewardRules::default_bonus_units")]
    pub bonus_units: u32,
}

impl RewardRules {
    const fn default_sessions_per_day() -> u32 {
        2
    }

    const fn default_bonus_units() -> u32 {
        2
    }

    /// Load reward rules from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or a field is out of range.
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        let rules: Self = serde_json::from_str(json_str)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Embedded default rules, falling back to compiled defaults if the asset is unusable.
    #[must_use]
    pub fn default_config() -> Self {
        Self::from_json(include_str!("../data/rules.json")).unwrap_or_default()
    }

    /// Check every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RangeViolation`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_SESSIONS_PER_DAY).contains(&self.sessions_per_day) {
            return Err(ConfigError::RangeViolation {
                field: "sessions_per_day",
                min: 1,
                max: MAX_SESSIONS_PER_DAY,
                value: self.sessions_per_day,
            });
        }
        if self.bonus_units > MAX_BONUS_UNITS {
            return Err(ConfigError::RangeViolation {
                field: "bonus_units",
                min: 0,
                max: MAX_BONUS_UNITS,
                value: self.bonus_units,
            });
        }
        Ok(())
    }
}

impl Default for RewardRules {
    fn default() -> Self {
        Self {
            sessions_per_day: Self::default_sessions_per_day(),
            bonus_units: Self::default_bonus_units(),
        }
    }
}

/// One roster configuration at one gate level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub level: u8,
    pub roster_size: usize,
    /// Roster slot that receives the guaranteed bonus, if any.
    #[serde(default)]
    pub bonus_member: Option<usize>,
}

impl Scenario {
    /// `invited = true` marks slot [`DEFAULT_BONUS_MEMBER`] as the bonus member.
    #[must_use]
    pub const fn new(level: u8, roster_size: usize, invited: bool) -> Self {
        Self {
            level,
            roster_size,
            bonus_member: if invited {
                Some(DEFAULT_BONUS_MEMBER)
            } else {
                None
            },
        }
    }

    #[must_use]
    pub const fn with_bonus_member(mut self, index: usize) -> Self {
        self.bonus_member = Some(index);
        self
    }

    #[must_use]
    pub const fn invited(&self) -> bool {
        self.bonus_member.is_some()
    }

    /// Check level, roster size and bonus slot.
    ///
    /// # Errors
    ///
    /// Returns [`MemoriaError::InvalidLevel`], [`MemoriaError::InvalidRosterSize`]
    /// or [`MemoriaError::InvalidBonusMember`] for the first violated rule.
    pub fn validate(&self) -> Result<(), MemoriaError> {
        validate_level(self.level)?;
        if self.roster_size < MIN_ROSTER_SIZE {
            return Err(MemoriaError::InvalidRosterSize {
                roster_size: self.roster_size,
                required: MIN_ROSTER_SIZE,
            });
        }
        if let Some(index) = self.bonus_member
            && index >= self.roster_size
        {
            return Err(MemoriaError::InvalidBonusMember {
                index,
                roster_size: self.roster_size,
            });
        }
        Ok(())
    }
}

/// A multi-trial Monte Carlo request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialPlan {
    pub scenario: Scenario,
    pub days: u32,
    pub trials: usize,
    /// Fixed seed for reproducible runs; `None` draws one from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl TrialPlan {
    #[must_use]
    pub const fn new(scenario: Scenario, days: u32, trials: usize) -> Self {
        Self {
            scenario,
            days,
            trials,
            seed: None,
        }
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_rules_match_defaults() {
        assert_eq!(RewardRules::default_config(), RewardRules::default());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let rules = RewardRules::from_json(r#"{ "bonus_units": 3 }"#).unwrap();
        assert_eq!(rules.sessions_per_day, 2);
        assert_eq!(rules.bonus_units, 3);
    }

    #[test]
    fn out_of_range_sessions_rejected() {
        let err = RewardRules::from_json(r#"{ "sessions_per_day": 0 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::RangeViolation {
                field: "sessions_per_day",
                value: 0,
                ..
            }
        ));
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        assert!(matches!(
            RewardRules::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn invited_maps_to_slot_zero() {
        let scenario = Scenario::new(30, 6, true);
        assert_eq!(scenario.bonus_member, Some(0));
        assert!(scenario.invited());
        assert!(!Scenario::new(30, 6, false).invited());
        assert_eq!(
            Scenario::new(30, 6, false).with_bonus_member(3).bonus_member,
            Some(3)
        );
    }

    #[test]
    fn validate_reports_first_violation() {
        assert_eq!(
            Scenario::new(41, 6, false).validate(),
            Err(MemoriaError::InvalidLevel { level: 41 })
        );
        assert_eq!(
            Scenario::new(10, 1, false).validate(),
            Err(MemoriaError::InvalidRosterSize {
                roster_size: 1,
                required: 2
            })
        );
        assert_eq!(
            Scenario::new(10, 6, false).with_bonus_member(6).validate(),
            Err(MemoriaError::InvalidBonusMember {
                index: 6,
                roster_size: 6
            })
        );
        assert!(Scenario::new(10, 6, true).validate().is_ok());
    }

    #[test]
    fn trial_plan_round_trips_through_json() {
        let plan = TrialPlan::new(Scenario::new(32, 6, true), 30, 1_000).with_seed(7);
        let json = serde_json::to_string(&plan).unwrap();
        let back: TrialPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
    }
}
