//! Monte Carlo reproduction of the daily visit process.
//!
//! A day consists of `sessions_per_day` independent sessions. Each session
//! draws a visitor count `k` from the level's distribution and then picks `k`
//! distinct members uniformly without replacement. When a bonus member is set
//! it always fills one of the `k` slots and the other `k - 1` come from the
//! remaining members. A regular member earns one unit if it appeared at least
//! once that day; the bonus member earns a flat `bonus_units` instead.
use rand::Rng;
use rand::seq::index;
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::config::{RewardRules, Scenario, TrialPlan};
use crate::error::MemoriaError;
use crate::rng::{entropy_seed, trial_rng};
use crate::table::{ProbabilityTable, VisitorDistribution};

/// Roster indices, stored inline for typical roster sizes.
pub type MemberSet = SmallVec<[usize; 16]>;
/// Per-member reward units for one day, indexed by roster slot.
pub type MemberGains = SmallVec<[u32; 16]>;

/// Result of one simulated day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyOutcome {
    /// Members that appeared in at least one session, ascending.
    pub appeared: MemberSet,
    pub gains: MemberGains,
    pub total: u32,
}

/// Ordered per-day rewards with the running total after each day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySeries {
    pub rewards: Vec<u32>,
    pub cumulative: Vec<u64>,
}

impl DaySeries {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    fn push(&mut self, reward: u32) {
        let running = self.total() + u64::from(reward);
        self.rewards.push(reward);
        self.cumulative.push(running);
    }
}

/// Sample one session's visitor count by inverse-CDF over a uniform `[0, 1)` roll.
///
/// Counts are visited in ascending order. If rounding leaves the accumulated
/// mass just below the roll, the largest count with nonzero probability is used.
pub fn draw_session_visitor_count<R: Rng + ?Sized>(
    dist: &VisitorDistribution,
    rng: &mut R,
) -> u8 {
    let roll: f64 = rng.r#gen();
    if let Some(visitors) = visitor_count_for_roll(dist, roll) {
        return visitors;
    }
    let fallback = dist.max_visitors();
    log::debug!(
        "level {} draw {roll} exceeded the accumulated mass; using {fallback} visitors",
        dist.level()
    );
    fallback
}

/// Inverse-CDF lookup; `None` when `roll` lies past the accumulated mass.
fn visitor_count_for_roll(dist: &VisitorDistribution, roll: f64) -> Option<u8> {
    let mut accumulated = 0.0;
    for (visitors, probability) in dist.iter() {
        accumulated += probability;
        if roll < accumulated {
            return Some(visitors);
        }
    }
    None
}

/// Stochastic day-by-day simulator sharing the analytic engine's table and rules.
#[derive(Debug, Clone, Copy)]
pub struct MonteCarloSimulator<'a> {
    table: &'a ProbabilityTable,
    rules: RewardRules,
}

impl<'a> MonteCarloSimulator<'a> {
    #[must_use]
    pub const fn new(table: &'a ProbabilityTable, rules: RewardRules) -> Self {
        Self { table, rules }
    }

    #[must_use]
    pub const fn rules(&self) -> RewardRules {
        self.rules
    }

    /// Simulate a single day.
    ///
    /// # Errors
    ///
    /// Returns an error when the scenario is invalid or the roster cannot supply
    /// the largest visitor count the level can draw.
    pub fn simulate_one_day<R: Rng + ?Sized>(
        &self,
        scenario: &Scenario,
        rng: &mut R,
    ) -> Result<DailyOutcome, MemoriaError> {
        let dist = self.prepare(scenario)?;
        Ok(self.sample_day(scenario, dist, rng))
    }

    /// Simulate `days` consecutive days from one random stream.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::simulate_one_day`].
    pub fn simulate_days<R: Rng + ?Sized>(
        &self,
        scenario: &Scenario,
        days: u32,
        rng: &mut R,
    ) -> Result<DaySeries, MemoriaError> {
        let dist = self.prepare(scenario)?;
        let mut series = DaySeries::default();
        for _ in 0..days {
            series.push(self.sample_day(scenario, dist, rng).total);
        }
        Ok(series)
    }

    /// Run independent trials and return each trial's cumulative total.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::simulate_one_day`]; nothing is sampled on error.
    pub fn run_trials(&self, plan: &TrialPlan) -> Result<Vec<u64>, MemoriaError> {
        let dist = self.prepare(&plan.scenario)?;
        let seed = plan.seed.unwrap_or_else(|| {
            let seed = entropy_seed();
            log::info!("no seed supplied, drew {seed} from entropy");
            seed
        });
        log::debug!(
            "running {} trial(s) of {} day(s) at level {} (roster {}, bonus {:?}, seed {seed})",
            plan.trials,
            plan.days,
            plan.scenario.level,
            plan.scenario.roster_size,
            plan.scenario.bonus_member
        );

        let totals: Vec<u64> = (0..plan.trials)
            .map(|trial| {
                let mut rng = trial_rng(seed, u64::try_from(trial).unwrap_or(u64::MAX));
                (0..plan.days)
                    .map(|_| u64::from(self.sample_day(&plan.scenario, dist, &mut rng).total))
                    .sum::<u64>()
            })
            .collect();
        Ok(totals)
    }

    fn prepare(&self, scenario: &Scenario) -> Result<&'a VisitorDistribution, MemoriaError> {
        scenario.validate()?;
        let dist = self.table.distribution(scenario.level)?;
        let required = usize::from(dist.max_visitors());
        if scenario.roster_size < required {
            return Err(MemoriaError::InvalidRosterSize {
                roster_size: scenario.roster_size,
                required,
            });
        }
        Ok(dist)
    }

    fn sample_day<R: Rng + ?Sized>(
        &self,
        scenario: &Scenario,
        dist: &VisitorDistribution,
        rng: &mut R,
    ) -> DailyOutcome {
        let members = scenario.roster_size;
        let mut seen: SmallVec<[bool; 16]> = smallvec![false; members];

        for _ in 0..self.rules.sessions_per_day {
            let visitors = usize::from(draw_session_visitor_count(dist, rng));
            match scenario.bonus_member {
                Some(bonus) => {
                    seen[bonus] = true;
                    for idx in index::sample(rng, members - 1, visitors.saturating_sub(1)) {
                        let member = if idx >= bonus { idx + 1 } else { idx };
                        seen[member] = true;
                    }
                }
                None => {
                    for member in index::sample(rng, members, visitors) {
                        seen[member] = true;
                    }
                }
            }
        }

        let mut appeared = MemberSet::new();
        let mut gains = MemberGains::with_capacity(members);
        for (member, &hit) in seen.iter().enumerate() {
            if hit {
                appeared.push(member);
            }
            let gain = if scenario.bonus_member == Some(member) {
                self.rules.bonus_units
            } else {
                u32::from(hit)
            };
            gains.push(gain);
        }
        let total = gains.iter().sum();
        DailyOutcome {
            appeared,
            gains,
            total,
        }
    }
}

/// Run Monte Carlo trials with the shared table and default rules.
///
/// # Errors
///
/// Returns [`MemoriaError::InvalidLevel`] or [`MemoriaError::InvalidRosterSize`]
/// when the parameters cannot be simulated.
pub fn run_trials(
    trial_count: usize,
    day_count: u32,
    level: u8,
    unit_size: usize,
    invited: bool,
    seed: Option<u64>,
) -> Result<Vec<u64>, MemoriaError> {
    let plan = TrialPlan {
        scenario: Scenario::new(level, unit_size, invited),
        days: day_count,
        trials: trial_count,
        seed,
    };
    MonteCarloSimulator::new(ProbabilityTable::shared(), RewardRules::default_config())
        .run_trials(&plan)
}
