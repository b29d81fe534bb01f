//! Memoria Expectation Engine
//!
//! Closed-form and Monte Carlo models of the daily memoria drop: two visit
//! sessions per day draw a level-dependent number of roster members, every
//! member that shows up earns one memoria, and an invited bonus member earns a
//! guaranteed daily amount. The analytic engine and the simulator read the same
//! probability table and reward rules so their results can be compared.

pub mod config;
pub mod error;
pub mod expectation;
pub mod numbers;
pub mod rng;
pub mod simulation;
pub mod stats;
pub mod table;

// Re-export commonly used types
pub use config::{DEFAULT_BONUS_MEMBER, MIN_ROSTER_SIZE, RewardRules, Scenario, TrialPlan};
pub use error::{ConfigError, MemoriaError};
pub use expectation::{
    Expectation, ExpectationEngine, MemberBreakdown, daily_expectation, expectation_after_days,
};
pub use rng::{derive_trial_seed, trial_rng};
pub use simulation::{
    DailyOutcome, DaySeries, MemberGains, MemberSet, MonteCarloSimulator,
    draw_session_visitor_count, run_trials,
};
pub use stats::{RunningStats, Summary, summarize};
pub use table::{
    MAX_LEVEL, MIN_LEVEL, ProbabilityTable, VISITOR_COUNTS, VisitorDistribution,
    build_probability_table,
};

/// Analytic expectation and simulated summary for the same scenario.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Comparison {
    pub analytic: Expectation,
    pub simulated: Summary,
}

impl Comparison {
    /// Relative gap between the simulated mean and the analytic total.
    #[must_use]
    pub fn relative_error(&self) -> f64 {
        self.simulated.relative_error(self.analytic.total)
    }

    #[must_use]
    pub fn within(&self, tolerance: f64) -> bool {
        self.relative_error() <= tolerance
    }
}

/// Run a trial plan and summarize it next to the analytic expectation for the same days.
///
/// # Errors
///
/// Returns an error when the plan's scenario is invalid, the roster is too small to
/// simulate, or the plan has zero trials.
pub fn compare(
    table: &ProbabilityTable,
    rules: RewardRules,
    plan: &TrialPlan,
) -> Result<Comparison, MemoriaError> {
    let analytic = ExpectationEngine::new(table, rules).after_days(plan.days, &plan.scenario)?;
    let totals = MonteCarloSimulator::new(table, rules).run_trials(plan)?;
    let simulated = summarize(&totals)?;
    Ok(Comparison {
        analytic,
        simulated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_agrees_for_a_month() {
        let plan = TrialPlan::new(Scenario::new(30, 6, false), 30, 2_000).with_seed(0xC0FFEE);
        let comparison =
            compare(ProbabilityTable::shared(), RewardRules::default(), &plan).unwrap();
        assert_eq!(comparison.simulated.count, 2_000);
        assert!(
            comparison.within(0.02),
            "relative error {:.4}",
            comparison.relative_error()
        );
    }

    #[test]
    fn compare_with_no_trials_is_empty_input() {
        let plan = TrialPlan::new(Scenario::new(30, 6, false), 30, 0).with_seed(1);
        assert_eq!(
            compare(ProbabilityTable::shared(), RewardRules::default(), &plan).unwrap_err(),
            MemoriaError::EmptyInput
        );
    }
}
