use chrono::Utc;
use memoria_core::rng::entropy_seed;
use memoria_core::{
    Expectation, ExpectationEngine, MemoriaError, ProbabilityTable, RewardRules, Scenario,
    Summary, TrialPlan, compare,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Everything needed to evaluate one scenario.
#[derive(Debug, Clone, Copy)]
pub struct HarnessRequest {
    pub scenario: Scenario,
    pub rules: RewardRules,
    pub days: u32,
    pub trials: usize,
    pub seed: Option<u64>,
    pub tolerance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionRow {
    pub visitors: u8,
    pub percent: u8,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub trials: usize,
    pub seed: u64,
    pub summary: Summary,
    pub relative_error: f64,
    pub tolerance: f64,
    pub passed: bool,
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: String,
    pub scenario: Scenario,
    pub rules: RewardRules,
    pub days: u32,
    pub daily: Expectation,
    pub cumulative: Expectation,
    pub distribution: Vec<DistributionRow>,
    pub simulation: Option<SimulationReport>,
}

impl RunReport {
    /// True unless a simulation ran and drifted beyond the tolerance.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.simulation.as_ref().is_none_or(|sim| sim.passed)
    }
}

/// Evaluate the analytic expectation and, when `trials > 0`, the Monte Carlo check.
pub fn run_harness(request: &HarnessRequest) -> Result<RunReport, MemoriaError> {
    let table = ProbabilityTable::shared();
    let engine = ExpectationEngine::new(table, request.rules);
    let daily = engine.daily(&request.scenario)?;
    let cumulative = daily.over_days(request.days);

    let dist = table.distribution(request.scenario.level)?;
    let distribution = dist
        .iter()
        .map(|(visitors, probability)| DistributionRow {
            visitors,
            percent: dist.raw_percent(visitors).unwrap_or(0),
            probability,
        })
        .collect();

    let simulation = if request.trials == 0 {
        log::info!("trials = 0, skipping Monte Carlo validation");
        None
    } else {
        let seed = request.seed.unwrap_or_else(entropy_seed);
        let plan = TrialPlan::new(request.scenario, request.days, request.trials).with_seed(seed);
        let started = Instant::now();
        let comparison = compare(table, request.rules, &plan)?;
        let elapsed_ms = started.elapsed().as_millis();
        let relative_error = comparison.relative_error();
        log::debug!(
            "simulated mean {:.3} vs analytic {:.3} ({:.4} relative) in {elapsed_ms} ms",
            comparison.simulated.mean,
            comparison.analytic.total,
            relative_error
        );
        Some(SimulationReport {
            trials: request.trials,
            seed,
            summary: comparison.simulated,
            relative_error,
            tolerance: request.tolerance,
            passed: comparison.within(request.tolerance),
            elapsed_ms,
        })
    };

    Ok(RunReport {
        generated_at: Utc::now().to_rfc3339(),
        scenario: request.scenario,
        rules: request.rules,
        days: request.days,
        daily,
        cumulative,
        distribution,
        simulation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(trials: usize) -> HarnessRequest {
        HarnessRequest {
            scenario: Scenario::new(30, 6, true),
            rules: RewardRules::default(),
            days: 30,
            trials,
            seed: Some(1337),
            tolerance: 0.02,
        }
    }

    #[test]
    fn analytic_only_run_passes() {
        let report = run_harness(&request(0)).unwrap();
        assert!(report.simulation.is_none());
        assert!(report.passed());
        assert!((report.daily.total - 6.2).abs() < 1e-12);
        assert!((report.cumulative.total - 186.0).abs() < 1e-9);
        assert_eq!(report.distribution.len(), 4);
        assert_eq!(report.distribution[0].percent, 0);
    }

    #[test]
    fn simulated_run_records_seed_and_verdict() {
        let report = run_harness(&request(500)).unwrap();
        let sim = report.simulation.as_ref().unwrap();
        assert_eq!(sim.seed, 1337);
        assert_eq!(sim.summary.count, 500);
        assert!(sim.passed, "relative error {}", sim.relative_error);
        assert!(report.passed());
    }

    #[test]
    fn zero_tolerance_fails_the_verdict() {
        // 7 trials of one day can never average exactly 6.2.
        let mut req = request(7);
        req.days = 1;
        req.tolerance = 0.0;
        let report = run_harness(&req).unwrap();
        assert!(!report.passed());
    }

    #[test]
    fn invalid_scenarios_surface_errors() {
        let mut req = request(10);
        req.scenario = Scenario::new(41, 6, false);
        assert_eq!(
            run_harness(&req).unwrap_err(),
            MemoriaError::InvalidLevel { level: 41 }
        );
    }
}
