use anyhow::Result;
use colored::Colorize;
use std::io::Write;

use crate::harness::{DistributionRow, RunReport};

fn mode_label(report: &RunReport) -> String {
    match report.scenario.bonus_member {
        Some(index) => format!("invited (bonus member #{index})"),
        None => "plain".to_string(),
    }
}

pub fn generate_console_report(
    out: &mut dyn Write,
    report: &RunReport,
    show_table: bool,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Memoria Expectation".bright_cyan().bold())?;
    writeln!(out, "{}", "======================".cyan())?;
    writeln!(out, "Level: {}", report.scenario.level)?;
    writeln!(out, "Unit size: {}", report.scenario.roster_size)?;
    writeln!(out, "Mode: {}", mode_label(report))?;
    writeln!(
        out,
        "Rules: {} sessions/day, bonus {} per day",
        report.rules.sessions_per_day, report.rules.bonus_units
    )?;
    writeln!(out)?;

    writeln!(out, "Daily total: {}", format!("{:.4}", report.daily.total).bold())?;
    for (name, value) in report.daily.breakdown.categories() {
        writeln!(out, "   {name}: {value:.4}")?;
    }
    writeln!(
        out,
        "After {} days: {}",
        report.days,
        format!("{:.4}", report.cumulative.total).bold()
    )?;

    if show_table {
        writeln!(out)?;
        writeln!(out, "{}", "🎲 Visitor Distribution".bright_yellow().bold())?;
        writeln!(out, "{}", "=======================".yellow())?;
        for DistributionRow {
            visitors,
            percent,
            probability,
        } in &report.distribution
        {
            writeln!(out, "   {visitors} visitors: {percent:>3}% ({probability:.2})")?;
        }
    }

    if let Some(sim) = &report.simulation {
        writeln!(out)?;
        writeln!(out, "{}", "⚡ Monte Carlo Check".bright_yellow().bold())?;
        writeln!(out, "{}", "===================".yellow())?;
        writeln!(out, "Trials: {} (seed {})", sim.trials, sim.seed)?;
        writeln!(
            out,
            "Simulated mean: {:.4} ± {:.4} (min {}, max {})",
            sim.summary.mean, sim.summary.std_dev, sim.summary.min, sim.summary.max
        )?;
        let deviation = format!(
            "{:.2}% (tolerance {:.2}%)",
            sim.relative_error * 100.0,
            sim.tolerance * 100.0
        );
        let status = if sim.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(out, "Deviation: {deviation}")?;
        writeln!(out, "{status} in {} ms", sim.elapsed_ms)?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, report: &RunReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(
    out: &mut dyn Write,
    report: &RunReport,
    show_table: bool,
) -> Result<()> {
    writeln!(out, "# Memoria Expectation Report\n")?;
    writeln!(out, "_Generated {}_\n", report.generated_at)?;

    writeln!(out, "## Scenario\n")?;
    writeln!(out, "- **Level**: {}", report.scenario.level)?;
    writeln!(out, "- **Unit size**: {}", report.scenario.roster_size)?;
    writeln!(out, "- **Mode**: {}", mode_label(report))?;
    writeln!(
        out,
        "- **Sessions per day**: {}",
        report.rules.sessions_per_day
    )?;
    writeln!(out, "- **Bonus units**: {}\n", report.rules.bonus_units)?;

    writeln!(out, "## Expectation\n")?;
    writeln!(out, "| Category | Daily | After {} days |", report.days)?;
    writeln!(out, "|---|---|---|")?;
    writeln!(
        out,
        "| total | {:.4} | {:.4} |",
        report.daily.total, report.cumulative.total
    )?;
    let daily = report.daily.breakdown.categories();
    let cumulative = report.cumulative.breakdown.categories();
    for ((name, daily), (_, total)) in daily.into_iter().zip(cumulative) {
        writeln!(out, "| {name} | {daily:.4} | {total:.4} |")?;
    }
    writeln!(out)?;

    if show_table {
        writeln!(out, "## Visitor Distribution\n")?;
        writeln!(out, "| Visitors | Percent |")?;
        writeln!(out, "|---|---|")?;
        for row in &report.distribution {
            writeln!(out, "| {} | {}% |", row.visitors, row.percent)?;
        }
        writeln!(out)?;
    }

    if let Some(sim) = &report.simulation {
        let status = if sim.passed { "✅" } else { "❌" };
        writeln!(out, "## {status} Monte Carlo Check\n")?;
        writeln!(out, "- **Trials**: {}", sim.trials)?;
        writeln!(out, "- **Seed**: {}", sim.seed)?;
        writeln!(out, "- **Simulated mean**: {:.4}", sim.summary.mean)?;
        writeln!(out, "- **Std dev**: {:.4}", sim.summary.std_dev)?;
        writeln!(
            out,
            "- **Relative error**: {:.4} (tolerance {:.4})",
            sim.relative_error, sim.tolerance
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{HarnessRequest, run_harness};
    use memoria_core::{RewardRules, Scenario};

    fn sample(trials: usize) -> RunReport {
        run_harness(&HarnessRequest {
            scenario: Scenario::new(30, 6, true),
            rules: RewardRules::default(),
            days: 30,
            trials,
            seed: Some(7),
            tolerance: 0.05,
        })
        .unwrap()
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> Result<()>) -> String {
        let mut buf: Vec<u8> = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn console_report_lists_breakdown_and_table() {
        let report = sample(0);
        let text = render(|out| generate_console_report(out, &report, true));
        assert!(text.contains("Memoria Expectation"));
        assert!(text.contains("invited"));
        assert!(text.contains("others: 0.8400"));
        assert!(text.contains("Visitor Distribution"));
        assert!(!text.contains("Monte Carlo"));
    }

    #[test]
    fn console_report_hides_table_by_default() {
        let report = sample(100);
        let text = render(|out| generate_console_report(out, &report, false));
        assert!(!text.contains("Visitor Distribution"));
        assert!(text.contains("seed 7"));
    }

    #[test]
    fn json_report_round_trips() {
        let report = sample(50);
        let text = render(|out| generate_json_report(out, &report));
        let parsed: RunReport = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.scenario, report.scenario);
        assert!((parsed.daily.total - report.daily.total).abs() < 1e-12);
        assert_eq!(parsed.simulation.map(|s| s.trials), Some(50));
        assert!(text.contains("\"mode\": \"invited\""));
    }

    #[test]
    fn markdown_report_has_expectation_table() {
        let report = sample(50);
        let text = render(|out| generate_markdown_report(out, &report, true));
        assert!(text.starts_with("# Memoria Expectation Report"));
        assert!(text.contains("| total | 6.2000 | 186.0000 |"));
        assert!(text.contains("| invited | 2.0000 | 60.0000 |"));
        assert!(text.contains("| 3 | 30% |"));
        assert!(text.contains("**Seed**: 7"));
    }
}
