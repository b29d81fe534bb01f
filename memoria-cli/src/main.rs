mod harness;
mod reports;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use memoria_core::{RewardRules, Scenario};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};

use harness::{HarnessRequest, RunReport, run_harness};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ReportFormat {
    /// Colored human-readable summary
    Console,
    /// Machine-readable report
    Json,
    /// Markdown tables for pasting into docs
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "memoria-cli", version)]
#[command(about = "Expected daily memoria per unit, cross-checked by Monte Carlo simulation")]
struct Args {
    /// Gate level (1-40)
    #[arg(long, default_value_t = 30)]
    level: u8,

    /// Number of members in the unit
    #[arg(long, default_value_t = 6)]
    unit_size: usize,

    /// Invite a bonus member (roster slot 0)
    #[arg(long)]
    invited: bool,

    /// Roster slot of the bonus member; implies --invited
    #[arg(long)]
    bonus_member: Option<usize>,

    /// Days to project and simulate
    #[arg(long, default_value_t = 30)]
    days: u32,

    /// Monte Carlo trials; 0 skips the simulation
    #[arg(long, default_value_t = 1000)]
    trials: usize,

    /// Seed for reproducible simulations
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum accepted relative error between simulation and closed form
    #[arg(long, default_value_t = 0.02)]
    tolerance: f64,

    /// JSON file with reward rules (sessions_per_day, bonus_units)
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Include the visitor distribution for the level
    #[arg(long)]
    show_table: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Exit status when the simulation drifts beyond the tolerance.
const EXIT_TOLERANCE: i32 = 1;
/// Exit status for invalid inputs and any other failure.
const EXIT_ERROR: i32 = 2;

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(EXIT_TOLERANCE),
        Err(err) => {
            eprintln!("❌ {}", format!("{err:#}").red());
            std::process::exit(EXIT_ERROR);
        }
    }
}

/// Returns whether the run passed its tolerance check.
fn run(args: &Args) -> Result<bool> {
    let rules = load_rules(args.rules.as_deref())?;
    let request = build_request(args, rules);
    log::debug!("running {request:?}");

    let report = run_harness(&request)?;
    write_report(args, &report)?;
    Ok(report.passed())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn load_rules(path: Option<&Path>) -> Result<RewardRules> {
    let Some(path) = path else {
        return Ok(RewardRules::default_config());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let rules = RewardRules::from_json(&json)
        .with_context(|| format!("invalid reward rules in {}", path.display()))?;
    log::info!("loaded reward rules from {}", path.display());
    Ok(rules)
}

fn build_scenario(args: &Args) -> Scenario {
    let scenario = Scenario::new(args.level, args.unit_size, args.invited);
    match args.bonus_member {
        Some(index) => scenario.with_bonus_member(index),
        None => scenario,
    }
}

fn build_request(args: &Args, rules: RewardRules) -> HarnessRequest {
    HarnessRequest {
        scenario: build_scenario(args),
        rules,
        days: args.days,
        trials: args.trials,
        seed: args.seed,
        tolerance: args.tolerance,
    }
}

fn write_report(args: &Args, report: &RunReport) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Json => reports::generate_json_report(&mut output_target, report)?,
        ReportFormat::Markdown => {
            reports::generate_markdown_report(&mut output_target, report, args.show_table)?;
        }
        ReportFormat::Console => {
            reports::generate_console_report(&mut output_target, report, args.show_table)?;
        }
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        self.writer().flush()
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            level: 30,
            unit_size: 6,
            invited: false,
            bonus_member: None,
            days: 30,
            trials: 0,
            seed: Some(1337),
            tolerance: 0.02,
            rules: None,
            report: ReportFormat::Json,
            output: None,
            show_table: false,
            verbose: false,
        }
    }

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("memoria-main-{label}-{}", std::process::id()))
    }

    #[test]
    fn clap_defaults_match_documented_values() {
        let args = Args::try_parse_from(["memoria-cli"]).unwrap();
        assert_eq!(args.level, 30);
        assert_eq!(args.unit_size, 6);
        assert_eq!(args.days, 30);
        assert_eq!(args.trials, 1000);
        assert!((args.tolerance - 0.02).abs() < f64::EPSILON);
        assert_eq!(args.report, ReportFormat::Console);
        assert!(args.seed.is_none());
    }

    #[test]
    fn bonus_member_implies_invited() {
        let args = Args {
            bonus_member: Some(3),
            ..base_args()
        };
        let scenario = build_scenario(&args);
        assert!(scenario.invited());
        assert_eq!(scenario.bonus_member, Some(3));

        let invited = Args {
            invited: true,
            ..base_args()
        };
        assert_eq!(build_scenario(&invited).bonus_member, Some(0));
        assert!(!build_scenario(&base_args()).invited());
    }

    #[test]
    fn rules_file_overrides_defaults() {
        let path = temp_path("rules.json");
        std::fs::write(&path, r#"{"sessions_per_day": 3}"#).unwrap();
        let rules = load_rules(Some(&path)).unwrap();
        assert_eq!(rules.sessions_per_day, 3);
        assert_eq!(rules.bonus_units, 2);
        assert_eq!(load_rules(None).unwrap(), RewardRules::default());
    }

    #[test]
    fn out_of_range_rules_are_rejected() {
        let path = temp_path("bad-rules.json");
        std::fs::write(&path, r#"{"sessions_per_day": 0}"#).unwrap();
        let err = load_rules(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("sessions_per_day"));
        assert!(load_rules(Some(Path::new("/nonexistent/rules.json"))).is_err());
    }

    #[test]
    fn run_reports_library_and_config_errors() {
        let path = temp_path("run-bad-rules.json");
        std::fs::write(&path, r#"{"bonus_units": 500}"#).unwrap();
        let args = Args {
            rules: Some(path),
            ..base_args()
        };
        assert!(run(&args).is_err());

        let args = Args {
            level: 0,
            ..base_args()
        };
        let err = run(&args).unwrap_err();
        assert!(format!("{err:#}").contains("gate level 0"));
    }

    #[test]
    fn run_passes_without_simulation() {
        let args = Args {
            output: Some(temp_path("run-ok.json")),
            ..base_args()
        };
        assert!(run(&args).unwrap());
    }

    #[test]
    fn write_report_emits_json_to_file() {
        let path = temp_path("report.json");
        let args = Args {
            output: Some(path.clone()),
            ..base_args()
        };
        let report = run_harness(&build_request(&args, RewardRules::default())).unwrap();
        write_report(&args, &report).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("\"total\""));
        assert!(content.contains("\"simulation\": null"));
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }
}
