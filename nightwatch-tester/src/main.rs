mod common;
mod logic;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use common::scenario::{ALL_SCENARIOS, get_scenario, list_scenarios};
use common::split_csv;
use logic::{
    FileProgressStore, GameTester, LogicTester, ScenarioResult, resolve_nights,
    resolve_seed_inputs,
};
use nightwatch_game::{NightEngine, StaticDataLoader};

#[derive(Debug, Parser)]
#[command(name = "nightwatch-tester", version)]
#[command(about = "Headless QA runs for Nightwatch - scripted operators over seeded nights")]
struct Args {
    /// Scenarios to run (comma-separated, `all` for every scenario)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds or replay codes to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Nights to play (comma-separated, `all` for every night)
    #[arg(long, default_value = "1")]
    nights: String,

    /// Number of iterations per scenario, night and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Progress file that finished nights are recorded into
    #[arg(long)]
    progress: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios);
    let seed_infos = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let nights = resolve_nights(&split_csv(&args.nights))?;
    let game_tester = GameTester::try_new(args.verbose)?;

    let logic_tester = LogicTester::new(game_tester);
    let mut results: Vec<ScenarioResult> = Vec::new();
    for scenario_name in &scenarios {
        match get_scenario(scenario_name) {
            Some(scenario) => results.extend(logic_tester.run_scenario(
                &scenario,
                &seed_infos,
                &nights,
                args.iterations,
            )),
            None => eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow()),
        }
    }

    if let Some(path) = &args.progress {
        record_progress(path, &results)?;
    }

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🌙 Nightwatch Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s.eq_ignore_ascii_case("all")) {
        scenarios.retain(|s| !s.eq_ignore_ascii_case("all"));
        for key in ALL_SCENARIOS {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push((*key).to_string());
            }
        }
    }
    scenarios
}

/// Fold every finished night into the progress file, in run order.
fn record_progress(path: &Path, results: &[ScenarioResult]) -> Result<()> {
    let engine = NightEngine::new(StaticDataLoader, FileProgressStore::new(path));
    let mut recorded = 0_usize;
    for report in results.iter().flat_map(|r| r.reports.iter()) {
        let delta = engine.record_report(report).with_context(|| {
            format!("recording night {} into {}", report.night, path.display())
        })?;
        if let Some(night) = delta.night_unlocked {
            println!("🔓 Night {night} unlocked");
        }
        for lore in &delta.lore_unlocked {
            println!("📜 Lore unlocked: {lore}");
        }
        recorded += 1;
    }
    log::info!("recorded {recorded} night reports into {}", path.display());
    Ok(())
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Nightwatch Night Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
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
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
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
    use nightwatch_game::{NightOutcome, NightReport, NightStats, ProgressStorage};
    use std::time::Duration;

    fn base_args() -> Args {
        Args {
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            nights: "1".to_string(),
            iterations: 1,
            report: "json".to_string(),
            verbose: false,
            output: None,
            progress: None,
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "nightwatch-main-{}-{name}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "Smoke Test".to_string(),
            night: 1,
            seed: 1337,
            replay_code: "N1-TEST01".to_string(),
            passed,
            iterations_run: 1,
            successful_iterations: usize::from(passed),
            nights_survived: 1,
            mean_power_remaining: 44.0,
            failures: Vec::new(),
            average_duration: Duration::from_millis(5),
            reports: vec![NightReport {
                night: 1,
                seed: 1337,
                outcome: NightOutcome::Survived,
                power_remaining: 44.0,
                elapsed_secs: 360.0,
                stats: NightStats::default(),
            }],
        }
    }

    #[test]
    fn args_parse_defaults() {
        let args = Args::parse_from(["nightwatch-tester"]);
        assert_eq!(args.scenarios, "smoke");
        assert_eq!(args.nights, "1");
        assert_eq!(args.iterations, 10);
        assert_eq!(args.report, "console");
        assert!(args.progress.is_none());
    }

    #[test]
    fn args_reject_unknown_report_format() {
        assert!(Args::try_parse_from(["nightwatch-tester", "--report", "csv"]).is_err());
    }

    #[test]
    fn expand_scenarios_replaces_all_without_duplicates() {
        let scenarios = expand_scenarios("smoke,all");
        assert_eq!(scenarios.len(), ALL_SCENARIOS.len());
        assert_eq!(scenarios[0], "smoke");
        assert!(scenarios.iter().any(|s| s == "autopilot"));
    }

    #[test]
    fn maybe_list_scenarios_writes_output() {
        let temp = temp_path("scenarios.txt");
        let args = Args {
            list_scenarios: true,
            output: Some(temp.clone()),
            ..base_args()
        };
        assert!(maybe_list_scenarios(&args).unwrap());
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("Available scenarios"));
        assert!(content.contains("deterministic-replay"));
    }

    #[test]
    fn maybe_list_scenarios_returns_false_when_disabled() {
        assert!(!maybe_list_scenarios(&base_args()).unwrap());
    }

    #[test]
    fn write_reports_emits_empty_json() {
        let temp = temp_path("report.json");
        let args = Args {
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert_eq!(content.trim(), "[]");
    }

    #[test]
    fn write_reports_emits_markdown_report() {
        let temp = temp_path("report.md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(true)], Instant::now()).unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("# Nightwatch Night Test Results"));
        assert!(content.contains("Smoke Test"));
    }

    #[test]
    fn record_progress_unlocks_the_next_night() {
        let path = temp_path("progress.json");
        record_progress(&path, &[sample_result(true)]).unwrap();
        let saved = FileProgressStore::new(&path)
            .load_progress()
            .unwrap()
            .unwrap();
        assert!(saved.is_unlocked(2));
    }
}
