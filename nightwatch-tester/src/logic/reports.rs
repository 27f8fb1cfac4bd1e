use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::ScenarioResult;

#[allow(clippy::cast_precision_loss)]
fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Night Test Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "Total runs: {total_tests}")?;
    writeln!(out, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(out, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(
        out,
        "Success rate: {:.1}%",
        percentage(passed_tests, total_tests)
    )?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{} {} (night {}, {})",
            status,
            result.scenario_name.bold(),
            result.night,
            result.replay_code
        )?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(
            out,
            "   Survived: {}/{} (mean power left {:.1})",
            result.nights_survived, result.iterations_run, result.mean_power_remaining
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    let survival = survival_by_night(results);
    if !survival.is_empty() {
        writeln!(out, "{}", "🌙 Survival by Night".bright_yellow().bold())?;
        writeln!(out, "{}", "===================".yellow())?;
        for (night, survived, total) in survival {
            writeln!(
                out,
                "Night {night}: {survived}/{total} ({:.1}%)",
                percentage(survived, total)
            )?;
        }
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    writeln!(out, "# Nightwatch Night Test Results\n")?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total runs**: {total_tests}")?;
    writeln!(out, "- **Passed**: {passed_tests}")?;
    writeln!(out, "- **Failed**: {}", total_tests - passed_tests)?;
    writeln!(
        out,
        "- **Success rate**: {:.1}%\n",
        percentage(passed_tests, total_tests)
    )?;

    writeln!(out, "## Survival\n")?;
    writeln!(out, "| Night | Survived | Runs |")?;
    writeln!(out, "|------:|---------:|-----:|")?;
    for (night, survived, total) in survival_by_night(results) {
        writeln!(out, "| {night} | {survived} | {total} |")?;
    }
    writeln!(out)?;

    writeln!(out, "## Detailed Results\n")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(
            out,
            "### {} {} (night {}, `{}`)\n",
            status, result.scenario_name, result.night, result.replay_code
        )?;
        writeln!(
            out,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- **Average time**: {:?}", result.average_duration)?;
        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// `(night, survived, runs)` in night order.
fn survival_by_night(results: &[ScenarioResult]) -> Vec<(u8, usize, usize)> {
    let mut rows: Vec<(u8, usize, usize)> = Vec::new();
    for result in results {
        match rows.iter_mut().find(|(night, _, _)| *night == result.night) {
            Some(row) => {
                row.1 += result.nights_survived;
                row.2 += result.iterations_run;
            }
            None => rows.push((result.night, result.nights_survived, result.iterations_run)),
        }
    }
    rows.sort_by_key(|(night, _, _)| *night);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(night: u8, passed: bool, survived: usize) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "Survive Night".into(),
            night,
            seed: 1,
            replay_code: format!("N{night}-ECHO01"),
            passed,
            iterations_run: 2,
            successful_iterations: if passed { 2 } else { 1 },
            nights_survived: survived,
            mean_power_remaining: 12.5,
            failures: if passed {
                Vec::new()
            } else {
                vec!["killed by crawler".into()]
            },
            average_duration: Duration::from_millis(3),
            reports: Vec::new(),
        }
    }

    #[test]
    fn markdown_lists_survival_per_night() {
        let mut buf = Vec::new();
        generate_markdown_report(&mut buf, &[result(2, true, 2), result(1, false, 1)]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("# Nightwatch Night Test Results"));
        assert!(text.contains("| 1 | 1 | 2 |"));
        assert!(text.contains("| 2 | 2 | 2 |"));
        assert!(text.contains("killed by crawler"));
    }

    #[test]
    fn json_report_is_an_array() {
        let mut buf = Vec::new();
        generate_json_report(&mut buf, &[result(1, true, 2)]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(1));
        assert_eq!(value[0]["replay_code"], "N1-ECHO01");
    }

    #[test]
    fn console_report_handles_empty_results() {
        let mut buf = Vec::new();
        generate_console_report(&mut buf, &[], Duration::ZERO).unwrap();
        let text = String::from_utf8_lossy(&buf);
        assert!(text.contains("Total runs: 0"));
    }
}
