use colored::Colorize;
use nightwatch_game::NightReport;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::common::scenario::TestScenario;
use crate::logic::game_tester::{GameTester, SimulationPlan, SimulationSummary};
use crate::logic::seeds::SeedInfo;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub night: u8,
    pub seed: u64,
    pub replay_code: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub nights_survived: usize,
    pub mean_power_remaining: f32,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(skip)]
    pub reports: Vec<NightReport>,
}

pub struct LogicTester {
    tester: GameTester,
}

impl LogicTester {
    pub const fn new(tester: GameTester) -> Self {
        Self { tester }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[SeedInfo],
        nights: &[u8],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &night in nights {
            for seed in seeds.iter().filter(|s| s.matches_night(night)) {
                if self.tester.verbose() {
                    println!(
                        "🧪 Testing scenario: {} (night {} seed {} strategy {})",
                        scenario.name.bright_white(),
                        night,
                        seed.seed,
                        scenario.plan.strategy
                    );
                }
                results.push(self.run_single_scenario(scenario, night, seed, iterations));
            }
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        night: u8,
        seed: &SeedInfo,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut durations = Vec::new();
        let mut reports = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed
                .seed
                .wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let summary = match self.tester.run_plan(&scenario.plan, night, iteration_seed) {
                Ok(summary) => summary,
                Err(err) => {
                    failures.push(format!("Iteration {} (seed {iteration_seed}): {err:#}", i + 1));
                    continue;
                }
            };
            durations.push(start_time.elapsed());
            if let Some(report) = &summary.report {
                reports.push(report.clone());
            }

            if let Some(err) = evaluate_expectations(&scenario.plan, &summary) {
                failures.push(format!(
                    "Iteration {} (night {}, seed {}, strategy {}, frames {}, ending '{}'): {} | power {:.1} breaches {} commands {}",
                    i + 1,
                    summary.night,
                    summary.seed,
                    summary.strategy,
                    summary.frames,
                    summary.ending_message(),
                    err,
                    summary.final_state.power,
                    summary.breaches_opened,
                    summary.commands_applied
                ));
                if self.tester.verbose() {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.red()
                    );
                }
            } else {
                successes += 1;
                if self.tester.verbose() {
                    println!(
                        "  ✅ Iteration {}/{} passed ({:?}) ending:{} breaches:{}",
                        i + 1,
                        iterations,
                        start_time.elapsed(),
                        summary.ending_message(),
                        summary.breaches_opened
                    );
                }
            }
        }

        let average_duration = if durations.is_empty() {
            Duration::ZERO
        } else {
            durations.iter().sum::<Duration>() / u32::try_from(durations.len()).unwrap_or(1)
        };
        let survived: Vec<&NightReport> =
            reports.iter().filter(|r| r.outcome.is_victory()).collect();
        let mean_power_remaining = if survived.is_empty() {
            0.0
        } else {
            let total: f32 = survived.iter().map(|r| r.power_remaining).sum();
            #[allow(clippy::cast_precision_loss)]
            let count = survived.len() as f32;
            total / count
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            night,
            seed: seed.seed,
            replay_code: seed.replay_code_for_night(night),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            nights_survived: survived.len(),
            mean_power_remaining,
            failures,
            average_duration,
            reports,
        }
    }
}

fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> Option<String> {
    for expectation in &plan.expectations {
        if let Err(err) = expectation.evaluate(summary) {
            return Some(err.to_string());
        }
    }
    None
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::scenario::get_scenario;

    #[test]
    fn smoke_scenario_passes_for_each_night() {
        let tester = GameTester::try_new(false).unwrap();
        let logic = LogicTester::new(tester);
        let scenario = get_scenario("smoke").unwrap();
        let results = logic.run_scenario(&scenario, &[SeedInfo::from_numeric(3)], &[1, 2], 2);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.passed), "{results:?}");
        assert!(results.iter().all(|r| r.successful_iterations == 2));
        assert_eq!(results[1].night, 2);
    }

    #[test]
    fn replay_codes_only_run_on_their_night() {
        let tester = GameTester::try_new(false).unwrap();
        let logic = LogicTester::new(tester);
        let scenario = get_scenario("smoke").unwrap();
        let seed = SeedInfo::from_replay_code(99, 2, "N2-CODE01".into());
        let results = logic.run_scenario(&scenario, &[seed], &[1, 2, 3], 1);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].replay_code, "N2-CODE01");
    }

    #[test]
    fn result_serializes_without_reports() {
        let result = ScenarioResult {
            scenario_name: "Smoke".into(),
            night: 1,
            seed: 1,
            replay_code: "N1-X00".into(),
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            nights_survived: 0,
            mean_power_remaining: 0.0,
            failures: Vec::new(),
            average_duration: Duration::from_millis(12),
            reports: Vec::new(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_duration"], 12);
        assert!(json.get("reports").is_none());
    }
}
