use crate::logic::game_tester::SimulationPlan;

pub mod catalog;

/// Named simulation plan runnable by the logic tester.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

/// Keys `all` expands to, in run order.
pub const ALL_SCENARIOS: &[&str] = &[
    "smoke",
    "survive-night",
    "unblocked-breach",
    "lure-redirect",
    "night-reset",
    "deterministic-replay",
    "autopilot",
];

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let scenario = match name.to_lowercase().as_str() {
        "smoke" => TestScenario::simulation("Smoke Test", catalog::smoke_plan()),
        "survive-night" | "survive" => {
            TestScenario::simulation("Survive Night", catalog::survive_night_plan())
        }
        "unblocked-breach" | "breach" => {
            TestScenario::simulation("Unblocked Breach", catalog::unblocked_breach_plan())
        }
        "lure-redirect" | "lure" => {
            TestScenario::simulation("Lure Redirect", catalog::lure_redirect_plan())
        }
        "night-reset" | "reset" => {
            TestScenario::simulation("Night Reset", catalog::night_reset_plan())
        }
        "deterministic-replay" | "deterministic" => TestScenario::simulation(
            "Deterministic Replay",
            catalog::deterministic_replay_plan(),
        ),
        "autopilot" => TestScenario::simulation("Guardian Autopilot", catalog::autopilot_plan()),
        _ => return None,
    };
    Some(scenario)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("survive-night", "Survive Night"),
        ("unblocked-breach", "Unblocked Breach"),
        ("lure-redirect", "Lure Redirect"),
        ("night-reset", "Night Reset"),
        ("deterministic-replay", "Deterministic Replay"),
        ("autopilot", "Guardian Autopilot"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_scenario_resolves() {
        for (key, name) in list_scenarios() {
            let scenario = get_scenario(key).unwrap_or_else(|| panic!("missing {key}"));
            assert_eq!(scenario.name, name);
        }
        assert_eq!(ALL_SCENARIOS.len(), list_scenarios().len());
    }

    #[test]
    fn aliases_and_case_are_accepted() {
        assert!(get_scenario("BREACH").is_some());
        assert!(get_scenario("deterministic").is_some());
        assert!(get_scenario("nope").is_none());
    }
}
