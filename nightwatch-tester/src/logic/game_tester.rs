use anyhow::Result;
use nightwatch_game::constants::MAX_NIGHT;
use nightwatch_game::{
    GamePhase, GameState, NightOutcome, NightReport, NightSession, Notification, World,
};
use std::sync::Arc;

use super::policy::OperatorStrategy;

/// Frame delta the tester drives every session with.
pub const FRAME_DT: f64 = 1.0 / 60.0;
/// Frames between digest samples.
const DIGEST_EVERY: u64 = 60;

#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: OperatorStrategy,
    /// Simulated seconds to run; `None` runs until the night ends.
    pub max_secs: Option<f64>,
    pub setup: Option<fn(&mut GameState, &World)>,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(strategy: OperatorStrategy) -> Self {
        Self {
            strategy,
            max_secs: None,
            setup: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_max_secs(mut self, max_secs: f64) -> Self {
        self.max_secs = Some(max_secs);
        self
    }

    #[must_use]
    pub fn with_setup(mut self, setup: fn(&mut GameState, &World)) -> Self {
        self.setup = Some(setup);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Complete record of a simulated night.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub night: u8,
    pub strategy: OperatorStrategy,
    pub frames: u64,
    pub commands_applied: u32,
    pub breaches_opened: u32,
    /// State digests sampled once per simulated second.
    pub digests: Vec<u64>,
    pub report: Option<NightReport>,
    pub final_state: GameState,
    pub world: Arc<World>,
    pub game_ended: bool,
}

impl SimulationSummary {
    #[must_use]
    pub fn outcome(&self) -> Option<&NightOutcome> {
        self.report.as_ref().map(|r| &r.outcome)
    }

    #[must_use]
    pub fn survived(&self) -> bool {
        self.final_state.phase == GamePhase::Victory
    }

    #[must_use]
    pub fn ending_message(&self) -> String {
        self.outcome()
            .map_or_else(|| "still playing".to_string(), ToString::to_string)
    }
}

/// Headless deterministic runner for the night engine.
#[derive(Clone)]
pub struct GameTester {
    verbose: bool,
    world: Arc<World>,
}

impl GameTester {
    pub const fn new(world: Arc<World>, verbose: bool) -> Self {
        Self { verbose, world }
    }

    /// Tester over the embedded data set.
    pub fn try_new(verbose: bool) -> Result<Self> {
        Ok(Self::new(Arc::new(World::load_from_static()?), verbose))
    }

    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// Play `night` with `seed` under `plan`.
    pub fn run_plan(
        &self,
        plan: &SimulationPlan,
        night: u8,
        seed: u64,
    ) -> Result<SimulationSummary> {
        let mut session = NightSession::new(Arc::clone(&self.world), (1..=MAX_NIGHT).collect());
        if let Some(rejection) = session.start_night(night, seed).rejection() {
            anyhow::bail!("night {night} could not start: {rejection}");
        }
        if let Some(setup) = plan.setup {
            let world = Arc::clone(&self.world);
            session.with_state_mut(|state| setup(state, &world));
        }
        if self.verbose {
            log::info!(
                "night {night} seed {seed}: {} subjects, strategy {}",
                session.state().subjects.len(),
                plan.strategy
            );
        }

        let limit = plan
            .max_secs
            .unwrap_or(self.world.tuning.night_duration_secs + 1.0);
        let mut policy = plan.strategy.create_policy();
        log::debug!("operator policy: {}", policy.name());
        let mut frames = 0_u64;
        let mut commands_applied = 0_u32;
        let mut breaches_opened = 0_u32;
        let mut digests = vec![session.state().digest()];
        let mut report = None;

        while session.state().is_playing() && simulated_secs(frames) < limit {
            let notifications = session.tick(FRAME_DT);
            frames += 1;
            for n in &notifications {
                match n {
                    Notification::BreachOpened { .. } => breaches_opened += 1,
                    Notification::NightComplete { report: r }
                    | Notification::NightLost { report: r } => report = Some(r.clone()),
                    _ => {}
                }
            }
            commands_applied += policy.act(&mut session);
            if frames % DIGEST_EVERY == 0 {
                digests.push(session.state().digest());
            }
        }

        let final_state = session.into_state();
        let game_ended = final_state.phase.is_terminal();
        if self.verbose {
            log::info!(
                "night {night} seed {seed} finished after {frames} frames: {}",
                report
                    .as_ref()
                    .map_or_else(|| "still playing".to_string(), |r| r.outcome.to_string())
            );
        }
        Ok(SimulationSummary {
            seed,
            night,
            strategy: plan.strategy,
            frames,
            commands_applied,
            breaches_opened,
            digests,
            report,
            final_state,
            world: Arc::clone(&self.world),
            game_ended,
        })
    }
}

fn simulated_secs(frames: u64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let frames = frames as f64;
    frames * FRAME_DT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_plan_leaves_the_night_untouched() {
        let tester = GameTester::try_new(false).unwrap();
        let plan = SimulationPlan::new(OperatorStrategy::Idle).with_max_secs(0.0);
        let summary = tester.run_plan(&plan, 1, 5).unwrap();
        assert_eq!(summary.frames, 0);
        assert!(!summary.game_ended);
        assert_eq!(summary.final_state.phase, GamePhase::Playing);
        assert_eq!(summary.digests.len(), 1);
    }

    #[test]
    fn setup_hook_runs_before_the_first_frame() {
        fn drain(state: &mut GameState, _world: &World) {
            state.power = 5.0;
        }
        let tester = GameTester::try_new(false).unwrap();
        let plan = SimulationPlan::new(OperatorStrategy::Idle)
            .with_max_secs(0.0)
            .with_setup(drain);
        let summary = tester.run_plan(&plan, 1, 5).unwrap();
        assert!((summary.final_state.power - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn invalid_night_is_an_error() {
        let tester = GameTester::try_new(false).unwrap();
        let plan = SimulationPlan::new(OperatorStrategy::Idle);
        assert!(tester.run_plan(&plan, MAX_NIGHT + 1, 5).is_err());
    }

    #[test]
    fn guardian_survives_the_first_night() {
        let tester = GameTester::try_new(false).unwrap();
        let plan = SimulationPlan::new(OperatorStrategy::Guardian);
        let summary = tester.run_plan(&plan, 1, 1337).unwrap();
        assert!(summary.survived(), "{}", summary.ending_message());
        assert!(summary.report.is_some());
    }
}
