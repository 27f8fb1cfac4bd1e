use anyhow::{Context, Result, anyhow, ensure};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::logic::game_tester::{GameTester, SimulationPlan, SimulationSummary};
use crate::logic::policy::OperatorStrategy;
use nightwatch_game::constants::MAX_NIGHT;
use nightwatch_game::{
    Direction, GamePhase, GameState, NightOutcome, NightSession, World, commands,
    parse_replay_code, replay_code, run_ai_tick,
};

/// Simulated seconds the replay check compares.
const REPLAY_SECS: f64 = 60.0;

pub fn smoke_plan() -> SimulationPlan {
    SimulationPlan::new(OperatorStrategy::Idle)
        .with_max_secs(0.0)
        .with_expectation(fresh_night_expectation)
}

pub fn survive_night_plan() -> SimulationPlan {
    SimulationPlan::new(OperatorStrategy::Guardian).with_expectation(survival_expectation)
}

pub fn unblocked_breach_plan() -> SimulationPlan {
    SimulationPlan::new(OperatorStrategy::Idle)
        .with_max_secs(30.0)
        .with_setup(crawler_at_the_west_door)
        .with_expectation(killed_expectation)
}

pub fn lure_redirect_plan() -> SimulationPlan {
    SimulationPlan::new(OperatorStrategy::Idle)
        .with_max_secs(0.0)
        .with_expectation(lure_redirect_expectation)
}

pub fn night_reset_plan() -> SimulationPlan {
    SimulationPlan::new(OperatorStrategy::Idle)
        .with_max_secs(0.0)
        .with_expectation(night_reset_expectation)
}

pub fn deterministic_replay_plan() -> SimulationPlan {
    SimulationPlan::new(OperatorStrategy::Guardian)
        .with_max_secs(REPLAY_SECS)
        .with_expectation(replay_expectation)
}

pub fn autopilot_plan() -> SimulationPlan {
    SimulationPlan::new(OperatorStrategy::Guardian).with_expectation(autopilot_expectation)
}

fn fresh_night_expectation(summary: &SimulationSummary) -> Result<()> {
    let state = &summary.final_state;
    ensure!(state.phase == GamePhase::Playing, "night should be running");
    ensure!(state.night == summary.night, "wrong night {}", state.night);
    ensure!(
        (state.power - 100.0).abs() < f32::EPSILON,
        "night should start at full power, got {:.1}",
        state.power
    );
    ensure!(state.cameras.all_online(), "every camera should be online");
    ensure!(!state.subjects.is_empty(), "night has no subjects");
    ensure!(state.lures.is_empty(), "no lures at dawn of the night");
    ensure!(!state.breach.is_active(), "no breach before the first tick");
    let expected = summary.world.roster.active_on(summary.night).count();
    ensure!(
        state.subjects.len() == expected,
        "expected {expected} subjects, got {}",
        state.subjects.len()
    );
    Ok(())
}

fn survival_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.survived(),
        "guardian should reach dawn, ended: {}",
        summary.ending_message()
    );
    ensure!(
        matches!(summary.outcome(), Some(NightOutcome::Survived)),
        "victory must produce a survived report"
    );
    let next = summary.night.saturating_add(1);
    if next <= MAX_NIGHT {
        ensure!(
            summary.final_state.unlocked_nights.contains(&next),
            "night {next} should unlock"
        );
    }
    Ok(())
}

fn crawler_at_the_west_door(state: &mut GameState, world: &World) {
    let (Some(crawler), Some(west)) = (
        state.subject_by_archetype("crawler"),
        world.facility.room_index("west_hall"),
    ) else {
        return;
    };
    state.subjects[crawler].room = west;
    state.subjects[crawler].target = None;
    state.clock_secs = 30.0;
}

fn killed_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.final_state.phase == GamePhase::GameOver,
        "unattended breach should end the night, ended: {}",
        summary.ending_message()
    );
    ensure!(summary.breaches_opened >= 1, "no breach was opened");
    match summary.outcome() {
        Some(NightOutcome::Killed { by }) => {
            ensure!(
                summary.final_state.killed_by.as_deref() == Some(by.as_str()),
                "report and state disagree on the killer"
            );
            Ok(())
        }
        other => Err(anyhow!("expected a killed report, got {other:?}")),
    }
}

fn lure_redirect_expectation(summary: &SimulationSummary) -> Result<()> {
    let mut world = World::clone(&summary.world);
    for archetype in &mut world.roster.subjects {
        archetype.lure_susceptibility = 1.0;
    }
    let facility = &world.facility;
    let atrium = facility.room_index("atrium").context("facility has no atrium")?;
    let archive = facility.room_index("archive").context("facility has no archive")?;
    let control = facility.control_room();

    let mut state = GameState::for_night(
        &world,
        summary.night,
        summary.seed,
        BTreeSet::from([summary.night]),
    );
    let crawler = state
        .subject_by_archetype("crawler")
        .context("crawler is not on shift")?;
    state.subjects[crawler].room = atrium;
    state.clock_secs = 60.0;

    let to_lure = facility.distance(atrium, archive).context("archive unreachable")?;
    let to_control = facility.distance(atrium, control).context("control unreachable")?;
    let placed = commands::place_lure(&world, &mut state, "archive");
    ensure!(placed.is_applied(), "lure rejected: {:?}", placed.rejection());
    run_ai_tick(&world, &mut state);

    let now_at = state.subjects[crawler].room;
    let lure_gap = facility.distance(now_at, archive).context("lost the crawler")?;
    let control_gap = facility.distance(now_at, control).context("lost the crawler")?;
    ensure!(
        lure_gap < to_lure,
        "crawler should close in on the lure ({lure_gap} >= {to_lure})"
    );
    ensure!(
        control_gap >= to_control,
        "crawler should not gain on control ({control_gap} < {to_control})"
    );
    Ok(())
}

fn night_reset_expectation(summary: &SimulationSummary) -> Result<()> {
    let night = summary.night;
    let next = if night >= MAX_NIGHT { 1 } else { night + 1 };
    let mut session = NightSession::new(Arc::clone(&summary.world), (1..=MAX_NIGHT).collect());
    ensure!(
        session.start_night(night, summary.seed).is_applied(),
        "night {night} could not start"
    );

    let lab_a = summary
        .world
        .facility
        .room_index("lab_a")
        .context("facility has no lab_a")?;
    session.with_state_mut(|state| {
        state.clock_secs = 40.0;
        state.power = 12.0;
        state.cameras.sabotage(lab_a);
    });
    session.place_lure("archive");
    session.block_door(Direction::Front);
    session.tick(1.0);
    ensure!(
        session.end_game(false, Some("crawler")).is_applied(),
        "could not end the night"
    );

    let restart = session.start_night(next, summary.seed.wrapping_add(1));
    ensure!(restart.is_applied(), "restart rejected: {:?}", restart.rejection());
    let state = session.state();
    ensure!((state.power - 100.0).abs() < f32::EPSILON, "power carried over");
    ensure!(state.cameras.all_online(), "sabotage carried over");
    ensure!(state.lures.is_empty(), "lures carried over");
    ensure!(state.blocked_door.is_none(), "door block carried over");
    ensure!(!state.breach.is_active(), "breach carried over");
    ensure!(state.killed_by.is_none(), "killer carried over");
    ensure!(state.cooldowns.all_clear(state.clock_secs), "cooldowns carried over");
    ensure!(state.stats == Default::default(), "stats carried over");
    Ok(())
}

fn replay_expectation(summary: &SimulationSummary) -> Result<()> {
    let code = replay_code(summary.night, summary.seed);
    let (night, seed) = parse_replay_code(&code).context("replay code did not decode")?;
    ensure!(night == summary.night, "replay code lost the night");

    let tester = GameTester::new(Arc::clone(&summary.world), false);
    let plan = SimulationPlan::new(summary.strategy).with_max_secs(REPLAY_SECS);
    let replay = tester.run_plan(&plan, night, seed)?;
    let again = tester.run_plan(&plan, night, seed)?;
    ensure!(
        replay.digests == again.digests,
        "replaying {code} twice diverged"
    );
    if seed == summary.seed {
        ensure!(
            replay.digests == summary.digests,
            "replay of {code} diverged from the original run"
        );
    }
    Ok(())
}

fn autopilot_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.game_ended, "night did not finish");
    let report = summary.report.as_ref().context("finished night without a report")?;
    ensure!(report.night == summary.night, "report for the wrong night");
    ensure!(
        (0.0..=100.0).contains(&report.power_remaining),
        "power out of range: {}",
        report.power_remaining
    );
    ensure!(
        summary.final_state.report.as_ref() == Some(report),
        "state and notification reports differ"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tester() -> GameTester {
        GameTester::try_new(false).unwrap()
    }

    #[test]
    fn smoke_holds_on_every_night() {
        let tester = tester();
        let plan = smoke_plan();
        for night in 1..=MAX_NIGHT {
            let summary = tester.run_plan(&plan, night, 77).unwrap();
            for expectation in &plan.expectations {
                expectation.evaluate(&summary).unwrap();
            }
        }
    }

    #[test]
    fn crawler_left_alone_kills_the_operator() {
        let tester = tester();
        let plan = unblocked_breach_plan();
        let summary = tester.run_plan(&plan, 1, 3).unwrap();
        assert_eq!(summary.final_state.phase, GamePhase::GameOver);
        assert!(summary.breaches_opened >= 1);
    }

    #[test]
    fn reset_and_replay_checks_pass_on_the_first_night() {
        let tester = tester();
        for plan in [night_reset_plan(), deterministic_replay_plan()] {
            let summary = tester.run_plan(&plan, 1, 21).unwrap();
            for expectation in &plan.expectations {
                expectation.evaluate(&summary).unwrap();
            }
        }
    }
}
