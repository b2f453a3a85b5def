use std::time::Duration;

use reflex_rush_catalog::LevelCatalog;
use reflex_rush_core::{Command, LevelDescriptor, LevelNumber, RedStrategy, RedWindow};
use reflex_rush_engine::{self as engine, query, Config, Engine, MIN_FRAME_STEP};
use reflex_rush_system_scheduling::{Placement, ScriptedUnits, UnitSource};

const FRAME: Duration = Duration::from_millis(100);

fn standard_engine() -> Engine {
    Engine::new(LevelCatalog::standard(), Config::new().with_seed(Some(7)))
}

fn scripted_engine(levels: Vec<LevelDescriptor>, samples: Vec<f64>) -> Engine<ScriptedUnits> {
    let catalog = LevelCatalog::new(levels).expect("valid catalog");
    Engine::with_source(catalog, Config::new(), ScriptedUnits::new(samples))
}

fn level(number: u32, required: u32, seconds: u64, strategy: RedStrategy) -> LevelDescriptor {
    LevelDescriptor::new(
        LevelNumber::new(number),
        required,
        Duration::from_secs(seconds),
        strategy,
    )
}

fn advance_frames<S: UnitSource>(engine: &mut Engine<S>, frames: u32) {
    for _ in 0..frames {
        engine.advance(FRAME);
    }
}

#[test]
fn idle_engine_ignores_input() {
    let mut engine = standard_engine();
    let before = query::snapshot(&engine);

    engine.press();
    engine.advance(Duration::from_secs(1));

    assert_eq!(query::snapshot(&engine), before);
    assert!(!query::is_running(&engine));
    assert_eq!(query::elapsed(&engine), Duration::ZERO);
}

#[test]
fn start_initializes_the_first_level() {
    let mut engine = standard_engine();
    engine.start(None);

    let snapshot = query::snapshot(&engine);
    assert_eq!(snapshot.level, LevelNumber::FIRST);
    assert_eq!(snapshot.progress, 0);
    assert_eq!(snapshot.time_left, Duration::from_secs(15));
    assert_eq!(snapshot.score, 0);
    assert_eq!(snapshot.successful_presses, 0);
    assert!(!snapshot.is_red && !snapshot.is_over && !snapshot.is_won);
    assert!(query::is_running(&engine));
    assert_eq!(query::level_descriptor(&engine).required_progress(), 100);
}

#[test]
fn start_clamps_requested_levels() {
    let mut engine = standard_engine();

    engine.start(Some(LevelNumber::new(0)));
    assert_eq!(query::snapshot(&engine).level, LevelNumber::FIRST);

    engine.start(Some(LevelNumber::new(99)));
    assert_eq!(query::snapshot(&engine).level, LevelNumber::new(10));
    assert_eq!(query::level_descriptor(&engine).required_progress(), 300);
}

#[test]
fn configured_start_level_applies_without_explicit_level() {
    let config = Config::new()
        .with_seed(Some(1))
        .with_start_level(Some(LevelNumber::new(5)));
    let mut engine = Engine::new(LevelCatalog::standard(), config);

    engine.start(None);
    assert_eq!(query::snapshot(&engine).level, LevelNumber::new(5));
    assert_eq!(query::schedule(&engine).len(), 1);

    engine.start(Some(LevelNumber::new(2)));
    assert_eq!(query::snapshot(&engine).level, LevelNumber::new(2));
    assert!(query::schedule(&engine).is_empty());
}

#[test]
fn time_runs_down_to_zero_then_the_session_is_over() {
    let mut engine = standard_engine();
    engine.start(None);

    let mut previous = query::snapshot(&engine).time_left;
    for step in 1..=100 {
        engine.advance(Duration::from_millis(150));
        let snapshot = query::snapshot(&engine);
        assert!(snapshot.time_left < previous, "step {step} did not count down");
        if step < 100 {
            assert!(!snapshot.is_over, "over too early at step {step}");
        }
        previous = snapshot.time_left;
    }

    let snapshot = query::snapshot(&engine);
    assert_eq!(snapshot.time_left, Duration::ZERO);
    assert!(snapshot.is_over);
    assert!(!snapshot.is_won);

    engine.advance(FRAME);
    engine.press();
    assert_eq!(query::snapshot(&engine), snapshot, "terminal session is frozen");
}

#[test]
fn large_frame_steps_are_clamped() {
    let mut engine = standard_engine();
    engine.start(None);

    engine.advance(Duration::from_secs(60));
    assert_eq!(
        query::snapshot(&engine).time_left,
        Duration::from_millis(14_800)
    );

    let config = Config::new()
        .with_seed(Some(3))
        .with_max_frame_step(Duration::from_secs(1));
    let mut engine = Engine::new(LevelCatalog::standard(), config);
    engine.start(None);
    engine.advance(Duration::from_secs(60));
    assert_eq!(query::snapshot(&engine).time_left, Duration::from_secs(14));
}

#[test]
fn green_presses_add_two_progress() {
    let mut engine = standard_engine();
    engine.start(None);

    for expected in 1..=10 {
        engine.press();
        let snapshot = query::snapshot(&engine);
        assert_eq!(snapshot.progress, expected * 2);
        assert_eq!(snapshot.successful_presses, expected);
        assert_eq!(snapshot.score, 0);
        assert_eq!(snapshot.level, LevelNumber::FIRST);
    }
}

#[test]
fn clearing_the_first_level_moves_to_the_second() {
    let mut engine = standard_engine();
    engine.start(None);
    advance_frames(&mut engine, 30);

    for _ in 0..49 {
        engine.press();
    }
    let before = query::snapshot(&engine);
    assert_eq!(before.progress, 98);
    assert_eq!(before.successful_presses, 49);

    engine.press();

    let after = query::snapshot(&engine);
    assert_eq!(after.level, LevelNumber::new(2));
    assert_eq!(after.progress, 0);
    assert_eq!(after.successful_presses, 0);
    assert_eq!(after.time_left, Duration::from_secs(15));
    assert_eq!(after.score, 100 + 49 + 10);
    assert!(!after.is_red && !after.is_over && !after.is_won);
    assert_eq!(query::elapsed(&engine), Duration::ZERO);
}

#[test]
fn fixed_window_turns_red_and_penalizes() {
    let mut engine = standard_engine();
    engine.start(Some(LevelNumber::new(2)));

    for _ in 0..10 {
        engine.press();
    }
    advance_frames(&mut engine, 59);
    assert!(!query::snapshot(&engine).is_red, "still green at 5.9s");

    advance_frames(&mut engine, 6);
    assert_eq!(query::elapsed(&engine), Duration::from_millis(6_500));
    let red = query::snapshot(&engine);
    assert!(red.is_red);
    assert_eq!(red.progress, 20);

    engine.press();
    let penalized = query::snapshot(&engine);
    assert_eq!(penalized.progress, 10);
    assert_eq!(penalized.successful_presses, 10);
    assert_eq!(penalized.score, 0);

    advance_frames(&mut engine, 5);
    assert!(!query::snapshot(&engine).is_red, "window closes at 7s");
}

#[test]
fn penalties_never_drop_progress_below_zero() {
    let mut engine = scripted_engine(
        vec![level(1, 260, 15, RedStrategy::CyclicPredictable)],
        vec![],
    );
    engine.start(None);
    engine.advance(FRAME);
    assert!(query::snapshot(&engine).is_red);

    engine.press();
    assert_eq!(query::snapshot(&engine).progress, 0);
}

#[test]
fn penalty_grows_with_the_level() {
    let levels = (1..=10)
        .map(|number| level(number, 400, 15, RedStrategy::CyclicPredictable))
        .collect();
    let mut engine = scripted_engine(levels, vec![]);
    let expected = [10, 10, 12, 12, 14, 16, 18, 20, 22, 25];

    for (index, penalty) in expected.into_iter().enumerate() {
        engine.start(Some(LevelNumber::new(index as u32 + 1)));
        for _ in 0..20 {
            engine.press();
        }
        engine.advance(FRAME);
        assert!(query::snapshot(&engine).is_red);

        engine.press();
        let snapshot = query::snapshot(&engine);
        assert_eq!(snapshot.progress, 40 - penalty, "level {}", index + 1);
        assert_eq!(snapshot.successful_presses, 20);
    }
}

#[test]
fn clearing_the_final_level_wins() {
    let mut engine = standard_engine();
    engine.start(Some(LevelNumber::new(10)));

    for _ in 0..150 {
        engine.press();
    }

    let snapshot = query::snapshot(&engine);
    assert!(snapshot.is_won);
    assert!(!snapshot.is_over);
    assert_eq!(snapshot.level, LevelNumber::new(10));
    assert_eq!(snapshot.progress, 300);
    assert_eq!(snapshot.score, 100 + 149 + 100);

    engine.press();
    engine.advance(Duration::from_secs(20));
    assert_eq!(query::snapshot(&engine), snapshot);
}

#[test]
fn odd_requirements_are_capped_at_the_target() {
    let mut engine = scripted_engine(
        vec![
            level(1, 5, 10, RedStrategy::never()),
            level(2, 5, 10, RedStrategy::never()),
        ],
        vec![],
    );
    engine.start(None);

    engine.press();
    engine.press();
    assert_eq!(query::snapshot(&engine).progress, 4);
    engine.press();

    let snapshot = query::snapshot(&engine);
    assert_eq!(snapshot.level, LevelNumber::new(2));
    assert_eq!(snapshot.score, 100 + 2 + 10);
}

#[test]
fn level_transition_reschedules_random_reds() {
    let mut engine = scripted_engine(
        vec![
            level(1, 2, 10, RedStrategy::never()),
            level(
                2,
                100,
                5,
                RedStrategy::ScheduledRandom {
                    count: 1,
                    bias_toward_end: false,
                },
            ),
        ],
        vec![0.5],
    );
    engine.start(None);
    assert!(query::schedule(&engine).is_empty());

    engine.press();
    let schedule = query::schedule(&engine);
    assert_eq!(schedule.len(), 1);
    // 4s of start range, one onset, half the slack.
    assert_eq!(schedule.onsets()[0].at(), Duration::from_secs(2));

    advance_frames(&mut engine, 19);
    assert!(!query::snapshot(&engine).is_red);
    advance_frames(&mut engine, 1);
    assert!(query::snapshot(&engine).is_red);
    assert!(query::schedule(&engine).onsets()[0].is_fired());

    advance_frames(&mut engine, 9);
    assert!(query::snapshot(&engine).is_red);
    advance_frames(&mut engine, 1);
    assert!(!query::snapshot(&engine).is_red);
}

#[test]
fn rejection_placement_is_configurable() {
    let catalog = LevelCatalog::standard();
    let config = Config::new().with_placement(Placement::Rejection { max_attempts: 2_000 });
    let mut engine = Engine::with_source(catalog, config, ScriptedUnits::new(vec![0.25, 0.75]));

    engine.start(Some(LevelNumber::new(6)));

    let onsets: Vec<Duration> = query::schedule(&engine)
        .onsets()
        .iter()
        .map(|onset| onset.at())
        .collect();
    assert_eq!(
        onsets,
        vec![Duration::from_millis(3_500), Duration::from_millis(10_500)]
    );
}

#[test]
fn standard_random_levels_spread_onsets_over_the_whole_level() {
    let mut engine = Engine::with_source(
        LevelCatalog::standard(),
        Config::new(),
        ScriptedUnits::new(vec![0.0, 0.5, 1.0]),
    );

    engine.start(Some(LevelNumber::new(7)));

    let onsets: Vec<Duration> = query::schedule(&engine)
        .onsets()
        .iter()
        .map(|onset| onset.at())
        .collect();
    assert_eq!(
        onsets,
        vec![
            Duration::ZERO,
            Duration::from_secs(7),
            Duration::from_secs(14)
        ]
    );
    engine.advance(FRAME);
    assert!(query::snapshot(&engine).is_red, "first onset opens the level");
}

#[test]
fn zero_frame_step_still_moves_the_clock() {
    let config = Config::new()
        .with_seed(Some(2))
        .with_max_frame_step(Duration::ZERO);
    assert_eq!(config.max_frame_step(), MIN_FRAME_STEP);

    let mut engine = Engine::new(LevelCatalog::standard(), config);
    engine.start(None);
    engine.advance(Duration::from_secs(1));
    assert_eq!(
        query::snapshot(&engine).time_left,
        Duration::from_secs(15) - MIN_FRAME_STEP
    );
}

#[test]
fn every_start_gets_a_new_session_number() {
    let mut engine = standard_engine();
    assert_eq!(query::snapshot(&engine).session, 0);

    engine.start(None);
    assert_eq!(query::snapshot(&engine).session, 1);
    engine.press();
    engine.start(None);
    assert_eq!(query::snapshot(&engine).session, 2);

    engine.reset();
    assert_eq!(query::snapshot(&engine).session, 0);
    engine.start(None);
    assert_eq!(query::snapshot(&engine).session, 1);
}

#[test]
fn reset_then_start_reproduces_the_initial_session() {
    let mut engine = standard_engine();
    engine.start(None);
    let initial = query::snapshot(&engine);

    for _ in 0..60 {
        engine.press();
    }
    advance_frames(&mut engine, 40);
    assert_ne!(query::snapshot(&engine), initial);

    engine.reset();
    assert!(!query::is_running(&engine));
    engine.press();
    engine.advance(FRAME);
    assert_eq!(query::snapshot(&engine).progress, 0);

    engine.start(None);
    assert_eq!(query::snapshot(&engine), initial);
}

#[test]
fn restarting_without_reset_discards_the_session() {
    let mut engine = standard_engine();
    engine.start(None);
    for _ in 0..70 {
        engine.press();
    }
    advance_frames(&mut engine, 10);

    engine.start(None);
    let snapshot = query::snapshot(&engine);
    assert_eq!(snapshot.level, LevelNumber::FIRST);
    assert_eq!(snapshot.score, 0);
    assert_eq!(snapshot.time_left, Duration::from_secs(15));
}

#[test]
fn commands_drive_the_same_operations() {
    let script = r#"[
        {"command": "start", "level": 2},
        {"command": "press"},
        {"command": "press"},
        {"command": "tick", "dt": 0.1},
        {"command": "reset"},
        {"command": "start"},
        {"command": "press"}
    ]"#;
    let commands: Vec<Command> = serde_json::from_str(script).expect("script parses");
    let mut engine = standard_engine();

    for command in commands.iter().take(4).cloned() {
        engine::apply(&mut engine, command);
    }
    let snapshot = query::snapshot(&engine);
    assert_eq!(snapshot.level, LevelNumber::new(2));
    assert_eq!(snapshot.progress, 4);
    assert_eq!(snapshot.time_left, Duration::from_millis(14_900));

    for command in commands.into_iter().skip(4) {
        engine::apply(&mut engine, command);
    }
    let snapshot = query::snapshot(&engine);
    assert_eq!(snapshot.level, LevelNumber::FIRST);
    assert_eq!(snapshot.progress, 2);
}

#[test]
fn fixed_windows_longer_than_a_second_are_truncated() {
    let mut engine = scripted_engine(
        vec![level(
            1,
            100,
            10,
            RedStrategy::FixedWindows {
                windows: vec![RedWindow::new(Duration::from_secs(2), Duration::from_secs(4))],
            },
        )],
        vec![],
    );
    engine.start(None);

    advance_frames(&mut engine, 25);
    assert!(query::snapshot(&engine).is_red);
    advance_frames(&mut engine, 5);
    assert!(!query::snapshot(&engine).is_red);
}
