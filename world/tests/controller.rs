use galton_board_core::{
    BallId, BoardArea, Command, ConfigError, ConfigPatch, Event, SchedulerState,
};
use galton_board_world::{self as world, query, take_chart_refresh, SimulationError, World};
use glam::Vec2;

const TICK_BUDGET: usize = 500_000;

fn configured(patch: ConfigPatch) -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(&mut world, Command::Configure { patch }, &mut events).expect("valid patch");
    world
}

fn apply(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events).expect("command accepted");
    events
}

fn run_to_end(world: &mut World) -> Vec<Event> {
    let mut log = apply(world, Command::Start);
    for _ in 0..TICK_BUDGET {
        if query::state(world) != SchedulerState::Running {
            return log;
        }
        log.extend(apply(world, Command::Tick));
    }
    panic!("run did not finish within {TICK_BUDGET} ticks");
}

#[test]
fn single_certain_ball_finishes_in_the_last_bin() {
    let mut world = configured(ConfigPatch {
        row_count: Some(3),
        deflection_probability: Some(1.0),
        ball_count: Some(1),
        max_concurrent_balls: Some(1),
        ..ConfigPatch::default()
    });
    let log = run_to_end(&mut world);

    assert_eq!(query::state(&world), SchedulerState::Complete);
    assert_eq!(query::histogram(&world).as_slice(), &[0, 0, 0, 1]);
    assert_eq!(query::counts(&world).completed, 1);
    assert!((query::progress(&world) - 1.0).abs() < f64::EPSILON);
    assert!(query::flight_view(&world).is_empty());
    assert!(log.contains(&Event::BallCompleted {
        ball: BallId::new(0),
        bin: 3
    }));

    let summary = query::summary(&world);
    assert_eq!(summary.count, 1);
    assert!((summary.mean - 3.0).abs() < f64::EPSILON);
    assert!(summary.std_dev.abs() < f64::EPSILON);
}

#[test]
fn large_runs_converge_on_the_binomial_mean() {
    let mut world = configured(ConfigPatch {
        row_count: Some(10),
        deflection_probability: Some(0.5),
        ball_count: Some(10_000),
        speed: Some(15.0),
        max_concurrent_balls: Some(10_000),
        seed: Some(0x00c0_ffee),
    });
    let log = run_to_end(&mut world);

    assert_eq!(query::state(&world), SchedulerState::Complete);
    let histogram = query::histogram(&world);
    assert_eq!(histogram.len(), 11);
    assert_eq!(histogram.total(), 10_000);

    let summary = query::summary(&world);
    assert_eq!(summary.count, 10_000);
    assert!((summary.mean - 5.0).abs() < 0.1, "mean {}", summary.mean);
    let expected_std = query::theoretical(&world).std_dev;
    assert!((summary.std_dev - expected_std).abs() < 0.1);

    let weighted: u64 = histogram
        .as_slice()
        .iter()
        .zip(0u64..)
        .map(|(count, bin)| count * bin)
        .sum();
    assert!((weighted as f64 / 10_000.0 - summary.mean).abs() < 1e-9);
    assert!(matches!(log.last(), Some(Event::RunCompleted { summary: last }) if *last == summary));
}

#[test]
fn reset_is_idempotent() {
    let mut world = configured(ConfigPatch {
        row_count: Some(5),
        ball_count: Some(30),
        seed: Some(9),
        ..ConfigPatch::default()
    });
    let _ = apply(&mut world, Command::Start);
    for _ in 0..80 {
        let _ = apply(&mut world, Command::Tick);
    }

    let _ = apply(&mut world, Command::Reset);
    let once = snapshot(&world);
    let _ = apply(&mut world, Command::Reset);
    let twice = snapshot(&world);

    assert_eq!(once, twice);
    assert_eq!(query::state(&world), SchedulerState::Idle);
    assert_eq!(query::histogram(&world).len(), 13);
    assert_eq!(query::histogram(&world).total(), 0);
    assert_eq!(query::config(&world).seed(), None);
}

fn snapshot(world: &World) -> String {
    format!(
        "{:?}|{:?}|{:?}|{:?}|{:?}|{:?}",
        query::config(world),
        query::state(world),
        query::histogram(world),
        query::summary(world),
        query::counts(world),
        query::flight_view(world).into_vec(),
    )
}

#[test]
fn stop_abandons_in_flight_balls_without_crediting_them() {
    let mut world = configured(ConfigPatch {
        row_count: Some(8),
        ball_count: Some(200),
        max_concurrent_balls: Some(12),
        speed: Some(10.0),
        seed: Some(21),
        ..ConfigPatch::default()
    });
    let _ = apply(&mut world, Command::Start);
    for _ in 0..150 {
        let _ = apply(&mut world, Command::Tick);
    }
    let in_flight = query::counts(&world).in_flight;

    let events = apply(&mut world, Command::Stop);
    assert_eq!(events, vec![Event::RunStopped { abandoned: in_flight }]);
    assert_eq!(query::state(&world), SchedulerState::Stopped);
    assert!(query::flight_view(&world).is_empty());

    let counts = query::counts(&world);
    let histogram = query::histogram(&world);
    assert!(histogram.total() < 200);
    assert_eq!(histogram.total(), u64::from(counts.completed));
    assert_eq!(query::summary(&world).count, u64::from(counts.completed));

    for _ in 0..50 {
        assert!(apply(&mut world, Command::Tick).is_empty());
    }
    assert_eq!(query::counts(&world), counts);
}

#[test]
fn configuration_is_locked_while_a_run_is_active() {
    let mut world = configured(ConfigPatch {
        ball_count: Some(50),
        seed: Some(4),
        ..ConfigPatch::default()
    });
    let _ = apply(&mut world, Command::Start);
    let _ = apply(&mut world, Command::Pause);

    let mut events = Vec::new();
    let patch = ConfigPatch {
        row_count: Some(4),
        ..ConfigPatch::default()
    };
    let error = world::apply(&mut world, Command::Configure { patch }, &mut events)
        .expect_err("paused runs own the configuration");
    assert!(matches!(
        error,
        SimulationError::InvalidConfig(ConfigError::RunActive(SchedulerState::Paused))
    ));
    assert_eq!(
        events,
        vec![Event::ConfigRejected {
            error: ConfigError::RunActive(SchedulerState::Paused)
        }]
    );

    let area = BoardArea::new(Vec2::ZERO, 400.0, 400.0, 10.0).expect("valid area");
    assert!(world::apply(&mut world, Command::ConfigureBoardArea { area }, &mut events).is_err());
    assert_eq!(query::config(&world).row_count(), 12);

    let _ = apply(&mut world, Command::Stop);
    let events = apply(&mut world, Command::Configure { patch });
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::ConfigUpdated { config } if config.row_count() == 4)));
    assert_eq!(query::state(&world), SchedulerState::Idle);
    assert_eq!(query::histogram(&world).len(), 5);
    assert_eq!(query::histogram(&world).total(), 0);
}

#[test]
fn oversized_boards_are_rejected_without_side_effects() {
    let mut world = World::new();
    let before = snapshot(&world);

    let mut events = Vec::new();
    let patch = ConfigPatch {
        row_count: Some(u32::MAX),
        ..ConfigPatch::default()
    };
    let error = world::apply(&mut world, Command::Configure { patch }, &mut events)
        .expect_err("row count above the limit");
    assert!(matches!(
        error,
        SimulationError::InvalidConfig(ConfigError::RowCount(u32::MAX))
    ));
    assert_eq!(
        events,
        vec![Event::ConfigRejected {
            error: ConfigError::RowCount(u32::MAX)
        }]
    );

    let patch = ConfigPatch {
        ball_count: Some(u32::MAX),
        ..ConfigPatch::default()
    };
    assert!(world::apply(&mut world, Command::Configure { patch }, &mut events).is_err());
    assert_eq!(snapshot(&world), before);
    assert_eq!(query::histogram(&world).len(), 13);
}

#[test]
fn ticks_are_counted_in_every_state() {
    let mut world = configured(ConfigPatch {
        ball_count: Some(3),
        row_count: Some(2),
        speed: Some(50.0),
        seed: Some(1),
        ..ConfigPatch::default()
    });
    let _ = apply(&mut world, Command::Tick);
    assert_eq!(query::tick_index(&world), 1);

    let _ = apply(&mut world, Command::Start);
    let _ = apply(&mut world, Command::Pause);
    let _ = apply(&mut world, Command::Tick);
    assert_eq!(query::tick_index(&world), 2);

    let _ = apply(&mut world, Command::Resume);
    let mut ticks = 2;
    while query::state(&world) == SchedulerState::Running {
        let _ = apply(&mut world, Command::Tick);
        ticks += 1;
        assert!(ticks < TICK_BUDGET as u64, "run did not finish");
    }
    assert_eq!(query::tick_index(&world), ticks);
}

#[test]
fn inapplicable_lifecycle_commands_are_ignored() {
    let mut world = World::new();
    for command in [Command::Pause, Command::Resume, Command::Stop, Command::TogglePause] {
        let events = apply(&mut world, command.clone());
        assert_eq!(
            events,
            vec![Event::CommandIgnored {
                command,
                state: SchedulerState::Idle
            }]
        );
    }

    let _ = apply(&mut world, Command::Start);
    let events = apply(&mut world, Command::Start);
    assert_eq!(
        events,
        vec![Event::CommandIgnored {
            command: Command::Start,
            state: SchedulerState::Running
        }]
    );
}

#[test]
fn toggle_pause_alternates_and_freezes_flights() {
    let mut world = configured(ConfigPatch {
        ball_count: Some(40),
        seed: Some(77),
        ..ConfigPatch::default()
    });
    let _ = apply(&mut world, Command::Start);
    for _ in 0..25 {
        let _ = apply(&mut world, Command::Tick);
    }

    assert_eq!(apply(&mut world, Command::TogglePause), vec![Event::RunPaused]);
    let frozen = query::flight_view(&world).into_vec();
    let counts = query::counts(&world);
    for _ in 0..100 {
        assert!(apply(&mut world, Command::Tick).is_empty());
    }
    assert_eq!(query::flight_view(&world).into_vec(), frozen);
    assert_eq!(query::counts(&world), counts);

    assert_eq!(apply(&mut world, Command::TogglePause), vec![Event::RunResumed]);
    assert_eq!(query::state(&world), SchedulerState::Running);
}

#[test]
fn chart_latch_is_raised_on_lifecycle_boundaries() {
    let mut world = configured(ConfigPatch {
        row_count: Some(2),
        ball_count: Some(3),
        seed: Some(1),
        ..ConfigPatch::default()
    });
    assert!(take_chart_refresh(&mut world), "fresh worlds draw once");
    assert!(!take_chart_refresh(&mut world));

    let log = run_to_end(&mut world);
    let due = log
        .iter()
        .filter(|event| matches!(event, Event::ChartRefreshDue))
        .count();
    assert_eq!(due, 2, "start and completion");
    assert!(query::chart_refresh_pending(&world));
    assert!(take_chart_refresh(&mut world));

    let events = apply(&mut world, Command::Reset);
    assert_eq!(events, vec![Event::RunReset, Event::ChartRefreshDue]);
}

#[test]
fn seeded_runs_can_be_restarted_after_completion() {
    let mut world = configured(ConfigPatch {
        row_count: Some(4),
        ball_count: Some(6),
        seed: Some(2),
        ..ConfigPatch::default()
    });
    let _ = run_to_end(&mut world);
    assert_eq!(query::state(&world), SchedulerState::Complete);

    let log = run_to_end(&mut world);
    assert!(matches!(
        log.first(),
        Some(Event::RunStarted {
            ball_count: 6,
            row_count: 4
        })
    ));
    assert_eq!(query::histogram(&world).total(), 6, "results restart per run");
}
