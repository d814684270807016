use galton_board_core::{
    BallId, BallPath, BoardArea, BoardConfig, Event, FlightSnapshot, PathFault, SchedulerState,
};
use galton_board_system_geometry::Waypoints;
use galton_board_system_paths::generate_paths;
use galton_board_system_scheduler::Scheduler;
use galton_board_system_stats::StatsAggregator;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const TICK_BUDGET: usize = 200_000;

struct Harness {
    config: BoardConfig,
    waypoints: Waypoints,
    paths: Vec<BallPath>,
    scheduler: Scheduler,
    stats: StatsAggregator,
    events: Vec<Event>,
}

impl Harness {
    fn new(config: BoardConfig, paths: Vec<BallPath>) -> Self {
        Self {
            waypoints: Waypoints::compute(config.row_count(), BoardArea::default()),
            stats: StatsAggregator::new(config.bin_count()),
            config,
            paths,
            scheduler: Scheduler::new(),
            events: Vec::new(),
        }
    }

    fn start(&mut self) {
        assert!(self.scheduler.start(
            &self.config,
            &self.waypoints,
            &self.paths,
            &mut self.events
        ));
    }

    fn tick(&mut self) {
        self.scheduler.tick(
            &self.config,
            &self.waypoints,
            &self.paths,
            &mut self.stats,
            &mut self.events,
        );
    }

    fn run_to_end(&mut self, mut inspect: impl FnMut(&Scheduler)) {
        for _ in 0..TICK_BUDGET {
            if self.scheduler.state() != SchedulerState::Running {
                return;
            }
            self.tick();
            inspect(&self.scheduler);
        }
        panic!("run did not finish within {TICK_BUDGET} ticks");
    }

    fn snapshots(&self) -> Vec<FlightSnapshot> {
        self.scheduler.flight_view().into_vec()
    }
}

#[test]
fn single_certain_ball_lands_in_the_last_bin() {
    let config = BoardConfig::new(3, 1.0, 1, 6.0, 1).expect("valid config");
    let mut harness = Harness::new(config, vec![BallPath::new(vec![1, 2, 3])]);
    harness.start();
    harness.run_to_end(|_| {});

    assert_eq!(harness.scheduler.state(), SchedulerState::Complete);
    assert_eq!(harness.scheduler.completed(), 1);
    assert_eq!(harness.stats.histogram().as_slice(), &[0, 0, 0, 1]);

    let pegs: Vec<(u32, u32)> = harness
        .events
        .iter()
        .filter_map(|event| match event {
            Event::BallReachedPeg { row, column, .. } => Some((*row, *column)),
            _ => None,
        })
        .collect();
    assert_eq!(pegs, vec![(0, 0), (1, 1), (2, 2)]);
    assert!(harness.events.contains(&Event::BallCompleted {
        ball: BallId::new(0),
        bin: 3
    }));
    assert!(matches!(
        harness.events.last(),
        Some(Event::RunCompleted { summary }) if summary.count == 1
    ));
}

#[test]
fn concurrency_cap_of_one_is_never_exceeded() {
    let config = BoardConfig::new(6, 0.5, 5, 6.0, 1)
        .expect("valid config")
        .with_seed(11);
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let paths = generate_paths(&mut rng, 5, 6, 0.5);
    let mut harness = Harness::new(config, paths);
    harness.start();
    assert_eq!(harness.scheduler.in_flight(), 1);

    let mut peak = 0;
    harness.run_to_end(|scheduler| peak = peak.max(scheduler.in_flight()));

    assert_eq!(peak, 1);
    assert_eq!(harness.scheduler.completed(), 5);
    assert_eq!(harness.stats.histogram().total(), 5);
}

#[test]
fn paused_flights_stay_frozen_and_resume_without_jumps() {
    let config = BoardConfig::new(8, 0.5, 20, 6.0, 4).expect("valid config");
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let paths = generate_paths(&mut rng, 20, 8, 0.5);
    let mut harness = Harness::new(config, paths);
    harness.start();
    for _ in 0..17 {
        harness.tick();
    }

    assert!(harness.scheduler.pause());
    let frozen = harness.snapshots();
    let countdown = harness.scheduler.admission_countdown();
    let logged = harness.events.len();
    for _ in 0..250 {
        harness.tick();
    }
    assert_eq!(harness.snapshots(), frozen);
    assert_eq!(harness.scheduler.admission_countdown(), countdown);
    assert_eq!(harness.events.len(), logged);

    assert!(harness.scheduler.resume());
    harness.tick();
    for (before, after) in frozen.iter().zip(harness.snapshots()) {
        if before.ball == after.ball && before.leg == after.leg {
            assert!(before.position.distance(after.position) <= 12.0 + 1e-3);
        }
    }
}

#[test]
fn corrupted_paths_are_dropped_and_the_run_continues() {
    let config = BoardConfig::new(3, 1.0, 3, 6.0, 3).expect("valid config");
    let paths = vec![
        BallPath::new(vec![1, 2, 3]),
        BallPath::new(vec![2, 2, 2]),
    ];
    let mut harness = Harness::new(config, paths);
    harness.start();
    harness.run_to_end(|_| {});

    assert_eq!(harness.scheduler.state(), SchedulerState::Complete);
    assert_eq!(harness.scheduler.completed(), 1);
    assert_eq!(harness.scheduler.dropped(), 2);
    assert_eq!(harness.stats.histogram().total(), 1);
    assert!(harness.events.contains(&Event::BallDropped {
        ball: BallId::new(1),
        reason: PathFault::ColumnOutOfRange { row: 0, column: 2 },
    }));
    assert!(harness.events.contains(&Event::BallDropped {
        ball: BallId::new(2),
        reason: PathFault::MissingPath,
    }));
}

#[test]
fn stopped_runs_never_record_more_outcomes() {
    let config = BoardConfig::new(10, 0.5, 50, 12.0, 8).expect("valid config");
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let paths = generate_paths(&mut rng, 50, 10, 0.5);
    let mut harness = Harness::new(config, paths);
    harness.start();
    for _ in 0..120 {
        harness.tick();
    }

    let abandoned = harness.scheduler.stop().expect("run was active");
    let completed = harness.scheduler.completed();
    for _ in 0..100 {
        harness.tick();
    }
    assert_eq!(harness.scheduler.completed(), completed);
    assert_eq!(harness.stats.histogram().total(), u64::from(completed));
    assert!(u64::from(completed) + u64::from(abandoned) <= 50);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn every_run_accounts_for_every_ball(
        seed in any::<u64>(),
        rows in 1u32..10,
        balls in 1u32..30,
        cap in 1u32..6,
        speed in 1.0f32..20.0,
        probability in 0.0f64..=1.0,
    ) {
        let config = BoardConfig::new(rows, probability, balls, speed, cap).expect("valid config");
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let paths = generate_paths(&mut rng, balls, rows, probability);
        let expected: Vec<u32> = paths.iter().filter_map(BallPath::final_bin).collect();
        let mut harness = Harness::new(config, paths);
        harness.start();

        let mut peak = 0;
        harness.run_to_end(|scheduler| peak = peak.max(scheduler.in_flight()));

        prop_assert!(peak <= cap as usize);
        prop_assert_eq!(harness.scheduler.state(), SchedulerState::Complete);
        prop_assert_eq!(harness.scheduler.completed(), balls);
        prop_assert_eq!(harness.stats.histogram().total(), u64::from(balls));

        let mut recorded = harness.stats.outcomes().to_vec();
        let mut expected = expected;
        recorded.sort_unstable();
        expected.sort_unstable();
        prop_assert_eq!(recorded, expected);
    }
}
