#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Animation scheduler that admits balls and walks them along their waypoints.
//!
//! The scheduler owns the run lifecycle ([`SchedulerState`]) together with the
//! set of in-flight balls. Every running tick it first opens the admission
//! window when the delay counter allows, then advances each ball by one
//! interpolation step. Balls that settle in a bin, or whose path turns out to
//! be inconsistent, are marked during the pass and compacted out afterwards.

use galton_board_core::{
    BallId, BallPath, BoardConfig, Event, FlightLeg, FlightSnapshot, FlightView, PathFault,
    SchedulerState, Transition,
};
use galton_board_system_geometry::Waypoints;
use galton_board_system_stats::StatsAggregator;
use glam::Vec2;
use tracing::{debug, info, warn};

/// Upper bound on the distance a ball travels in a single tick.
pub const MAX_STEP: f32 = 30.0;

const ADMISSION_BASE_TICKS: f32 = 30.0;
const ADMISSION_SPEED_FACTOR: f32 = 0.3;

/// Distance covered per tick at the provided animation speed.
#[must_use]
pub fn step_length(speed: f32) -> f32 {
    (2.0 * speed).min(MAX_STEP)
}

/// Ticks between two admission windows at the provided animation speed.
#[must_use]
pub fn admission_delay(speed: f32) -> u32 {
    let ticks = (ADMISSION_BASE_TICKS - ADMISSION_SPEED_FACTOR * speed).ceil();
    if ticks.is_nan() || ticks <= 1.0 {
        1
    } else {
        ticks as u32
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Flight {
    ball: BallId,
    current_row: i32,
    position: Vec2,
    target: Vec2,
    leg: FlightLeg,
}

impl Flight {
    fn snapshot(&self) -> FlightSnapshot {
        FlightSnapshot {
            ball: self.ball,
            current_row: self.current_row,
            position: self.position,
            target: self.target,
            leg: self.leg,
        }
    }
}

/// Result of advancing a single flight by one step.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Progress {
    Moving,
    Settled(u32),
    Faulted(PathFault),
}

/// State machine that schedules admission and interpolation of balls.
#[derive(Debug, Default)]
pub struct Scheduler {
    state: SchedulerState,
    flights: Vec<Flight>,
    ball_count: u32,
    next_ball: u32,
    completed: u32,
    dropped: u32,
    admission_countdown: u32,
    settled: Vec<(BallId, Result<u32, PathFault>)>,
    stats_events: Vec<Event>,
}

impl Scheduler {
    /// Creates an idle scheduler with no run attached.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SchedulerState {
        self.state
    }

    /// Number of balls scheduled for the current run.
    #[must_use]
    pub const fn ball_count(&self) -> u32 {
        self.ball_count
    }

    /// Number of balls that entered the board, including dropped ones.
    #[must_use]
    pub const fn admitted(&self) -> u32 {
        self.next_ball
    }

    /// Number of balls whose outcome was recorded.
    #[must_use]
    pub const fn completed(&self) -> u32 {
        self.completed
    }

    /// Number of balls removed without an outcome.
    #[must_use]
    pub const fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Number of balls that have not entered the board yet.
    #[must_use]
    pub const fn queued(&self) -> u32 {
        self.ball_count.saturating_sub(self.next_ball)
    }

    /// Number of balls currently animating.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.flights.len()
    }

    /// Ticks remaining until the next admission window opens.
    #[must_use]
    pub const fn admission_countdown(&self) -> u32 {
        self.admission_countdown
    }

    /// Captures a read-only view of every in-flight ball.
    #[must_use]
    pub fn flight_view(&self) -> FlightView {
        FlightView::from_snapshots(self.flights.iter().map(Flight::snapshot).collect())
    }

    /// Begins a new run, admitting the first batch immediately.
    ///
    /// Returns `false` without touching any state when a run is already active.
    pub fn start(
        &mut self,
        config: &BoardConfig,
        waypoints: &Waypoints,
        paths: &[BallPath],
        out: &mut Vec<Event>,
    ) -> bool {
        let Some(next) = self.state.on(Transition::Start) else {
            return false;
        };
        self.clear_run();
        self.state = next;
        self.ball_count = config.ball_count();
        self.admit(config, waypoints, paths, out);
        self.admission_countdown = admission_delay(config.speed());
        info!(
            balls = self.ball_count,
            rows = config.row_count(),
            "run started"
        );
        true
    }

    /// Freezes admission and interpolation.
    pub fn pause(&mut self) -> bool {
        self.transition(Transition::Pause)
    }

    /// Continues a paused run from the frozen positions.
    pub fn resume(&mut self) -> bool {
        self.transition(Transition::Resume)
    }

    /// Terminates the active run, returning how many in-flight balls were abandoned.
    pub fn stop(&mut self) -> Option<u32> {
        let next = self.state.on(Transition::Stop)?;
        self.state = next;
        let abandoned = u32::try_from(self.flights.len()).unwrap_or(u32::MAX);
        self.flights.clear();
        info!(
            abandoned,
            completed = self.completed,
            "run stopped early"
        );
        Some(abandoned)
    }

    /// Discards every per-run record and returns to [`SchedulerState::Idle`].
    pub fn reset(&mut self) {
        self.clear_run();
        self.ball_count = 0;
        self.state = SchedulerState::Idle;
    }

    /// Advances the run by a single frame.
    ///
    /// Does nothing unless the scheduler is [`SchedulerState::Running`]. When
    /// the last ball leaves the board the scheduler moves to
    /// [`SchedulerState::Complete`], forces a final statistics refresh and
    /// emits [`Event::RunCompleted`].
    pub fn tick(
        &mut self,
        config: &BoardConfig,
        waypoints: &Waypoints,
        paths: &[BallPath],
        stats: &mut StatsAggregator,
        out: &mut Vec<Event>,
    ) {
        if self.state != SchedulerState::Running {
            return;
        }

        if self.admission_countdown == 0 {
            self.admit(config, waypoints, paths, out);
            self.admission_countdown = admission_delay(config.speed());
        } else {
            self.admission_countdown -= 1;
        }

        let step = step_length(config.speed());
        let row_count = config.row_count();
        self.settled.clear();
        for flight in &mut self.flights {
            let path = paths.get(flight.ball.index());
            match advance(flight, step, row_count, waypoints, path, out) {
                Progress::Moving => {}
                Progress::Settled(bin) => self.settled.push((flight.ball, Ok(bin))),
                Progress::Faulted(fault) => self.settled.push((flight.ball, Err(fault))),
            }
        }

        if !self.settled.is_empty() {
            let settled = &self.settled;
            self.flights
                .retain(|flight| settled.binary_search_by_key(&flight.ball, |(ball, _)| *ball).is_err());
            let settled = std::mem::take(&mut self.settled);
            for &(ball, outcome) in &settled {
                self.finalize_ball(ball, outcome, stats, out);
            }
            self.settled = settled;
        }

        if self.next_ball >= self.ball_count && self.flights.is_empty() {
            if let Some(next) = self.state.on(Transition::Finish) {
                self.state = next;
                let summary = stats.finalize();
                info!(
                    completed = self.completed,
                    dropped = self.dropped,
                    mean = summary.mean,
                    std_dev = summary.std_dev,
                    "run complete"
                );
                stats.request_chart_refresh(out);
                out.push(Event::RunCompleted { summary });
            }
        }
    }

    fn transition(&mut self, transition: Transition) -> bool {
        match self.state.on(transition) {
            Some(next) => {
                self.state = next;
                info!(state = %next, "scheduler transitioned");
                true
            }
            None => false,
        }
    }

    fn clear_run(&mut self) {
        self.flights.clear();
        self.settled.clear();
        self.next_ball = 0;
        self.completed = 0;
        self.dropped = 0;
        self.admission_countdown = 0;
    }

    fn admit(
        &mut self,
        config: &BoardConfig,
        waypoints: &Waypoints,
        paths: &[BallPath],
        out: &mut Vec<Event>,
    ) {
        let capacity = usize::try_from(config.max_concurrent_balls()).unwrap_or(usize::MAX);
        let entry = waypoints.entry();
        let apex = waypoints.peg(0, 0).unwrap_or(entry);

        while self.flights.len() < capacity && self.next_ball < self.ball_count {
            let ball = BallId::new(self.next_ball);
            self.next_ball += 1;

            let verdict = paths
                .get(ball.index())
                .ok_or(PathFault::MissingPath)
                .and_then(|path| path.check(config.row_count()));
            if let Err(reason) = verdict {
                self.drop_ball(ball, reason, out);
                continue;
            }

            self.flights.push(Flight {
                ball,
                current_row: -1,
                position: entry,
                target: apex,
                leg: FlightLeg::Peg { row: 0, column: 0 },
            });
            debug!(%ball, in_flight = self.flights.len(), "admitted ball");
            out.push(Event::BallAdmitted { ball });
        }
    }

    fn finalize_ball(
        &mut self,
        ball: BallId,
        outcome: Result<u32, PathFault>,
        stats: &mut StatsAggregator,
        out: &mut Vec<Event>,
    ) {
        let bin = match outcome {
            Ok(bin) => bin,
            Err(reason) => {
                self.drop_ball(ball, reason, out);
                return;
            }
        };

        self.stats_events.clear();
        if stats.record_outcome(bin, &mut self.stats_events).is_err() {
            self.drop_ball(ball, PathFault::BinOutOfRange { bin }, out);
            return;
        }
        self.completed += 1;
        debug!(%ball, bin, completed = self.completed, "ball settled");
        out.push(Event::BallCompleted { ball, bin });
        out.append(&mut self.stats_events);
    }

    fn drop_ball(&mut self, ball: BallId, reason: PathFault, out: &mut Vec<Event>) {
        self.dropped += 1;
        warn!(%ball, %reason, "dropped ball without recording an outcome");
        out.push(Event::BallDropped { ball, reason });
    }
}

fn advance(
    flight: &mut Flight,
    step: f32,
    row_count: u32,
    waypoints: &Waypoints,
    path: Option<&BallPath>,
    out: &mut Vec<Event>,
) -> Progress {
    let offset = flight.target - flight.position;
    if offset.length_squared() > step * step {
        flight.position += offset.normalize_or_zero() * step;
        return Progress::Moving;
    }
    flight.position = flight.target;

    let (row, column) = match flight.leg {
        FlightLeg::Bin { bin } => {
            flight.current_row = i32::try_from(row_count).unwrap_or(i32::MAX);
            return Progress::Settled(bin);
        }
        FlightLeg::Peg { row, column } => (row, column),
    };

    out.push(Event::BallReachedPeg {
        ball: flight.ball,
        row,
        column,
    });
    flight.current_row = i32::try_from(row).unwrap_or(i32::MAX);

    let Some(path) = path else {
        return Progress::Faulted(PathFault::MissingPath);
    };
    let Some(next_column) = path.position_after(row) else {
        return Progress::Faulted(PathFault::LengthMismatch {
            expected: row_count,
            actual: u32::try_from(path.len()).unwrap_or(u32::MAX),
        });
    };
    if !matches!(next_column.checked_sub(column), Some(0 | 1)) {
        return Progress::Faulted(PathFault::ColumnOutOfRange {
            row,
            column: next_column,
        });
    }

    let next_row = row + 1;
    if next_row < row_count {
        let Some(target) = waypoints.peg(next_row, next_column) else {
            return Progress::Faulted(PathFault::ColumnOutOfRange {
                row,
                column: next_column,
            });
        };
        flight.target = target;
        flight.leg = FlightLeg::Peg {
            row: next_row,
            column: next_column,
        };
    } else {
        let Some(target) = waypoints.bin(next_column) else {
            return Progress::Faulted(PathFault::BinOutOfRange { bin: next_column });
        };
        flight.target = target;
        flight.leg = FlightLeg::Bin { bin: next_column };
    }
    Progress::Moving
}
