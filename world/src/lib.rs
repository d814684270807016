#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the Galton board.
//!
//! The world owns the configuration, the waypoint layout, the generated paths,
//! the scheduler and the outcome statistics. It is mutated exclusively through
//! [`apply`], which executes one [`Command`] and appends the resulting
//! [`Event`] values to the caller's buffer. Renderers read it through the
//! [`query`] module.

use galton_board_core::{
    BallPath, BoardArea, BoardConfig, Command, ConfigError, ConfigPatch, Event, SchedulerState,
    TheoreticalStats, Transition,
};
use galton_board_system_geometry::WaypointCache;
use galton_board_system_paths::{PathError, PathGenerator};
use galton_board_system_scheduler::Scheduler;
use galton_board_system_stats::{self as stats, StatsAggregator};
use thiserror::Error;
use tracing::{info, warn};

/// Failures surfaced to callers of [`apply`].
#[derive(Debug, Error)]
pub enum SimulationError {
    /// A configuration or board-area update was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    /// Paths could not be generated because randomness was unavailable.
    #[error("cannot start run: {0}")]
    RandomSource(#[from] PathError),
}

/// Represents the authoritative Galton board world state.
#[derive(Debug)]
pub struct World {
    config: BoardConfig,
    area: BoardArea,
    layout: WaypointCache,
    generator: PathGenerator,
    paths: Vec<BallPath>,
    scheduler: Scheduler,
    stats: StatsAggregator,
    theoretical: TheoreticalStats,
    tick_index: u64,
}

impl World {
    /// Creates a new world with the default configuration and board area.
    #[must_use]
    pub fn new() -> Self {
        let config = BoardConfig::default();
        let area = BoardArea::default();
        Self {
            layout: WaypointCache::new(config.row_count(), area),
            generator: PathGenerator::new(),
            paths: Vec::new(),
            scheduler: Scheduler::new(),
            stats: StatsAggregator::new(config.bin_count()),
            theoretical: theoretical_for(&config),
            tick_index: 0,
            config,
            area,
        }
    }

    fn start(&mut self, out_events: &mut Vec<Event>) -> Result<(), SimulationError> {
        let state = self.scheduler.state();
        if state.on(Transition::Start).is_none() {
            ignore(Command::Start, state, out_events);
            return Ok(());
        }

        let paths = match self.generator.generate(&self.config) {
            Ok(paths) => paths,
            Err(error) => {
                warn!(%error, "run could not start");
                return Err(error.into());
            }
        };
        self.paths = paths;
        self.stats.reset(self.config.bin_count());

        out_events.push(Event::RunStarted {
            ball_count: self.config.ball_count(),
            row_count: self.config.row_count(),
        });
        self.stats.request_chart_refresh(out_events);
        let waypoints = self.layout.resolve(self.config.row_count(), self.area);
        let _ = self
            .scheduler
            .start(&self.config, waypoints, &self.paths, out_events);
        Ok(())
    }

    fn stop(&mut self, out_events: &mut Vec<Event>) {
        match self.scheduler.stop() {
            Some(abandoned) => {
                let _ = self.stats.finalize();
                out_events.push(Event::RunStopped { abandoned });
            }
            None => ignore(Command::Stop, self.scheduler.state(), out_events),
        }
    }

    fn reset(&mut self, out_events: &mut Vec<Event>) {
        self.config = BoardConfig::default();
        self.theoretical = theoretical_for(&self.config);
        self.clear_run();
        info!("world reset to defaults");
        out_events.push(Event::RunReset);
        self.stats.request_chart_refresh(out_events);
    }

    fn configure(
        &mut self,
        patch: ConfigPatch,
        out_events: &mut Vec<Event>,
    ) -> Result<(), SimulationError> {
        let state = self.scheduler.state();
        if state.is_active() {
            return reject(ConfigError::RunActive(state), out_events);
        }
        let next = match self.config.patched(&patch) {
            Ok(next) => next,
            Err(error) => return reject(error, out_events),
        };

        let rows_changed = next.row_count() != self.config.row_count();
        self.config = next;
        self.theoretical = theoretical_for(&self.config);
        if rows_changed {
            self.clear_run();
            self.stats.request_chart_refresh(out_events);
        }
        info!(
            rows = next.row_count(),
            probability = next.deflection_probability(),
            balls = next.ball_count(),
            speed = next.speed(),
            max_concurrent = next.max_concurrent_balls(),
            "configuration updated"
        );
        out_events.push(Event::ConfigUpdated { config: next });
        Ok(())
    }

    fn configure_area(
        &mut self,
        area: BoardArea,
        out_events: &mut Vec<Event>,
    ) -> Result<(), SimulationError> {
        let state = self.scheduler.state();
        if state.is_active() {
            return reject(ConfigError::RunActive(state), out_events);
        }
        if let Err(error) = area.validate() {
            return reject(error, out_events);
        }
        self.area = area;
        let _ = self.layout.resolve(self.config.row_count(), area);
        out_events.push(Event::BoardAreaUpdated { area });
        Ok(())
    }

    fn toggle_pause(&mut self, out_events: &mut Vec<Event>) {
        match self.scheduler.state() {
            SchedulerState::Running => self.pause(Command::TogglePause, out_events),
            SchedulerState::Paused => self.resume(Command::TogglePause, out_events),
            state => ignore(Command::TogglePause, state, out_events),
        }
    }

    fn pause(&mut self, command: Command, out_events: &mut Vec<Event>) {
        if self.scheduler.pause() {
            out_events.push(Event::RunPaused);
        } else {
            ignore(command, self.scheduler.state(), out_events);
        }
    }

    fn resume(&mut self, command: Command, out_events: &mut Vec<Event>) {
        if self.scheduler.resume() {
            out_events.push(Event::RunResumed);
        } else {
            ignore(command, self.scheduler.state(), out_events);
        }
    }

    fn tick(&mut self, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        let waypoints = self.layout.resolve(self.config.row_count(), self.area);
        self.scheduler.tick(
            &self.config,
            waypoints,
            &self.paths,
            &mut self.stats,
            out_events,
        );
    }

    fn clear_run(&mut self) {
        self.scheduler.reset();
        self.paths.clear();
        self.stats.reset(self.config.bin_count());
        let _ = self.layout.resolve(self.config.row_count(), self.area);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Lifecycle commands that do not apply to the current state are reported
/// through [`Event::CommandIgnored`] and succeed. Rejected configuration
/// updates emit [`Event::ConfigRejected`] and also return
/// [`SimulationError::InvalidConfig`]; nothing is modified in that case.
pub fn apply(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), SimulationError> {
    match command {
        Command::Start => world.start(out_events)?,
        Command::Pause => world.pause(Command::Pause, out_events),
        Command::Resume => world.resume(Command::Resume, out_events),
        Command::TogglePause => world.toggle_pause(out_events),
        Command::Stop => world.stop(out_events),
        Command::Reset => world.reset(out_events),
        Command::Tick => world.tick(out_events),
        Command::Configure { patch } => world.configure(patch, out_events)?,
        Command::ConfigureBoardArea { area } => world.configure_area(area, out_events)?,
    }
    Ok(())
}

/// Consumes the chart refresh latch, returning whether charts should be regenerated.
pub fn take_chart_refresh(world: &mut World) -> bool {
    world.stats.take_chart_refresh()
}

fn theoretical_for(config: &BoardConfig) -> TheoreticalStats {
    stats::theoretical(config.row_count(), config.deflection_probability())
}

fn ignore(command: Command, state: SchedulerState, out_events: &mut Vec<Event>) {
    info!(?command, %state, "ignored command");
    out_events.push(Event::CommandIgnored { command, state });
}

fn reject(error: ConfigError, out_events: &mut Vec<Event>) -> Result<(), SimulationError> {
    warn!(%error, "rejected configuration update");
    out_events.push(Event::ConfigRejected { error });
    Err(SimulationError::InvalidConfig(error))
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use galton_board_core::{
        BoardArea, BoardConfig, FlightView, HistogramView, SchedulerState, StatsSummary,
        TheoreticalStats,
    };
    use galton_board_system_geometry::Waypoints;
    use glam::Vec2;

    use super::World;

    /// Provides read-only access to the configuration in effect.
    #[must_use]
    pub fn config(world: &World) -> &BoardConfig {
        &world.config
    }

    /// Board area used to lay out waypoints.
    #[must_use]
    pub fn board_area(world: &World) -> BoardArea {
        world.area
    }

    /// Current scheduler lifecycle state.
    #[must_use]
    pub fn state(world: &World) -> SchedulerState {
        world.scheduler.state()
    }

    /// Captures a read-only view of the balls currently in flight.
    #[must_use]
    pub fn flight_view(world: &World) -> FlightView {
        world.scheduler.flight_view()
    }

    /// Snapshot of the per-bin completion counts.
    #[must_use]
    pub fn histogram(world: &World) -> HistogramView {
        world.stats.histogram()
    }

    /// Most recently published running summary.
    ///
    /// Between refreshes this may trail the histogram by a few balls; it is
    /// exact once the run completes or stops.
    #[must_use]
    pub fn summary(world: &World) -> StatsSummary {
        world.stats.summary()
    }

    /// Expected mean and spread for the configured board.
    #[must_use]
    pub fn theoretical(world: &World) -> TheoreticalStats {
        world.theoretical
    }

    /// Fraction of the run's balls whose outcome was recorded, in `[0, 1]`.
    #[must_use]
    pub fn progress(world: &World) -> f64 {
        let total = world.scheduler.ball_count();
        if total == 0 {
            return 0.0;
        }
        f64::from(world.scheduler.completed()) / f64::from(total)
    }

    /// Per-run ball counters.
    #[must_use]
    pub fn counts(world: &World) -> RunCounts {
        RunCounts {
            scheduled: world.scheduler.ball_count(),
            admitted: world.scheduler.admitted(),
            completed: world.scheduler.completed(),
            dropped: world.scheduler.dropped(),
            queued: world.scheduler.queued(),
            in_flight: u32::try_from(world.scheduler.in_flight()).unwrap_or(u32::MAX),
        }
    }

    /// Resolved peg, bin and entry coordinates for the current layout.
    #[must_use]
    pub fn waypoints(world: &World) -> &Waypoints {
        world.layout.current()
    }

    /// Peg positions in row-major order.
    #[must_use]
    pub fn pegs(world: &World) -> Vec<Vec2> {
        world
            .layout
            .current()
            .pegs()
            .map(|(_, _, position)| position)
            .collect()
    }

    /// Bin positions in bin order.
    #[must_use]
    pub fn bins(world: &World) -> &[Vec2] {
        world.layout.current().bins()
    }

    /// Reports whether charts should be regenerated.
    #[must_use]
    pub fn chart_refresh_pending(world: &World) -> bool {
        world.stats.chart_refresh_pending()
    }

    /// Number of ticks applied since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Ball counters for the current or most recent run.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RunCounts {
        /// Balls scheduled for the run.
        pub scheduled: u32,
        /// Balls that entered the board, including dropped ones.
        pub admitted: u32,
        /// Balls whose outcome was recorded.
        pub completed: u32,
        /// Balls removed without an outcome.
        pub dropped: u32,
        /// Balls waiting for admission.
        pub queued: u32,
        /// Balls currently animating.
        pub in_flight: u32,
    }
}
