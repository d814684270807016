#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Galton board engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and the board systems. Adapters submit [`Command`]
//! values describing desired lifecycle changes, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! describing what happened. Renderers never mutate state; they poll the
//! immutable views defined here once per frame.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Begins a new run using the current configuration.
    Start,
    /// Freezes admission and interpolation while preserving flight state.
    Pause,
    /// Continues a paused run from the frozen positions.
    Resume,
    /// Pauses a running run or resumes a paused one.
    TogglePause,
    /// Terminates the active run early, abandoning balls still in flight.
    Stop,
    /// Restores default configuration and clears every per-run record.
    Reset,
    /// Advances the animation by a single frame.
    Tick,
    /// Applies a partial configuration update while no run is active.
    Configure {
        /// Fields that should replace the current configuration values.
        patch: ConfigPatch,
    },
    /// Replaces the rectangular board area used to lay out waypoints.
    ConfigureBoardArea {
        /// New board area expressed in screen units.
        area: BoardArea,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that a run began and all paths were generated.
    RunStarted {
        /// Number of balls scheduled for the run.
        ball_count: u32,
        /// Number of peg rows every ball traverses.
        row_count: u32,
    },
    /// Announces that the run was paused.
    RunPaused,
    /// Announces that a paused run resumed.
    RunResumed,
    /// Announces that the run was stopped before every ball completed.
    RunStopped {
        /// Number of in-flight balls discarded without crediting an outcome.
        abandoned: u32,
    },
    /// Announces that every ball reached a bin.
    RunCompleted {
        /// Final statistics computed over the full outcome list.
        summary: StatsSummary,
    },
    /// Announces that configuration and run state returned to defaults.
    RunReset,
    /// Confirms that a ball entered the board above the first peg.
    BallAdmitted {
        /// Identifier of the admitted ball.
        ball: BallId,
    },
    /// Reports that a ball arrived at a peg and was deflected.
    BallReachedPeg {
        /// Identifier of the deflected ball.
        ball: BallId,
        /// Row of the peg the ball arrived at.
        row: u32,
        /// Column of the peg the ball arrived at.
        column: u32,
    },
    /// Confirms that a ball settled into a bin and its outcome was recorded.
    BallCompleted {
        /// Identifier of the completed ball.
        ball: BallId,
        /// Bin index that received the ball.
        bin: u32,
    },
    /// Reports that a ball was removed without crediting an outcome.
    BallDropped {
        /// Identifier of the removed ball.
        ball: BallId,
        /// Inconsistency that forced the removal.
        reason: PathFault,
    },
    /// Confirms that a configuration update was accepted.
    ConfigUpdated {
        /// Configuration now in effect.
        config: BoardConfig,
    },
    /// Reports that a configuration update or start request was rejected.
    ConfigRejected {
        /// Validation failure describing the offending field.
        error: ConfigError,
    },
    /// Confirms that the board area changed and waypoints were recomputed.
    BoardAreaUpdated {
        /// Board area now in effect.
        area: BoardArea,
    },
    /// Reports that a lifecycle command did not apply to the current state.
    CommandIgnored {
        /// Command that had no effect.
        command: Command,
        /// Scheduler state observed when the command arrived.
        state: SchedulerState,
    },
    /// Publishes a refreshed running summary.
    StatsRefreshed {
        /// Summary computed over every outcome recorded so far.
        summary: StatsSummary,
    },
    /// Signals that charts derived from the histogram should be regenerated.
    ChartRefreshDue,
}

/// Unique identifier assigned to a ball, equal to its index within the run.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BallId(u32);

impl BallId {
    /// Creates a new ball identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Index of the ball within per-run collections.
    #[must_use]
    pub fn index(&self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl fmt::Display for BallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ball#{}", self.0)
    }
}

/// Lifecycle state of the animation scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SchedulerState {
    /// No run has started since the last reset or configuration change.
    #[default]
    Idle,
    /// Balls are admitted and advanced every tick.
    Running,
    /// Admission and interpolation are frozen.
    Paused,
    /// The run was terminated early; outcomes are partial.
    Stopped,
    /// Every ball completed; outcomes are final.
    Complete,
}

/// Transitions accepted by [`SchedulerState::on`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Transition {
    /// A new run begins.
    Start,
    /// The running run freezes.
    Pause,
    /// The frozen run continues.
    Resume,
    /// The active run terminates early.
    Stop,
    /// The last ball settled.
    Finish,
    /// All run state is discarded.
    Reset,
}

impl SchedulerState {
    /// Resolves the state reached by applying `transition`, or `None` when the
    /// transition is not defined for the current state.
    #[must_use]
    pub const fn on(self, transition: Transition) -> Option<Self> {
        match (self, transition) {
            (Self::Idle | Self::Stopped | Self::Complete, Transition::Start) => Some(Self::Running),
            (Self::Running, Transition::Pause) => Some(Self::Paused),
            (Self::Paused, Transition::Resume) => Some(Self::Running),
            (Self::Running | Self::Paused, Transition::Stop) => Some(Self::Stopped),
            (Self::Running, Transition::Finish) => Some(Self::Complete),
            (_, Transition::Reset) => Some(Self::Idle),
            _ => None,
        }
    }

    /// Reports whether a run currently owns the configuration.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Complete => "complete",
        };
        f.write_str(label)
    }
}

/// Board parameters that remain fixed for the duration of a run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    row_count: u32,
    deflection_probability: f64,
    ball_count: u32,
    speed: f32,
    max_concurrent_balls: u32,
    seed: Option<u64>,
}

impl BoardConfig {
    /// Row count used when no override is supplied.
    pub const DEFAULT_ROW_COUNT: u32 = 12;
    /// Probability of deflecting right used when no override is supplied.
    pub const DEFAULT_DEFLECTION_PROBABILITY: f64 = 0.5;
    /// Number of balls dropped per run when no override is supplied.
    pub const DEFAULT_BALL_COUNT: u32 = 500;
    /// Animation speed used when no override is supplied.
    pub const DEFAULT_SPEED: f32 = 6.0;
    /// Number of balls allowed in flight when no override is supplied.
    pub const DEFAULT_MAX_CONCURRENT_BALLS: u32 = 8;
    /// Largest accepted row count.
    pub const MAX_ROW_COUNT: u32 = 64;
    /// Largest accepted number of balls per run.
    pub const MAX_BALL_COUNT: u32 = 100_000;

    /// Creates a validated configuration.
    pub fn new(
        row_count: u32,
        deflection_probability: f64,
        ball_count: u32,
        speed: f32,
        max_concurrent_balls: u32,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            row_count,
            deflection_probability,
            ball_count,
            speed,
            max_concurrent_balls,
            seed: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Returns a copy of the configuration that seeds path generation deterministically.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of peg rows each ball traverses.
    #[must_use]
    pub const fn row_count(&self) -> u32 {
        self.row_count
    }

    /// Probability that a single peg deflects a ball to the right.
    #[must_use]
    pub const fn deflection_probability(&self) -> f64 {
        self.deflection_probability
    }

    /// Number of balls dropped per run.
    #[must_use]
    pub const fn ball_count(&self) -> u32 {
        self.ball_count
    }

    /// Animation speed; the per-tick step length derives from it.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Upper bound on simultaneously animated balls.
    #[must_use]
    pub const fn max_concurrent_balls(&self) -> u32 {
        self.max_concurrent_balls
    }

    /// Seed for reproducible path generation, if configured.
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Number of bins at the bottom of the board.
    #[must_use]
    pub const fn bin_count(&self) -> usize {
        self.row_count as usize + 1
    }

    /// Checks every field, reporting the first one that is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=Self::MAX_ROW_COUNT).contains(&self.row_count) {
            return Err(ConfigError::RowCount(self.row_count));
        }
        if !(0.0..=1.0).contains(&self.deflection_probability) {
            return Err(ConfigError::DeflectionProbability(
                self.deflection_probability,
            ));
        }
        if !(1..=Self::MAX_BALL_COUNT).contains(&self.ball_count) {
            return Err(ConfigError::BallCount(self.ball_count));
        }
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(ConfigError::Speed(self.speed));
        }
        if self.max_concurrent_balls < 1 {
            return Err(ConfigError::MaxConcurrentBalls(self.max_concurrent_balls));
        }
        Ok(())
    }

    /// Produces the configuration obtained by overlaying `patch`.
    ///
    /// The receiver is left untouched; the merged result is validated as a
    /// whole so a rejected patch never leaks partially into the board.
    pub fn patched(&self, patch: &ConfigPatch) -> Result<Self, ConfigError> {
        let merged = Self {
            row_count: patch.row_count.unwrap_or(self.row_count),
            deflection_probability: patch
                .deflection_probability
                .unwrap_or(self.deflection_probability),
            ball_count: patch.ball_count.unwrap_or(self.ball_count),
            speed: patch.speed.unwrap_or(self.speed),
            max_concurrent_balls: patch
                .max_concurrent_balls
                .unwrap_or(self.max_concurrent_balls),
            seed: patch.seed.or(self.seed),
        };
        merged.validate()?;
        Ok(merged)
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            row_count: Self::DEFAULT_ROW_COUNT,
            deflection_probability: Self::DEFAULT_DEFLECTION_PROBABILITY,
            ball_count: Self::DEFAULT_BALL_COUNT,
            speed: Self::DEFAULT_SPEED,
            max_concurrent_balls: Self::DEFAULT_MAX_CONCURRENT_BALLS,
            seed: None,
        }
    }
}

/// Partial configuration update; absent fields keep their current values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigPatch {
    /// Replacement row count.
    pub row_count: Option<u32>,
    /// Replacement deflection probability.
    pub deflection_probability: Option<f64>,
    /// Replacement ball count.
    pub ball_count: Option<u32>,
    /// Replacement animation speed.
    pub speed: Option<f32>,
    /// Replacement concurrency cap.
    pub max_concurrent_balls: Option<u32>,
    /// Seed enabling reproducible runs.
    ///
    /// Leaving it unset keeps the current seed; only [`Command::Reset`]
    /// returns the board to entropy-seeded runs.
    pub seed: Option<u64>,
}

impl ConfigPatch {
    /// Reports whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlays `other` on top of `self`, preferring fields set in `other`.
    #[must_use]
    pub fn merge(self, other: ConfigPatch) -> Self {
        Self {
            row_count: other.row_count.or(self.row_count),
            deflection_probability: other.deflection_probability.or(self.deflection_probability),
            ball_count: other.ball_count.or(self.ball_count),
            speed: other.speed.or(self.speed),
            max_concurrent_balls: other.max_concurrent_balls.or(self.max_concurrent_balls),
            seed: other.seed.or(self.seed),
        }
    }
}

/// Configuration fields that can fail validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigField {
    /// [`BoardConfig::row_count`].
    RowCount,
    /// [`BoardConfig::deflection_probability`].
    DeflectionProbability,
    /// [`BoardConfig::ball_count`].
    BallCount,
    /// [`BoardConfig::speed`].
    Speed,
    /// [`BoardConfig::max_concurrent_balls`].
    MaxConcurrentBalls,
    /// The board area used for waypoint layout.
    BoardArea,
}

/// Reasons a configuration update may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The row count is zero or above [`BoardConfig::MAX_ROW_COUNT`].
    #[error("row_count must lie within [1, {max}] (received {0})", max = BoardConfig::MAX_ROW_COUNT)]
    RowCount(u32),
    /// The probability lies outside `[0, 1]` or is not a number.
    #[error("deflection_probability must lie within [0, 1] (received {0})")]
    DeflectionProbability(f64),
    /// The ball count is zero or above [`BoardConfig::MAX_BALL_COUNT`].
    #[error("ball_count must lie within [1, {max}] (received {0})", max = BoardConfig::MAX_BALL_COUNT)]
    BallCount(u32),
    /// The speed is zero, negative or not finite.
    #[error("speed must be positive and finite (received {0})")]
    Speed(f32),
    /// The concurrency cap is zero.
    #[error("max_concurrent_balls must be at least 1 (received {0})")]
    MaxConcurrentBalls(u32),
    /// The board area leaves no usable interior.
    #[error("board area {0:?} leaves no usable interior")]
    BoardArea(BoardArea),
    /// Configuration edits are refused while a run owns the board.
    #[error("configuration cannot change while the run is {0}")]
    RunActive(SchedulerState),
}

impl ConfigError {
    /// Field responsible for the rejection, if the failure concerns a single field.
    #[must_use]
    pub const fn field(&self) -> Option<ConfigField> {
        match self {
            Self::RowCount(_) => Some(ConfigField::RowCount),
            Self::DeflectionProbability(_) => Some(ConfigField::DeflectionProbability),
            Self::BallCount(_) => Some(ConfigField::BallCount),
            Self::Speed(_) => Some(ConfigField::Speed),
            Self::MaxConcurrentBalls(_) => Some(ConfigField::MaxConcurrentBalls),
            Self::BoardArea(_) => Some(ConfigField::BoardArea),
            Self::RunActive(_) => None,
        }
    }
}

/// Rectangular screen region that hosts pegs and bins.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardArea {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    margin: f32,
}

impl BoardArea {
    /// Creates a validated board area anchored at its top-left corner.
    pub fn new(origin: Vec2, width: f32, height: f32, margin: f32) -> Result<Self, ConfigError> {
        let area = Self {
            x: origin.x,
            y: origin.y,
            width,
            height,
            margin,
        };
        area.validate()?;
        Ok(area)
    }

    /// Checks that the area is finite and leaves room inside its margins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            self.x,
            self.y,
            self.width,
            self.height,
            self.margin,
        ]
        .iter()
        .all(|value| value.is_finite());
        let roomy = self.margin >= 0.0
            && self.width > 2.0 * self.margin
            && self.height > 2.0 * self.margin;
        if finite && roomy {
            Ok(())
        } else {
            Err(ConfigError::BoardArea(*self))
        }
    }

    /// Top-left corner of the area.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Horizontal extent of the area.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Vertical extent of the area.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Inset kept free of waypoints along every edge.
    #[must_use]
    pub const fn margin(&self) -> f32 {
        self.margin
    }

    /// Left edge coordinate.
    #[must_use]
    pub const fn left(&self) -> f32 {
        self.x
    }

    /// Top edge coordinate.
    #[must_use]
    pub const fn top(&self) -> f32 {
        self.y
    }

    /// Right edge coordinate.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge coordinate.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Geometric centre of the area.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.x + self.width * 0.5,
            self.y + self.height * 0.5,
        )
    }
}

impl Default for BoardArea {
    fn default() -> Self {
        Self {
            x: 300.0,
            y: 100.0,
            width: 600.0,
            height: 480.0,
            margin: 20.0,
        }
    }
}

/// Predetermined route of a single ball through the board.
///
/// Entry `r` holds the cumulative number of rightward deflections after row
/// `r`, so the final entry is the bin index the ball settles into.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BallPath {
    positions: Vec<u32>,
}

impl BallPath {
    /// Wraps the provided cumulative deflection counts.
    #[must_use]
    pub fn new(positions: Vec<u32>) -> Self {
        Self { positions }
    }

    /// Number of rows covered by the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Reports whether the path covers no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Cumulative rightward deflections after `row`.
    #[must_use]
    pub fn position_after(&self, row: u32) -> Option<u32> {
        usize::try_from(row)
            .ok()
            .and_then(|index| self.positions.get(index))
            .copied()
    }

    /// Bin index reached after the last row.
    #[must_use]
    pub fn final_bin(&self) -> Option<u32> {
        self.positions.last().copied()
    }

    /// Underlying cumulative deflection counts.
    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.positions
    }

    /// Checks the path against the row count it is expected to traverse.
    ///
    /// Values must start at zero or one and grow by at most one per row.
    pub fn check(&self, row_count: u32) -> Result<(), PathFault> {
        let expected = usize::try_from(row_count).unwrap_or(usize::MAX);
        if self.positions.len() != expected {
            return Err(PathFault::LengthMismatch {
                expected: row_count,
                actual: u32::try_from(self.positions.len()).unwrap_or(u32::MAX),
            });
        }

        let mut previous = 0;
        for (row, &value) in (0u32..).zip(self.positions.iter()) {
            if !matches!(value.checked_sub(previous), Some(0 | 1)) {
                return Err(PathFault::ColumnOutOfRange { row, column: value });
            }
            previous = value;
        }
        Ok(())
    }
}

/// Inconsistencies that force a ball to leave the board without an outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum PathFault {
    /// No path was generated for the ball.
    #[error("no path exists for the ball")]
    MissingPath,
    /// The path does not cover every row of the board.
    #[error("path covers {actual} rows but the board has {expected}")]
    LengthMismatch {
        /// Rows on the board.
        expected: u32,
        /// Rows covered by the path.
        actual: u32,
    },
    /// A path entry names a peg column that does not exist.
    #[error("column {column} does not exist after row {row}")]
    ColumnOutOfRange {
        /// Row whose entry is inconsistent.
        row: u32,
        /// Offending cumulative deflection count.
        column: u32,
    },
    /// The final bin lies outside the histogram.
    #[error("bin {bin} lies outside the histogram")]
    BinOutOfRange {
        /// Offending bin index.
        bin: u32,
    },
}

/// Waypoint a ball is currently heading towards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlightLeg {
    /// Heading to the peg at the provided row and column.
    Peg {
        /// Row of the target peg.
        row: u32,
        /// Column of the target peg.
        column: u32,
    },
    /// Heading to the bin; the next arrival finalizes the ball.
    Bin {
        /// Index of the target bin.
        bin: u32,
    },
}

/// Immutable representation of a single in-flight ball used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlightSnapshot {
    /// Identifier of the ball.
    pub ball: BallId,
    /// Index of the last path entry consumed; `-1` before the first peg.
    pub current_row: i32,
    /// Current interpolated position.
    pub position: Vec2,
    /// Position of the waypoint being approached.
    pub target: Vec2,
    /// Waypoint kind being approached.
    pub leg: FlightLeg,
}

/// Read-only snapshot describing every in-flight ball.
#[derive(Clone, Debug, Default)]
pub struct FlightView {
    snapshots: Vec<FlightSnapshot>,
}

impl FlightView {
    /// Creates a new flight view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<FlightSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.ball);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in ball order.
    pub fn iter(&self) -> impl Iterator<Item = &FlightSnapshot> {
        self.snapshots.iter()
    }

    /// Number of balls in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no ball is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Looks up the snapshot for a specific ball.
    #[must_use]
    pub fn get(&self, ball: BallId) -> Option<&FlightSnapshot> {
        self.snapshots
            .binary_search_by_key(&ball, |snapshot| snapshot.ball)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<FlightSnapshot> {
        self.snapshots
    }
}

/// Count, mean and standard deviation of recorded outcomes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    /// Number of outcomes contributing to the summary.
    pub count: u64,
    /// Arithmetic mean of the outcomes.
    pub mean: f64,
    /// Population standard deviation of the outcomes.
    pub std_dev: f64,
}

/// Binomial expectation for the configured board.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TheoreticalStats {
    /// Expected bin index, `rows × p`.
    pub mean: f64,
    /// Expected spread, `sqrt(rows × p × (1 − p))`.
    pub std_dev: f64,
}

/// Snapshot of per-bin completion counts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HistogramView {
    counts: Vec<u64>,
}

impl HistogramView {
    /// Wraps the provided bin counts.
    #[must_use]
    pub fn from_counts(counts: Vec<u64>) -> Self {
        Self { counts }
    }

    /// Count recorded for `bin`, or `None` outside the histogram.
    #[must_use]
    pub fn get(&self, bin: usize) -> Option<u64> {
        self.counts.get(bin).copied()
    }

    /// Number of bins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Reports whether the histogram has no bins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all bin counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Largest bin count, or zero for an empty histogram.
    #[must_use]
    pub fn max(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Bin counts in bin order.
    #[must_use]
    pub fn as_slice(&self) -> &[u64] {
        &self.counts
    }
}
