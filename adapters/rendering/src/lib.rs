#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Galton board adapters.
//!
//! Backends never touch the world directly. Each frame they hand the adapter a
//! [`FrameInput`], the adapter converts it into commands, applies them plus a
//! tick, and refreshes the [`Scene`] from the world's read-only queries.

use anyhow::Result as AnyResult;
use galton_board_core::{
    BallId, BoardArea, BoardConfig, Command, ConfigPatch, FlightLeg, SchedulerState,
    StatsSummary, TheoreticalStats,
};
use galton_board_world::{query, World};
use glam::Vec2;
use std::{error::Error, fmt};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Colors shared by every backend.
pub mod palette {
    use super::Color;

    /// Background cleared at the start of every frame.
    pub const BACKGROUND: Color = Color::from_rgb_u8(255, 255, 255);
    /// Peg fill.
    pub const PEG: Color = Color::from_rgb_u8(64, 64, 64);
    /// In-flight ball fill.
    pub const BALL: Color = Color::from_rgb_u8(220, 50, 50);
    /// Fill of a bin holding the largest count.
    pub const BIN: Color = Color::from_rgb_u8(30, 90, 160);
    /// Observed histogram bars.
    pub const OBSERVED: Color = Color::from_rgb_u8(70, 130, 180);
    /// Theoretical distribution overlay.
    pub const EXPECTED: Color = Color::from_rgb_u8(255, 140, 0);
}

/// Configuration sliders offered by the control panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SliderKind {
    /// Number of balls per run, in steps of fifty.
    Balls,
    /// Number of peg rows.
    Rows,
    /// Probability of a rightward deflection, in hundredths.
    Probability,
    /// Animation speed.
    Speed,
    /// Number of balls allowed in flight at once.
    MaxConcurrent,
}

impl SliderKind {
    /// Every slider in control-panel order.
    pub const ALL: [Self; 5] = [
        Self::Balls,
        Self::Rows,
        Self::Probability,
        Self::Speed,
        Self::MaxConcurrent,
    ];

    /// Label shown next to the slider.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Balls => "Number of Balls",
            Self::Rows => "Number of Rows",
            Self::Probability => "Probability (Right)",
            Self::Speed => "Animation Speed",
            Self::MaxConcurrent => "Multi-Ball Count",
        }
    }

    /// Inclusive value range covered by the slider track.
    #[must_use]
    pub const fn range(self) -> (f64, f64) {
        match self {
            Self::Balls => (100.0, 1000.0),
            Self::Rows => (5.0, 18.0),
            Self::Probability => (0.1, 0.9),
            Self::Speed => (1.0, 100.0),
            Self::MaxConcurrent => (1.0, 25.0),
        }
    }

    /// Configuration update produced by releasing the knob at `ratio` along the track.
    #[must_use]
    pub fn patch_at(self, ratio: f32) -> ConfigPatch {
        let (min, max) = self.range();
        let ratio = if ratio.is_nan() {
            0.0
        } else {
            f64::from(ratio.clamp(0.0, 1.0))
        };
        let raw = min + ratio * (max - min);
        let mut patch = ConfigPatch::default();
        match self {
            Self::Balls => {
                let stepped = ((raw / 50.0).floor() * 50.0).clamp(min, max);
                patch.ball_count = Some(stepped as u32);
            }
            Self::Rows => patch.row_count = Some(raw.round().clamp(min, max) as u32),
            Self::Probability => {
                let hundredths = (raw * 100.0).round() / 100.0;
                patch.deflection_probability = Some(hundredths.clamp(min, max));
            }
            Self::Speed => patch.speed = Some(raw.round().clamp(min, max) as f32),
            Self::MaxConcurrent => {
                patch.max_concurrent_balls = Some(raw.round().clamp(min, max) as u32);
            }
        }
        patch
    }

    /// Knob position, in `[0, 1]`, that represents the configured value.
    #[must_use]
    pub fn ratio_of(self, config: &BoardConfig) -> f32 {
        let value = match self {
            Self::Balls => f64::from(config.ball_count()),
            Self::Rows => f64::from(config.row_count()),
            Self::Probability => config.deflection_probability(),
            Self::Speed => f64::from(config.speed()),
            Self::MaxConcurrent => f64::from(config.max_concurrent_balls()),
        };
        let (min, max) = self.range();
        ((value - min) / (max - min)).clamp(0.0, 1.0) as f32
    }
}

/// Slider interaction observed during a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliderInput {
    /// Slider being dragged.
    pub kind: SliderKind,
    /// Knob position along the track in `[0, 1]`.
    pub ratio: f32,
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Start button, `Enter` or `Space`.
    pub start: bool,
    /// Pause/resume button or `P`.
    pub toggle_pause: bool,
    /// Stop button.
    pub stop: bool,
    /// Reset button or `R`.
    pub reset: bool,
    /// Window close, `Q` or `Escape`.
    pub quit: bool,
    /// Slider dragged during the frame, if any.
    pub slider: Option<SliderInput>,
}

impl FrameInput {
    /// Translates the frame's input into world commands, in application order.
    ///
    /// Quitting is a backend concern and produces no command. The caller
    /// appends [`Command::Tick`] after these.
    #[must_use]
    pub fn commands(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        if self.reset {
            commands.push(Command::Reset);
        }
        if self.stop {
            commands.push(Command::Stop);
        }
        if let Some(slider) = self.slider {
            commands.push(Command::Configure {
                patch: slider.kind.patch_at(slider.ratio),
            });
        }
        if self.start {
            commands.push(Command::Start);
        }
        if self.toggle_pause {
            commands.push(Command::TogglePause);
        }
        commands
    }

    /// Combines two input sources, keeping every press seen by either.
    #[must_use]
    pub fn merge(self, other: FrameInput) -> Self {
        Self {
            start: self.start || other.start,
            toggle_pause: self.toggle_pause || other.toggle_pause,
            stop: self.stop || other.stop,
            reset: self.reset || other.reset,
            quit: self.quit || other.quit,
            slider: other.slider.or(self.slider),
        }
    }
}

/// Latches control-panel button presses so each fires for exactly one frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct ControlPanelInputState {
    start_latched: bool,
    pause_latched: bool,
    stop_latched: bool,
    reset_latched: bool,
    slider_latched: Option<SliderInput>,
}

impl ControlPanelInputState {
    /// Records that the run button was pressed.
    pub fn register_start(&mut self) {
        self.start_latched = true;
    }

    /// Records that the pause/resume button was pressed.
    pub fn register_pause_toggle(&mut self) {
        self.pause_latched = true;
    }

    /// Records that the stop button was pressed.
    pub fn register_stop(&mut self) {
        self.stop_latched = true;
    }

    /// Records that the reset button was pressed.
    pub fn register_reset(&mut self) {
        self.reset_latched = true;
    }

    /// Records the most recent slider position; later drags replace earlier ones.
    pub fn register_slider(&mut self, kind: SliderKind, ratio: f32) {
        self.slider_latched = Some(SliderInput { kind, ratio });
    }

    /// Returns the latched presses as frame input and clears every latch.
    pub fn take_frame_input(&mut self) -> FrameInput {
        let input = FrameInput {
            start: self.start_latched,
            toggle_pause: self.pause_latched,
            stop: self.stop_latched,
            reset: self.reset_latched,
            quit: false,
            slider: self.slider_latched,
        };
        *self = Self::default();
        input
    }
}

/// Bin drawn beneath the peg field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BinPresentation {
    /// Bin index, equal to the number of rightward deflections.
    pub index: u32,
    /// Centre of the bin mouth.
    pub position: Vec2,
    /// Balls collected so far.
    pub count: u64,
    /// Count relative to the fullest bin, in `[0, 1]`.
    pub fill: f32,
}

impl BinPresentation {
    /// Fill color, fading towards white for emptier bins.
    #[must_use]
    pub fn color(&self) -> Color {
        palette::BIN.lighten(1.0 - self.fill)
    }
}

/// Ball currently animating between waypoints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BallPresentation {
    /// Identifier of the ball.
    pub id: BallId,
    /// Interpolated position.
    pub position: Vec2,
    /// Waypoint the ball is heading towards.
    pub target: Vec2,
    /// Last peg row passed, `-1` before the first peg.
    pub row: i32,
    /// Whether the ball is on its final leg into a bin.
    pub heading_to_bin: bool,
}

/// Histogram bar comparing observed and expected shares of one bin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HistogramBar {
    /// Bin index.
    pub bin: u32,
    /// Balls collected in the bin.
    pub count: u64,
    /// Share of completed balls that landed in the bin.
    pub observed: f64,
    /// Binomial probability of landing in the bin.
    pub expected: f64,
}

/// Scene description combining the board, in-flight balls and the charts.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Area that hosts pegs and bins.
    pub board: BoardArea,
    /// Peg positions in row-major order.
    pub pegs: Vec<Vec2>,
    /// Bins in index order.
    pub bins: Vec<BinPresentation>,
    /// Balls in flight, ordered by id.
    pub balls: Vec<BallPresentation>,
    /// Histogram chart bars in bin order.
    pub bars: Vec<HistogramBar>,
    /// Running summary of the observed outcomes.
    pub observed: StatsSummary,
    /// Binomial expectation for the configuration.
    pub theoretical: TheoreticalStats,
    /// Fraction of the run's balls already collected.
    pub progress: f64,
    /// Scheduler state at capture time.
    pub state: SchedulerState,
    /// Balls collected in the current or last run.
    pub completed: u32,
    /// Balls scheduled for the current or last run.
    pub ball_count: u32,
}

impl Scene {
    /// Captures the presentable state of `world`.
    #[must_use]
    pub fn capture(world: &World) -> Self {
        let histogram = query::histogram(world);
        let max_count = histogram.max();
        let bins = query::bins(world)
            .iter()
            .zip(0u32..)
            .map(|(&position, index)| {
                let count = histogram.get(index as usize).unwrap_or(0);
                BinPresentation {
                    index,
                    position,
                    count,
                    fill: share(count, max_count) as f32,
                }
            })
            .collect();

        let balls = query::flight_view(world)
            .iter()
            .map(|flight| BallPresentation {
                id: flight.ball,
                position: flight.position,
                target: flight.target,
                row: flight.current_row,
                heading_to_bin: matches!(flight.leg, FlightLeg::Bin { .. }),
            })
            .collect();

        let config = query::config(world);
        let total = histogram.total();
        let bars = histogram
            .as_slice()
            .iter()
            .zip(binomial_distribution(
                config.row_count(),
                config.deflection_probability(),
            ))
            .zip(0u32..)
            .map(|((&count, expected), bin)| HistogramBar {
                bin,
                count,
                observed: share(count, total),
                expected,
            })
            .collect();

        let counts = query::counts(world);
        Self {
            board: query::board_area(world),
            pegs: query::pegs(world),
            bins,
            balls,
            bars,
            observed: query::summary(world),
            theoretical: query::theoretical(world),
            progress: query::progress(world),
            state: query::state(world),
            completed: counts.completed,
            ball_count: counts.scheduled,
        }
    }

    /// Progress line such as `"42.0% | 3 falling"`.
    #[must_use]
    pub fn status_label(&self) -> String {
        let mut label = format!("{:.1}%", self.progress * 100.0);
        if !self.balls.is_empty() {
            label.push_str(&format!(" | {} falling", self.balls.len()));
        }
        label
    }

    /// Caption of the run button.
    #[must_use]
    pub fn run_button_label(&self) -> &'static str {
        if self.state == SchedulerState::Running {
            "RUNNING"
        } else {
            "START"
        }
    }

    /// Caption of the pause/resume button.
    #[must_use]
    pub fn pause_button_label(&self) -> &'static str {
        if self.state == SchedulerState::Paused {
            "RESUME"
        } else {
            "PAUSE"
        }
    }
}

/// Probability of each bin for `rows` independent deflections with probability `p`.
#[must_use]
pub fn binomial_distribution(rows: u32, probability: f64) -> Vec<f64> {
    let mut distribution = vec![1.0];
    for _ in 0..rows {
        let mut next = vec![0.0; distribution.len() + 1];
        for (bin, weight) in distribution.iter().enumerate() {
            next[bin] += weight * (1.0 - probability);
            next[bin + 1] += weight * probability;
        }
        distribution = next;
    }
    distribution
}

fn share(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Galton board scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The backend calls `update_scene` once per frame with the input it
    /// captured. The closure advances the simulation by one tick and refreshes
    /// the scene before the backend presents it.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(FrameInput, &mut Scene) -> AnyResult<()>;
}

/// Errors that backends report when a session ends abnormally.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderingError {
    /// The run did not finish within the permitted number of frames.
    FrameBudgetExhausted {
        /// Frames presented before giving up.
        frames: u64,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameBudgetExhausted { frames } => {
                write!(f, "run did not finish within {frames} frames")
            }
        }
    }
}

impl Error for RenderingError {}
