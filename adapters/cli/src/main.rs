#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Galton board simulation headlessly.

mod config_file;
mod headless;
mod report;

use std::{path::PathBuf, process::ExitCode};

use anyhow::{anyhow, Context, Result as AnyResult};
use clap::Parser;
use galton_board_core::{Command, ConfigPatch};
use galton_board_rendering::{palette, Presentation, RenderingBackend, Scene};
use galton_board_world::{self as world, World};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::headless::HeadlessBackend;

/// Command-line arguments accepted by the simulation driver.
#[derive(Parser, Debug)]
#[command(name = "galton-board", author, version, about = "Drops balls through a Galton board and reports the resulting distribution")]
struct Cli {
    /// TOML file with `[board]` and optional `[area]` tables.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of balls dropped in the run.
    #[arg(long)]
    balls: Option<u32>,

    /// Number of peg rows.
    #[arg(long)]
    rows: Option<u32>,

    /// Probability that a peg deflects a ball to the right.
    #[arg(long)]
    probability: Option<f64>,

    /// Animation speed; larger values move balls further per frame.
    #[arg(long)]
    speed: Option<f32>,

    /// Upper bound on balls animated at once.
    #[arg(long)]
    max_concurrent: Option<u32>,

    /// Seed for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    /// Frames simulated before giving up on the run.
    #[arg(long, default_value_t = 1_000_000)]
    max_frames: u64,

    /// Tracing filter, e.g. `debug` or `galton_board_world=debug`; overrides `RUST_LOG`.
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    fn flag_patch(&self) -> ConfigPatch {
        ConfigPatch {
            row_count: self.rows,
            deflection_probability: self.probability,
            ball_count: self.balls,
            speed: self.speed,
            max_concurrent_balls: self.max_concurrent,
            seed: self.seed,
        }
    }
}

/// Entry point for the Galton board command-line interface.
fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(error) = init_tracing(cli.log_level.as_deref()) {
        eprintln!("failed to initialise logging: {error:#}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(report) => {
            print!("{report}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            error!("{error:#}");
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: Option<&str>) -> AnyResult<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).with_context(|| format!("invalid log level `{level}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!(error))
}

fn run(cli: &Cli) -> AnyResult<String> {
    let file = match &cli.config {
        Some(path) => config_file::load(path)?,
        None => config_file::BoardFile::default(),
    };
    let patch = file.board.merge(cli.flag_patch());

    let mut world = World::new();
    let mut events = Vec::new();
    if let Some(area) = file.area {
        world::apply(&mut world, Command::ConfigureBoardArea { area }, &mut events)
            .context("board area rejected")?;
    }
    if !patch.is_empty() {
        world::apply(&mut world, Command::Configure { patch }, &mut events)
            .context("configuration rejected")?;
    }
    events.clear();

    let presentation = Presentation::new(
        "Galton Board Simulation",
        palette::BACKGROUND,
        Scene::capture(&world),
    );
    HeadlessBackend::new(cli.max_frames).run(presentation, |input, scene| {
        for command in input.commands() {
            world::apply(&mut world, command, &mut events)?;
        }
        world::apply(&mut world, Command::Tick, &mut events)?;
        events.clear();

        *scene = Scene::capture(&world);
        if world::take_chart_refresh(&mut world) {
            debug!(status = %scene.status_label(), "chart refresh");
        }
        Ok(())
    })?;

    let scene = Scene::capture(&world);
    info!(
        ticks = world::query::tick_index(&world),
        completed = scene.completed,
        mean = scene.observed.mean,
        std_dev = scene.observed.std_dev,
        "simulation finished"
    );
    Ok(report::render(&scene))
}
