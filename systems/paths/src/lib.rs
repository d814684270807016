#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Path generation system that fixes every ball's route before animation begins.
//!
//! Each ball performs one independent Bernoulli trial per row. A trial draws a
//! fresh uniform sample in `[0, 1)` and deflects the ball right when the sample
//! is below the configured probability, so `p = 0` never deflects and `p = 1`
//! always does.

use galton_board_core::{BallPath, BoardConfig};
use rand::{rngs::OsRng, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::debug;

/// Failures that prevent paths from being generated.
#[derive(Debug, Error)]
pub enum PathError {
    /// The operating system could not provide entropy to seed the generator.
    #[error("random source unavailable: {0}")]
    RandomSource(#[from] rand::Error),
}

/// Generates the route of a single ball across `row_count` rows.
pub fn generate_path<R>(rng: &mut R, row_count: u32, probability: f64) -> BallPath
where
    R: Rng + ?Sized,
{
    let mut position = 0;
    let positions = (0..row_count)
        .map(|_| {
            if rng.gen::<f64>() < probability {
                position += 1;
            }
            position
        })
        .collect();
    BallPath::new(positions)
}

/// Generates one independent route per ball, indexed by ball id.
pub fn generate_paths<R>(
    rng: &mut R,
    ball_count: u32,
    row_count: u32,
    probability: f64,
) -> Vec<BallPath>
where
    R: Rng + ?Sized,
{
    (0..ball_count)
        .map(|_| generate_path(rng, row_count, probability))
        .collect()
}

/// Stateful generator that owns the seeding policy across runs.
///
/// With a configured seed, run `k` uses `seed + k` so consecutive runs differ
/// yet replay identically. Without one, every run is seeded from the OS.
#[derive(Debug, Default)]
pub struct PathGenerator {
    runs: u64,
}

impl PathGenerator {
    /// Creates a generator that has not produced any run yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of runs generated so far.
    #[must_use]
    pub const fn runs(&self) -> u64 {
        self.runs
    }

    /// Produces the full set of paths for a run described by `config`.
    pub fn generate(&mut self, config: &BoardConfig) -> Result<Vec<BallPath>, PathError> {
        let mut rng = self.rng_for_next_run(config.seed())?;
        let paths = generate_paths(
            &mut rng,
            config.ball_count(),
            config.row_count(),
            config.deflection_probability(),
        );
        debug!(
            run = self.runs,
            balls = paths.len(),
            rows = config.row_count(),
            "generated ball paths"
        );
        self.runs = self.runs.wrapping_add(1);
        Ok(paths)
    }

    fn rng_for_next_run(&self, seed: Option<u64>) -> Result<ChaCha8Rng, PathError> {
        match seed {
            Some(seed) => Ok(ChaCha8Rng::seed_from_u64(seed.wrapping_add(self.runs))),
            None => Ok(ChaCha8Rng::from_rng(OsRng)?),
        }
    }
}
