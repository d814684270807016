//! Frame driver that runs the simulation without a window.

use anyhow::Result as AnyResult;
use galton_board_core::SchedulerState;
use galton_board_rendering::{
    FrameInput, Presentation, RenderingBackend, RenderingError, Scene,
};
use tracing::info;

/// Backend that presses start on the first frame and ticks until the run ends.
#[derive(Clone, Copy, Debug)]
pub(crate) struct HeadlessBackend {
    max_frames: u64,
}

impl HeadlessBackend {
    /// Creates a backend that gives up after `max_frames` frames.
    pub(crate) const fn new(max_frames: u64) -> Self {
        Self { max_frames }
    }
}

impl RenderingBackend for HeadlessBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> AnyResult<()>
    where
        F: FnMut(FrameInput, &mut Scene) -> AnyResult<()>,
    {
        let Presentation {
            window_title,
            mut scene,
            ..
        } = presentation;
        info!(title = %window_title, max_frames = self.max_frames, "headless session started");

        let mut input = FrameInput {
            start: true,
            ..FrameInput::default()
        };
        for frame in 1..=self.max_frames {
            update_scene(input, &mut scene)?;
            input = FrameInput::default();
            if matches!(
                scene.state,
                SchedulerState::Complete | SchedulerState::Stopped
            ) {
                info!(frames = frame, state = %scene.state, "headless session finished");
                return Ok(());
            }
        }
        Err(RenderingError::FrameBudgetExhausted {
            frames: self.max_frames,
        }
        .into())
    }
}
