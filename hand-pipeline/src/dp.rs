//! Display task: renders every snapshot the inference task publishes.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::pixelcolor::Rgb565;
use hand_shared::DisplayInfo;

use crate::button::{Button, ButtonInput};
use crate::engine::{Clock, DmaBarrier, Region};
use crate::error::{halt, Fatal};
use crate::render::Renderer;
use crate::Pipeline;

/// Double-buffered overlay layer of the display controller
pub trait Compositor {
    type Target: DrawTarget<Color = Rgb565>;

    /// Index and surface of the overlay buffer not being scanned out
    fn drawing_area(&mut self) -> (usize, &mut Self::Target);

    /// Scans out the buffer just drawn and flips
    fn commit(&mut self) -> Result<(), Fatal>;
}

pub struct DisplayTask<C, K, X, L, D>
where
    C: Compositor,
    K: Clock,
    X: DmaBarrier,
    L: ButtonInput,
    D: ButtonInput,
{
    compositor: C,
    renderer: Renderer,
    clock: K,
    barrier: X,
    landmark_button: Button<L>,
    detection_button: Button<D>,
    disp_ms: u32,
}

impl<C, K, X, L, D> DisplayTask<C, K, X, L, D>
where
    C: Compositor,
    K: Clock,
    X: DmaBarrier,
    L: ButtonInput,
    D: ButtonInput,
{
    pub fn new(compositor: C, renderer: Renderer, clock: K, barrier: X, landmark_button: L, detection_button: D) -> Self {
        Self {
            compositor,
            renderer,
            clock,
            barrier,
            landmark_button: Button::new(landmark_button),
            detection_button: Button::new(detection_button),
            disp_ms: 0,
        }
    }

    pub fn compositor(&self) -> &C {
        &self.compositor
    }

    /// Waits for an update and renders it. Returns the snapshot drawn.
    pub async fn step<M: RawMutex, B: Copy>(&mut self, pipeline: &Pipeline<M, B>) -> Result<DisplayInfo, Fatal> {
        pipeline.display.wait_update().await;

        if self.landmark_button.poll() {
            pipeline.display.toggle_landmarks();
        }
        if self.detection_button.poll() {
            pipeline.display.toggle_detection();
        }

        let mut info = pipeline.display.snapshot();
        info.disp_ms = self.disp_ms;

        let start = self.clock.now_ms();
        let (idx, target) = self.compositor.drawing_area();
        self.renderer
            .render(target, &info)
            .map_err(|_| Fatal::Display("overlay draw failed"))?;
        self.barrier.publish(Region::Overlay(idx));
        self.compositor.commit()?;
        self.disp_ms = self.clock.now_ms().wrapping_sub(start);

        Ok(info)
    }

    pub async fn run<M: RawMutex, B: Copy>(mut self, pipeline: &Pipeline<M, B>) {
        loop {
            if let Err(fatal) = self.step(pipeline).await {
                halt(fatal);
            }
        }
    }
}
