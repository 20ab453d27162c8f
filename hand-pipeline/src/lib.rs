#![cfg_attr(not(feature = "std"), no_std)]

//! Capture, inference and display tasks around the hand tracker.
//!
//! All shared state lives in one [`Pipeline`], created once at startup and
//! borrowed by the camera interrupt handlers and the tasks for the rest of
//! the program.

pub mod bqueue;
pub mod button;
pub mod capture;
pub mod config;
pub mod display;
pub mod dp;
pub mod engine;
pub mod error;
pub mod isp;
pub mod nn;
pub mod render;
pub mod stats;
pub mod sync;

use embassy_sync::blocking_mutex::raw::RawMutex;
use log::{info, warn};

pub use bqueue::{BufferQueue, BQUEUE_MAX_BUFFERS};
pub use capture::{CameraPipes, CaptureState, PipeId};
pub use config::PipelineConfig;
pub use display::SharedDisplay;
pub use error::{halt, Fatal};

use crate::sync::Semaphore;

pub struct Pipeline<M: RawMutex, B: Copy> {
    config: PipelineConfig,
    pub queue: BufferQueue<M, B>,
    pub display: SharedDisplay<M>,
    pub capture: CaptureState,
    isp: Semaphore<M>,
}

impl<M: RawMutex, B: Copy> Pipeline<M, B> {
    /// `nn_buffers` are the detector input buffers cycled through the queue
    pub fn new(config: PipelineConfig, nn_buffers: &[B]) -> Result<Self, Fatal> {
        Ok(Self {
            config,
            queue: BufferQueue::new(nn_buffers)?,
            display: SharedDisplay::new(),
            capture: CaptureState::new(config.display_buffers()),
            isp: Semaphore::new(0, 1),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Starts both camera pipes. Call once, before the camera interrupts fire.
    pub fn start<P: CameraPipes<B>>(&self, pipes: &mut P) -> Result<(), Fatal> {
        let first = self
            .queue
            .try_acquire_free()
            .ok_or(Fatal::Pipe("no free buffer for the nn pipe"))?;

        pipes.start_nn_pipe(first)?;
        pipes.start_display_pipe(0)?;

        info!(
            "pipeline started: {}x{}, {} nn buffers, {} display buffers",
            self.config.bounds.width,
            self.config.bounds.height,
            self.queue.len(),
            self.capture.ring()
        );

        Ok(())
    }

    /// Display pipe frame complete (interrupt context)
    pub fn on_primary_frame<P: CameraPipes<B>>(&self, pipes: &mut P) -> Result<(), Fatal> {
        self.capture.on_primary_frame(pipes)
    }

    /// Auxiliary pipe frame complete (interrupt context)
    pub fn on_auxiliary_frame<P: CameraPipes<B>>(&self, pipes: &mut P) -> Result<(), Fatal> {
        self.capture.on_auxiliary_frame(&self.queue, pipes)
    }

    /// Display pipe vsync (interrupt context)
    pub fn on_vsync(&self) {
        // the ISP task runs at most once per pending vsync
        let _ = self.isp.release();
    }

    pub fn on_pipe_error(&self, pipe: PipeId) {
        warn!("camera pipe error on {:?}", pipe);
    }

    pub async fn wait_vsync(&self) {
        self.isp.acquire().await
    }
}
