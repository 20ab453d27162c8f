//! Camera interrupt handlers.
//!
//! Two pipes run off the same sensor. The display pipe writes full frames into
//! a ring of display buffers, the auxiliary pipe writes the downscaled
//! detector input into `BufferQueue` buffers. Every frame, the display pipe
//! completes before the auxiliary pipe.

use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::bqueue::BufferQueue;
use crate::error::Fatal;

/// Camera pipes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeId {
    Display,
    Auxiliary,
}

/// Commands the handlers issue to the camera and the compositor
pub trait CameraPipes<B> {
    fn start_display_pipe(&mut self, frame_idx: usize) -> Result<(), Fatal>;

    fn start_nn_pipe(&mut self, buffer: B) -> Result<(), Fatal>;

    /// Where the display pipe writes its next frame
    fn set_display_target(&mut self, frame_idx: usize) -> Result<(), Fatal>;

    /// Where the auxiliary pipe writes its next frame
    fn set_nn_target(&mut self, buffer: B) -> Result<(), Fatal>;

    /// Scans out display frame `frame_idx` as the background layer
    fn show_frame(&mut self, frame_idx: usize) -> Result<(), Fatal>;
}

pub struct CaptureState {
    ring: usize,
    disp_idx: AtomicUsize,
    capt_idx: AtomicUsize,
    frame_event_nb: AtomicU32,
    frame_for_resize: AtomicU32,
}

impl CaptureState {
    /// `ring` display buffers, at least two
    pub const fn new(ring: usize) -> Self {
        Self {
            ring,
            disp_idx: AtomicUsize::new(1),
            capt_idx: AtomicUsize::new(0),
            frame_event_nb: AtomicU32::new(0),
            frame_for_resize: AtomicU32::new(0),
        }
    }

    pub fn ring(&self) -> usize {
        self.ring
    }

    /// Display pipe finished a frame: retarget it and show the next buffer
    pub fn on_primary_frame<B, P: CameraPipes<B>>(&self, pipes: &mut P) -> Result<(), Fatal> {
        let next_disp = (self.disp_idx.load(Ordering::Relaxed) + 1) % self.ring;
        let next_capt = (self.capt_idx.load(Ordering::Relaxed) + 1) % self.ring;

        pipes.set_display_target(next_capt)?;
        pipes.show_frame(next_disp)?;

        self.disp_idx.store(next_disp, Ordering::Relaxed);
        self.capt_idx.store(next_capt, Ordering::Relaxed);
        let frame = self.frame_event_nb.load(Ordering::Relaxed);
        self.frame_event_nb.store(frame.wrapping_add(1), Ordering::Release);

        Ok(())
    }

    /// Auxiliary pipe finished a frame: hand it to inference if a free buffer
    /// can take the next one, otherwise the pipe overwrites the same buffer.
    pub fn on_auxiliary_frame<M, B, P, const N: usize>(
        &self,
        queue: &BufferQueue<M, B, N>,
        pipes: &mut P,
    ) -> Result<(), Fatal>
    where
        M: RawMutex,
        B: Copy,
        P: CameraPipes<B>,
    {
        let Some(next) = queue.try_acquire_free() else {
            return Ok(());
        };

        pipes.set_nn_target(next)?;
        // the display pipe of this frame already bumped the counter
        let frame = self.frame_event_nb.load(Ordering::Acquire).wrapping_sub(1);
        self.frame_for_resize.store(frame, Ordering::Release);

        queue.release_as_ready()
    }

    /// Display frame matching the most recent buffer handed to inference
    pub fn frame_for_resize(&self) -> usize {
        self.frame_for_resize.load(Ordering::Acquire) as usize % self.ring
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_event_nb.load(Ordering::Acquire)
    }

    pub fn display_index(&self) -> usize {
        self.disp_idx.load(Ordering::Relaxed)
    }

    pub fn capture_index(&self) -> usize {
        self.capt_idx.load(Ordering::Relaxed)
    }
}
