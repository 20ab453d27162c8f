//! Seams to the hardware collaborators: the inference engine, cache
//! maintenance and the millisecond clock.

use core::fmt;

use hand_core::landmarks::RAW_LANDMARK_LEN;
use hand_core::CropPlan;
use hand_shared::DetectionBox;
use heapless::Vec;

/// Boxes the detector may report in one run
pub const MAX_DETECTIONS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    UnexpectedStatus(i32),
    InvalidInput,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::UnexpectedStatus(code) => write!(f, "unexpected status {}", code),
            EngineError::InvalidInput => write!(f, "invalid input"),
        }
    }
}

/// Outcome of one step of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Done,
    /// Hardware busy, call `wait_for_event` before stepping again
    WaitForEvent,
    /// More work to do right away
    Running,
}

/// A compiled network that runs in steps
pub trait Network {
    fn run(&mut self) -> Result<RunStatus, EngineError>;

    /// Low-power wait for the accelerator interrupt
    fn wait_for_event(&mut self) {}

    /// Rearms the network for the next inference
    fn new_inference(&mut self);
}

/// Steps the network until it reports done, yielding to other tasks between steps
pub async fn run_to_completion<N: Network + ?Sized>(network: &mut N) -> Result<(), EngineError> {
    loop {
        match network.run()? {
            RunStatus::Done => break,
            RunStatus::WaitForEvent => network.wait_for_event(),
            RunStatus::Running => {}
        }
        embassy_futures::yield_now().await;
    }

    network.new_inference();
    Ok(())
}

/// Full-frame palm detector with post-processing built in
pub trait PalmDetector<B>: Network {
    fn set_input(&mut self, buffer: B) -> Result<(), EngineError>;

    /// Boxes above the detector's own threshold, normalized to the detector input
    fn detections(&self) -> Vec<DetectionBox, MAX_DETECTIONS>;
}

/// Landmark model cropping its input from a display frame
pub trait LandmarkModel: Network {
    /// Crops and resizes `plan` out of display frame `frame_idx` into the model input
    fn prepare_input(&mut self, frame_idx: usize, plan: &CropPlan) -> Result<(), EngineError>;

    fn probability(&self) -> f32;

    fn landmarks(&self) -> [f32; RAW_LANDMARK_LEN];
}

/// Memory handed between the CPU and DMA masters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Frame(usize),
    NnInput,
    DetectorOutput,
    LandmarkOutput,
    Overlay(usize),
}

/// Cache maintenance at DMA handoff points
pub trait DmaBarrier {
    /// CPU writes become visible to DMA
    fn publish(&self, region: Region);

    /// DMA writes become visible to the CPU
    fn consume(&self, region: Region);
}

impl<T: DmaBarrier + ?Sized> DmaBarrier for &T {
    fn publish(&self, region: Region) {
        (**self).publish(region)
    }

    fn consume(&self, region: Region) {
        (**self).consume(region)
    }
}

/// Coherent memory, nothing to do
pub struct NoBarrier;

impl DmaBarrier for NoBarrier {
    fn publish(&self, _region: Region) {}

    fn consume(&self, _region: Region) {}
}

pub trait Clock {
    fn now_ms(&self) -> u32;
}

#[cfg(feature = "embassy-time")]
pub struct EmbassyClock;

#[cfg(feature = "embassy-time")]
impl Clock for EmbassyClock {
    fn now_ms(&self) -> u32 {
        embassy_time::Instant::now().as_millis() as u32
    }
}

#[cfg(feature = "std")]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now_ms(&self) -> u32 {
        self.origin.elapsed().as_millis() as u32
    }
}
