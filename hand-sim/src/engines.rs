//! Stand-ins for the camera and the two networks, working off the scene
//! contents each camera buffer captured.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use hand_core::geometry::rotate;
use hand_core::landmarks::{PALM_KEYPOINT_LANDMARKS, RAW_LANDMARK_LEN};
use hand_core::{CropPlan, FrameBounds, LandmarkSet};
use hand_pipeline::engine::{EngineError, LandmarkModel, Network, PalmDetector, RunStatus, MAX_DETECTIONS};
use hand_pipeline::{CameraPipes, Fatal};
use hand_shared::{DetectionBox, Point, LANDMARK_COUNT};

/// Landmarks the palm box is fitted around
const PALM_LANDMARKS: [usize; 7] = [0, 1, 2, 5, 9, 13, 17];

const PALM_PROBABILITY: f32 = 0.92;
const LANDMARK_PROBABILITY: f32 = 0.97;

/// Polls a network reports busy before finishing
const BUSY_POLLS: u8 = 2;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // the data stays usable after a panicking writer
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// What the camera wrote into each buffer: the hand in screen pixels, if any
pub struct SensorMemory {
    nn: Mutex<Vec<Option<LandmarkSet>>>,
    display: Mutex<Vec<Option<LandmarkSet>>>,
}

impl SensorMemory {
    pub fn new(nn_buffers: usize, display_buffers: usize) -> Self {
        Self {
            nn: Mutex::new(vec![None; nn_buffers]),
            display: Mutex::new(vec![None; display_buffers]),
        }
    }

    pub fn nn_frame(&self, buffer: usize) -> Result<Option<LandmarkSet>, EngineError> {
        lock(&self.nn).get(buffer).copied().ok_or(EngineError::InvalidInput)
    }

    pub fn display_frame(&self, frame_idx: usize) -> Result<Option<LandmarkSet>, EngineError> {
        lock(&self.display).get(frame_idx).copied().ok_or(EngineError::InvalidInput)
    }
}

/// Both camera pipes plus the background layer of the display
pub struct SimCamera {
    memory: Arc<SensorMemory>,
    display_target: Option<usize>,
    nn_target: Option<usize>,
    shown: usize,
}

impl SimCamera {
    pub fn new(memory: Arc<SensorMemory>) -> Self {
        Self {
            memory,
            display_target: None,
            nn_target: None,
            shown: 0,
        }
    }

    /// Exposes one frame into whatever buffers the pipes currently target
    pub fn capture(&mut self, hand: Option<LandmarkSet>) {
        if let Some(idx) = self.display_target {
            if let Some(slot) = lock(&self.memory.display).get_mut(idx) {
                *slot = hand;
            }
        }
        if let Some(idx) = self.nn_target {
            if let Some(slot) = lock(&self.memory.nn).get_mut(idx) {
                *slot = hand;
            }
        }
    }

    pub fn shown_frame(&self) -> usize {
        self.shown
    }
}

impl CameraPipes<usize> for SimCamera {
    fn start_display_pipe(&mut self, frame_idx: usize) -> Result<(), Fatal> {
        self.display_target = Some(frame_idx);
        Ok(())
    }

    fn start_nn_pipe(&mut self, buffer: usize) -> Result<(), Fatal> {
        self.nn_target = Some(buffer);
        Ok(())
    }

    fn set_display_target(&mut self, frame_idx: usize) -> Result<(), Fatal> {
        self.display_target
            .replace(frame_idx)
            .map(|_| ())
            .ok_or(Fatal::Pipe("display pipe not started"))
    }

    fn set_nn_target(&mut self, buffer: usize) -> Result<(), Fatal> {
        self.nn_target
            .replace(buffer)
            .map(|_| ())
            .ok_or(Fatal::Pipe("nn pipe not started"))
    }

    fn show_frame(&mut self, frame_idx: usize) -> Result<(), Fatal> {
        self.shown = frame_idx;
        Ok(())
    }
}

/// Runs busy for a couple of polls, sleeping on each event wait
#[derive(Default)]
struct Busy {
    polls: u8,
}

impl Busy {
    fn step(&mut self) -> RunStatus {
        if self.polls < BUSY_POLLS {
            self.polls += 1;
            RunStatus::WaitForEvent
        } else {
            RunStatus::Done
        }
    }

    fn wait(&self) {
        std::thread::sleep(Duration::from_micros(500));
    }
}

/// Palm box around a screen-space hand, normalized by the frame width
pub fn palm_box(hand: &LandmarkSet, frame_width: f32, probability: f32) -> DetectionBox {
    let (mut min, mut max) = (Point::new(f32::MAX, f32::MAX), Point::new(f32::MIN, f32::MIN));
    for p in PALM_LANDMARKS.iter().map(|&i| hand[i]) {
        min = Point::new(min.x.min(p.x), min.y.min(p.y));
        max = Point::new(max.x.max(p.x), max.y.max(p.y));
    }

    DetectionBox {
        probability,
        x_center: (min.x + max.x) / 2.0 / frame_width,
        y_center: (min.y + max.y) / 2.0 / frame_width,
        width: (max.x - min.x) / frame_width,
        height: (max.y - min.y) / frame_width,
        keypoints: PALM_KEYPOINT_LANDMARKS.map(|i| hand[i] * (1.0 / frame_width)),
    }
}

/// Finds the hand whenever every landmark is inside the frame
pub struct SimDetector {
    memory: Arc<SensorMemory>,
    bounds: FrameBounds,
    busy: Busy,
    found: Option<DetectionBox>,
}

impl SimDetector {
    pub fn new(memory: Arc<SensorMemory>, bounds: FrameBounds) -> Self {
        Self {
            memory,
            bounds,
            busy: Busy::default(),
            found: None,
        }
    }

    fn in_frame(&self, p: &Point) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x < self.bounds.width as f32 && p.y < self.bounds.height as f32
    }
}

impl Network for SimDetector {
    fn run(&mut self) -> Result<RunStatus, EngineError> {
        Ok(self.busy.step())
    }

    fn wait_for_event(&mut self) {
        self.busy.wait();
    }

    fn new_inference(&mut self) {
        self.busy = Busy::default();
    }
}

impl PalmDetector<usize> for SimDetector {
    fn set_input(&mut self, buffer: usize) -> Result<(), EngineError> {
        self.found = self
            .memory
            .nn_frame(buffer)?
            .filter(|hand| hand.iter().all(|p| self.in_frame(p)))
            .map(|hand| palm_box(&hand, self.bounds.width as f32, PALM_PROBABILITY));
        Ok(())
    }

    fn detections(&self) -> heapless::Vec<DetectionBox, MAX_DETECTIONS> {
        self.found.iter().copied().collect()
    }
}

/// Re-projects the hand in a display frame into the requested crop. Confidence
/// falls with the share of landmarks outside the crop.
pub struct SimLandmarkModel {
    memory: Arc<SensorMemory>,
    input_size: f32,
    busy: Busy,
    probability: f32,
    raw: [f32; RAW_LANDMARK_LEN],
}

impl SimLandmarkModel {
    pub fn new(memory: Arc<SensorMemory>, input_size: i32) -> Self {
        Self {
            memory,
            input_size: input_size as f32,
            busy: Busy::default(),
            probability: 0.0,
            raw: [0.0; RAW_LANDMARK_LEN],
        }
    }
}

impl Network for SimLandmarkModel {
    fn run(&mut self) -> Result<RunStatus, EngineError> {
        Ok(self.busy.step())
    }

    fn wait_for_event(&mut self) {
        self.busy.wait();
    }

    fn new_inference(&mut self) {
        self.busy = Busy::default();
    }
}

impl LandmarkModel for SimLandmarkModel {
    fn prepare_input(&mut self, frame_idx: usize, plan: &CropPlan) -> Result<(), EngineError> {
        self.raw = [0.0; RAW_LANDMARK_LEN];
        self.probability = 0.0;

        let Some(hand) = self.memory.display_frame(frame_idx)? else {
            return Ok(());
        };

        let roi = &plan.request.roi;
        let center = Point::new(roi.cx, roi.cy);
        let mut inside = 0;
        for (xyz, p) in self.raw.chunks_exact_mut(3).zip(hand.iter()) {
            let local = rotate(*p - center, -roi.rotation);
            let normalized = Point::new(local.x / roi.w + 0.5, local.y / roi.h + 0.5);
            if (0.0..=1.0).contains(&normalized.x) && (0.0..=1.0).contains(&normalized.y) {
                inside += 1;
            }
            xyz[0] = normalized.x * self.input_size;
            xyz[1] = normalized.y * self.input_size;
        }
        self.probability = LANDMARK_PROBABILITY * inside as f32 / LANDMARK_COUNT as f32;

        Ok(())
    }

    fn probability(&self) -> f32 {
        self.probability
    }

    fn landmarks(&self) -> [f32; RAW_LANDMARK_LEN] {
        self.raw
    }
}
