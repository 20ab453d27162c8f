use crate::geometry::{FrameBounds, RotationMode};

/// Shift and scale applied when turning a box into a crop ROI
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoiAdjust {
    pub shift_x: f32,
    pub shift_y: f32,
    pub scale: f32,
}

impl RoiAdjust {
    /// Palm box to full hand: move toward the fingers and enlarge
    pub const DETECTION: Self = Self {
        shift_x: 0.0,
        shift_y: -0.5,
        scale: 2.6,
    };

    /// Landmark bounding box to next-frame crop
    pub const LANDMARKS: Self = Self {
        shift_x: 0.0,
        shift_y: -0.1,
        scale: 2.0,
    };
}

/// What to do when the tracked ROI no longer fits the frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClampPolicy {
    /// Drop the track and search again next cycle
    #[default]
    Abandon,
    /// Feed the visible part into the matching sub-rectangle of the model input.
    /// Only meaningful in snapped rotation mode.
    PartialResize,
}

/// Configuration for the hand tracker
#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    pub bounds: FrameBounds,
    pub rotation_mode: RotationMode,
    pub detection_adjust: RoiAdjust,
    pub landmark_adjust: RoiAdjust,
    pub landmark_threshold: f32,
    /// Square landmark model input side in pixels
    pub landmark_input_size: i32,
    pub clamp_policy: ClampPolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            bounds: FrameBounds::new(800, 480),
            rotation_mode: RotationMode::Snapped,
            detection_adjust: RoiAdjust::DETECTION,
            landmark_adjust: RoiAdjust::LANDMARKS,
            landmark_threshold: 0.25,
            landmark_input_size: 224,
            clamp_policy: ClampPolicy::Abandon,
        }
    }
}

impl TrackerConfig {
    pub fn with_bounds(mut self, bounds: FrameBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_rotation_mode(mut self, rotation_mode: RotationMode) -> Self {
        self.rotation_mode = rotation_mode;
        self
    }

    pub fn with_clamp_policy(mut self, clamp_policy: ClampPolicy) -> Self {
        self.clamp_policy = clamp_policy;
        self
    }

    pub fn with_landmark_threshold(mut self, threshold: f32) -> Self {
        self.landmark_threshold = threshold;
        self
    }
}
