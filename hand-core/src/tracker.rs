//! Search/track state machine for a single hand.
//!
//! One cycle per captured frame:
//!
//! 1. [`HandTracker::begin_cycle`] tells the caller which model to run.
//! 2. While searching, the detector output goes to [`HandTracker::on_detections`].
//! 3. While tracking (including the cycle that just acquired a hand),
//!    [`HandTracker::plan_crop`] yields the landmark model crop and the model
//!    output goes to [`HandTracker::on_landmarks`].
//!
//! A clamped crop or a low-confidence landmark set drops back to searching.

use hand_shared::{DetectionBox, HandInfo, Point, Roi, LANDMARK_COUNT, NO_HAND};
use log::debug;

use crate::config::{ClampPolicy, TrackerConfig};
use crate::crop::{CropPlan, CropRequest};
use crate::detection::{best_detection, box_to_roi, to_screen};
use crate::geometry::{shift_and_scale, RotationMode};
use crate::landmarks::{
    count_raised_fingers, decode_all, landmarks_to_roi, post_process, LandmarkSet, RAW_LANDMARK_LEN,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrackerState {
    #[default]
    Searching,
    Tracking,
}

/// Which model the current cycle needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePlan {
    /// Run the palm detector on the full frame
    Detect,
    /// Skip detection, the ROI comes from the previous cycle's landmarks
    Track,
}

pub struct HandTracker {
    config: TrackerConfig,
    state: TrackerState,
    /// ROI the landmark model crops this cycle
    roi: Roi,
    detection: DetectionBox,
    next_roi: Roi,
    next_detection: DetectionBox,
    /// Normalized against `roi`
    landmarks: LandmarkSet,
    best_probability: f32,
}

impl HandTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            state: TrackerState::Searching,
            roi: Roi::default(),
            detection: DetectionBox::default(),
            next_roi: Roi::default(),
            next_detection: DetectionBox::default(),
            landmarks: [Point::default(); LANDMARK_COUNT],
            best_probability: 0.0,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn is_tracking(&self) -> bool {
        self.state == TrackerState::Tracking
    }

    pub fn begin_cycle(&mut self) -> CyclePlan {
        match self.state {
            TrackerState::Searching => CyclePlan::Detect,
            TrackerState::Tracking => {
                self.roi = self.next_roi;
                self.detection = self.next_detection;
                CyclePlan::Track
            }
        }
    }

    /// Takes normalized detector boxes. Returns whether a hand was acquired.
    pub fn on_detections(&mut self, detections: &[DetectionBox]) -> bool {
        let Some(best) = best_detection(detections) else {
            self.best_probability = 0.0;
            return false;
        };

        let detection = to_screen(&detections[best], self.config.bounds.width);
        self.roi = box_to_roi(&detection, &self.config.detection_adjust, self.config.rotation_mode);
        self.detection = detection;
        self.best_probability = detection.probability;
        self.state = TrackerState::Tracking;

        debug!(
            "hand acquired: p={:.2} roi=({:.0}, {:.0}, {:.0})",
            detection.probability, self.roi.cx, self.roi.cy, self.roi.w
        );

        true
    }

    /// Crop for the landmark model, or `None` when there is nothing to track.
    /// A crop that leaves the frame loses the track unless the clamp policy
    /// allows a partial resize.
    pub fn plan_crop(&mut self) -> Option<CropPlan> {
        if !self.is_tracking() {
            return None;
        }

        let request = CropRequest::new(&self.roi, self.config.bounds);
        if !request.is_clamped {
            return Some(CropPlan {
                request,
                partial: None,
            });
        }

        let partial = match (self.config.clamp_policy, self.config.rotation_mode) {
            (ClampPolicy::PartialResize, RotationMode::Snapped) => request.partial_resize(
                self.config.bounds,
                self.config.landmark_input_size,
                self.config.landmark_input_size,
            ),
            _ => None,
        };

        match partial {
            Some(partial) => Some(CropPlan {
                request,
                partial: Some(partial),
            }),
            None => {
                self.lose_track("roi left the frame");
                None
            }
        }
    }

    /// Takes the landmark model output for the crop planned this cycle.
    /// Returns whether tracking continues.
    pub fn on_landmarks(&mut self, probability: f32, raw: &[f32; RAW_LANDMARK_LEN]) -> bool {
        if !self.is_tracking() {
            return false;
        }

        let Some(landmarks) = post_process(
            probability,
            raw,
            self.config.landmark_input_size as f32,
            self.config.landmark_threshold,
        ) else {
            self.lose_track("low landmark confidence");
            return false;
        };

        self.landmarks = landmarks;

        let mode = self.config.rotation_mode;
        let adjust = self.config.landmark_adjust;
        let (roi, mut detection) = landmarks_to_roi(&decode_all(&self.roi, &landmarks), mode);
        detection.probability = self.detection.probability;

        let mut next_roi = shift_and_scale(&roi, adjust.shift_x, adjust.shift_y, adjust.scale, adjust.scale);
        if mode == RotationMode::Snapped {
            next_roi.rotation = 0.0;
        }

        self.next_roi = next_roi;
        self.next_detection = detection;

        true
    }

    fn lose_track(&mut self, reason: &str) {
        debug!("hand lost: {}", reason);
        self.state = TrackerState::Searching;
    }

    pub fn hand_info(&self) -> HandInfo {
        HandInfo {
            is_valid: self.is_tracking(),
            detection: self.detection,
            roi: self.roi,
            landmarks: self.landmarks,
        }
    }

    /// Raised fingers for the current landmarks, `NO_HAND` when not tracking
    pub fn finger_count(&self) -> i8 {
        if self.is_tracking() {
            count_raised_fingers(&self.roi, &self.landmarks) as i8
        } else {
            NO_HAND
        }
    }

    pub fn best_probability(&self) -> f32 {
        self.best_probability
    }

    pub fn hand_count(&self) -> u8 {
        u8::from(self.is_tracking())
    }
}

impl Default for HandTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::fixtures::{fist, open_hand, raw};

    fn palm(x: f32, y: f32, probability: f32) -> DetectionBox {
        let mut keypoints = [Point::new(x, y); 7];
        keypoints[0] = Point::new(x, y + 0.05);
        keypoints[2] = Point::new(x, y - 0.05);

        DetectionBox {
            probability,
            x_center: x,
            y_center: y,
            width: 0.1,
            height: 0.1,
            keypoints,
        }
    }

    fn shifted(mut lm: LandmarkSet, dx: f32) -> LandmarkSet {
        for p in lm.iter_mut() {
            p.x += dx;
        }
        lm
    }

    fn acquire(tracker: &mut HandTracker, detection: DetectionBox) -> Option<CropPlan> {
        assert_eq!(tracker.begin_cycle(), CyclePlan::Detect);
        assert!(tracker.on_detections(&[detection]));
        tracker.plan_crop()
    }

    #[test]
    fn test_starts_searching() {
        let mut tracker = HandTracker::default();
        assert_eq!(tracker.state(), TrackerState::Searching);
        assert_eq!(tracker.begin_cycle(), CyclePlan::Detect);
        assert_eq!(tracker.finger_count(), NO_HAND);
        assert!(tracker.plan_crop().is_none());
    }

    #[test]
    fn test_no_detection_stays_searching() {
        let mut tracker = HandTracker::default();
        tracker.begin_cycle();
        assert!(!tracker.on_detections(&[]));
        assert_eq!(tracker.state(), TrackerState::Searching);
        assert_eq!(tracker.best_probability(), 0.0);
        assert_eq!(tracker.begin_cycle(), CyclePlan::Detect);
    }

    #[test]
    fn test_detection_picks_best_box() {
        let mut tracker = HandTracker::default();
        tracker.begin_cycle();
        assert!(tracker.on_detections(&[palm(0.2, 0.3, 0.4), palm(0.5, 0.3, 0.9)]));

        let info = tracker.hand_info();
        assert!(info.is_valid);
        assert_eq!(info.detection.probability, 0.9);
        assert!((info.roi.cx - 400.0).abs() < 1e-3);
        assert!((info.roi.cy - 200.0).abs() < 1e-3);
        assert!((info.roi.w - 208.0).abs() < 1e-3);
        assert_eq!(tracker.best_probability(), 0.9);
        assert_eq!(tracker.hand_count(), 1);
    }

    #[test]
    fn test_track_cycle_uses_landmark_roi() {
        let mut tracker = HandTracker::default();
        let plan = acquire(&mut tracker, palm(0.5, 0.3, 0.9)).unwrap();
        assert!(!plan.request.is_clamped);
        assert!(plan.partial.is_none());

        assert!(tracker.on_landmarks(0.95, &raw(&open_hand(), 224.0)));
        assert_eq!(tracker.finger_count(), 5);

        assert_eq!(tracker.begin_cycle(), CyclePlan::Track);
        let info = tracker.hand_info();
        // bounding box of the palm landmarks, squared on its height and doubled
        assert!((info.roi.w - 0.43 * 208.0 * 2.0).abs() < 1e-2);
        assert!((info.roi.cx - 396.88).abs() < 1e-2);
        assert!((info.roi.cy - (228.08 - 0.043 * 208.0)).abs() < 1e-2);
        assert_eq!(info.roi.rotation, 0.0);
        // synthesized box carries the detector probability
        assert_eq!(info.detection.probability, 0.9);
        assert!((info.detection.x_center - 396.88).abs() < 1e-2);

        assert!(tracker.plan_crop().is_some());
        assert!(tracker.on_landmarks(0.95, &raw(&fist(), 224.0)));
        assert_eq!(tracker.finger_count(), 0);
    }

    #[test]
    fn test_low_confidence_returns_to_search() {
        let mut tracker = HandTracker::default();
        acquire(&mut tracker, palm(0.5, 0.3, 0.9)).unwrap();

        assert!(!tracker.on_landmarks(0.1, &raw(&open_hand(), 224.0)));
        assert_eq!(tracker.state(), TrackerState::Searching);
        assert_eq!(tracker.finger_count(), NO_HAND);
        assert!(!tracker.hand_info().is_valid);
        assert_eq!(tracker.begin_cycle(), CyclePlan::Detect);
    }

    #[test]
    fn test_clamped_detection_abandons_cycle() {
        let mut tracker = HandTracker::default();
        assert!(acquire(&mut tracker, palm(0.02, 0.3, 0.9)).is_none());
        assert_eq!(tracker.state(), TrackerState::Searching);
        assert_eq!(tracker.begin_cycle(), CyclePlan::Detect);
    }

    #[test]
    fn test_hand_leaving_frame_returns_to_search() {
        let mut tracker = HandTracker::default();
        acquire(&mut tracker, palm(0.5, 0.3, 0.9)).unwrap();

        // landmarks far to the right of the crop push the next roi past the edge
        assert!(tracker.on_landmarks(0.95, &raw(&shifted(open_hand(), 1.6), 224.0)));
        assert!(tracker.is_tracking());

        assert_eq!(tracker.begin_cycle(), CyclePlan::Track);
        assert!(tracker.plan_crop().is_none());
        assert_eq!(tracker.state(), TrackerState::Searching);

        assert_eq!(tracker.begin_cycle(), CyclePlan::Detect);
    }

    #[test]
    fn test_partial_resize_policy_keeps_tracking() {
        let config = TrackerConfig::default().with_clamp_policy(ClampPolicy::PartialResize);
        let mut tracker = HandTracker::new(config);

        let plan = acquire(&mut tracker, palm(0.02, 0.3, 0.9)).unwrap();
        assert!(plan.request.is_clamped);
        let partial = plan.partial.unwrap();
        assert_eq!(partial.source.x, 0);
        assert!(partial.dest.x > 0);
        assert_eq!(partial.dest.x + partial.dest.width, 224);
        assert!(tracker.is_tracking());
    }

    #[test]
    fn test_partial_resize_ignored_with_free_rotation() {
        let config = TrackerConfig::default()
            .with_clamp_policy(ClampPolicy::PartialResize)
            .with_rotation_mode(RotationMode::Free);
        let mut tracker = HandTracker::new(config);

        assert!(acquire(&mut tracker, palm(0.02, 0.3, 0.9)).is_none());
        assert!(!tracker.is_tracking());
    }

    #[test]
    fn test_landmarks_ignored_while_searching() {
        let mut tracker = HandTracker::default();
        tracker.begin_cycle();
        assert!(!tracker.on_landmarks(0.95, &raw(&open_hand(), 224.0)));
        assert_eq!(tracker.state(), TrackerState::Searching);
    }
}
