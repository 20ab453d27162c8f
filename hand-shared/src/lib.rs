#![cfg_attr(not(feature = "std"), no_std)]

use serde::{Deserialize, Serialize};

/// Number of landmarks produced by the hand landmark model
pub const LANDMARK_COUNT: usize = 21;

/// Number of palm keypoints produced by the palm detector
pub const KEYPOINT_COUNT: usize = 7;

/// Tracked hands per cycle. The tracker follows exactly one subject.
pub const MAX_HANDS: usize = 1;

/// Finger count reported when no hand is tracked
pub const NO_HAND: i8 = -1;

/// A 2D point, either normalized model space or screen pixels depending on context
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl core::ops::Add for Point {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl core::ops::Sub for Point {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl core::ops::Mul<f32> for Point {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

/// Rotated rectangle in screen pixels used to crop the landmark model input.
/// `rotation` is in radians.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Roi {
    pub cx: f32,
    pub cy: f32,
    pub w: f32,
    pub h: f32,
    pub rotation: f32,
}

/// Palm detector box. Normalized when it leaves the detector, screen pixels afterwards.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct DetectionBox {
    pub probability: f32,
    pub x_center: f32,
    pub y_center: f32,
    pub width: f32,
    pub height: f32,
    pub keypoints: [Point; KEYPOINT_COUNT],
}

/// Per-hand result of one pipeline cycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HandInfo {
    pub is_valid: bool,
    pub detection: DetectionBox,
    pub roi: Roi,
    /// Normalized landmarks in model input space, decoded through `roi` when drawn
    pub landmarks: [Point; LANDMARK_COUNT],
}

impl Default for HandInfo {
    fn default() -> Self {
        Self {
            is_valid: false,
            detection: DetectionBox::default(),
            roi: Roi::default(),
            landmarks: [Point::default(); LANDMARK_COUNT],
        }
    }
}

/// Everything the inference task publishes at the end of a cycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CycleReport {
    pub cycle: u32,
    pub nn_period_ms: f32,
    pub pd_ms: u32,
    pub hl_ms: u32,
    pub pd_hand_nb: u8,
    pub pd_max_prob: f32,
    pub hands: [HandInfo; MAX_HANDS],
    /// Raised fingers in `0..=5`, or `NO_HAND`
    pub finger_count: i8,
}

impl Default for CycleReport {
    fn default() -> Self {
        Self {
            cycle: 0,
            nn_period_ms: 0.0,
            pd_ms: 0,
            hl_ms: 0,
            pd_hand_nb: 0,
            pd_max_prob: 0.0,
            hands: [HandInfo::default(); MAX_HANDS],
            finger_count: NO_HAND,
        }
    }
}

impl CycleReport {
    pub fn has_hand(&self) -> bool {
        self.finger_count != NO_HAND
    }
}

/// Overlay toggles driven by the buttons
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OverlayFlags {
    pub landmarks: bool,
    pub detection: bool,
}

impl Default for OverlayFlags {
    fn default() -> Self {
        Self {
            landmarks: true,
            detection: false,
        }
    }
}

/// Snapshot consumed by the display task
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct DisplayInfo {
    pub report: CycleReport,
    pub overlay: OverlayFlags,
    pub disp_ms: u32,
}

#[cfg(feature = "std")]
impl DisplayInfo {
    /// Single-line JSON form used by host tooling
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_operations() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(3.0, 5.0);

        let sum = a + b;
        assert_eq!(sum, Point::new(4.0, 7.0));

        let diff = b - a;
        assert_eq!(diff, Point::new(2.0, 3.0));

        assert_eq!(a * 2.0, Point::new(2.0, 4.0));
    }

    #[test]
    fn test_default_report_has_no_hand() {
        let report = CycleReport::default();
        assert_eq!(report.finger_count, NO_HAND);
        assert!(!report.has_hand());
        assert!(!report.hands[0].is_valid);
    }

    #[test]
    fn test_default_overlay() {
        let overlay = OverlayFlags::default();
        assert!(overlay.landmarks);
        assert!(!overlay.detection);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_display_info_json_fields() {
        let mut info = DisplayInfo::default();
        info.report.finger_count = 3;
        info.report.cycle = 42;

        let json = info.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["report"]["finger_count"], 3);
        assert_eq!(value["report"]["cycle"], 42);
        assert_eq!(value["overlay"]["landmarks"], true);
        assert_eq!(
            value["report"]["hands"][0]["landmarks"]
                .as_array()
                .unwrap()
                .len(),
            LANDMARK_COUNT
        );
    }
}
