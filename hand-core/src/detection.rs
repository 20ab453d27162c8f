//! Palm detector output handling.

use hand_shared::{DetectionBox, Roi};

use crate::config::RoiAdjust;
use crate::geometry::{compute_rotation, shift_and_scale, RotationMode};

/// Keypoints giving the palm direction: wrist base and middle finger base
const ROTATION_KEYPOINTS: (usize, usize) = (0, 2);

/// Scales a normalized detector box into screen pixels.
///
/// Both axes use the frame width because the detector input is a square
/// letterboxed from the frame with its aspect ratio kept.
pub fn to_screen(detection: &DetectionBox, frame_width: i32) -> DetectionBox {
    let scale = frame_width as f32;

    DetectionBox {
        probability: detection.probability,
        x_center: detection.x_center * scale,
        y_center: detection.y_center * scale,
        width: detection.width * scale,
        height: detection.height * scale,
        keypoints: detection.keypoints.map(|kp| kp * scale),
    }
}

/// Turns a screen-space palm box into the crop ROI for the landmark model
pub fn box_to_roi(detection: &DetectionBox, adjust: &RoiAdjust, mode: RotationMode) -> Roi {
    let (from, to) = ROTATION_KEYPOINTS;
    let roi = Roi {
        cx: detection.x_center,
        cy: detection.y_center,
        w: detection.width,
        h: detection.height,
        rotation: compute_rotation(detection.keypoints[from], detection.keypoints[to], mode),
    };

    let mut roi = shift_and_scale(&roi, adjust.shift_x, adjust.shift_y, adjust.scale, adjust.scale);
    if mode == RotationMode::Snapped {
        // axis-aligned crops keep their corners in natural order
        roi.rotation = 0.0;
    }

    roi
}

/// Index of the most confident box
pub fn best_detection(detections: &[DetectionBox]) -> Option<usize> {
    detections
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.probability.total_cmp(&b.probability))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hand_shared::Point;

    fn palm(probability: f32) -> DetectionBox {
        let mut keypoints = [Point::new(0.5, 0.5); 7];
        keypoints[0] = Point::new(0.5, 0.6);
        keypoints[2] = Point::new(0.5, 0.4);

        DetectionBox {
            probability,
            x_center: 0.5,
            y_center: 0.5,
            width: 0.1,
            height: 0.1,
            keypoints,
        }
    }

    #[test]
    fn test_to_screen_uses_width_for_both_axes() {
        let screen = to_screen(&palm(0.9), 800);

        assert_eq!(screen.probability, 0.9);
        assert_eq!(screen.x_center, 400.0);
        assert_eq!(screen.y_center, 400.0);
        assert_eq!(screen.width, 80.0);
        assert_eq!(screen.keypoints[0], Point::new(400.0, 480.0));
    }

    #[test]
    fn test_box_to_roi_upright() {
        let screen = to_screen(&palm(0.9), 800);
        let roi = box_to_roi(&screen, &RoiAdjust::DETECTION, RotationMode::Snapped);

        assert_eq!(roi.rotation, 0.0);
        assert!((roi.w - 208.0).abs() < 1e-3);
        assert!((roi.h - 208.0).abs() < 1e-3);
        assert!((roi.cx - 400.0).abs() < 1e-3);
        // shifted half a box toward the fingers
        assert!((roi.cy - 360.0).abs() < 1e-3);
    }

    #[test]
    fn test_box_to_roi_snapped_cancels_rotation() {
        let mut screen = to_screen(&palm(0.9), 800);
        // fingers pointing right
        screen.keypoints[0] = Point::new(360.0, 400.0);
        screen.keypoints[2] = Point::new(440.0, 400.0);

        let snapped = box_to_roi(&screen, &RoiAdjust::DETECTION, RotationMode::Snapped);
        assert_eq!(snapped.rotation, 0.0);
        // the shift still follows the quarter turn
        assert!((snapped.cx - 440.0).abs() < 1e-3);
        assert!((snapped.cy - 400.0).abs() < 1e-3);

        let free = box_to_roi(&screen, &RoiAdjust::DETECTION, RotationMode::Free);
        assert!((free.rotation - core::f32::consts::FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn test_best_detection() {
        assert_eq!(best_detection(&[]), None);
        assert_eq!(best_detection(&[palm(0.3), palm(0.8), palm(0.5)]), Some(1));
    }
}
