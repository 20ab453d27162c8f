//! Hand landmark decoding and the raised-finger heuristic.
//!
//! Landmark order follows the 21-point hand convention:
//! wrist, then four joints per finger from thumb to pinky.

use hand_shared::{DetectionBox, Point, Roi, KEYPOINT_COUNT, LANDMARK_COUNT};

use crate::geometry::{compute_rotation, rotate, RotationMode};

/// Normalized landmarks in model input space
pub type LandmarkSet = [Point; LANDMARK_COUNT];

/// Landmark model output floats: x, y, z per landmark, in input pixels
pub const RAW_LANDMARK_LEN: usize = LANDMARK_COUNT * 3;

/// Landmark indices
#[allow(dead_code)]
pub mod index {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

/// Skeleton segments drawn between landmarks
pub const BINDINGS: [(usize, usize); 21] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    (5, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    (9, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    (13, 17),
    (17, 18),
    (18, 19),
    (19, 20),
    (0, 17),
];

/// Landmark standing in for each palm detector keypoint. Fixed by the model pair.
pub const PALM_KEYPOINT_LANDMARKS: [usize; KEYPOINT_COUNT] = [0, 5, 9, 13, 17, 1, 2];

/// Palm and finger base landmarks bounding the next ROI
const ROI_LANDMARKS: [usize; 12] = [0, 1, 2, 3, 5, 6, 9, 10, 13, 14, 17, 18];

/// (tip, proximal joint) for the four fingers judged on the vertical axis
const FINGERS: [(usize, usize); 4] = [
    (index::INDEX_TIP, index::INDEX_PIP),
    (index::MIDDLE_TIP, index::MIDDLE_PIP),
    (index::RING_TIP, index::RING_PIP),
    (index::PINKY_TIP, index::PINKY_PIP),
];

/// Applies the confidence gate and normalizes raw model output by the input width.
/// Returns `None` when the model is not confident enough.
pub fn post_process(
    probability: f32,
    raw: &[f32; RAW_LANDMARK_LEN],
    input_width: f32,
    threshold: f32,
) -> Option<LandmarkSet> {
    if probability < threshold {
        return None;
    }

    let mut landmarks = [Point::default(); LANDMARK_COUNT];
    for (landmark, xyz) in landmarks.iter_mut().zip(raw.chunks_exact(3)) {
        *landmark = Point::new(xyz[0] / input_width, xyz[1] / input_width);
    }

    Some(landmarks)
}

/// Maps a normalized model point back into screen space through the ROI it was cropped from
pub fn decode_landmark(roi: &Roi, point: Point) -> Point {
    let local = Point::new((point.x - 0.5) * roi.w, (point.y - 0.5) * roi.h);

    rotate(local, roi.rotation) + Point::new(roi.cx, roi.cy)
}

pub fn decode_all(roi: &Roi, landmarks: &LandmarkSet) -> LandmarkSet {
    landmarks.map(|point| decode_landmark(roi, point))
}

/// Counts raised fingers in `0..=5`.
///
/// The thumb is raised when its tip is horizontally farther from the palm
/// center than its IP joint. Other fingers are raised when the tip sits above
/// (smaller Y than) the PIP joint.
pub fn count_raised_fingers(roi: &Roi, raw_landmarks: &LandmarkSet) -> u8 {
    let lm = decode_all(roi, raw_landmarks);
    let palm_cx = (lm[index::WRIST].x + lm[index::MIDDLE_MCP].x) / 2.0;
    let mut count = 0;

    let tip_dist = (lm[index::THUMB_TIP].x - palm_cx).abs();
    let ip_dist = (lm[index::THUMB_IP].x - palm_cx).abs();
    if tip_dist > ip_dist {
        count += 1;
    }

    for (tip, pip) in FINGERS {
        if lm[tip].y < lm[pip].y {
            count += 1;
        }
    }

    count
}

/// Derives an unadjusted ROI and a detector-shaped box from screen-space landmarks.
/// The box probability is left at zero for the caller to fill in.
pub fn landmarks_to_roi(lm: &LandmarkSet, mode: RotationMode) -> (Roi, DetectionBox) {
    let rotation = compute_rotation(lm[index::WRIST], lm[index::MIDDLE_MCP], mode);

    let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
    let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
    for p in ROI_LANDMARKS.iter().map(|&i| lm[i]) {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let roi = Roi {
        cx: (max_x + min_x) / 2.0,
        cy: (max_y + min_y) / 2.0,
        w: max_x - min_x,
        h: max_y - min_y,
        rotation,
    };

    let detection = DetectionBox {
        probability: 0.0,
        x_center: roi.cx,
        y_center: roi.cy,
        width: roi.w,
        height: roi.h,
        keypoints: PALM_KEYPOINT_LANDMARKS.map(|i| lm[i]),
    };

    (roi, detection)
}

/// Synthetic hands shared by tests across the crate
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Upright open hand centered in the model input, all five fingers extended
    pub fn open_hand() -> LandmarkSet {
        let mut lm = [Point::default(); LANDMARK_COUNT];
        lm[index::WRIST] = Point::new(0.5, 0.85);

        lm[index::THUMB_CMC] = Point::new(0.42, 0.78);
        lm[index::THUMB_MCP] = Point::new(0.36, 0.70);
        lm[index::THUMB_IP] = Point::new(0.32, 0.62);
        lm[index::THUMB_TIP] = Point::new(0.26, 0.56);

        let fingers = [
            (index::INDEX_MCP, 0.42),
            (index::MIDDLE_MCP, 0.50),
            (index::RING_MCP, 0.58),
            (index::PINKY_MCP, 0.65),
        ];
        for (mcp, x) in fingers {
            lm[mcp] = Point::new(x, 0.55);
            lm[mcp + 1] = Point::new(x, 0.42);
            lm[mcp + 2] = Point::new(x, 0.32);
            lm[mcp + 3] = Point::new(x, 0.22);
        }

        lm
    }

    /// Same hand with every finger folded over the palm
    pub fn fist() -> LandmarkSet {
        let mut lm = open_hand();
        lm[index::THUMB_IP] = Point::new(0.36, 0.62);
        lm[index::THUMB_TIP] = Point::new(0.44, 0.60);

        for mcp in [index::INDEX_MCP, index::MIDDLE_MCP, index::RING_MCP, index::PINKY_MCP] {
            let x = lm[mcp].x;
            lm[mcp + 1] = Point::new(x, 0.45);
            lm[mcp + 2] = Point::new(x, 0.52);
            lm[mcp + 3] = Point::new(x, 0.58);
        }

        lm
    }

    /// Raw model output for a normalized set
    pub fn raw(landmarks: &LandmarkSet, input_width: f32) -> [f32; RAW_LANDMARK_LEN] {
        let mut raw = [0.0; RAW_LANDMARK_LEN];
        for (xyz, p) in raw.chunks_exact_mut(3).zip(landmarks.iter()) {
            xyz[0] = p.x * input_width;
            xyz[1] = p.y * input_width;
        }
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use core::f32::consts::FRAC_PI_2;

    fn square_roi() -> Roi {
        Roi {
            cx: 100.0,
            cy: 100.0,
            w: 200.0,
            h: 200.0,
            rotation: 0.0,
        }
    }

    #[test]
    fn test_post_process_gate() {
        let raw = raw(&open_hand(), 224.0);

        assert!(post_process(0.1, &raw, 224.0, 0.25).is_none());

        let landmarks = post_process(0.9, &raw, 224.0, 0.25).unwrap();
        assert!((landmarks[index::WRIST].x - 0.5).abs() < 1e-5);
        assert!((landmarks[index::WRIST].y - 0.85).abs() < 1e-5);
    }

    #[test]
    fn test_decode_landmark() {
        let roi = square_roi();
        assert_eq!(decode_landmark(&roi, Point::new(0.5, 0.5)), Point::new(100.0, 100.0));
        assert_eq!(decode_landmark(&roi, Point::new(0.0, 1.0)), Point::new(0.0, 200.0));

        let rotated = Roi {
            rotation: FRAC_PI_2,
            ..roi
        };
        // model "right" becomes screen "down" after a quarter turn
        let p = decode_landmark(&rotated, Point::new(1.0, 0.5));
        assert!((p.x - 100.0).abs() < 1e-3);
        assert!((p.y - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_count_raised_fingers_open_hand() {
        assert_eq!(count_raised_fingers(&square_roi(), &open_hand()), 5);
    }

    #[test]
    fn test_count_raised_fingers_fist() {
        assert_eq!(count_raised_fingers(&square_roi(), &fist()), 0);
    }

    #[test]
    fn test_count_raised_fingers_partial() {
        let mut lm = fist();
        let open = open_hand();
        for i in [index::INDEX_PIP, index::INDEX_DIP, index::INDEX_TIP] {
            lm[i] = open[i];
        }
        for i in [index::MIDDLE_PIP, index::MIDDLE_DIP, index::MIDDLE_TIP] {
            lm[i] = open[i];
        }

        assert_eq!(count_raised_fingers(&square_roi(), &lm), 2);
    }

    #[test]
    fn test_landmarks_to_roi() {
        let decoded = decode_all(&square_roi(), &open_hand());
        let (roi, detection) = landmarks_to_roi(&decoded, RotationMode::Snapped);

        assert_eq!(roi.rotation, 0.0);
        // bounded by wrist (y 0.85), finger PIPs (y 0.42), thumb CMC..IP and pinky
        assert!((roi.w - (0.65 - 0.32) * 200.0).abs() < 1e-3);
        assert!((roi.h - (0.85 - 0.42) * 200.0).abs() < 1e-3);
        assert_eq!(detection.x_center, roi.cx);
        assert_eq!(detection.keypoints[0], decoded[index::WRIST]);
        assert_eq!(detection.keypoints[2], decoded[index::MIDDLE_MCP]);
        assert_eq!(detection.keypoints[6], decoded[index::THUMB_MCP]);
    }
}
