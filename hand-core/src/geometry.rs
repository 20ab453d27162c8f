//! Stateless ROI geometry.
//!
//! Screen space has its origin at the top-left corner with Y growing downward.
//! Angles are radians.

use core::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use hand_shared::{Point, Roi};

use crate::math;

/// Size of the captured/displayed frame in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBounds {
    pub width: i32,
    pub height: i32,
}

impl FrameBounds {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Integer pixel position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Truncates toward zero, like a C float to int cast
    pub fn truncate(p: Point) -> Self {
        Self {
            x: p.x as i32,
            y: p.y as i32,
        }
    }
}

/// Whether the crop path can warp arbitrary rotations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RotationMode {
    /// Axis-aligned crops only; rotations snap to multiples of pi/2
    #[default]
    Snapped,
    /// Rotation-capable crop hardware
    Free,
}

/// Maps any angle into `(-pi, pi]`
pub fn normalize_angle(angle: f32) -> f32 {
    let mut normalized = angle - TAU * math::floor((angle + PI) / TAU);

    // the closed-form result lands on -pi for odd multiples of pi, and float
    // rounding can push it a hair outside either end
    if normalized <= -PI {
        normalized += TAU;
    }
    if normalized > PI {
        normalized -= TAU;
    }

    normalized
}

/// Snaps to the nearest quarter turn when rotation is not supported by the crop path
pub fn cook_rotation(angle: f32, mode: RotationMode) -> f32 {
    match mode {
        RotationMode::Free => angle,
        RotationMode::Snapped => {
            if angle >= 3.0 * FRAC_PI_4 {
                PI
            } else if angle >= FRAC_PI_4 {
                FRAC_PI_2
            } else if angle >= -FRAC_PI_4 {
                0.0
            } else if angle >= -3.0 * FRAC_PI_4 {
                -FRAC_PI_2
            } else {
                -PI
            }
        }
    }
}

/// Hand rotation from two anatomical reference points: `p0` at the wrist and
/// `p1` toward the middle finger. An upright hand yields 0.
pub fn compute_rotation(p0: Point, p1: Point, mode: RotationMode) -> f32 {
    let rotation = FRAC_PI_2 - math::atan2(-(p1.y - p0.y), p1.x - p0.x);

    cook_rotation(normalize_angle(rotation), mode)
}

/// Rotates `p` around the origin
pub fn rotate(p: Point, angle: f32) -> Point {
    let (sin, cos) = (math::sin(angle), math::cos(angle));

    Point::new(cos * p.x - sin * p.y, sin * p.x + cos * p.y)
}

/// Moves the center by `(shift_x * w, shift_y * h)` expressed in the ROI's own
/// rotated frame, squares the box on its long side, then scales each axis.
pub fn shift_and_scale(roi: &Roi, shift_x: f32, shift_y: f32, scale_x: f32, scale_y: f32) -> Roi {
    let shift = rotate(Point::new(roi.w * shift_x, roi.h * shift_y), roi.rotation);
    let long_side = roi.w.max(roi.h);

    Roi {
        cx: roi.cx + shift.x,
        cy: roi.cy + shift.y,
        w: long_side * scale_x,
        h: long_side * scale_y,
        rotation: roi.rotation,
    }
}

/// Corners in order top-left, top-right, bottom-right, bottom-left before rotation
pub fn to_corners(roi: &Roi) -> [Point; 4] {
    let (hw, hh) = (roi.w / 2.0, roi.h / 2.0);
    let center = Point::new(roi.cx, roi.cy);

    [
        Point::new(-hw, -hh),
        Point::new(hw, -hh),
        Point::new(hw, hh),
        Point::new(-hw, hh),
    ]
    .map(|corner| rotate(corner, roi.rotation) + center)
}

/// Clamps into `[margin, size - margin - 1]` on both axes. Returns the clamped
/// point and whether anything moved.
pub fn clamp_point_with_margin(p: PixelPoint, bounds: FrameBounds, margin: i32) -> (PixelPoint, bool) {
    let mut clamped = p;

    if clamped.x < margin {
        clamped.x = margin;
    }
    if clamped.y < margin {
        clamped.y = margin;
    }
    if clamped.x >= bounds.width - margin {
        clamped.x = bounds.width - margin - 1;
    }
    if clamped.y >= bounds.height - margin {
        clamped.y = bounds.height - margin - 1;
    }

    (clamped, clamped != p)
}

pub fn clamp_point(p: PixelPoint, bounds: FrameBounds) -> (PixelPoint, bool) {
    clamp_point_with_margin(p, bounds, 0)
}

/// Truncates and clamps each corner. The flag is set when any corner moved.
pub fn clamp_corners(corners: &[Point; 4], bounds: FrameBounds) -> ([PixelPoint; 4], bool) {
    let mut out = [PixelPoint::default(); 4];
    let mut is_clamped = false;

    for (dst, src) in out.iter_mut().zip(corners.iter()) {
        let (p, moved) = clamp_point(PixelPoint::truncate(*src), bounds);
        *dst = p;
        is_clamped |= moved;
    }

    (out, is_clamped)
}
