//! Crop requests handed to the landmark model's input preparation.

use hand_shared::{Point, Roi};

use crate::geometry::{clamp_corners, to_corners, FrameBounds, PixelPoint};
use crate::math;

/// Axis-aligned pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Where the ROI lands in the frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRequest {
    pub roi: Roi,
    pub corners: [Point; 4],
    pub clamped_corners: [PixelPoint; 4],
    pub is_clamped: bool,
}

impl CropRequest {
    pub fn new(roi: &Roi, bounds: FrameBounds) -> Self {
        let corners = to_corners(roi);
        let (clamped_corners, is_clamped) = clamp_corners(&corners, bounds);

        Self {
            roi: *roi,
            corners,
            clamped_corners,
            is_clamped,
        }
    }

    /// Visible part of an axis-aligned ROI, spanning clamped corners 0 and 2
    pub fn source_rect(&self) -> Option<PixelRect> {
        let (top_left, bottom_right) = (self.clamped_corners[0], self.clamped_corners[2]);
        let rect = PixelRect {
            x: top_left.x,
            y: top_left.y,
            width: bottom_right.x - top_left.x,
            height: bottom_right.y - top_left.y,
        };

        (rect.width > 0 && rect.height > 0).then_some(rect)
    }

    /// Resize plan for an axis-aligned ROI that sticks out of the frame: the
    /// visible part is resized into the matching sub-rectangle of the model input
    /// so that landmarks keep the ROI's scale. The rest of the input is blank.
    pub fn partial_resize(&self, bounds: FrameBounds, input_width: i32, input_height: i32) -> Option<PartialResize> {
        let source = self.source_rect()?;
        let (f0, f2) = (self.corners[0], self.corners[2]);
        let (c0, c2) = (self.clamped_corners[0], self.clamped_corners[2]);
        let (span_x, span_y) = (f2.x - f0.x, f2.y - f0.y);

        if span_x <= 0.0 || span_y <= 0.0 {
            return None;
        }

        let to_input_x = |pixels: f32| math::round(pixels * input_width as f32 / span_x) as i32;
        let to_input_y = |pixels: f32| math::round(pixels * input_height as f32 / span_y) as i32;

        let offset_x = if c0.x == f0.x as i32 {
            0
        } else {
            to_input_x(c0.x as f32 - f0.x)
        };
        let offset_y = if c0.y == f0.y as i32 {
            0
        } else {
            to_input_y(c0.y as f32 - f0.y)
        };

        let width = if offset_x != 0 {
            to_input_x(f2.x - c0.x as f32)
        } else if c2.x < bounds.width - 1 {
            input_width
        } else {
            to_input_x(c2.x as f32 - f0.x)
        };
        let height = if offset_y != 0 {
            to_input_y(f2.y - c0.y as f32)
        } else if c2.y < bounds.height - 1 {
            input_height
        } else {
            to_input_y(c2.y as f32 - f0.y)
        };

        let dest = PixelRect {
            x: offset_x,
            y: offset_y,
            width,
            height,
        };

        let fits = dest.x >= 0
            && dest.y >= 0
            && dest.width > 0
            && dest.height > 0
            && dest.x + dest.width <= input_width
            && dest.y + dest.height <= input_height;

        fits.then_some(PartialResize { source, dest })
    }
}

/// Source rectangle in the frame and its destination inside the model input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialResize {
    pub source: PixelRect,
    pub dest: PixelRect,
}

/// What the landmark model is asked to crop this cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropPlan {
    pub request: CropRequest,
    /// Present only when a clamped ROI is resized partially instead of abandoned
    pub partial: Option<PartialResize>,
}
