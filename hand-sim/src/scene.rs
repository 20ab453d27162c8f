//! Synthetic camera scene: one hand drifting around the frame, changing
//! pose now and then and sometimes walking out of view.

use hand_core::geometry::rotate;
use hand_core::landmarks::index;
use hand_core::{FrameBounds, LandmarkSet};
use hand_shared::{Point, LANDMARK_COUNT};
use log::debug;

use crate::rng::SimpleRng;

/// Frames between pose changes
pub const POSE_PERIOD: u32 = 45;

const MAX_SPEED: f32 = 4.0;
const EXIT_SPEED: f32 = 14.0;
const EXIT_CHANCE: f32 = 0.004;
const MAX_TILT: f32 = 0.35;

/// Fingers in the order they get raised: index, middle, ring, pinky, thumb
const RAISE_ORDER: [usize; 5] = [1, 2, 3, 4, 0];

/// Hand landmarks in a unit box, wrist at the bottom. `raised[0]` is the
/// thumb, then index to pinky.
pub fn unit_hand(raised: [bool; 5]) -> LandmarkSet {
    let mut lm = [Point::default(); LANDMARK_COUNT];
    lm[index::WRIST] = Point::new(0.5, 0.85);

    lm[index::THUMB_CMC] = Point::new(0.42, 0.78);
    lm[index::THUMB_MCP] = Point::new(0.36, 0.70);
    if raised[0] {
        lm[index::THUMB_IP] = Point::new(0.32, 0.62);
        lm[index::THUMB_TIP] = Point::new(0.26, 0.56);
    } else {
        lm[index::THUMB_IP] = Point::new(0.36, 0.62);
        lm[index::THUMB_TIP] = Point::new(0.44, 0.60);
    }

    let fingers = [
        (index::INDEX_MCP, 0.42),
        (index::MIDDLE_MCP, 0.50),
        (index::RING_MCP, 0.58),
        (index::PINKY_MCP, 0.65),
    ];
    for (finger, (mcp, x)) in fingers.into_iter().enumerate() {
        let joints = if raised[finger + 1] {
            [0.42, 0.32, 0.22]
        } else {
            [0.45, 0.52, 0.58]
        };
        lm[mcp] = Point::new(x, 0.55);
        for (joint, y) in joints.into_iter().enumerate() {
            lm[mcp + 1 + joint] = Point::new(x, y);
        }
    }

    lm
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Motion {
    Wandering,
    Leaving,
    /// Out of view for this many more frames
    Away(u32),
}

pub struct HandScene {
    rng: SimpleRng,
    bounds: FrameBounds,
    /// Edge of the unit box in pixels
    span: f32,
    center: Point,
    velocity: Point,
    tilt: f32,
    motion: Motion,
    raised: [bool; 5],
    frame: u32,
}

impl HandScene {
    pub fn new(seed: u32, bounds: FrameBounds) -> Self {
        let span = bounds.width.min(bounds.height) as f32 * 0.45;

        Self {
            rng: SimpleRng::new(seed),
            bounds,
            span,
            center: Point::new(bounds.width as f32 / 2.0, bounds.height as f32 / 2.0),
            velocity: Point::default(),
            tilt: 0.0,
            motion: Motion::Wandering,
            raised: [false; 5],
            frame: 0,
        }
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn raised_count(&self) -> u8 {
        self.raised.iter().filter(|raised| **raised).count() as u8
    }

    pub fn is_present(&self) -> bool {
        !matches!(self.motion, Motion::Away(_))
    }

    /// Keeps the tilted hand inside the frame while wandering
    fn margin(&self) -> f32 {
        self.span * 0.45
    }

    /// Advances the scene by one camera frame
    pub fn step(&mut self) {
        self.frame += 1;

        if self.frame % POSE_PERIOD == 0 {
            let count = ((self.frame / POSE_PERIOD) % 6) as usize;
            for (order, finger) in RAISE_ORDER.iter().enumerate() {
                self.raised[*finger] = order < count;
            }
        }

        let (width, height) = (self.bounds.width as f32, self.bounds.height as f32);
        match self.motion {
            Motion::Wandering => {
                self.velocity.x = (self.velocity.x + self.rng.range_f32(-0.6, 0.6)).clamp(-MAX_SPEED, MAX_SPEED);
                self.velocity.y = (self.velocity.y + self.rng.range_f32(-0.6, 0.6)).clamp(-MAX_SPEED, MAX_SPEED);
                self.tilt = (self.tilt + self.rng.range_f32(-0.02, 0.02)).clamp(-MAX_TILT, MAX_TILT);
                self.center = self.center + self.velocity;

                let margin = self.margin();
                if self.center.x < margin || self.center.x > width - margin {
                    self.velocity.x = -self.velocity.x;
                    self.center.x = self.center.x.clamp(margin, width - margin);
                }
                if self.center.y < margin || self.center.y > height - margin {
                    self.velocity.y = -self.velocity.y;
                    self.center.y = self.center.y.clamp(margin, height - margin);
                }

                if self.rng.chance(EXIT_CHANCE) {
                    let direction = if self.center.x < width / 2.0 { -1.0 } else { 1.0 };
                    self.velocity = Point::new(direction * EXIT_SPEED, 0.0);
                    self.motion = Motion::Leaving;
                    debug!("scene: hand leaving at frame {}", self.frame);
                }
            }
            Motion::Leaving => {
                self.center = self.center + self.velocity;
                if self.center.x < -self.span || self.center.x > width + self.span {
                    self.motion = Motion::Away(self.rng.range_f32(20.0, 80.0) as u32);
                }
            }
            Motion::Away(0) => {
                let margin = self.margin();
                self.center = Point::new(
                    self.rng.range_f32(margin, width - margin),
                    self.rng.range_f32(margin, height - margin),
                );
                self.velocity = Point::default();
                self.tilt = 0.0;
                self.motion = Motion::Wandering;
                debug!("scene: hand back at frame {}", self.frame);
            }
            Motion::Away(frames) => self.motion = Motion::Away(frames - 1),
        }
    }

    /// Screen-space landmarks, `None` while the hand is out of view
    pub fn landmarks(&self) -> Option<LandmarkSet> {
        if !self.is_present() {
            return None;
        }

        let span = self.span;
        let landmarks = unit_hand(self.raised)
            .map(|p| rotate(Point::new((p.x - 0.5) * span, (p.y - 0.5) * span), self.tilt) + self.center);
        Some(landmarks)
    }
}
