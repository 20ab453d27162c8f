#![cfg_attr(not(feature = "std"), no_std)]

pub mod config;
pub mod crop;
pub mod detection;
pub mod geometry;
pub mod landmarks;
mod math;
pub mod tracker;

pub use config::{ClampPolicy, RoiAdjust, TrackerConfig};
pub use crop::{CropPlan, CropRequest, PartialResize, PixelRect};
pub use geometry::{FrameBounds, PixelPoint, RotationMode};
pub use landmarks::LandmarkSet;
pub use tracker::{CyclePlan, HandTracker, TrackerState};
