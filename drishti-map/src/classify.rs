//! Per-pixel depth sample classification.
//!
//! Converts a raw depth return plus its pixel position into a real-world
//! height above/below the sensor plane and an Obstacle/Other label.
//! Depths are corrected for per-column off-axis foreshortening before
//! they enter the angle buckets.

use crate::config::MapConfig;
use crate::core::{Classification, DepthSample};

/// Per-column angular offset from the optical center, in degrees.
///
/// Positive to the right of center, negative to the left.
#[inline]
pub fn screen_angle_deg(col: usize, config: &MapConfig) -> f64 {
    let width = config.frame_width as f64;
    (col as f64 - width / 2.0) / width * config.horizontal_fov_deg
}

/// Correct a depth for off-axis foreshortening at the given screen angle.
///
/// `corrected = depth / sin(90° - screen_angle)`. At |screen_angle| >= 90°
/// (only reachable with a field of view of 180° or more) the divisor
/// reaches zero; the corrected depth is defined as the raw depth there.
#[inline]
pub fn corrected_depth_mm(depth_mm: u16, screen_angle_deg: f64) -> u16 {
    let divisor = (90.0 - screen_angle_deg.abs()).to_radians().sin();
    if divisor <= f64::EPSILON {
        return depth_mm;
    }
    (depth_mm as f64 / divisor).round() as u16
}

/// Classify a single raw depth return at the given row.
///
/// Returns `None` for a zero depth ("no return"); otherwise the depth is
/// clamped to the configured maximum and labeled:
/// - rows at or above the vertical center always classify as `Other`;
/// - rows below center classify as `Obstacle` when the return's drop
///   under the sensor plane stays within the mount clearance threshold.
pub fn classify_sample(raw_depth_mm: u16, row: usize, config: &MapConfig) -> Option<DepthSample> {
    if raw_depth_mm == 0 {
        return None;
    }
    let depth = raw_depth_mm.min(config.max_depth_mm);

    let height = config.frame_height as f64;
    let centered = row as f64 - height / 2.0;
    if centered <= 0.0 {
        return Some(DepthSample::new(depth, Classification::Other));
    }

    let vertical_angle = (centered / height).abs() * config.vertical_fov_deg;
    let drop_mm = depth as f64 * vertical_angle.to_radians().sin()
        / (90.0 - vertical_angle).to_radians().sin();

    let class = if drop_mm <= config.mount_height_mm as f64 {
        Classification::Obstacle
    } else {
        Classification::Other
    };

    Some(DepthSample::new(depth, class))
}
