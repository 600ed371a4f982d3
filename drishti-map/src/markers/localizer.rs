//! Marker back-projection from depth-space corners to map coordinates.
//!
//! The upstream detector hands over four corner pixels in depth-image
//! space; this module turns them into a drawable rectangle on the map.
//! Localization is pure computation: a failed attempt yields `None` and
//! leaves the caller's marker table untouched.

use crate::classify::{corrected_depth_mm, screen_angle_deg};
use crate::config::MapConfig;
use crate::core::{DepthFrame, MapPoint, PixelPoint};
use crate::markers::MarkerRecord;
use crate::raster::project;

/// Number of rings the corner-depth search spirals outward.
const SPIRAL_STEPS: i32 = 5;

/// Physical marker dimensions in millimeters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerSize {
    /// Printed marker width (its extent along the wall it sits on)
    pub width_mm: f64,
    /// How far the marked object extends away from its face
    pub depth_mm: f64,
}

/// Back-project a detected marker onto the map.
///
/// `capture_angle_deg` is the actuator view angle in effect when `frame`
/// was captured. Returns `None` when the depth data around the marker is
/// too sparse to anchor it; the caller decides whether to keep a previous
/// record.
#[allow(clippy::too_many_arguments)]
pub fn localize(
    id: i32,
    top_left: PixelPoint,
    top_right: PixelPoint,
    bottom_left: PixelPoint,
    bottom_right: PixelPoint,
    size: MarkerSize,
    frame: &DepthFrame,
    capture_angle_deg: f64,
    config: &MapConfig,
) -> Option<MarkerRecord> {
    let corners = [top_left, top_right, bottom_left, bottom_right];
    let center_depth = average_depth(frame, &corners)?;

    // The corner further right in the image is the one facing the sensor;
    // perspective skews the raw detection, so pick per side by X.
    let anchor_left = if top_left.x > bottom_left.x {
        top_left
    } else {
        bottom_left
    };
    let anchor_right = if top_right.x > bottom_right.x {
        top_right
    } else {
        bottom_right
    };

    let half_window = size.width_mm / 2.0;
    let left_depth = find_corner_depth(frame, anchor_left, center_depth, half_window)?;
    let right_depth = find_corner_depth(frame, anchor_right, center_depth, half_window)?;

    let bottom_left_map = corner_to_map(anchor_left, left_depth, capture_angle_deg, config);
    let bottom_right_map = corner_to_map(anchor_right, right_depth, capture_angle_deg, config);

    let scale = config.scale_mm_per_px as f64;
    let width_px = size.width_mm / scale;
    let depth_px = size.depth_mm / scale;

    // Fix the bottom edge to the marker's true width along its own
    // direction; the raw right corner is the noisier of the two.
    let direction = (bottom_right_map - bottom_left_map).normalized();
    if direction == MapPoint::default() {
        return None;
    }
    let bottom_right_fixed = bottom_left_map + direction.scaled(width_px);

    // Extrude away from the sensor to close the rectangle.
    let center = {
        let half = config.raster_side() as f64 / 2.0;
        MapPoint::new(half, half)
    };
    let mut extrusion = direction.perpendicular();
    if extrusion.dot(&(bottom_left_map - center)) < 0.0 {
        extrusion = extrusion.scaled(-1.0);
    }
    let top_right_map = bottom_right_fixed + extrusion.scaled(depth_px);
    let top_left_map = bottom_left_map + extrusion.scaled(depth_px);

    Some(MarkerRecord {
        id,
        polygon: [
            bottom_left_map,
            bottom_right_fixed,
            top_right_map,
            top_left_map,
            bottom_left_map,
        ],
    })
}

/// Average all non-zero depths inside the corner bounding box.
///
/// Returns `None` when the box contains no valid return at all.
fn average_depth(frame: &DepthFrame, corners: &[PixelPoint; 4]) -> Option<f64> {
    let min_x = corners.iter().map(|c| c.x).min()?.max(0) as usize;
    let max_x = (corners.iter().map(|c| c.x.max(0)).max()? as usize).min(frame.width() - 1);
    let min_y = corners.iter().map(|c| c.y).min()?.max(0) as usize;
    let max_y = (corners.iter().map(|c| c.y.max(0)).max()? as usize).min(frame.height() - 1);

    let mut sum = 0u64;
    let mut count = 0u64;
    for row in min_y..=max_y {
        for col in min_x..=max_x {
            let depth = frame.depth_at(row, col);
            if depth != 0 {
                sum += depth as u64;
                count += 1;
            }
        }
    }

    if count == 0 {
        None
    } else {
        Some(sum as f64 / count as f64)
    }
}

/// Search an expanding square spiral around `corner` for a depth return
/// within `center_depth ± half_window`.
fn find_corner_depth(
    frame: &DepthFrame,
    corner: PixelPoint,
    center_depth: f64,
    half_window: f64,
) -> Option<u16> {
    let in_window = |depth: u16| {
        depth != 0 && (depth as f64 - center_depth).abs() <= half_window
    };
    let depth_checked = |x: i32, y: i32| -> Option<u16> {
        if x < 0 || y < 0 || x as usize >= frame.width() || y as usize >= frame.height() {
            return None;
        }
        Some(frame.depth_at(y as usize, x as usize))
    };

    for ring in 0..=SPIRAL_STEPS {
        for dy in -ring..=ring {
            for dx in -ring..=ring {
                // Perimeter of the ring only; inner cells were already seen
                if dx.abs() != ring && dy.abs() != ring {
                    continue;
                }
                if let Some(depth) = depth_checked(corner.x + dx, corner.y + dy) {
                    if in_window(depth) {
                        return Some(depth);
                    }
                }
            }
        }
    }

    None
}

/// Project a corner's pixel column into map coordinates at the capture
/// angle, using the same projection the rasterizer uses.
fn corner_to_map(
    corner: PixelPoint,
    depth_mm: u16,
    capture_angle_deg: f64,
    config: &MapConfig,
) -> MapPoint {
    let col = corner.x.clamp(0, config.frame_width as i32 - 1) as usize;
    let screen_angle = screen_angle_deg(col, config);
    let corrected = corrected_depth_mm(depth_mm, screen_angle);
    project(screen_angle, capture_angle_deg, corrected as f64, config)
}
