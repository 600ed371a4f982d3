//! Top-down map rasterization.
//!
//! Converts the bucket store into two BGRA raster channels (obstacle,
//! other) and fills live marker polygons onto the obstacle channel.
//! Every pass is a full redraw, so the raster always exactly reflects
//! the bucket-store + marker-table snapshot it was rendered from.

use crate::buckets::AngleBucketStore;
use crate::config::MapConfig;
use crate::core::{Classification, MapPoint};
use crate::markers::MarkerTable;

/// Opaque red, BGRA. Used for obstacle samples and marker fills.
pub const OBSTACLE_COLOR: [u8; 4] = [0, 0, 255, 255];

/// Opaque green, BGRA. Used for all other classified samples.
pub const OTHER_COLOR: [u8; 4] = [0, 255, 0, 255];

const BYTES_PER_PIXEL: usize = 4;

/// Two equally-sized BGRA channels covering a square map region of side
/// `2 * max_depth / scale` centered on the sensor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapRaster {
    side: usize,
    obstacle: Vec<u8>,
    other: Vec<u8>,
}

impl MapRaster {
    /// Create a cleared raster pair sized from the configuration.
    pub fn new(config: &MapConfig) -> Self {
        let side = config.raster_side();
        Self {
            side,
            obstacle: vec![0; side * side * BYTES_PER_PIXEL],
            other: vec![0; side * side * BYTES_PER_PIXEL],
        }
    }

    /// Side length in pixels (both channels are `side` x `side`).
    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    /// Row stride in bytes.
    #[inline]
    pub fn stride(&self) -> usize {
        self.side * BYTES_PER_PIXEL
    }

    /// Obstacle channel, BGRA row-major.
    #[inline]
    pub fn obstacle(&self) -> &[u8] {
        &self.obstacle
    }

    /// Other-surface channel, BGRA row-major.
    #[inline]
    pub fn other(&self) -> &[u8] {
        &self.other
    }

    /// True if the obstacle channel has an opaque pixel at (x, y).
    pub fn is_obstacle_at(&self, x: usize, y: usize) -> bool {
        self.alpha_at(&self.obstacle, x, y) != 0
    }

    /// True if the other channel has an opaque pixel at (x, y).
    pub fn is_other_at(&self, x: usize, y: usize) -> bool {
        self.alpha_at(&self.other, x, y) != 0
    }

    fn alpha_at(&self, channel: &[u8], x: usize, y: usize) -> u8 {
        if x >= self.side || y >= self.side {
            return 0;
        }
        channel[(y * self.side + x) * BYTES_PER_PIXEL + 3]
    }

    /// Reset both channels to transparent black.
    pub fn clear(&mut self) {
        self.obstacle.fill(0);
        self.other.fill(0);
    }

    fn put(&mut self, channel: Channel, x: i64, y: i64, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.side as i64 || y >= self.side as i64 {
            return;
        }
        let offset = (y as usize * self.side + x as usize) * BYTES_PER_PIXEL;
        let buffer = match channel {
            Channel::Obstacle => &mut self.obstacle,
            Channel::Other => &mut self.other,
        };
        buffer[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&color);
    }
}

#[derive(Clone, Copy)]
enum Channel {
    Obstacle,
    Other,
}

/// Project a bucketed sample into map-raster coordinates.
///
/// The sensor sits at the raster center; a sample straight ahead at view
/// angle 0 lands on the +X axis. The single projection used everywhere —
/// sample rendering and marker localization share it, so the two can
/// never disagree on the screen-to-map convention.
#[inline]
pub fn project(
    screen_angle_deg: f64,
    view_angle_deg: f64,
    depth_mm: f64,
    config: &MapConfig,
) -> MapPoint {
    let half = config.raster_side() as f64 / 2.0;
    let depth_px = depth_mm / config.scale_mm_per_px as f64;
    let angle = (screen_angle_deg - view_angle_deg + 90.0).to_radians();
    MapPoint::new(half + angle.sin() * depth_px, half - angle.cos() * depth_px)
}

/// Redraw both channels from the full bucket store, then fill every live
/// marker polygon onto the obstacle channel.
///
/// Markers always render as occupied space, overriding classification
/// pixels at the same location.
pub fn render(
    store: &AngleBucketStore,
    markers: &MarkerTable,
    config: &MapConfig,
    raster: &mut MapRaster,
) {
    raster.clear();

    for (view_angle, samples) in store.occupied_bins() {
        for sample in samples {
            let point = project(
                sample.screen_angle_deg,
                view_angle,
                sample.depth_mm as f64,
                config,
            );
            let (x, y) = (point.x as i64, point.y as i64);
            match sample.class {
                Classification::Obstacle => raster.put(Channel::Obstacle, x, y, OBSTACLE_COLOR),
                Classification::Other => raster.put(Channel::Other, x, y, OTHER_COLOR),
            }
        }
    }

    for record in markers.iter() {
        fill_polygon(raster, &record.polygon);
    }
}

/// Scanline-fill a closed polygon onto the obstacle channel.
fn fill_polygon(raster: &mut MapRaster, polygon: &[MapPoint; 5]) {
    let min_y = polygon.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = polygon
        .iter()
        .map(|p| p.y)
        .fold(f64::NEG_INFINITY, f64::max);

    let y_start = min_y.floor().max(0.0) as i64;
    let y_end = max_y.ceil().min(raster.side() as f64 - 1.0) as i64;

    let mut crossings: Vec<f64> = Vec::with_capacity(4);
    for y in y_start..=y_end {
        let scan = y as f64 + 0.5;
        crossings.clear();

        for edge in polygon.windows(2) {
            let (a, b) = (edge[0], edge[1]);
            // Half-open span so a shared vertex is counted once
            if (a.y <= scan && b.y > scan) || (b.y <= scan && a.y > scan) {
                let t = (scan - a.y) / (b.y - a.y);
                crossings.push(a.x + t * (b.x - a.x));
            }
        }

        crossings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        for pair in crossings.chunks(2) {
            if pair.len() < 2 {
                continue;
            }
            let x_start = pair[0].ceil() as i64;
            let x_end = pair[1].floor() as i64;
            for x in x_start..=x_end {
                raster.put(Channel::Obstacle, x, y, OBSTACLE_COLOR);
            }
        }
    }
}
