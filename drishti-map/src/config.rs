//! Configuration for the mapping engine.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Configuration for the mapping engine.
///
/// Defaults match the reference hardware: a 512x424 depth camera with a
/// 70° horizontal and 60° vertical field of view, panned by a mount with
/// 600 mm of ground clearance under the sensor plane.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Maximum usable depth in millimeters; deeper returns are clamped.
    /// Default: 8000
    pub max_depth_mm: u16,

    /// Horizontal field of view in degrees.
    /// Default: 70.0
    pub horizontal_fov_deg: f64,

    /// Vertical field of view in degrees.
    /// Default: 60.0
    pub vertical_fov_deg: f64,

    /// Mount clearance threshold in millimeters: a below-center return
    /// whose drop under the sensor plane stays within this threshold is
    /// classified as an obstacle.
    /// Default: 600
    pub mount_height_mm: u16,

    /// Expected depth frame width in pixels.
    /// Default: 512
    pub frame_width: usize,

    /// Expected depth frame height in pixels.
    /// Default: 424
    pub frame_height: usize,

    /// Map scale: millimeters of world space per raster pixel.
    /// Default: 10
    pub scale_mm_per_px: u16,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            max_depth_mm: 8000,
            horizontal_fov_deg: 70.0,
            vertical_fov_deg: 60.0,
            mount_height_mm: 600,
            frame_width: 512,
            frame_height: 424,
            scale_mm_per_px: 10,
        }
    }
}

impl MapConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate numeric bounds. Invalid values are rejected here,
    /// never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.horizontal_fov_deg > 0.0 && self.horizontal_fov_deg < 360.0) {
            return Err(ConfigError::InvalidFov {
                axis: "horizontal",
                value: self.horizontal_fov_deg,
            });
        }
        if !(self.vertical_fov_deg > 0.0 && self.vertical_fov_deg < 360.0) {
            return Err(ConfigError::InvalidFov {
                axis: "vertical",
                value: self.vertical_fov_deg,
            });
        }
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(ConfigError::InvalidFrameSize {
                width: self.frame_width,
                height: self.frame_height,
            });
        }
        if self.max_depth_mm == 0 {
            return Err(ConfigError::InvalidMaxDepth);
        }
        if self.scale_mm_per_px == 0 {
            return Err(ConfigError::InvalidScale);
        }
        Ok(())
    }

    /// Angular resolution of one depth column in degrees.
    #[inline]
    pub fn angular_resolution_deg(&self) -> f64 {
        self.horizontal_fov_deg / self.frame_width as f64
    }

    /// Number of angle bins covering a full rotation at column resolution.
    #[inline]
    pub fn bin_count(&self) -> usize {
        (360.0 / self.angular_resolution_deg()).round() as usize
    }

    /// Side length of the square map raster in pixels.
    #[inline]
    pub fn raster_side(&self) -> usize {
        2 * self.max_depth_mm as usize / self.scale_mm_per_px as usize
    }

    // ===== Builder Methods =====

    /// Builder-style setter for the maximum depth.
    pub fn with_max_depth_mm(mut self, max_depth_mm: u16) -> Self {
        self.max_depth_mm = max_depth_mm;
        self
    }

    /// Builder-style setter for the mount clearance threshold.
    pub fn with_mount_height_mm(mut self, mount_height_mm: u16) -> Self {
        self.mount_height_mm = mount_height_mm;
        self
    }

    /// Builder-style setter for the frame dimensions.
    pub fn with_frame_size(mut self, width: usize, height: usize) -> Self {
        self.frame_width = width;
        self.frame_height = height;
        self
    }
}
