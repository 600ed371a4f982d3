//! Angle-bucketed sample storage for one full mechanical sweep.
//!
//! The store keeps one bin per discretized view angle at depth-column
//! resolution. A frame replaces exactly the bin addressed by the view
//! angle it was captured at; every other bin keeps its last-written
//! content, which is how a back-and-forth sweep accumulates into one
//! coherent map even though each frame covers a single angular step.

use crate::classify::{classify_sample, corrected_depth_mm, screen_angle_deg};
use crate::config::MapConfig;
use crate::core::{normalize_angle_deg, Classification, DepthFrame};

/// One classified sample placed in a bin.
///
/// Carries the per-column screen angle so the rasterizer can place it
/// without re-deriving frame geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedSample {
    /// Foreshortening-corrected depth in millimeters
    pub depth_mm: u16,
    /// Per-column angular offset from the optical center, degrees
    pub screen_angle_deg: f64,
    /// Obstacle/Other label
    pub class: Classification,
}

/// One angle bin: the most recent frame's samples for its slot.
#[derive(Clone, Debug, Default)]
struct AngleBin {
    /// Exact (undiscretized) view angle of the last write, degrees
    view_angle_deg: f64,
    samples: Vec<PlacedSample>,
}

/// Fixed-size ring of angle bins accumulating classified depth samples
/// across an entire sweep.
#[derive(Clone, Debug)]
pub struct AngleBucketStore {
    bins: Vec<AngleBin>,
    resolution_deg: f64,
}

impl AngleBucketStore {
    /// Create an empty store sized from the configuration.
    pub fn new(config: &MapConfig) -> Self {
        Self {
            bins: vec![AngleBin::default(); config.bin_count()],
            resolution_deg: config.angular_resolution_deg(),
        }
    }

    /// Number of bins (one per discretized view angle).
    #[inline]
    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    /// Bin index for a view angle, normalized into `[0, 360)` and rounded
    /// to the discretization step.
    #[inline]
    pub fn bin_index(&self, view_angle_deg: f64) -> usize {
        let normalized = normalize_angle_deg(view_angle_deg);
        (normalized / self.resolution_deg).round() as usize % self.bins.len()
    }

    /// Absorb a classified frame into the bin addressed by `view_angle_deg`.
    ///
    /// The touched bin's samples are replaced wholesale with this frame's
    /// classified columns; no other bin is modified. Zero-depth pixels
    /// never enter the store. Returns the index of the written bin.
    pub fn absorb(
        &mut self,
        frame: &DepthFrame,
        view_angle_deg: f64,
        config: &MapConfig,
    ) -> usize {
        let index = self.bin_index(view_angle_deg);
        let bin = &mut self.bins[index];
        bin.samples.clear();
        bin.view_angle_deg = view_angle_deg;

        for col in 0..frame.width() {
            let screen_angle = screen_angle_deg(col, config);
            for row in 0..frame.height() {
                let Some(sample) = classify_sample(frame.depth_at(row, col), row, config) else {
                    continue;
                };
                bin.samples.push(PlacedSample {
                    depth_mm: corrected_depth_mm(sample.depth_mm, screen_angle),
                    screen_angle_deg: screen_angle,
                    class: sample.class,
                });
            }
        }

        log::trace!(
            "AngleBucketStore: bin {} <- {} samples at {:.2}°",
            index,
            bin.samples.len(),
            view_angle_deg
        );

        index
    }

    /// Samples currently held by a bin.
    #[inline]
    pub fn samples(&self, index: usize) -> &[PlacedSample] {
        &self.bins[index].samples
    }

    /// Exact view angle of a bin's last write, degrees.
    #[inline]
    pub fn view_angle(&self, index: usize) -> f64 {
        self.bins[index].view_angle_deg
    }

    /// Iterate non-empty bins as (view angle, samples).
    pub fn occupied_bins(&self) -> impl Iterator<Item = (f64, &[PlacedSample])> {
        self.bins
            .iter()
            .filter(|bin| !bin.samples.is_empty())
            .map(|bin| (bin.view_angle_deg, bin.samples.as_slice()))
    }

    /// Empty every bin.
    pub fn clear(&mut self) {
        for bin in &mut self.bins {
            bin.samples.clear();
            bin.view_angle_deg = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> MapConfig {
        // 8 columns over 40° -> 5°/bin, 72 bins
        MapConfig {
            frame_width: 8,
            frame_height: 4,
            horizontal_fov_deg: 40.0,
            vertical_fov_deg: 30.0,
            max_depth_mm: 4000,
            mount_height_mm: 500,
            scale_mm_per_px: 10,
        }
    }

    fn uniform_frame(config: &MapConfig, depth: u16) -> DepthFrame {
        DepthFrame::new(
            config.frame_width,
            config.frame_height,
            vec![depth; config.frame_width * config.frame_height],
        )
        .unwrap()
    }

    #[test]
    fn test_bin_count_from_config() {
        let config = small_config();
        let store = AngleBucketStore::new(&config);
        assert_eq!(store.bin_count(), 72);
    }

    #[test]
    fn test_bin_index_normalizes_and_wraps() {
        let store = AngleBucketStore::new(&small_config());
        assert_eq!(store.bin_index(0.0), 0);
        assert_eq!(store.bin_index(360.0), 0);
        assert_eq!(store.bin_index(-5.0), 71);
        assert_eq!(store.bin_index(10.0), 2);
    }

    #[test]
    fn test_absorb_replaces_touched_bin_only() {
        let config = small_config();
        let mut store = AngleBucketStore::new(&config);

        let index_a = store.absorb(&uniform_frame(&config, 1000), 30.0, &config);
        let snapshot_a: Vec<_> = store.samples(index_a).to_vec();
        assert!(!snapshot_a.is_empty());

        // A later frame for a different angle must not disturb bin A.
        let index_b = store.absorb(&uniform_frame(&config, 2500), 90.0, &config);
        assert_ne!(index_a, index_b);
        assert_eq!(store.samples(index_a), snapshot_a.as_slice());

        // Revisiting bin A replaces its content wholesale.
        store.absorb(&uniform_frame(&config, 2500), 30.0, &config);
        assert_ne!(store.samples(index_a), snapshot_a.as_slice());
        assert_eq!(store.samples(index_a).len(), snapshot_a.len());
    }

    #[test]
    fn test_zero_depth_excluded() {
        let config = small_config();
        let mut store = AngleBucketStore::new(&config);
        let index = store.absorb(&uniform_frame(&config, 0), 0.0, &config);
        assert!(store.samples(index).is_empty());
    }

    #[test]
    fn test_samples_carry_screen_angle() {
        let config = small_config();
        let mut store = AngleBucketStore::new(&config);
        let index = store.absorb(&uniform_frame(&config, 1000), 0.0, &config);

        let angles: Vec<f64> = store
            .samples(index)
            .iter()
            .map(|s| s.screen_angle_deg)
            .collect();
        assert!(angles.iter().any(|&a| a < 0.0));
        assert!(angles.iter().any(|&a| a > 0.0));
    }

    #[test]
    fn test_clear_empties_all_bins() {
        let config = small_config();
        let mut store = AngleBucketStore::new(&config);
        store.absorb(&uniform_frame(&config, 1000), 30.0, &config);
        store.clear();
        assert_eq!(store.occupied_bins().count(), 0);
    }
}
