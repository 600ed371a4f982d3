//! Hardware-free sweep demo: a mock pan actuator, a synthetic depth
//! scene, and the mapping engine running one full back-and-forth sweep.
//!
//! ```sh
//! RUST_LOG=info cargo run --example sweep_mock
//! ```

use drishti_io::{MockActuator, SweepParams, SweepSyncController};
use drishti_map::{DepthFrame, MapConfig, MapPoint, MappingEngine};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Synthetic scene: a flat wall 2.5m out with a low box 1.2m out in the
/// middle third of the view.
fn synthetic_frame(config: &MapConfig) -> DepthFrame {
    let width = config.frame_width;
    let height = config.frame_height;
    let mut data = vec![0u16; width * height];

    for row in 0..height {
        for col in 0..width {
            let mid_third = col > width / 3 && col < 2 * width / 3;
            let below_center = row > height / 2 + height / 8;
            data[row * width + col] = if mid_third && below_center { 1200 } else { 2500 };
        }
    }

    DepthFrame::new(width, height, data).unwrap()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    log::info!("=== Drishti Mock Sweep Demo ===");

    // === 1. Mapping engine ===
    log::info!("1. Starting mapping engine...");
    let config = MapConfig::default();
    let engine = Arc::new(MappingEngine::new(config.clone())?);
    log::info!(
        "   ✓ Engine up: {} bins, {}x{} raster",
        config.bin_count(),
        config.raster_side(),
        config.raster_side()
    );

    // === 2. Sensor delivery thread ===
    log::info!("2. Starting synthetic sensor feed...");
    let feed_stop = Arc::new(AtomicBool::new(false));
    let feeder = {
        let engine = Arc::clone(&engine);
        let config = config.clone();
        let stop = Arc::clone(&feed_stop);
        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                engine.update(synthetic_frame(&config));
                thread::sleep(Duration::from_millis(5));
            }
        })
    };

    // === 3. Sweep controller over a mock actuator ===
    log::info!("3. Sweeping 40°..140° in 4° steps...");
    let mock = MockActuator::new(90.0);
    let params = SweepParams {
        min_angle_deg: 40.0,
        max_angle_deg: 140.0,
        step_deg: 4.0,
    };
    let controller =
        SweepSyncController::new(Box::new(mock.clone()), Arc::clone(&engine), params)?;
    let handle = controller.spawn();

    // One full cycle is 2 * (100 / 4) = 50 steps
    while mock.rotations().len() < 50 {
        thread::sleep(Duration::from_millis(10));
    }
    handle.stop();
    handle.join()?;
    log::info!("   ✓ Sweep complete: {} steps", mock.rotations().len());

    feed_stop.store(true, Ordering::Relaxed);
    feeder.join().expect("feeder thread");

    // === 4. Inspect the result ===
    let half = config.raster_side() as f64 / 2.0;
    let center = MapPoint::new(half, half);
    engine.with_raster(|raster| {
        let side = raster.side();
        let mut obstacle = 0usize;
        let mut other = 0usize;
        let mut nearest = f64::INFINITY;
        for y in 0..side {
            for x in 0..side {
                if raster.is_obstacle_at(x, y) {
                    obstacle += 1;
                    let d = MapPoint::new(x as f64, y as f64).distance(&center);
                    if d < nearest {
                        nearest = d;
                    }
                }
                if raster.is_other_at(x, y) {
                    other += 1;
                }
            }
        }
        log::info!(
            "4. Map: {} obstacle px, {} other px, nearest obstacle {:.0}cm",
            obstacle,
            other,
            nearest * config.scale_mm_per_px as f64 / 10.0
        );
    });

    log::info!("=== Done ===");
    Ok(())
}
