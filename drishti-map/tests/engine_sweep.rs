//! End-to-end mapping tests over a synthetic panned depth scene.
//!
//! A 512x424 frame carries a ground plane below center and a low object
//! patch; absorbed at a single view angle, the object must land on the
//! obstacle channel near the expected map radius while the ground stays
//! on the other channel.

use drishti_map::{DepthFrame, MapConfig, MappingEngine, MarkerSize, PixelPoint, StepEvent};

const OBJECT_ROWS: std::ops::Range<usize> = 300..321;
const OBJECT_COLS: std::ops::Range<usize> = 100..151;
const GROUND_ROWS: std::ops::Range<usize> = 340..424;
const SCENE_DEPTH_MM: u16 = 2000;

fn test_config() -> MapConfig {
    MapConfig::default() // 512x424, 70°/60°, 600mm clearance, 10mm/px
}

/// Synthetic scene: a 2000mm ground band well below center plus a low
/// object patch at the same depth. Everything else is "no return".
fn scene_frame(config: &MapConfig) -> DepthFrame {
    let mut data = vec![0u16; config.frame_width * config.frame_height];

    for row in GROUND_ROWS {
        for col in 0..config.frame_width {
            data[row * config.frame_width + col] = SCENE_DEPTH_MM;
        }
    }
    for row in OBJECT_ROWS {
        for col in OBJECT_COLS {
            data[row * config.frame_width + col] = SCENE_DEPTH_MM;
        }
    }

    DepthFrame::new(config.frame_width, config.frame_height, data).unwrap()
}

fn absorb_scene(engine: &MappingEngine, config: &MapConfig, angle: f64) {
    let waiter = engine.step_waiter();
    engine.set_angle(angle);
    assert!(engine.update(scene_frame(config)));
    assert_eq!(waiter.wait(), StepEvent::FrameAbsorbed);
}

/// Distances (in raster pixels) of every opaque pixel from the map center.
fn opaque_radii(channel: &[u8], side: usize) -> Vec<f64> {
    let half = side as f64 / 2.0;
    channel
        .chunks(4)
        .enumerate()
        .filter(|(_, px)| px[3] != 0)
        .map(|(i, _)| {
            let x = (i % side) as f64;
            let y = (i / side) as f64;
            ((x - half).powi(2) + (y - half).powi(2)).sqrt()
        })
        .collect()
}

#[test]
fn object_maps_to_obstacle_channel_at_expected_radius() {
    let config = test_config();
    let engine = MappingEngine::new(config.clone()).unwrap();

    absorb_scene(&engine, &config, 0.0);

    engine.with_raster(|raster| {
        let obstacle_radii = opaque_radii(raster.obstacle(), raster.side());
        let other_radii = opaque_radii(raster.other(), raster.side());

        assert!(!obstacle_radii.is_empty(), "object produced no obstacle pixels");
        assert!(!other_radii.is_empty(), "ground produced no other pixels");

        // 2000mm at 10mm/px is 200px before foreshortening correction;
        // the object columns sit up to ~21° off axis, stretching that to
        // ~215px. Everything must stay inside that envelope.
        assert!(
            obstacle_radii.iter().any(|&r| (195.0..=225.0).contains(&r)),
            "no obstacle pixel near the 2000mm radius"
        );
        assert!(
            obstacle_radii.iter().all(|&r| r <= 230.0),
            "obstacle pixel far outside the scene depth"
        );
    });
}

#[test]
fn object_rows_classify_obstacle_and_ground_rows_other() {
    let config = test_config();
    let frame = scene_frame(&config);

    for row in OBJECT_ROWS {
        for col in OBJECT_COLS {
            let sample = drishti_map::classify::classify_sample(
                frame.depth_at(row, col),
                row,
                &config,
            )
            .expect("object pixel has a return");
            assert!(sample.is_obstacle(), "object pixel ({row},{col}) not Obstacle");
        }
    }

    for row in GROUND_ROWS {
        let sample = drishti_map::classify::classify_sample(
            frame.depth_at(row, 0),
            row,
            &config,
        )
        .expect("ground pixel has a return");
        assert!(!sample.is_obstacle(), "ground pixel (row {row}) not Other");
    }
}

#[test]
fn reabsorbing_the_same_frame_is_idempotent() {
    let config = test_config();
    let engine = MappingEngine::new(config.clone()).unwrap();

    absorb_scene(&engine, &config, 0.0);
    let first = engine.with_raster(|raster| raster.clone());

    absorb_scene(&engine, &config, 0.0);
    let second = engine.with_raster(|raster| raster.clone());

    assert_eq!(first, second);
}

#[test]
fn frames_at_other_angles_preserve_earlier_coverage() {
    let config = test_config();
    let engine = MappingEngine::new(config.clone()).unwrap();

    absorb_scene(&engine, &config, 0.0);
    let solo = engine.with_raster(|raster| raster.clone());

    // A second frame 90° away must only add pixels, never disturb the
    // first frame's sector.
    absorb_scene(&engine, &config, 90.0);

    engine.with_raster(|raster| {
        let side = raster.side();
        for y in 0..side {
            for x in 0..side {
                if solo.is_obstacle_at(x, y) {
                    assert!(
                        raster.is_obstacle_at(x, y),
                        "sweep history lost at ({x},{y})"
                    );
                }
            }
        }
    });
}

#[test]
fn marker_overlay_lands_on_obstacle_channel() {
    let config = test_config();
    let engine = MappingEngine::new(config.clone()).unwrap();

    absorb_scene(&engine, &config, 0.0);

    // Marker pasted on the object patch; its corners see valid depth.
    let placed = engine.add_marker(
        42,
        PixelPoint::new(110, 302),
        PixelPoint::new(140, 303),
        PixelPoint::new(111, 318),
        PixelPoint::new(139, 319),
        MarkerSize {
            width_mm: 300.0,
            depth_mm: 200.0,
        },
    );
    assert!(placed);

    let record = engine.marker(42).expect("marker record present");
    assert_eq!(record.polygon[0], record.polygon[4]);

    // The polygon midpoint must be filled as occupied space.
    let mid_x = (record.polygon[0].x + record.polygon[2].x) / 2.0;
    let mid_y = (record.polygon[0].y + record.polygon[2].y) / 2.0;
    engine.with_raster(|raster| {
        assert!(raster.is_obstacle_at(mid_x as usize, mid_y as usize));
    });

    // Detector reports the marker gone: the overlay follows.
    assert!(engine.remove_marker(42));
    assert!(engine.marker(42).is_none());
}
