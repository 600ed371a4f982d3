//! # Drishti-Map: Angle-Bucketed Depth Mapping
//!
//! Builds a top-down 2D occupancy raster from depth-camera frames
//! captured while the camera is panned by a motorized mount, and
//! overlays the map-space position of detected fiducial markers.
//!
//! ## Data Flow
//!
//! ```text
//!   ┌──────────────┐      ┌───────────────────┐      ┌────────────────┐
//!   │ Depth Frame  │ ───► │ Sample Classifier │ ───► │ Angle Buckets  │
//!   │ (u16 mm)     │      │ (Obstacle/Other)  │      │ (one bin per   │
//!   └──────────────┘      └───────────────────┘      │  view angle)   │
//!                                                    └───────┬────────┘
//!   ┌──────────────┐      ┌───────────────────┐              │
//!   │ Marker       │ ───► │ Marker Localizer  │──────┐       │ full redraw
//!   │ corners (px) │      │ (spiral search +  │      ▼       ▼
//!   └──────────────┘      │  back-projection) │   ┌────────────────┐
//!                         └───────────────────┘   │  Map Raster    │
//!                                                 │  obstacle+other│
//!                                                 └────────────────┘
//! ```
//!
//! All shared state (bucket store, rasters, marker table) lives behind a
//! single lock per [`MappingEngine`]; a dedicated worker thread absorbs
//! frames so the sensor's delivery context never blocks, and a
//! single-permit step gate keeps the pan actuator in lockstep with frame
//! ingestion.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use drishti_map::{DepthFrame, MapConfig, MappingEngine, StepEvent};
//!
//! let config = MapConfig::default();
//! let engine = MappingEngine::new(config.clone())?;
//! let waiter = engine.step_waiter();
//!
//! // Sensor delivery context:
//! let depths = vec![0u16; config.frame_width * config.frame_height];
//! let frame = DepthFrame::new(config.frame_width, config.frame_height, depths)?;
//! engine.update(frame);
//!
//! // Actuator control context:
//! assert_eq!(waiter.wait(), StepEvent::FrameAbsorbed);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod buckets;
pub mod classify;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod markers;
pub mod raster;

// Re-export main types at crate root
pub use config::MapConfig;
pub use core::{Classification, DepthFrame, DepthSample, MapPoint, PixelPoint};
pub use engine::{step_gate, MappingEngine, StepEvent, StepNotifier, StepWaiter};
pub use error::{ConfigError, FrameSizeMismatch};
pub use markers::{localize, MarkerRecord, MarkerSize, MarkerTable};
pub use raster::{MapRaster, OBSTACLE_COLOR, OTHER_COLOR};
