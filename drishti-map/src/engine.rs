//! The mapping engine: one lock domain, one worker thread, one gate.
//!
//! The bucket store, both raster channels, and the marker table live
//! behind a single mutex per engine instance; absorb and render execute
//! as atomic operations under it and no bin reference ever escapes the
//! lock. Frame ingestion runs on a dedicated worker so the sensor's
//! delivery thread never blocks on CPU-bound rasterization. A saturated
//! worker drops incoming frames rather than queueing them: the map
//! favors freshness over completeness.

use crate::buckets::AngleBucketStore;
use crate::config::MapConfig;
use crate::core::{DepthFrame, PixelPoint};
use crate::error::ConfigError;
use crate::markers::{localize, MarkerRecord, MarkerSize, MarkerTable};
use crate::raster::{render, MapRaster};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Event delivered through the step gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepEvent {
    /// A frame has been fully absorbed and rasterized
    FrameAbsorbed,
    /// The engine or sweep is shutting down; stop waiting for frames
    Halted,
}

/// Sending side of the step gate. Cloneable; used by the engine worker
/// and by whoever needs to abort a blocked waiter.
#[derive(Clone)]
pub struct StepNotifier {
    tx: Sender<StepEvent>,
}

impl StepNotifier {
    /// Post a frame-absorbed release. One permit per absorbed frame; a
    /// permit already pending is left in place.
    pub fn frame_absorbed(&self) {
        let _ = self.tx.try_send(StepEvent::FrameAbsorbed);
    }

    /// Wake any blocked waiter and tell it to stop.
    pub fn halt(&self) {
        let _ = self.tx.try_send(StepEvent::Halted);
    }
}

/// Receiving side of the step gate.
#[derive(Clone)]
pub struct StepWaiter {
    rx: Receiver<StepEvent>,
}

impl StepWaiter {
    /// Block until the next event. A disconnected gate reads as `Halted`,
    /// so a waiter can never be stranded by engine teardown.
    pub fn wait(&self) -> StepEvent {
        self.rx.recv().unwrap_or(StepEvent::Halted)
    }

    /// Non-blocking poll, mainly for tests.
    pub fn try_wait(&self) -> Option<StepEvent> {
        self.rx.try_recv().ok()
    }
}

/// Create a single-slot rendezvous gate.
///
/// One permit: the notifier releases a waiter exactly once per absorbed
/// frame, which is what keeps actuator stepping and frame ingestion in
/// lockstep.
pub fn step_gate() -> (StepNotifier, StepWaiter) {
    let (tx, rx) = bounded(1);
    (StepNotifier { tx }, StepWaiter { rx })
}

/// Everything the lock protects.
struct MapState {
    store: AngleBucketStore,
    raster: MapRaster,
    markers: MarkerTable,
    view_angle_deg: f64,
    /// Most recently absorbed frame and the view angle it was captured at
    last_frame: Option<(DepthFrame, f64)>,
}

/// The angle-bucketed mapping engine.
///
/// Mutations happen only inside the frame-processing path and the marker
/// calls; the display collaborator reads through [`MappingEngine::with_raster`].
pub struct MappingEngine {
    config: MapConfig,
    state: Arc<Mutex<MapState>>,
    frame_tx: Option<Sender<DepthFrame>>,
    worker: Option<JoinHandle<()>>,
    notifier: StepNotifier,
    waiter: StepWaiter,
}

impl MappingEngine {
    /// Create an engine and start its worker thread.
    ///
    /// Configuration bounds are validated here; invalid values are
    /// rejected, never clamped.
    pub fn new(config: MapConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let state = Arc::new(Mutex::new(MapState {
            store: AngleBucketStore::new(&config),
            raster: MapRaster::new(&config),
            markers: MarkerTable::new(),
            view_angle_deg: 0.0,
            last_frame: None,
        }));

        let (notifier, waiter) = step_gate();
        // One slot: a frame may be queued while another is absorbing;
        // anything beyond that is dropped at the submission site.
        let (frame_tx, frame_rx) = bounded::<DepthFrame>(1);

        let worker_state = Arc::clone(&state);
        let worker_config = config.clone();
        let worker_notifier = notifier.clone();
        let worker = std::thread::Builder::new()
            .name("drishti-map-worker".to_string())
            .spawn(move || {
                Self::worker_loop(frame_rx, worker_state, worker_config, worker_notifier);
            })
            .expect("failed to spawn mapping worker");

        log::info!(
            "MappingEngine: started ({} bins, {}px raster)",
            config.bin_count(),
            config.raster_side()
        );

        Ok(Self {
            config,
            state,
            frame_tx: Some(frame_tx),
            worker: Some(worker),
            notifier,
            waiter,
        })
    }

    fn worker_loop(
        frame_rx: Receiver<DepthFrame>,
        state: Arc<Mutex<MapState>>,
        config: MapConfig,
        notifier: StepNotifier,
    ) {
        while let Ok(frame) = frame_rx.recv() {
            {
                let mut state = state.lock();
                let angle = state.view_angle_deg;
                state.store.absorb(&frame, angle, &config);
                let MapState {
                    store,
                    raster,
                    markers,
                    ..
                } = &mut *state;
                render(store, markers, &config, raster);
                state.last_frame = Some((frame, angle));
            }
            // Always release the gate, even for an empty frame, so a
            // controller blocked on this step cannot lose its wakeup.
            notifier.frame_absorbed();
        }
        log::debug!("MappingEngine: worker exiting");
    }

    /// Engine configuration.
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Set the actuator view angle stamped onto subsequent frames.
    pub fn set_angle(&self, degrees: f64) {
        self.state.lock().view_angle_deg = degrees;
    }

    /// Current view angle in degrees.
    pub fn angle(&self) -> f64 {
        self.state.lock().view_angle_deg
    }

    /// Submit a frame for absorption.
    ///
    /// Returns `true` if the frame was accepted, `false` if it was
    /// dropped because the worker is saturated or the frame does not
    /// match the configured dimensions. Dropping is a silent per-tick
    /// degradation: the map simply omits that data for one cycle.
    pub fn update(&self, frame: DepthFrame) -> bool {
        if frame.width() != self.config.frame_width || frame.height() != self.config.frame_height {
            log::warn!(
                "MappingEngine: dropping {}x{} frame (expected {}x{})",
                frame.width(),
                frame.height(),
                self.config.frame_width,
                self.config.frame_height
            );
            return false;
        }
        let Some(tx) = &self.frame_tx else {
            return false;
        };
        match tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::trace!("MappingEngine: worker busy, frame dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Localize a detected marker and overlay it on the map.
    ///
    /// Runs against the most recently absorbed frame at the view angle it
    /// was captured at. Returns `true` when localization succeeded and
    /// the overlay was updated; on failure any previous record for the id
    /// is retained (a per-cycle degradation, distinct from the detector
    /// reporting the marker gone).
    #[allow(clippy::too_many_arguments)]
    pub fn add_marker(
        &self,
        id: i32,
        top_left: PixelPoint,
        top_right: PixelPoint,
        bottom_left: PixelPoint,
        bottom_right: PixelPoint,
        size: MarkerSize,
    ) -> bool {
        let mut state = self.state.lock();
        let Some((frame, capture_angle)) = &state.last_frame else {
            log::debug!("MappingEngine: no frame yet, marker {} skipped", id);
            return false;
        };

        let record = localize(
            id,
            top_left,
            top_right,
            bottom_left,
            bottom_right,
            size,
            frame,
            *capture_angle,
            &self.config,
        );

        match record {
            Some(record) => {
                state.markers.insert(record);
                let MapState {
                    store,
                    raster,
                    markers,
                    ..
                } = &mut *state;
                render(store, markers, &self.config, raster);
                true
            }
            None => {
                log::debug!("MappingEngine: marker {} localization failed", id);
                false
            }
        }
    }

    /// Remove a marker the detector no longer reports.
    ///
    /// Returns `true` if a record was removed.
    pub fn remove_marker(&self, id: i32) -> bool {
        let mut state = self.state.lock();
        if !state.markers.remove(id) {
            return false;
        }
        let MapState {
            store,
            raster,
            markers,
            ..
        } = &mut *state;
        render(store, markers, &self.config, raster);
        true
    }

    /// Look up the current record for a marker id.
    pub fn marker(&self, id: i32) -> Option<MarkerRecord> {
        self.state.lock().markers.get(id).cloned()
    }

    /// Snapshot of the live marker overlay, in id order.
    pub fn markers(&self) -> Vec<MarkerRecord> {
        self.state.lock().markers.iter().cloned().collect()
    }

    /// Read-only access to the current raster pair.
    ///
    /// The closure runs under the engine lock; readers and the absorb
    /// path never interleave partially.
    pub fn with_raster<R>(&self, f: impl FnOnce(&MapRaster) -> R) -> R {
        f(&self.state.lock().raster)
    }

    /// Reset the map: empties every bin, both rasters, and the marker
    /// overlay.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.store.clear();
        state.raster.clear();
        state.markers.clear();
        state.last_frame = None;
        log::info!("MappingEngine: map cleared");
    }

    /// A waiter on the step gate, for the sweep controller.
    pub fn step_waiter(&self) -> StepWaiter {
        self.waiter.clone()
    }

    /// A notifier on the step gate, for teardown paths that must release
    /// a blocked waiter.
    pub fn step_notifier(&self) -> StepNotifier {
        self.notifier.clone()
    }
}

impl Drop for MappingEngine {
    fn drop(&mut self) {
        // Disconnect the frame queue, wake any waiter, join the worker.
        self.frame_tx.take();
        self.notifier.halt();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
