//! Sweep synchronization between the pan actuator and frame ingestion.
//!
//! The controller commands one angular step, tells the mapping engine
//! the new view angle, then blocks on the engine's step gate until a
//! frame captured at that angle has been fully absorbed and rasterized.
//! Only then does it command the next step, so every angular slot gets
//! exactly one fully-processed frame.
//!
//! Known gap: there is no timeout while waiting for a frame — the wait
//! is unconditional. The gate's `Halted` event is the only way out of a
//! wait that will never be satisfied.

use crate::actuator::PanActuator;
use crate::error::{Error, Result};
use drishti_map::{MappingEngine, StepEvent, StepWaiter};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Sweep state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SweepState {
    /// No sweep in progress
    Idle,
    /// An angular step has been commanded
    Rotating,
    /// Blocked until the frame for the current angle is absorbed
    WaitingForFrame,
    /// Actuator link failed; commands refused until reconnect
    Stopped,
}

/// Angular bounds and step of a sweep.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepParams {
    /// Lower bound of the back-and-forth sweep, degrees
    pub min_angle_deg: f64,
    /// Upper bound of the back-and-forth sweep, degrees
    pub max_angle_deg: f64,
    /// Angular step between frames, degrees
    pub step_deg: f64,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            min_angle_deg: 0.0,
            max_angle_deg: 180.0,
            step_deg: 2.0,
        }
    }
}

impl SweepParams {
    /// Validate numeric bounds. Rejected here, never clamped.
    pub fn validate(&self) -> Result<()> {
        if !(self.step_deg > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "sweep step must be positive, got {}",
                self.step_deg
            )));
        }
        if self.min_angle_deg >= self.max_angle_deg {
            return Err(Error::InvalidParameter(format!(
                "sweep bounds inverted: [{}, {}]",
                self.min_angle_deg, self.max_angle_deg
            )));
        }
        Ok(())
    }
}

/// The actuator/frame handshake controller.
///
/// Owns the actuator driver for the duration of a sweep; the mapping
/// engine is shared.
pub struct SweepSyncController {
    driver: Box<dyn PanActuator>,
    engine: Arc<MappingEngine>,
    waiter: StepWaiter,
    params: SweepParams,
    state: Arc<Mutex<SweepState>>,
    stop: Arc<AtomicBool>,
    direction: f64,
}

impl SweepSyncController {
    /// Create an idle controller.
    ///
    /// Parameters are validated here; a zero step or inverted bounds are
    /// construction errors.
    pub fn new(
        driver: Box<dyn PanActuator>,
        engine: Arc<MappingEngine>,
        params: SweepParams,
    ) -> Result<Self> {
        params.validate()?;
        let waiter = engine.step_waiter();
        Ok(Self {
            driver,
            engine,
            waiter,
            params,
            state: Arc::new(Mutex::new(SweepState::Idle)),
            stop: Arc::new(AtomicBool::new(false)),
            direction: 1.0,
        })
    }

    /// Current state machine position.
    pub fn state(&self) -> SweepState {
        *self.state.lock()
    }

    /// Replace a dead actuator link and return to `Idle`.
    pub fn reconnect(&mut self, driver: Box<dyn PanActuator>) {
        self.driver = driver;
        self.stop.store(false, Ordering::SeqCst);
        *self.state.lock() = SweepState::Idle;
        log::info!("SweepController: reconnected, back to Idle");
    }

    /// Next target angle, reversing direction exactly at the bounds.
    fn next_angle(&mut self) -> f64 {
        let current = self.driver.state().angle_deg;
        let mut next = current + self.direction * self.params.step_deg;
        if next >= self.params.max_angle_deg {
            next = self.params.max_angle_deg;
            self.direction = -1.0;
        } else if next <= self.params.min_angle_deg {
            next = self.params.min_angle_deg;
            self.direction = 1.0;
        }
        next
    }

    /// Command one step and wait for its frame.
    ///
    /// A failed actuator write moves the controller to `Stopped` and is
    /// returned to the caller — fatal to the sweep, no retry.
    fn step_once(&mut self) -> Result<()> {
        *self.state.lock() = SweepState::Rotating;
        let target = self.next_angle();

        if let Err(e) = self.driver.rotate(target) {
            *self.state.lock() = SweepState::Stopped;
            log::error!("SweepController: actuator failure at {:.1}°: {}", target, e);
            return Err(e);
        }

        self.engine.set_angle(target);

        *self.state.lock() = SweepState::WaitingForFrame;
        match self.waiter.wait() {
            StepEvent::FrameAbsorbed => Ok(()),
            StepEvent::Halted => {
                // Engine went away or someone is tearing the sweep down;
                // treat like a stop request at this boundary.
                self.stop.store(true, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    /// Drive the sweep on the calling thread until stopped or failed.
    ///
    /// A stop request takes effect at the next step boundary; an
    /// in-flight wait is allowed to complete.
    pub fn run(&mut self) -> Result<()> {
        if self.state() == SweepState::Stopped {
            return Err(Error::SweepStopped);
        }

        log::info!(
            "SweepController: sweeping [{:.1}°, {:.1}°] in {:.1}° steps",
            self.params.min_angle_deg,
            self.params.max_angle_deg,
            self.params.step_deg
        );

        while !self.stop.load(Ordering::SeqCst) {
            self.step_once()?;
        }

        self.stop.store(false, Ordering::SeqCst);
        *self.state.lock() = SweepState::Idle;
        log::info!("SweepController: sweep stopped, back to Idle");
        Ok(())
    }

    /// Start the sweep on a dedicated thread and return its handle.
    pub fn spawn(mut self) -> SweepHandle {
        let stop = Arc::clone(&self.stop);
        let state = Arc::clone(&self.state);
        let notifier = self.engine.step_notifier();

        let join = std::thread::Builder::new()
            .name("drishti-sweep".to_string())
            .spawn(move || self.run())
            .expect("failed to spawn sweep thread");

        SweepHandle {
            stop,
            state,
            notifier,
            join: Some(join),
        }
    }
}

/// Handle to a sweep running on its own thread.
pub struct SweepHandle {
    stop: Arc<AtomicBool>,
    state: Arc<Mutex<SweepState>>,
    notifier: drishti_map::StepNotifier,
    join: Option<JoinHandle<Result<()>>>,
}

impl SweepHandle {
    /// Request the sweep to stop at the next step boundary.
    ///
    /// Also posts a `Halted` release so a controller blocked in
    /// `WaitingForFrame` cannot be stranded by a sensor that has stopped
    /// delivering frames.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        self.notifier.halt();
    }

    /// Current state machine position.
    pub fn state(&self) -> SweepState {
        *self.state.lock()
    }

    /// Wait for the sweep thread to finish and return its outcome.
    pub fn join(mut self) -> Result<()> {
        match self.join.take() {
            Some(join) => join
                .join()
                .unwrap_or_else(|_| Err(Error::InvalidParameter("sweep thread panicked".into()))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::MockActuator;
    use drishti_map::{DepthFrame, MapConfig};
    use std::time::Duration;

    fn small_engine() -> Arc<MappingEngine> {
        let config = MapConfig {
            frame_width: 8,
            frame_height: 4,
            horizontal_fov_deg: 40.0,
            vertical_fov_deg: 30.0,
            max_depth_mm: 4000,
            mount_height_mm: 500,
            scale_mm_per_px: 10,
        };
        Arc::new(MappingEngine::new(config).unwrap())
    }

    fn feed_frames(engine: Arc<MappingEngine>, stop: Arc<AtomicBool>) -> JoinHandle<()> {
        std::thread::spawn(move || {
            while !stop.load(Ordering::SeqCst) {
                let frame = DepthFrame::new(8, 4, vec![1000; 32]).unwrap();
                engine.update(frame);
                std::thread::sleep(Duration::from_millis(1));
            }
        })
    }

    #[test]
    fn test_rejects_zero_step() {
        let engine = small_engine();
        let params = SweepParams {
            step_deg: 0.0,
            ..SweepParams::default()
        };
        let result = SweepSyncController::new(Box::new(MockActuator::new(90.0)), engine, params);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let engine = small_engine();
        let params = SweepParams {
            min_angle_deg: 100.0,
            max_angle_deg: 50.0,
            step_deg: 5.0,
        };
        let result = SweepSyncController::new(Box::new(MockActuator::new(90.0)), engine, params);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_sweep_reverses_exactly_at_bounds() {
        let engine = small_engine();
        let mock = MockActuator::new(0.0);
        let params = SweepParams {
            min_angle_deg: 0.0,
            max_angle_deg: 30.0,
            step_deg: 10.0,
        };
        let controller =
            SweepSyncController::new(Box::new(mock.clone()), Arc::clone(&engine), params).unwrap();

        let feed_stop = Arc::new(AtomicBool::new(false));
        let feeder = feed_frames(Arc::clone(&engine), Arc::clone(&feed_stop));

        let handle = controller.spawn();
        // Let it bounce off both bounds a few times
        while mock.rotations().len() < 14 {
            std::thread::sleep(Duration::from_millis(2));
        }
        handle.stop();
        handle.join().unwrap();
        feed_stop.store(true, Ordering::SeqCst);
        feeder.join().unwrap();

        let rotations = mock.rotations();
        assert!(rotations.iter().all(|&a| (0.0..=30.0).contains(&a)));

        // Up, hit the bound, straight back down, hit the other bound
        assert_eq!(&rotations[0..7], &[10.0, 20.0, 30.0, 20.0, 10.0, 0.0, 10.0]);
    }

    #[test]
    fn test_stop_returns_to_idle_at_boundary() {
        let engine = small_engine();
        let mock = MockActuator::new(0.0);
        let controller = SweepSyncController::new(
            Box::new(mock.clone()),
            Arc::clone(&engine),
            SweepParams::default(),
        )
        .unwrap();

        let feed_stop = Arc::new(AtomicBool::new(false));
        let feeder = feed_frames(Arc::clone(&engine), Arc::clone(&feed_stop));

        let handle = controller.spawn();
        while mock.rotations().len() < 3 {
            std::thread::sleep(Duration::from_millis(2));
        }
        handle.stop();
        assert!(handle.join().is_ok());

        feed_stop.store(true, Ordering::SeqCst);
        feeder.join().unwrap();
    }

    #[test]
    fn test_actuator_failure_stops_sweep() {
        let engine = small_engine();
        let mock = MockActuator::new(0.0);
        mock.fail_next_rotation();
        let controller = SweepSyncController::new(
            Box::new(mock.clone()),
            Arc::clone(&engine),
            SweepParams::default(),
        )
        .unwrap();

        let handle = controller.spawn();
        while handle.state() != SweepState::Stopped {
            std::thread::sleep(Duration::from_millis(2));
        }
        assert!(handle.join().is_err());
        assert!(!mock.is_connected());
    }

    #[test]
    fn test_stopped_sweep_refuses_until_reconnect() {
        let engine = small_engine();
        let mock = MockActuator::new(0.0);
        mock.fail_next_rotation();
        let mut controller = SweepSyncController::new(
            Box::new(mock.clone()),
            Arc::clone(&engine),
            SweepParams::default(),
        )
        .unwrap();

        assert!(controller.run().is_err());
        assert_eq!(controller.state(), SweepState::Stopped);
        assert!(matches!(controller.run(), Err(Error::SweepStopped)));

        controller.reconnect(Box::new(MockActuator::new(0.0)));
        assert_eq!(controller.state(), SweepState::Idle);
    }

    #[test]
    fn test_halt_releases_blocked_wait() {
        let engine = small_engine();
        let mock = MockActuator::new(0.0);
        let controller = SweepSyncController::new(
            Box::new(mock.clone()),
            Arc::clone(&engine),
            SweepParams::default(),
        )
        .unwrap();

        // No frames are ever fed: the controller blocks in
        // WaitingForFrame after its first step.
        let handle = controller.spawn();
        while handle.state() != SweepState::WaitingForFrame {
            std::thread::sleep(Duration::from_millis(2));
        }

        handle.stop();
        assert!(handle.join().is_ok());
    }
}
