//! Pan actuator driver trait and mock implementation.

use crate::error::Result;
use std::sync::{Arc, Mutex};

/// Snapshot of the actuator link.
///
/// Created disconnected; becomes connected when a link is established;
/// torn down on link failure (rotation halts, link marked dead).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ActuatorState {
    /// Current mount angle in degrees
    pub angle_deg: f64,
    /// True while a rotation command is settling
    pub rotating: bool,
    /// True while the link is alive
    pub connected: bool,
}

/// Pan actuator driver trait
pub trait PanActuator: Send {
    /// Rotate the mount to an absolute angle in degrees.
    ///
    /// Blocks until the mount has settled. A write failure is fatal to
    /// the link: the driver marks itself disconnected and every further
    /// command is refused until a reconnect.
    fn rotate(&mut self, angle_deg: f64) -> Result<()>;

    /// Current link state snapshot
    fn state(&self) -> ActuatorState;

    /// Tear the link down
    fn disconnect(&mut self);

    /// True while the link is alive
    fn is_connected(&self) -> bool {
        self.state().connected
    }
}

/// Mock pan actuator for hardware-free tests and demos
#[derive(Clone)]
pub struct MockActuator {
    inner: Arc<Mutex<MockActuatorInner>>,
}

struct MockActuatorInner {
    state: ActuatorState,
    rotations: Vec<f64>,
    fail_next: bool,
}

impl MockActuator {
    /// Create a connected mock actuator homed to the given angle
    pub fn new(home_deg: f64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockActuatorInner {
                state: ActuatorState {
                    angle_deg: home_deg,
                    rotating: false,
                    connected: true,
                },
                rotations: Vec::new(),
                fail_next: false,
            })),
        }
    }

    /// Every angle the mock has been commanded to, in order
    pub fn rotations(&self) -> Vec<f64> {
        self.inner.lock().unwrap().rotations.clone()
    }

    /// Make the next rotate call fail, simulating a dead link
    pub fn fail_next_rotation(&self) {
        self.inner.lock().unwrap().fail_next = true;
    }
}

impl PanActuator for MockActuator {
    fn rotate(&mut self, angle_deg: f64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.state.connected {
            return Err(crate::Error::NotConnected);
        }
        if inner.fail_next {
            inner.fail_next = false;
            inner.state.connected = false;
            return Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock actuator link down",
            )
            .into());
        }
        inner.rotations.push(angle_deg);
        inner.state.angle_deg = angle_deg;
        Ok(())
    }

    fn state(&self) -> ActuatorState {
        self.inner.lock().unwrap().state
    }

    fn disconnect(&mut self) {
        self.inner.lock().unwrap().state.connected = false;
    }
}
