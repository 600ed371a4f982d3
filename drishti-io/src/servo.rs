//! Serial pan-mount servo driver.
//!
//! The mount speaks a 2-byte frame at 9600 baud: the target angle as a
//! single byte followed by a 0xFF terminator. It has no feedback channel,
//! so settling is modeled as a fixed time per degree of travel.

use crate::actuator::{ActuatorState, PanActuator};
use crate::error::{Error, Result};
use crate::transport::{SerialTransport, Transport};
use std::time::Duration;

/// Default baud rate of the mount's serial link
pub const SERVO_BAUD: u32 = 9600;

/// Home position commanded on connect, degrees
const HOME_ANGLE_DEG: f64 = 90.0;

/// Settle time per degree of travel, milliseconds
const SETTLE_MS_PER_DEG: u64 = 50;

/// Frame terminator byte
const FRAME_END: u8 = 0xFF;

/// Driver for the serial pan mount.
pub struct ServoDriver {
    transport: Option<Box<dyn Transport>>,
    state: ActuatorState,
    settle_ms_per_deg: u64,
}

impl ServoDriver {
    /// Open the mount on a serial port and home it to 90°.
    pub fn connect(port: &str) -> Result<Self> {
        let transport = SerialTransport::open(port, SERVO_BAUD)?;
        let driver = Self::with_transport(Box::new(transport), SETTLE_MS_PER_DEG)?;
        log::info!("ServoDriver: connected on {}, homed to {}°", port, HOME_ANGLE_DEG);
        Ok(driver)
    }

    /// Build a driver over an arbitrary transport (tests, simulation).
    ///
    /// Homes the mount to 90° like `connect` does.
    pub fn with_transport(
        transport: Box<dyn Transport>,
        settle_ms_per_deg: u64,
    ) -> Result<Self> {
        let mut driver = ServoDriver {
            transport: Some(transport),
            state: ActuatorState {
                angle_deg: HOME_ANGLE_DEG,
                rotating: false,
                connected: true,
            },
            settle_ms_per_deg,
        };
        driver.send_angle(HOME_ANGLE_DEG)?;
        if settle_ms_per_deg > 0 {
            driver.settle(Duration::from_millis(200));
        }
        Ok(driver)
    }

    fn send_angle(&mut self, angle_deg: f64) -> Result<()> {
        let Some(transport) = self.transport.as_mut() else {
            return Err(Error::NotConnected);
        };
        let frame = [angle_deg.round() as u8, FRAME_END];
        log::debug!("ServoDriver: sending frame {:02X?}", frame);

        let result = transport.write(&frame).and_then(|_| transport.flush());
        if let Err(e) = result {
            // A failed write is fatal to the link; the caller must
            // reconnect before issuing further commands.
            log::error!("ServoDriver: write failed, tearing link down: {}", e);
            self.transport = None;
            self.state.connected = false;
            self.state.rotating = false;
            return Err(e);
        }
        Ok(())
    }

    fn settle(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

impl PanActuator for ServoDriver {
    fn rotate(&mut self, angle_deg: f64) -> Result<()> {
        if !self.state.connected {
            return Err(Error::NotConnected);
        }
        if !(0.0..=180.0).contains(&angle_deg) {
            return Err(Error::InvalidParameter(format!(
                "servo angle {angle_deg}° outside [0, 180]"
            )));
        }

        let travel = (angle_deg - self.state.angle_deg).abs();
        self.state.rotating = true;
        self.send_angle(angle_deg)?;

        self.settle(Duration::from_millis(
            (travel * self.settle_ms_per_deg as f64).round() as u64,
        ));

        self.state.angle_deg = angle_deg;
        self.state.rotating = false;
        Ok(())
    }

    fn state(&self) -> ActuatorState {
        self.state
    }

    fn disconnect(&mut self) {
        if self.transport.take().is_some() {
            log::info!("ServoDriver: disconnected");
        }
        self.state.connected = false;
        self.state.rotating = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    fn driver_over(mock: &MockTransport) -> ServoDriver {
        ServoDriver::with_transport(Box::new(mock.clone()), 0).unwrap()
    }

    #[test]
    fn test_connect_homes_to_90() {
        let mock = MockTransport::new();
        let driver = driver_over(&mock);
        assert_eq!(mock.get_written(), vec![90, 0xFF]);
        assert_eq!(driver.state().angle_deg, 90.0);
        assert!(driver.is_connected());
    }

    #[test]
    fn test_rotate_writes_frame_and_updates_state() {
        let mock = MockTransport::new();
        let mut driver = driver_over(&mock);
        mock.clear_written();

        driver.rotate(120.0).unwrap();
        assert_eq!(mock.get_written(), vec![120, 0xFF]);
        assert_eq!(driver.state().angle_deg, 120.0);
        assert!(!driver.state().rotating);
    }

    #[test]
    fn test_rotate_rejects_out_of_range() {
        let mock = MockTransport::new();
        let mut driver = driver_over(&mock);
        assert!(matches!(
            driver.rotate(181.0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            driver.rotate(-1.0),
            Err(Error::InvalidParameter(_))
        ));
        // Link stays alive after a parameter error
        assert!(driver.is_connected());
    }

    #[test]
    fn test_write_failure_tears_link_down() {
        let mock = MockTransport::new();
        let mut driver = driver_over(&mock);
        mock.fail_writes(true);

        assert!(driver.rotate(100.0).is_err());
        assert!(!driver.is_connected());

        // Further commands are refused without a reconnect
        mock.fail_writes(false);
        assert!(matches!(driver.rotate(100.0), Err(Error::NotConnected)));
    }

    #[test]
    fn test_disconnect_marks_state() {
        let mock = MockTransport::new();
        let mut driver = driver_over(&mock);
        driver.disconnect();
        assert!(!driver.is_connected());
        assert!(matches!(driver.rotate(90.0), Err(Error::NotConnected)));
    }
}
