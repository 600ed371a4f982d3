//! DrishtiIO - Actuator and stream IO for the Drishti mapping engine
//!
//! This crate owns everything that touches hardware around the mapping
//! core: the serial pan-mount driver, the sweep synchronization
//! controller that keeps frame ingestion in lockstep with mount
//! rotation, and reference-counted stream requests for lazily enabling
//! sensor streams.
//!
//! The mapping engine itself lives in `drishti-map`; this crate drives
//! it through its public surface (`set_angle`, `update`, the step gate).

pub mod actuator;
pub mod config;
pub mod error;
pub mod servo;
pub mod stream;
pub mod sweep;
pub mod transport;

// Re-export commonly used types
pub use actuator::{ActuatorState, MockActuator, PanActuator};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use servo::ServoDriver;
pub use stream::{StreamGuard, StreamRequests};
pub use sweep::{SweepHandle, SweepParams, SweepState, SweepSyncController};
pub use transport::{MockTransport, SerialTransport, Transport};
