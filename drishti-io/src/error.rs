//! Error types for DrishtiIO

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// DrishtiIO error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Actuator link not established or already torn down
    #[error("Actuator not connected")]
    NotConnected,

    /// Sweep controller refused a command in its current state
    #[error("Sweep is stopped; reconnect before starting a new sweep")]
    SweepStopped,

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration file parse error
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration file serialize error
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}
