//! Driver for Pololu Maestro servo controllers over the compact serial protocol.

mod constants;
mod controller;
mod error;
mod protocol;
mod servo;
mod transport;
mod types;

pub use controller::Controller;
pub use error::{Error, Result};
pub use protocol::{encode_value, join_value, split_value};
pub use servo::{Servo, Servos};
pub use transport::{SerialConfig, SerialTransport, Transport, TransportError};
pub use types::{ErrorFlag, ErrorFlags};

// Re-export commonly used items
pub use constants::{DEFAULT_BAUD_RATE, DEFAULT_POLL_INTERVAL_MS, DEFAULT_PORT, DEFAULT_TIMEOUT_MS};
