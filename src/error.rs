use crate::transport::TransportError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The scaled value does not fit the two 7-bit payload bytes. Nothing was written.
    #[error("Value {value} is outside the encodable range [0, 16384)")]
    Encoding { value: f64 },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Servo range is zero, cannot convert {value} degrees")]
    ZeroRange { value: f64 },
    #[error("No servo named {0:?}")]
    UnknownServo(String),
    #[error("Servo name {0:?} is listed more than once")]
    DuplicateServo(String),
    #[error("{0} servo names given but channels are addressed by a single byte")]
    TooManyChannels(usize),
    #[error("Interrupted before all servos stopped")]
    Interrupted,
    #[error("Transport task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    pub fn is_encoding(&self) -> bool {
        matches!(self, Error::Encoding { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Join(_))
    }
}
