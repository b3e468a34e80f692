use crate::{
    constants::*,
    error::{Error, Result},
    protocol::{decode_u16_le, value_command},
    servo::{Servo, Servos},
    transport::{SerialConfig, SerialTransport, Transport, TransportError},
    types::ErrorFlags,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{debug, trace, warn};

/// Driver for one controller board.
///
/// Each command is written, and its reply read back, while holding the
/// transport lock, so replies can never be attributed to another request.
pub struct Controller<T: Transport = SerialTransport> {
    transport: Arc<Mutex<T>>,
}

impl<T: Transport> fmt::Debug for Controller<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller").finish_non_exhaustive()
    }
}

impl Controller<SerialTransport> {
    pub fn open(config: &SerialConfig) -> Result<Self> {
        Ok(Controller::new(SerialTransport::open(config)?))
    }
}

impl<T: Transport> Controller<T> {
    pub fn new(transport: T) -> Self {
        Controller {
            transport: Arc::new(Mutex::new(transport)),
        }
    }

    /// Builds the controller together with one [`Servo`] per name, numbered
    /// from channel 0 in the order given.
    pub fn with_servos<S: AsRef<str>>(
        transport: T,
        names: &[S],
    ) -> Result<(Arc<Self>, Servos<T>)> {
        if names.len() > u8::MAX as usize + 1 {
            return Err(Error::TooManyChannels(names.len()));
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in names {
            if !seen.insert(name.as_ref()) {
                return Err(Error::DuplicateServo(name.as_ref().to_string()));
            }
        }

        let controller = Arc::new(Controller::new(transport));
        let servos = names
            .iter()
            .enumerate()
            .map(|(id, name)| Servo::new(Arc::clone(&controller), name.as_ref(), id as u8))
            .collect();

        Ok((controller, Servos::new(servos)))
    }

    /// `position` is the pulse width in microseconds.
    pub async fn set_target(&self, channel: u8, position: f64) -> Result<()> {
        self.set_value(CMD_SET_TARGET, channel, position * QUARTER_US_PER_US).await
    }

    /// `speed` is the change in pulse width in microseconds per millisecond.
    pub async fn set_speed(&self, channel: u8, speed: f64) -> Result<()> {
        self.set_value(CMD_SET_SPEED, channel, speed * SPEED_SCALE).await
    }

    /// `acceleration` is the change in pulse width in microseconds per millisecond per millisecond.
    pub async fn set_acceleration(&self, channel: u8, acceleration: f64) -> Result<()> {
        self.set_value(CMD_SET_ACCELERATION, channel, acceleration * ACCELERATION_SCALE)
            .await
    }

    /// Sends every channel back to the home positions stored on the board.
    pub async fn go_home(&self) -> Result<()> {
        self.exchange(vec![CMD_GO_HOME], 0).await?;
        Ok(())
    }

    /// Returns the pulse width in microseconds the board is currently outputting.
    pub async fn get_position(&self, channel: u8) -> Result<f64> {
        let reply = self
            .exchange(vec![CMD_GET_POSITION, channel], POSITION_REPLY_LEN)
            .await?;
        let position = decode_u16_le(&reply) as f64 / QUARTER_US_PER_US;
        debug!("Channel {} position: {}us", channel, position);
        Ok(position)
    }

    /// True while any channel is still moving towards its target.
    pub async fn get_moving_state(&self) -> Result<bool> {
        let reply = self
            .exchange(vec![CMD_GET_MOVING_STATE], MOVING_STATE_REPLY_LEN)
            .await?;
        Ok(reply[0] != 0)
    }

    pub async fn get_errors(&self) -> Result<ErrorFlags> {
        let reply = self.exchange(vec![CMD_GET_ERRORS], ERRORS_REPLY_LEN).await?;
        let errors = ErrorFlags::from_bits(decode_u16_le(&reply));
        if !errors.is_empty() {
            warn!("Board reported errors: {}", errors);
        }
        Ok(errors)
    }

    /// Polls the moving state until every channel has stopped.
    ///
    /// There is no timeout; drop the future (or race it against one) to stop waiting.
    pub async fn wait_until_stopped(&self, poll_interval: Duration) -> Result<()> {
        while self.get_moving_state().await? {
            trace!("Still moving, checking again in {:?}", poll_interval);
            tokio::time::sleep(poll_interval).await;
        }
        Ok(())
    }

    /// Like [`Controller::wait_until_stopped`], but gives up with
    /// [`Error::Interrupted`] as soon as `cancel` completes.
    pub async fn wait_until_stopped_or<F>(&self, poll_interval: Duration, cancel: F) -> Result<()>
    where
        F: Future,
    {
        tokio::select! {
            res = self.wait_until_stopped(poll_interval) => res,
            _ = cancel => Err(Error::Interrupted),
        }
    }

    async fn set_value(&self, cmd: u8, channel: u8, scaled: f64) -> Result<()> {
        let frame = value_command(cmd, channel, scaled)?;
        self.exchange(frame, 0).await?;
        Ok(())
    }

    async fn exchange(&self, frame: Vec<u8>, reply_len: usize) -> Result<Vec<u8>> {
        debug!("Sending {:02x?}", frame);
        let transport = Arc::clone(&self.transport);

        let reply = tokio::task::spawn_blocking(move || {
            transfer(&mut *transport.lock(), &frame, reply_len)
        })
        .await??;

        if reply_len > 0 {
            debug!("Received {:02x?}", reply);
        }
        Ok(reply)
    }
}

/// One write plus its fixed-size reply, run while the transport is locked.
fn transfer<T: Transport>(
    transport: &mut T,
    frame: &[u8],
    reply_len: usize,
) -> std::result::Result<Vec<u8>, TransportError> {
    transport.write(frame)?;
    if reply_len == 0 {
        return Ok(Vec::new());
    }

    let reply = transport.read(reply_len)?;
    if reply.len() != reply_len {
        return Err(TransportError::ShortRead {
            expected_len: reply_len,
            actual_len: reply.len(),
            raw_data: reply,
        });
    }
    Ok(reply)
}
