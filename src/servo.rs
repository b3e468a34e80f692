use crate::{
    controller::Controller,
    error::{Error, Result},
    transport::{SerialTransport, Transport},
};
use std::fmt;
use std::sync::Arc;

/// One channel of a [`Controller`], with local limits and a cache of what
/// was last commanded.
///
/// Setters write through to the board immediately. The cache is only
/// updated once the command has been sent.
pub struct Servo<T: Transport = SerialTransport> {
    controller: Arc<Controller<T>>,
    name: String,
    channel: u8,
    minimum: f64,
    maximum: f64,
    range: f64,
    target: f64,
    speed: f64,
    acceleration: f64,
}

impl<T: Transport> Servo<T> {
    pub(crate) fn new(controller: Arc<Controller<T>>, name: &str, channel: u8) -> Self {
        Servo {
            controller,
            name: name.to_string(),
            channel,
            minimum: 0.0,
            maximum: 0.0,
            range: 0.0,
            target: 0.0,
            speed: 0.0,
            acceleration: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    pub fn range(&self) -> f64 {
        self.range
    }

    /// Pulse width bounds in microseconds. Clamping only applies while both are non-zero.
    pub fn set_limits(&mut self, minimum: f64, maximum: f64) -> &mut Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    /// Logical span (e.g. degrees of travel) covered by `maximum - minimum`.
    pub fn set_range(&mut self, range: f64) -> &mut Self {
        self.range = range;
        self
    }

    /// Converts a logical amount into pulse width.
    pub fn degrees_to_pwm(&self, value: f64) -> Result<f64> {
        if value == 0.0 {
            return Ok(0.0);
        }
        if self.range == 0.0 {
            return Err(Error::ZeroRange { value });
        }
        Ok(value * (self.maximum - self.minimum) / self.range)
    }

    fn clamp(&self, value: f64) -> f64 {
        // left for encode_value to reject
        if !value.is_finite() {
            return value;
        }
        if self.maximum != 0.0 && self.minimum != 0.0 {
            value.min(self.maximum).max(self.minimum)
        } else {
            value
        }
    }

    /// Last target sent to the board, not a live reading.
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Clamps `value` to the limits, sends it, and returns what was committed.
    pub async fn set_target(&mut self, value: f64) -> Result<f64> {
        let value = self.clamp(value);
        self.controller.set_target(self.channel, value).await?;
        self.target = value;
        Ok(value)
    }

    /// Queries the board for the live position.
    pub async fn position(&self) -> Result<f64> {
        self.controller.get_position(self.channel).await
    }

    /// Same as [`Servo::set_target`].
    pub async fn set_position(&mut self, value: f64) -> Result<f64> {
        self.set_target(value).await
    }

    /// Moves by `delta` logical units from the live position, within the limits.
    pub async fn nudge(&mut self, delta: f64) -> Result<f64> {
        let step = self.degrees_to_pwm(delta)?;
        let position = self.position().await?;
        self.set_target(position + step).await
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub async fn set_speed(&mut self, value: f64) -> Result<()> {
        self.controller.set_speed(self.channel, value).await?;
        self.speed = value;
        Ok(())
    }

    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    pub async fn set_acceleration(&mut self, value: f64) -> Result<()> {
        self.controller.set_acceleration(self.channel, value).await?;
        self.acceleration = value;
        Ok(())
    }
}

impl<T: Transport> fmt::Debug for Servo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Servo")
            .field("name", &self.name)
            .field("channel", &self.channel)
            .field("minimum", &self.minimum)
            .field("maximum", &self.maximum)
            .field("range", &self.range)
            .field("target", &self.target)
            .field("speed", &self.speed)
            .field("acceleration", &self.acceleration)
            .finish()
    }
}

/// The servos bound to a controller, in channel order.
pub struct Servos<T: Transport = SerialTransport> {
    servos: Vec<Servo<T>>,
}

impl<T: Transport> Servos<T> {
    pub(crate) fn new(servos: Vec<Servo<T>>) -> Self {
        Servos { servos }
    }

    pub fn get(&self, name: &str) -> Option<&Servo<T>> {
        self.servos.iter().find(|s| s.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Servo<T>> {
        self.servos.iter_mut().find(|s| s.name == name)
    }

    pub fn require_mut(&mut self, name: &str) -> Result<&mut Servo<T>> {
        self.get_mut(name)
            .ok_or_else(|| Error::UnknownServo(name.to_string()))
    }

    pub fn by_channel(&self, channel: u8) -> Option<&Servo<T>> {
        self.servos.get(channel as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Servo<T>> {
        self.servos.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Servo<T>> {
        self.servos.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.servos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servos.is_empty()
    }
}

impl<T: Transport> fmt::Debug for Servos<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.servos.iter()).finish()
    }
}
