use std::sync::Arc;

use maestro::{Controller, Error, Transport, TransportError};
use parking_lot::Mutex;

/// Records every frame and answers position queries from the last target.
#[derive(Clone, Default)]
struct Recorder {
    written: Arc<Mutex<Vec<Vec<u8>>>>,
    last_target: Arc<Mutex<u16>>,
}

impl Transport for Recorder {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if bytes[0] == 0x84 {
            *self.last_target.lock() = bytes[2] as u16 | ((bytes[3] as u16) << 7);
        }
        self.written.lock().push(bytes.to_vec());
        Ok(())
    }

    fn read(&mut self, len: usize) -> Result<Vec<u8>, TransportError> {
        let value = *self.last_target.lock();
        Ok(value.to_le_bytes()[..len].to_vec())
    }
}

#[test]
fn servos_are_numbered_in_name_order() {
    let names = ["pan", "tilt", "roll"];
    let (_controller, servos) = Controller::with_servos(Recorder::default(), &names).unwrap();

    assert_eq!(servos.len(), 3);
    assert_eq!(servos.get("pan").unwrap().channel(), 0);
    assert_eq!(servos.get("tilt").unwrap().channel(), 1);
    assert_eq!(servos.get("roll").unwrap().channel(), 2);
    assert_eq!(servos.by_channel(1).unwrap().name(), "tilt");
    assert!(servos.get("zoom").is_none());

    let names: Vec<&str> = servos.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["pan", "tilt", "roll"]);
}

#[test]
fn duplicate_names_are_rejected() {
    let err = Controller::with_servos(Recorder::default(), &["pan", "pan"]).unwrap_err();
    assert!(matches!(err, Error::DuplicateServo(name) if name == "pan"));
}

#[test]
fn unknown_name_is_an_error() {
    let (_controller, mut servos) = Controller::with_servos(Recorder::default(), &["pan"]).unwrap();
    assert!(matches!(servos.require_mut("tilt"), Err(Error::UnknownServo(_))));
}

#[tokio::test]
async fn target_is_clamped_to_limits() {
    let recorder = Recorder::default();
    let (_controller, mut servos) = Controller::with_servos(recorder.clone(), &["pan"]).unwrap();
    let pan = servos.require_mut("pan").unwrap();
    pan.set_limits(1000.0, 2000.0);

    assert_eq!(pan.set_target(2500.0).await.unwrap(), 2000.0);
    assert_eq!(pan.target(), 2000.0);
    assert_eq!(pan.set_target(500.0).await.unwrap(), 1000.0);
    assert_eq!(pan.target(), 1000.0);
    assert_eq!(pan.set_position(1234.5).await.unwrap(), 1234.5);

    let written = recorder.written.lock().clone();
    // 2000us = 8000 quarters, 1000us = 4000 quarters
    assert_eq!(written[0], vec![0x84, 0x00, (8000 & 0x7F) as u8, (8000 >> 7) as u8]);
    assert_eq!(written[1], vec![0x84, 0x00, (4000 & 0x7F) as u8, (4000 >> 7) as u8]);
}

#[tokio::test]
async fn non_finite_target_is_rejected_even_with_limits() {
    let recorder = Recorder::default();
    let (_controller, mut servos) = Controller::with_servos(recorder.clone(), &["pan"]).unwrap();
    let pan = servos.require_mut("pan").unwrap();
    pan.set_limits(1000.0, 2000.0);
    pan.set_target(1500.0).await.unwrap();

    for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = pan.set_target(value).await.unwrap_err();
        assert!(err.is_encoding(), "{value} gave {err:?}");
        assert_eq!(pan.target(), 1500.0);
    }
    assert!(pan.set_position(f64::NAN).await.unwrap_err().is_encoding());

    assert_eq!(recorder.written.lock().len(), 1);
}

#[tokio::test]
async fn unbounded_servo_passes_target_through() {
    let (_controller, mut servos) = Controller::with_servos(Recorder::default(), &["pan"]).unwrap();
    let pan = servos.require_mut("pan").unwrap();

    assert_eq!(pan.set_target(3000.0).await.unwrap(), 3000.0);
    pan.set_limits(1000.0, 0.0);
    assert_eq!(pan.set_target(500.0).await.unwrap(), 500.0);
}

#[tokio::test]
async fn target_is_cached_but_position_is_live() {
    let recorder = Recorder::default();
    let (controller, mut servos) = Controller::with_servos(recorder.clone(), &["pan"]).unwrap();
    let pan = servos.require_mut("pan").unwrap();

    pan.set_target(1500.0).await.unwrap();
    controller.set_target(0, 1200.0).await.unwrap();

    assert_eq!(pan.target(), 1500.0);
    assert_eq!(pan.position().await.unwrap(), 1200.0);
    assert_eq!(recorder.written.lock().last().unwrap(), &vec![0x90, 0x00]);
}

#[tokio::test]
async fn speed_and_acceleration_are_cached_after_sending() {
    let recorder = Recorder::default();
    let (_controller, mut servos) =
        Controller::with_servos(recorder.clone(), &["pan", "tilt"]).unwrap();
    let tilt = servos.require_mut("tilt").unwrap();

    tilt.set_speed(0.5).await.unwrap();
    tilt.set_acceleration(0.25).await.unwrap();
    assert_eq!(tilt.speed(), 0.5);
    assert_eq!(tilt.acceleration(), 0.25);

    let err = tilt.set_speed(1000.0).await.unwrap_err();
    assert!(err.is_encoding());
    assert_eq!(tilt.speed(), 0.5);

    let written = recorder.written.lock().clone();
    assert_eq!(written.len(), 2);
    assert_eq!(written[0][..2], [0x87, 0x01]);
    assert_eq!(written[1][..2], [0x89, 0x01]);
}

#[tokio::test]
async fn nudge_steps_from_live_position_within_limits() {
    let (_controller, mut servos) = Controller::with_servos(Recorder::default(), &["pan"]).unwrap();
    let pan = servos.require_mut("pan").unwrap();
    pan.set_limits(720.0, 2300.0).set_range(160.0);

    pan.set_position(1500.0).await.unwrap();
    // 10 degrees over a 160 degree span of 1580us
    assert_eq!(pan.nudge(10.0).await.unwrap(), 1598.75);
    assert_eq!(pan.nudge(-10.0).await.unwrap(), 1500.0);

    pan.set_position(2250.0).await.unwrap();
    assert_eq!(pan.nudge(10.0).await.unwrap(), 2300.0);
}

#[tokio::test]
async fn nudge_without_range_sends_nothing() {
    let recorder = Recorder::default();
    let (_controller, mut servos) = Controller::with_servos(recorder.clone(), &["pan"]).unwrap();
    let pan = servos.require_mut("pan").unwrap();

    assert!(matches!(pan.nudge(5.0).await, Err(Error::ZeroRange { .. })));
    assert!(recorder.written.lock().is_empty());
}
