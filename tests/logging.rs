#![cfg(feature = "tracing")]
//! Construction and cloning emit `TRACE` events describing the payload.

use std::{
    io,
    sync::{Arc, Mutex},
};

use erased_vehicle::prelude::*;
use tracing::{Level, subscriber::with_default};

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn output(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_events(f: impl FnOnce()) -> String {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::TRACE)
        .with_writer(move || writer.clone())
        .finish();

    with_default(subscriber, f);
    capture.output()
}

#[derive(Clone)]
struct Hovercraft {
    thrust: u32,
}

impl Accelerate for Hovercraft {
    fn accelerate(&mut self) {
        self.thrust += 1;
    }
}

#[test]
fn test_store_and_clone_are_traced() {
    let output = capture_events(|| {
        let hovercraft: RemoteVehicle = Vehicle::new(Hovercraft { thrust: 0 });
        let _copy = hovercraft.clone();
    });

    assert_eq!(output.matches("stored vehicle payload").count(), 2);
    assert!(output.contains("TRACE"));
    assert!(output.contains("operation=\"new\""));
    assert!(output.contains("operation=\"clone\""));
    assert!(output.contains("Hovercraft"));
    assert!(output.contains("storage=Heap"));
}

#[test]
fn test_inline_storage_is_traced() {
    let output = capture_events(|| {
        let _hovercraft: SboVehicle<16> = Vehicle::new(Hovercraft { thrust: 0 });
    });

    assert!(output.contains("storage=Inline"));
}

#[test]
fn test_boxed_vehicle_is_traced() {
    let output = capture_events(|| {
        let mut hovercraft = BoxedVehicle::new(Hovercraft { thrust: 0 });
        hovercraft.accelerate();
    });

    assert_eq!(output.matches("boxed vehicle payload").count(), 1);
    assert!(output.contains("Hovercraft"));
}

#[test]
fn test_accelerate_is_silent() {
    let mut hovercraft: Vehicle = Vehicle::new(Hovercraft { thrust: 0 });
    let output = capture_events(|| hovercraft.accelerate());

    assert!(output.is_empty());
    assert_eq!(hovercraft.downcast_ref::<Hovercraft>().unwrap().thrust, 1);
}
