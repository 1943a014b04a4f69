//! Echo pin capture
//!
//! The GPIO interrupt timestamps both edges of the HC-SR04 echo pulse into a
//! static [`EchoLatch`] and signals the sampling task on the falling edge.

use core::cell::RefCell;

use critical_section::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, WithTimeout};
use esp_hal::gpio::{Event, Input, Io};
use esp_hal::handler;
use esp_hal::time::Instant;
use watchpost_core::sensor::EchoLatch;
use watchpost_drivers::ranging::EchoSource;

static LATCH: EchoLatch = EchoLatch::new();
static ECHO_DONE: Signal<CriticalSectionRawMutex, ()> = Signal::new();
static ECHO_PIN: Mutex<RefCell<Option<Input<'static>>>> = Mutex::new(RefCell::new(None));

/// Interrupt-backed [`EchoSource`]
///
/// Only one may exist; [`EspEcho::install`] takes the echo pin for good.
pub struct EspEcho {
    _private: (),
}

impl EspEcho {
    pub fn install(io: &mut Io<'_>, mut pin: Input<'static>) -> Self {
        io.set_interrupt_handler(echo_edge);
        critical_section::with(|cs| {
            pin.listen(Event::AnyEdge);
            ECHO_PIN.borrow_ref_mut(cs).replace(pin);
        });
        Self { _private: () }
    }
}

impl EchoSource for EspEcho {
    fn arm(&mut self) {
        LATCH.reset();
        ECHO_DONE.reset();
    }

    async fn wait(&mut self, timeout_ms: u64) -> Option<u32> {
        ECHO_DONE
            .wait()
            .with_timeout(Duration::from_millis(timeout_ms))
            .await
            .ok()?;
        LATCH.take()
    }
}

#[handler]
fn echo_edge() {
    // Wraps every ~71 minutes; the latch subtracts with wrapping arithmetic
    let now_us = Instant::now().duration_since_epoch().as_micros() as u32;
    critical_section::with(|cs| {
        let mut slot = ECHO_PIN.borrow_ref_mut(cs);
        let Some(pin) = slot.as_mut() else {
            return;
        };
        if !pin.is_interrupt_set() {
            return;
        }
        if pin.is_high() {
            LATCH.on_rising(now_us);
        } else {
            LATCH.on_falling(now_us);
            ECHO_DONE.signal(());
        }
        pin.clear_interrupt();
    });
}
