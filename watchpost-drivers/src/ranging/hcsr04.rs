//! HC-SR04 ultrasonic ranger
//!
//! The trigger pin is driven here. The echo pin is timestamped elsewhere,
//! normally by an edge interrupt feeding an `EchoLatch`, and handed over
//! through an [`EchoSource`].

use core::future::Future;

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use watchpost_core::sensor::{ECHO_TIMEOUT_MS, TRIGGER_PULSE_US};

/// Low time before the trigger pulse so the module sees a clean edge
const TRIGGER_SETTLE_US: u32 = 2;

/// Delivers echo pulse widths in microseconds
pub trait EchoSource {
    /// Discard any measurement left over from an earlier pulse
    fn arm(&mut self);

    /// Wait for the next complete echo, `None` after `timeout_ms`
    fn wait(&mut self, timeout_ms: u64) -> impl Future<Output = Option<u32>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RangingError<E> {
    /// Trigger pin error
    Pin(E),
    /// No echo within the timeout (nothing in range or sensor unplugged)
    Timeout,
}

pub struct Hcsr04<P> {
    trigger: P,
}

impl<P: OutputPin> Hcsr04<P> {
    /// Take ownership of the trigger pin and drive it low
    pub fn new(mut trigger: P) -> Result<Self, RangingError<P::Error>> {
        trigger.set_low().map_err(RangingError::Pin)?;
        Ok(Self { trigger })
    }

    /// Emit one trigger pulse
    pub async fn trigger(&mut self, delay: &mut impl DelayNs) -> Result<(), RangingError<P::Error>> {
        self.trigger.set_low().map_err(RangingError::Pin)?;
        delay.delay_us(TRIGGER_SETTLE_US).await;
        self.trigger.set_high().map_err(RangingError::Pin)?;
        delay.delay_us(TRIGGER_PULSE_US).await;
        self.trigger.set_low().map_err(RangingError::Pin)
    }

    /// Trigger and wait for the echo pulse width in microseconds
    pub async fn ping(
        &mut self,
        echo: &mut impl EchoSource,
        delay: &mut impl DelayNs,
    ) -> Result<u32, RangingError<P::Error>> {
        echo.arm();
        self.trigger(delay).await?;
        echo.wait(ECHO_TIMEOUT_MS)
            .await
            .ok_or(RangingError::Timeout)
    }

    pub fn release(self) -> P {
        self.trigger
    }
}
