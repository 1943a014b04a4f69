//! XPT2046 resistive touch controller
//!
//! 12-bit conversions over SPI. The PENIRQ line goes low while the panel is
//! pressed, which lets `read` skip the bus entirely when idle.

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiBus;

use watchpost_display::{RawTouch, TouchInput};

/// Control bytes: start bit, channel, 12-bit differential mode, power-down
/// between conversions
mod ctrl {
    pub const READ_X: u8 = 0xD0;
    pub const READ_Y: u8 = 0x90;
    pub const READ_Z1: u8 = 0xB0;
    pub const READ_Z2: u8 = 0xC0;
}

/// Minimum pressure for a reading to count as a touch
const PRESSURE_THRESHOLD: u16 = 600;

/// Conversions averaged per axis
const SAMPLES: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchError<E> {
    Spi(E),
    Pin,
}

pub struct Xpt2046<SPI, CS, IRQ> {
    spi: SPI,
    cs: CS,
    irq: IRQ,
}

impl<SPI, CS, IRQ> Xpt2046<SPI, CS, IRQ>
where
    SPI: SpiBus,
    CS: OutputPin,
    IRQ: InputPin,
{
    pub fn new(spi: SPI, mut cs: CS, irq: IRQ) -> Self {
        let _ = cs.set_high();
        Self { spi, cs, irq }
    }

    fn convert(&mut self, control: u8) -> Result<u16, TouchError<SPI::Error>> {
        let mut frame = [control, 0, 0];
        self.spi.transfer_in_place(&mut frame).map_err(TouchError::Spi)?;
        Ok(u16::from_be_bytes([frame[1], frame[2]]) >> 3)
    }

    fn average(&mut self, control: u8) -> Result<u16, TouchError<SPI::Error>> {
        let mut sum = 0u32;
        for _ in 0..SAMPLES {
            sum += self.convert(control)? as u32;
        }
        Ok((sum / SAMPLES) as u16)
    }

    fn sample(&mut self) -> Result<Option<RawTouch>, TouchError<SPI::Error>> {
        let z1 = self.convert(ctrl::READ_Z1)?;
        let z2 = self.convert(ctrl::READ_Z2)?;
        let pressure = z1 + 4095u16.saturating_sub(z2);
        if pressure < PRESSURE_THRESHOLD {
            return Ok(None);
        }
        let x = self.average(ctrl::READ_X)?;
        let y = self.average(ctrl::READ_Y)?;
        Ok(Some(RawTouch::new(x, y)))
    }
}

impl<SPI, CS, IRQ> TouchInput for Xpt2046<SPI, CS, IRQ>
where
    SPI: SpiBus,
    CS: OutputPin,
    IRQ: InputPin,
{
    type Error = TouchError<SPI::Error>;

    fn read(&mut self) -> Result<Option<RawTouch>, Self::Error> {
        if self.irq.is_high().map_err(|_| TouchError::Pin)? {
            return Ok(None);
        }
        self.cs.set_low().map_err(|_| TouchError::Pin)?;
        let result = self.sample();
        self.cs.set_high().map_err(|_| TouchError::Pin)?;
        result
    }
}
