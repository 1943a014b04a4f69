//! ILI9488 TFT Display Driver
//!
//! Driver for 480x320 ILI9488 panels over 4-wire SPI (chip select plus a
//! data/command pin). In SPI mode the controller only accepts 18-bit
//! pixels, so each Rgb565 color is widened to three bytes on the wire.
//!
//! Drawing goes straight to panel RAM; there is no frame buffer.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

/// Panel size in landscape orientation
const WIDTH: u32 = 480;
const HEIGHT: u32 = 320;

/// Pixels per SPI write when streaming
const CHUNK_PIXELS: usize = 64;

/// ILI9488 commands
#[allow(dead_code)]
mod cmd {
    pub const SOFT_RESET: u8 = 0x01;
    pub const SLEEP_OUT: u8 = 0x11;
    pub const INVERSION_OFF: u8 = 0x20;
    pub const DISPLAY_ON: u8 = 0x29;
    pub const COLUMN_ADDR: u8 = 0x2A;
    pub const PAGE_ADDR: u8 = 0x2B;
    pub const MEMORY_WRITE: u8 = 0x2C;
    pub const MEMORY_ACCESS: u8 = 0x36;
    pub const PIXEL_FORMAT: u8 = 0x3A;
    pub const FRAME_RATE: u8 = 0xB1;
    pub const DISPLAY_FUNCTION: u8 = 0xB6;
    pub const POWER_1: u8 = 0xC0;
    pub const POWER_2: u8 = 0xC1;
    pub const VCOM: u8 = 0xC5;
    pub const POSITIVE_GAMMA: u8 = 0xE0;
    pub const NEGATIVE_GAMMA: u8 = 0xE1;
    pub const SET_IMAGE: u8 = 0xE9;
    pub const ADJUST_3: u8 = 0xF7;
}

/// MADCTL: row/column exchange for landscape, BGR panel order
const LANDSCAPE_BGR: u8 = 0x28;

/// 18 bits per pixel (the only SPI format)
const PIXEL_18BIT: u8 = 0x66;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ili9488Error<E> {
    Spi(E),
    /// A control pin could not be driven
    Pin,
}

/// ILI9488 driver
pub struct Ili9488<SPI, CS, DC, RST> {
    spi: SPI,
    cs: CS,
    dc: DC,
    rst: RST,
}

impl<SPI, CS, DC, RST> Ili9488<SPI, CS, DC, RST>
where
    SPI: SpiBus,
    CS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
{
    /// Create a new ILI9488 driver
    pub fn new(spi: SPI, cs: CS, dc: DC, rst: RST) -> Self {
        Self { spi, cs, dc, rst }
    }

    /// Hardware reset and initialization sequence
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), Ili9488Error<SPI::Error>> {
        self.cs.set_high().map_err(|_| Ili9488Error::Pin)?;
        self.rst.set_high().map_err(|_| Ili9488Error::Pin)?;
        delay.delay_ms(5);
        self.rst.set_low().map_err(|_| Ili9488Error::Pin)?;
        delay.delay_ms(20);
        self.rst.set_high().map_err(|_| Ili9488Error::Pin)?;
        delay.delay_ms(150);

        self.command(cmd::SOFT_RESET, &[])?;
        delay.delay_ms(120);

        self.command(
            cmd::POSITIVE_GAMMA,
            &[
                0x00, 0x03, 0x09, 0x08, 0x16, 0x0A, 0x3F, 0x78, 0x4C, 0x09, 0x0A, 0x08, 0x16,
                0x1A, 0x0F,
            ],
        )?;
        self.command(
            cmd::NEGATIVE_GAMMA,
            &[
                0x00, 0x16, 0x19, 0x03, 0x0F, 0x05, 0x32, 0x45, 0x46, 0x04, 0x0E, 0x0D, 0x35,
                0x37, 0x0F,
            ],
        )?;
        self.command(cmd::POWER_1, &[0x17, 0x15])?;
        self.command(cmd::POWER_2, &[0x41])?;
        self.command(cmd::VCOM, &[0x00, 0x12, 0x80])?;
        self.command(cmd::MEMORY_ACCESS, &[LANDSCAPE_BGR])?;
        self.command(cmd::PIXEL_FORMAT, &[PIXEL_18BIT])?;
        self.command(cmd::FRAME_RATE, &[0xA0])?;
        self.command(cmd::INVERSION_OFF, &[])?;
        self.command(cmd::DISPLAY_FUNCTION, &[0x02, 0x02, 0x3B])?;
        self.command(cmd::SET_IMAGE, &[0x00])?;
        self.command(cmd::ADJUST_3, &[0xA9, 0x51, 0x2C, 0x82])?;

        self.command(cmd::SLEEP_OUT, &[])?;
        delay.delay_ms(120);
        self.command(cmd::DISPLAY_ON, &[])?;
        delay.delay_ms(25);

        Ok(())
    }

    /// Send a command followed by its parameter bytes
    fn command(&mut self, cmd: u8, params: &[u8]) -> Result<(), Ili9488Error<SPI::Error>> {
        self.cs.set_low().map_err(|_| Ili9488Error::Pin)?;
        let result = self.command_selected(cmd, params);
        self.cs.set_high().map_err(|_| Ili9488Error::Pin)?;
        result
    }

    fn command_selected(&mut self, cmd: u8, params: &[u8]) -> Result<(), Ili9488Error<SPI::Error>> {
        self.dc.set_low().map_err(|_| Ili9488Error::Pin)?;
        self.spi.write(&[cmd]).map_err(Ili9488Error::Spi)?;
        self.dc.set_high().map_err(|_| Ili9488Error::Pin)?;
        if !params.is_empty() {
            self.spi.write(params).map_err(Ili9488Error::Spi)?;
        }
        self.spi.flush().map_err(Ili9488Error::Spi)
    }

    /// Set the RAM write window and stream `colors` into it
    fn write_window(
        &mut self,
        area: &Rectangle,
        colors: impl IntoIterator<Item = Rgb565>,
    ) -> Result<(), Ili9488Error<SPI::Error>> {
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };
        let (x0, y0) = (area.top_left.x as u16, area.top_left.y as u16);
        let (x1, y1) = (bottom_right.x as u16, bottom_right.y as u16);

        self.cs.set_low().map_err(|_| Ili9488Error::Pin)?;
        let result = self.stream_selected([x0, x1], [y0, y1], colors);
        self.cs.set_high().map_err(|_| Ili9488Error::Pin)?;
        result
    }

    fn stream_selected(
        &mut self,
        columns: [u16; 2],
        rows: [u16; 2],
        colors: impl IntoIterator<Item = Rgb565>,
    ) -> Result<(), Ili9488Error<SPI::Error>> {
        self.command_selected(cmd::COLUMN_ADDR, &window_bytes(columns[0], columns[1]))?;
        self.command_selected(cmd::PAGE_ADDR, &window_bytes(rows[0], rows[1]))?;
        self.command_selected(cmd::MEMORY_WRITE, &[])?;

        let mut chunk = [0u8; CHUNK_PIXELS * 3];
        let mut used = 0;
        for color in colors {
            chunk[used..used + 3].copy_from_slice(&rgb666(color));
            used += 3;
            if used == chunk.len() {
                self.spi.write(&chunk).map_err(Ili9488Error::Spi)?;
                used = 0;
            }
        }
        if used > 0 {
            self.spi.write(&chunk[..used]).map_err(Ili9488Error::Spi)?;
        }
        self.spi.flush().map_err(Ili9488Error::Spi)
    }
}

fn window_bytes(start: u16, end: u16) -> [u8; 4] {
    let [s_hi, s_lo] = start.to_be_bytes();
    let [e_hi, e_lo] = end.to_be_bytes();
    [s_hi, s_lo, e_hi, e_lo]
}

/// Widen 5/6/5 bits to the top of three bytes
fn rgb666(color: Rgb565) -> [u8; 3] {
    [color.r() << 3, color.g() << 2, color.b() << 3]
}

impl<SPI, CS, DC, RST> OriginDimensions for Ili9488<SPI, CS, DC, RST> {
    fn size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }
}

impl<SPI, CS, DC, RST> DrawTarget for Ili9488<SPI, CS, DC, RST>
where
    SPI: SpiBus,
    CS: OutputPin,
    DC: OutputPin,
    RST: OutputPin,
{
    type Color = Rgb565;
    type Error = Ili9488Error<SPI::Error>;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bounds = self.bounding_box();
        for Pixel(point, color) in pixels {
            if bounds.contains(point) {
                self.write_window(&Rectangle::new(point, Size::new(1, 1)), [color])?;
            }
        }
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        let visible = area.intersection(&self.bounding_box());
        if visible == *area {
            return self.write_window(area, colors);
        }
        // Partially off-screen: fall back to per-pixel writes
        self.draw_iter(
            area.points()
                .zip(colors)
                .filter(|(p, _)| visible.contains(*p))
                .map(|(p, c)| Pixel(p, c)),
        )
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let visible = area.intersection(&self.bounding_box());
        let count = visible.size.width as usize * visible.size.height as usize;
        self.write_window(&visible, core::iter::repeat(color).take(count))
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let screen = self.bounding_box();
        self.fill_solid(&screen, color)
    }
}
