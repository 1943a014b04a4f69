//! Touch panel calibration
//!
//! The resistive controller reports 12-bit readings along its own axes.
//! A calibration record maps them onto landscape panel pixels and is
//! persisted under [`StorageKey::TouchCalibration`] as a postcard blob.

use serde::{Deserialize, Serialize};
use watchpost_core::display::layout::{SCREEN_HEIGHT, SCREEN_WIDTH};
use watchpost_core::display::TouchPoint;
use watchpost_hal::{KeyValueStore, StorageError, StorageKey};

use crate::touch::RawTouch;

/// Upper bound of an encoded record (five varint u16)
pub const CALIBRATION_RECORD_LEN: usize = 16;

/// Controller X axis runs along the panel's Y axis
pub const FLAG_SWAP_XY: u16 = 1 << 0;
pub const FLAG_INVERT_X: u16 = 1 << 1;
pub const FLAG_INVERT_Y: u16 = 1 << 2;
const FLAG_MASK: u16 = FLAG_SWAP_XY | FLAG_INVERT_X | FLAG_INVERT_Y;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    Storage(StorageError),
    /// Record could not be encoded or decoded
    Encoding,
    /// Record decoded but describes an unusable mapping
    Invalid,
}

impl From<StorageError> for CalibrationError {
    fn from(e: StorageError) -> Self {
        CalibrationError::Storage(e)
    }
}

impl From<postcard::Error> for CalibrationError {
    fn from(_: postcard::Error) -> Self {
        CalibrationError::Encoding
    }
}

/// Where the calibration in use came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationSource {
    Stored,
    /// No record existed; the default was written
    Seeded,
    /// Record unreadable or unwritable; the default is used unsaved
    Fallback(CalibrationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    /// Raw reading at the left edge
    pub x_min: u16,
    /// Raw reading range across the full width
    pub x_span: u16,
    pub y_min: u16,
    pub y_span: u16,
    pub flags: u16,
}

impl Default for Calibration {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Calibration {
    /// Typical XPT2046 range on a 3.5" panel
    pub const DEFAULT: Self = Self {
        x_min: 300,
        x_span: 3500,
        y_min: 300,
        y_span: 3500,
        flags: 0,
    };

    pub fn is_valid(&self) -> bool {
        self.x_span != 0 && self.y_span != 0 && self.flags & !FLAG_MASK == 0
    }

    /// Map a raw reading to panel coordinates
    ///
    /// Readings outside the calibrated window yield `None`.
    pub fn map(&self, raw: RawTouch) -> Option<TouchPoint> {
        if !self.is_valid() {
            return None;
        }
        let (a, b) = if self.flags & FLAG_SWAP_XY != 0 {
            (raw.y, raw.x)
        } else {
            (raw.x, raw.y)
        };
        let mut x = scale(a, self.x_min, self.x_span, SCREEN_WIDTH)?;
        let mut y = scale(b, self.y_min, self.y_span, SCREEN_HEIGHT)?;
        if self.flags & FLAG_INVERT_X != 0 {
            x = SCREEN_WIDTH - 1 - x;
        }
        if self.flags & FLAG_INVERT_Y != 0 {
            y = SCREEN_HEIGHT - 1 - y;
        }
        Some(TouchPoint::new(x, y))
    }

    pub async fn load<S: KeyValueStore>(store: &mut S) -> Result<Self, CalibrationError> {
        let mut buf = [0u8; CALIBRATION_RECORD_LEN];
        let len = store.read(StorageKey::TouchCalibration, &mut buf).await?;
        let cal: Self = postcard::from_bytes(&buf[..len])?;
        if !cal.is_valid() {
            return Err(CalibrationError::Invalid);
        }
        Ok(cal)
    }

    /// Stored calibration, writing the default record on first boot
    ///
    /// Any other failure leaves the default in effect for this session and
    /// the store untouched.
    pub async fn load_or_seed<S: KeyValueStore>(store: &mut S) -> (Self, CalibrationSource) {
        match Self::load(store).await {
            Ok(cal) => (cal, CalibrationSource::Stored),
            Err(CalibrationError::Storage(StorageError::NotFound)) => {
                match Self::DEFAULT.save(store).await {
                    Ok(()) => (Self::DEFAULT, CalibrationSource::Seeded),
                    Err(e) => (Self::DEFAULT, CalibrationSource::Fallback(e)),
                }
            }
            Err(e) => (Self::DEFAULT, CalibrationSource::Fallback(e)),
        }
    }

    pub async fn save<S: KeyValueStore>(&self, store: &mut S) -> Result<(), CalibrationError> {
        if !self.is_valid() {
            return Err(CalibrationError::Invalid);
        }
        let mut buf = [0u8; CALIBRATION_RECORD_LEN];
        let used = postcard::to_slice(self, &mut buf)?;
        store.write(StorageKey::TouchCalibration, used).await?;
        Ok(())
    }
}

fn scale(raw: u16, min: u16, span: u16, extent: u16) -> Option<u16> {
    let offset = raw.checked_sub(min)? as u32;
    let scaled = offset * extent as u32 / span as u32;
    if scaled < extent as u32 {
        Some(scaled as u16)
    } else {
        None
    }
}
