//! Touch input abstraction

use watchpost_core::display::TouchPoint;

use crate::calibration::Calibration;

/// Raw controller reading, in controller units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawTouch {
    pub x: u16,
    pub y: u16,
}

impl RawTouch {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// Touch controller
///
/// Implementations apply their own pressure threshold and report `None`
/// while the panel is not pressed.
pub trait TouchInput {
    type Error;

    fn read(&mut self) -> Result<Option<RawTouch>, Self::Error>;
}

/// Calibrated touch source reporting one point per press
pub struct CalibratedTouch<T> {
    input: T,
    calibration: Calibration,
    pressed: bool,
}

impl<T: TouchInput> CalibratedTouch<T> {
    pub fn new(input: T, calibration: Calibration) -> Self {
        Self {
            input,
            calibration,
            pressed: false,
        }
    }

    /// Point of a new press, if one started since the last poll
    ///
    /// A held finger is reported once; the panel must be released before
    /// the next press registers.
    pub fn poll(&mut self) -> Result<Option<TouchPoint>, T::Error> {
        let Some(raw) = self.input.read()? else {
            self.pressed = false;
            return Ok(None);
        };
        if self.pressed {
            return Ok(None);
        }
        // Off-window readings don't latch so a slide onto the panel still counts
        let point = self.calibration.map(raw);
        self.pressed = point.is_some();
        Ok(point)
    }
}
