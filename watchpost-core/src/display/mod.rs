//! Display node logic
//!
//! Pages, touch hit-boxes, PIN entry and the controller that ties them to
//! the arm/disarm commands sent to the sensor.

pub mod layout;

mod controller;
mod page;
mod pin;

pub use controller::{DisplayController, Effect, Effects, DENIED_DISPLAY_MS, FOLLOWUP_DELAY_MS};
pub use layout::TouchPoint;
pub use page::{Page, PageEvent};
pub use pin::{PinEntry, PIN_CAPACITY};
