//! Screen-side components of the Watchpost display node
//!
//! This crate provides:
//! - `render` for drawing a page snapshot onto any `embedded-graphics`
//!   RGB565 target
//! - `TouchInput` for raw touch controllers and `Calibration` for turning
//!   raw readings into panel coordinates
//! - Load/save of the calibration record through the HAL key-value store
//!
//! # Architecture
//!
//! The page state machine lives in `watchpost-core` and knows nothing about
//! pixels. The firmware takes a [`View`] snapshot after every effect batch
//! and hands it to [`render`]; touches flow the other way through
//! [`CalibratedTouch`] into `DisplayController::on_touch`.

#![no_std]
#![deny(unsafe_code)]

pub mod calibration;
pub mod render;
pub mod touch;

// Re-export key types
pub use calibration::{Calibration, CalibrationError, CalibrationSource};
pub use render::{render, SetupInfo, View};
pub use touch::{CalibratedTouch, RawTouch, TouchInput};
