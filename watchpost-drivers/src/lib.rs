//! Peripheral drivers
//!
//! Generic over the embedded-hal traits so the same code runs on any
//! ESP32 variant and against mock pins on the host:
//!
//! - Ultrasonic ranger (HC-SR04 trigger and echo wait)
//! - 4x4 matrix keypad scanner

#![no_std]
#![deny(unsafe_code)]

pub mod keypad;
pub mod ranging;
