//! Ultrasonic distance sensors

mod hcsr04;

pub use hcsr04::{EchoSource, Hcsr04, RangingError};
