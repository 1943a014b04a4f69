//! Board-agnostic node logic for the Watchpost security network
//!
//! This crate contains everything that does not touch a peripheral:
//!
//! - Message channel with per-destination send cooldown
//! - Credential store over the HAL key-value trait
//! - Sensor node: echo latch, motion edge detection, alert fan-out,
//!   keypad authorization
//! - Display node: page state machine, PIN entry, disarm authorization
//! - Provisioning: access point retry, station reconnect, HTTP intake
//!
//! Time is passed in explicitly as milliseconds from a monotonic clock so
//! every component can be driven from host tests.

#![no_std]
#![deny(unsafe_code)]

pub mod arm;
pub mod auth;
pub mod channel;
pub mod credentials;
pub mod display;
pub mod identity;
pub mod provision;
pub mod sensor;

#[cfg(test)]
pub(crate) mod testing;

pub use arm::ArmState;
pub use identity::{NodeIdentity, NodeRole};
