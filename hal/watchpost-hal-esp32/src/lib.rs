//! ESP32-specific HAL for the Watchpost firmware
//!
//! This crate provides ESP32 implementations of the shared
//! `watchpost-hal` traits, plus the echo capture glue for the sensor:
//!
//! - Flash storage driver (implements `watchpost_hal::KeyValueStore`)
//! - UDP socket adapters (implement `watchpost_hal::DatagramSocket`)
//! - HTTP intake routers (picoserve) and form client (reqwless)
//! - Echo pin interrupt feeding an `EchoLatch`

#![no_std]

pub mod echo;
pub mod flash;
pub mod http;
pub mod udp;

// Re-export shared traits from watchpost-hal for convenience
pub use watchpost_hal::{DatagramSocket, KeyValueStore, StorageKey};
