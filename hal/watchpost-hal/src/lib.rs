//! Watchpost Hardware Abstraction Layer
//!
//! This crate defines the traits that chip-specific HALs implement so the
//! node logic in `watchpost-core` can run unchanged on the ESP32 and on the
//! host under test.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Firmware (sensor-fw, display-fw)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  watchpost-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!           ┌───────────────────┐
//!           │ watchpost-hal-    │
//!           │     esp32         │
//!           └───────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`storage::KeyValueStore`] - Persistent key-value storage
//! - [`net::DatagramSocket`] - Non-blocking UDP send/receive

#![no_std]
#![deny(unsafe_code)]

pub mod net;
pub mod storage;

// Re-export key traits at crate root for convenience
pub use net::{DatagramSocket, NetError, SplitSocket, Subnet};
pub use storage::{KeyValueStore, StorageError, StorageKey};
