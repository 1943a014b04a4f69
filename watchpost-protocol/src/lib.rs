//! Watchpost node-to-node protocol
//!
//! Display and sensor nodes talk over plain UDP datagrams carrying a single
//! ASCII keyword. There is no header, length field, checksum, or sequence
//! number; the datagram boundary is the frame.
//!
//! # Vocabulary
//!
//! ```text
//! ┌────────────────────────────────┬────────────────────┬─────────────────────┐
//! │ Keyword                        │ Direction          │ Meaning             │
//! ├────────────────────────────────┼────────────────────┼─────────────────────┤
//! │ turnonmotiondetectorespmotion  │ display → sensor   │ arm                 │
//! │ turnoffmotiondetectorespmotion │ display → sensor   │ disarm              │
//! │ idle                           │ display → sensor   │ no-op keepalive     │
//! │ MOTION DETECTOR ON             │ sensor → display   │ arm acknowledged    │
//! │ MOTION DETECTOR OFF            │ sensor → display   │ disarm acknowledged │
//! │ INTRUDER INTRUDER              │ sensor → anyone    │ intrusion alert     │
//! └────────────────────────────────┴────────────────────┴─────────────────────┘
//! ```
//!
//! Decoding is a byte-prefix match: a datagram is recognised when it starts
//! with one of the keywords. Trailing bytes (a newline, NUL padding) are
//! ignored.

#![no_std]
#![deny(unsafe_code)]

pub mod command;
pub mod endpoint;

pub use command::{Command, DecodeError, MAX_DATAGRAM_LEN};
pub use endpoint::{Endpoint, UDP_PORT};
