//! Datagram message channel
//!
//! Wraps a [`DatagramSocket`] with the command vocabulary from
//! `watchpost-protocol`. Payloads are decoded once here; everything above
//! this layer deals in [`Command`] values.
//!
//! Delivery is best effort. Nothing is retried, acknowledged, or
//! deduplicated, so callers must tolerate loss and reordering.

mod cooldown;

pub use cooldown::{SendCooldown, SEND_COOLDOWN_MS};

use watchpost_hal::{DatagramSocket, NetError};
use watchpost_protocol::{Command, DecodeError, Endpoint, MAX_DATAGRAM_LEN};

/// Result of a throttled send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendOutcome {
    /// Datagram handed to the socket
    Sent,
    /// Dropped because the destination is cooling down
    Throttled,
}

/// One polled datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Received {
    Command { command: Command, from: Endpoint },
    /// Datagram that did not decode; callers log and discard it
    Unrecognized {
        from: Endpoint,
        len: usize,
        error: DecodeError,
    },
}

pub struct MessageChannel<S> {
    socket: S,
    cooldown: SendCooldown,
}

impl<S: DatagramSocket> MessageChannel<S> {
    pub fn new(socket: S) -> Self {
        Self {
            socket,
            cooldown: SendCooldown::new(),
        }
    }

    /// Send a command, at most once per destination per [`SEND_COOLDOWN_MS`]
    ///
    /// A send inside the cooldown window is dropped and reported as
    /// [`SendOutcome::Throttled`]. The window only starts once the socket
    /// accepted the datagram.
    pub fn send(
        &mut self,
        command: Command,
        dest: Endpoint,
        now_ms: u64,
    ) -> Result<SendOutcome, NetError> {
        if !self.cooldown.is_ready(dest, now_ms) {
            return Ok(SendOutcome::Throttled);
        }
        self.socket.try_send_to(command.as_bytes(), dest)?;
        self.cooldown.record(dest, now_ms);
        Ok(SendOutcome::Sent)
    }

    /// Send without consulting or updating the cooldown
    ///
    /// Reserved for intrusion alerts and arm acknowledgements, whose
    /// repetition is part of the protocol.
    pub fn send_unthrottled(&mut self, command: Command, dest: Endpoint) -> Result<(), NetError> {
        self.socket.try_send_to(command.as_bytes(), dest)
    }

    /// Poll for one datagram without blocking
    pub fn receive(&mut self) -> Result<Option<Received>, NetError> {
        let mut buf = [0u8; MAX_DATAGRAM_LEN + 1];
        let Some((len, from)) = self.socket.try_recv_from(&mut buf)? else {
            return Ok(None);
        };

        let received = match Command::decode(&buf[..len]) {
            Ok(command) => Received::Command { command, from },
            Err(error) => Received::Unrecognized { from, len, error },
        };
        Ok(Some(received))
    }

    pub fn socket_mut(&mut self) -> &mut S {
        &mut self.socket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSocket;

    const SENSOR: Endpoint = Endpoint::node(192, 168, 10, 2);
    const DISPLAY: Endpoint = Endpoint::node(192, 168, 10, 1);

    #[test]
    fn test_two_sends_within_window_produce_one_datagram() {
        let mut ch = MessageChannel::new(FakeSocket::default());
        assert_eq!(
            ch.send(Command::ArmMotionDetector, SENSOR, 10_000),
            Ok(SendOutcome::Sent)
        );
        assert_eq!(
            ch.send(Command::Idle, SENSOR, 10_500),
            Ok(SendOutcome::Throttled)
        );
        assert_eq!(ch.socket_mut().sent_to(SENSOR), 1);
        assert_eq!(ch.socket_mut().sent[0].1, b"turnonmotiondetectorespmotion");
    }

    #[test]
    fn test_send_after_window() {
        let mut ch = MessageChannel::new(FakeSocket::default());
        ch.send(Command::ArmMotionDetector, SENSOR, 0).unwrap();
        assert_eq!(ch.send(Command::Idle, SENSOR, 1000), Ok(SendOutcome::Sent));
        assert_eq!(ch.socket_mut().sent_to(SENSOR), 2);
    }

    #[test]
    fn test_unthrottled_bypasses_cooldown() {
        let mut ch = MessageChannel::new(FakeSocket::default());
        ch.send(Command::Idle, DISPLAY, 0).unwrap();
        ch.send_unthrottled(Command::Intruder, DISPLAY).unwrap();
        ch.send_unthrottled(Command::Intruder, DISPLAY).unwrap();
        assert_eq!(ch.socket_mut().sent_to(DISPLAY), 3);
        // and does not start a cooldown of its own
        let mut ch = MessageChannel::new(FakeSocket::default());
        ch.send_unthrottled(Command::Intruder, DISPLAY).unwrap();
        assert_eq!(ch.send(Command::Idle, DISPLAY, 1), Ok(SendOutcome::Sent));
    }

    #[test]
    fn test_socket_error_propagates() {
        let mut ch = MessageChannel::new(FakeSocket {
            send_error: Some(NetError::NotReady),
            ..Default::default()
        });
        assert_eq!(
            ch.send(Command::Idle, SENSOR, 0),
            Err(NetError::NotReady)
        );
    }

    #[test]
    fn test_failed_send_does_not_start_cooldown() {
        let mut ch = MessageChannel::new(FakeSocket {
            send_error: Some(NetError::NotReady),
            ..Default::default()
        });
        assert!(ch.send(Command::ArmMotionDetector, SENSOR, 0).is_err());

        ch.socket_mut().send_error = None;
        assert_eq!(
            ch.send(Command::ArmMotionDetector, SENSOR, 100),
            Ok(SendOutcome::Sent)
        );
        assert_eq!(ch.socket_mut().sent_to(SENSOR), 1);
    }

    #[test]
    fn test_receive_returns_one_message_per_poll() {
        let mut ch = MessageChannel::new(FakeSocket::default());
        ch.socket_mut().deliver(SENSOR, b"MOTION DETECTOR ON\n");
        ch.socket_mut().deliver(SENSOR, b"INTRUDER INTRUDER");

        assert_eq!(
            ch.receive(),
            Ok(Some(Received::Command {
                command: Command::MotionDetectorOn,
                from: SENSOR
            }))
        );
        assert_eq!(
            ch.receive(),
            Ok(Some(Received::Command {
                command: Command::Intruder,
                from: SENSOR
            }))
        );
        assert_eq!(ch.receive(), Ok(None));
    }

    #[test]
    fn test_receive_reports_garbage() {
        let mut ch = MessageChannel::new(FakeSocket::default());
        ch.socket_mut().deliver(SENSOR, b"hello");
        assert_eq!(
            ch.receive(),
            Ok(Some(Received::Unrecognized {
                from: SENSOR,
                len: 5,
                error: DecodeError::Unrecognized
            }))
        );
    }

    #[test]
    fn test_receive_oversized_is_too_long() {
        let mut ch = MessageChannel::new(FakeSocket::default());
        let big = [b'i'; MAX_DATAGRAM_LEN + 1];
        ch.socket_mut().deliver(SENSOR, &big);
        assert!(matches!(
            ch.receive(),
            Ok(Some(Received::Unrecognized {
                error: DecodeError::TooLong,
                ..
            }))
        ));
    }
}
