//! Intrusion alert fan-out
//!
//! On a motion edge the alert goes to every registered recipient and to two
//! fixed fallback addresses. Each address gets the alert
//! [`ALERT_REPEAT`] times since the channel never acknowledges delivery.

use embedded_hal_async::delay::DelayNs;
use heapless::Vec;
use watchpost_hal::{DatagramSocket, NetError};
use watchpost_protocol::{Command, Endpoint};

use crate::channel::MessageChannel;

/// Registered recipients kept at once
pub const MAX_RECIPIENTS: usize = 20;

/// Sends per address per alert
pub const ALERT_REPEAT: usize = 2;

/// Gap after each individual send
pub const ALERT_SEND_GAP_MS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RecipientSetFull;

/// Runtime-registered alert subscribers; not persisted
#[derive(Debug, Clone, Default)]
pub struct RecipientSet {
    entries: Vec<Endpoint, MAX_RECIPIENTS>,
}

impl RecipientSet {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a recipient
    ///
    /// Returns `Ok(false)` if it was already registered.
    pub fn add(&mut self, endpoint: Endpoint) -> Result<bool, RecipientSetFull> {
        if self.contains(endpoint) {
            return Ok(false);
        }
        self.entries.push(endpoint).map_err(|_| RecipientSetFull)?;
        Ok(true)
    }

    pub fn contains(&self, endpoint: Endpoint) -> bool {
        self.entries.contains(&endpoint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Endpoint> + '_ {
        self.entries.iter().copied()
    }
}

/// Outcome of one alert burst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlertReport {
    pub sent: u16,
    pub failed: u16,
    pub last_error: Option<NetError>,
}

#[derive(Debug, Clone, Copy)]
pub struct AlertFanout {
    fallbacks: [Endpoint; 2],
}

impl AlertFanout {
    pub const fn new(fallbacks: [Endpoint; 2]) -> Self {
        Self { fallbacks }
    }

    /// Every distinct address an alert goes to, fallbacks first
    pub fn targets<'a>(
        &'a self,
        recipients: &'a RecipientSet,
    ) -> impl Iterator<Item = Endpoint> + 'a {
        let fallbacks = &self.fallbacks;
        let second = (fallbacks[1] != fallbacks[0]).then_some(fallbacks[1]);
        core::iter::once(fallbacks[0])
            .chain(second)
            .chain(recipients.iter().filter(move |ep| !fallbacks.contains(ep)))
    }

    /// Send the alert burst
    ///
    /// Send failures are counted and the burst continues; a lost datagram
    /// is indistinguishable from a failed one at this layer.
    pub async fn broadcast<S: DatagramSocket, D: DelayNs>(
        &self,
        channel: &mut MessageChannel<S>,
        recipients: &RecipientSet,
        delay: &mut D,
    ) -> AlertReport {
        let mut report = AlertReport::default();
        for _ in 0..ALERT_REPEAT {
            for target in self.targets(recipients) {
                match channel.send_unthrottled(Command::Intruder, target) {
                    Ok(()) => report.sent += 1,
                    Err(e) => {
                        report.failed += 1;
                        report.last_error = Some(e);
                    }
                }
                delay.delay_ms(ALERT_SEND_GAP_MS).await;
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeSocket, RecordingDelay};
    use embassy_futures::block_on;

    const AGGREGATOR: Endpoint = Endpoint::node(192, 168, 1, 69);
    const DISPLAY: Endpoint = Endpoint::node(192, 168, 10, 1);

    fn fanout() -> AlertFanout {
        AlertFanout::new([AGGREGATOR, DISPLAY])
    }

    #[test]
    fn test_no_recipients_sends_four() {
        let mut ch = MessageChannel::new(FakeSocket::default());
        let mut delay = RecordingDelay::default();
        let report = block_on(fanout().broadcast(&mut ch, &RecipientSet::new(), &mut delay));

        assert_eq!(report.sent, 4);
        assert_eq!(ch.socket_mut().sent_to(AGGREGATOR), 2);
        assert_eq!(ch.socket_mut().sent_to(DISPLAY), 2);
        assert!(ch
            .socket_mut()
            .sent
            .iter()
            .all(|(_, p)| p.as_slice() == b"INTRUDER INTRUDER"));
    }

    #[test]
    fn test_fallbacks_get_two_regardless_of_recipients() {
        for n in [0u8, 1, 5, 20] {
            let mut set = RecipientSet::new();
            for i in 0..n {
                set.add(Endpoint::node(192, 168, 10, 100 + i)).unwrap();
            }
            let mut ch = MessageChannel::new(FakeSocket::default());
            let mut delay = RecordingDelay::default();
            block_on(fanout().broadcast(&mut ch, &set, &mut delay));

            assert_eq!(ch.socket_mut().sent_to(AGGREGATOR), 2);
            assert_eq!(ch.socket_mut().sent_to(DISPLAY), 2);
            assert_eq!(ch.socket_mut().sent.len(), 4 + 2 * n as usize);
        }
    }

    #[test]
    fn test_recipient_equal_to_fallback_is_not_doubled() {
        let mut set = RecipientSet::new();
        set.add(DISPLAY).unwrap();
        let mut ch = MessageChannel::new(FakeSocket::default());
        let mut delay = RecordingDelay::default();
        block_on(fanout().broadcast(&mut ch, &set, &mut delay));
        assert_eq!(ch.socket_mut().sent_to(DISPLAY), 2);
    }

    #[test]
    fn test_burst_ignores_cooldown() {
        let mut ch = MessageChannel::new(FakeSocket::default());
        ch.send(Command::Idle, DISPLAY, 0).unwrap();
        let mut delay = RecordingDelay::default();
        block_on(fanout().broadcast(&mut ch, &RecipientSet::new(), &mut delay));
        assert_eq!(ch.socket_mut().sent_to(DISPLAY), 3);
    }

    #[test]
    fn test_sends_are_spaced() {
        let mut ch = MessageChannel::new(FakeSocket::default());
        let mut delay = RecordingDelay::default();
        block_on(fanout().broadcast(&mut ch, &RecipientSet::new(), &mut delay));
        let total_ns: u64 = delay.waits_ns.iter().map(|&ns| ns as u64).sum();
        assert_eq!(total_ns, 4 * ALERT_SEND_GAP_MS as u64 * 1_000_000);
    }

    #[test]
    fn test_failures_are_counted_not_fatal() {
        let mut ch = MessageChannel::new(FakeSocket {
            send_error: Some(NetError::NotReady),
            ..Default::default()
        });
        let mut delay = RecordingDelay::default();
        let report = block_on(fanout().broadcast(&mut ch, &RecipientSet::new(), &mut delay));
        assert_eq!(report.sent, 0);
        assert_eq!(report.failed, 4);
        assert_eq!(report.last_error, Some(NetError::NotReady));
    }

    #[test]
    fn test_recipient_set_is_bounded_and_deduplicated() {
        let mut set = RecipientSet::new();
        for i in 0..MAX_RECIPIENTS as u8 {
            assert_eq!(set.add(Endpoint::node(10, 0, 0, i)), Ok(true));
        }
        assert_eq!(set.add(Endpoint::node(10, 0, 0, 0)), Ok(false));
        assert_eq!(set.add(Endpoint::node(10, 0, 1, 0)), Err(RecipientSetFull));
        assert_eq!(set.len(), MAX_RECIPIENTS);
    }
}
