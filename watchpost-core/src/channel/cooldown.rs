//! Per-destination send cooldown

use heapless::Vec;
use watchpost_protocol::Endpoint;

/// Minimum spacing between two throttled sends to the same destination
pub const SEND_COOLDOWN_MS: u64 = 1000;

/// Destinations tracked at once
const COOLDOWN_SLOTS: usize = 8;

/// Monotonic cooldown table
///
/// Records the time of the last send to each destination. A send is allowed
/// once at least [`SEND_COOLDOWN_MS`] have elapsed; anything earlier is
/// refused and not queued.
#[derive(Debug, Clone, Default)]
pub struct SendCooldown {
    last_sent: Vec<(Endpoint, u64), COOLDOWN_SLOTS>,
}

impl SendCooldown {
    pub const fn new() -> Self {
        Self {
            last_sent: Vec::new(),
        }
    }

    /// Whether a send to `dest` at `now_ms` is outside the cooldown window
    pub fn is_ready(&self, dest: Endpoint, now_ms: u64) -> bool {
        self.last_sent
            .iter()
            .find(|(ep, _)| *ep == dest)
            .map_or(true, |(_, last)| now_ms.saturating_sub(*last) >= SEND_COOLDOWN_MS)
    }

    /// Start the cooldown window for `dest` after a completed send
    pub fn record(&mut self, dest: Endpoint, now_ms: u64) {
        if let Some((_, last)) = self.last_sent.iter_mut().find(|(ep, _)| *ep == dest) {
            *last = now_ms;
            return;
        }

        if self.last_sent.is_full() {
            self.last_sent
                .retain(|(_, last)| now_ms.saturating_sub(*last) < SEND_COOLDOWN_MS);
        }
        if self.last_sent.is_full() {
            // Every slot is still cooling down; give up the oldest
            if let Some(oldest) = self
                .last_sent
                .iter()
                .enumerate()
                .min_by_key(|(_, (_, last))| *last)
                .map(|(i, _)| i)
            {
                self.last_sent.swap_remove(oldest);
            }
        }
        // Cannot fail: a slot was freed above if the table was full
        let _ = self.last_sent.push((dest, now_ms));
    }

    /// Number of destinations currently tracked
    pub fn tracked(&self) -> usize {
        self.last_sent.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const A: Endpoint = Endpoint::node(192, 168, 10, 2);
    const B: Endpoint = Endpoint::node(192, 168, 10, 3);

    fn acquire(c: &mut SendCooldown, dest: Endpoint, now_ms: u64) -> bool {
        if !c.is_ready(dest, now_ms) {
            return false;
        }
        c.record(dest, now_ms);
        true
    }

    #[test]
    fn test_first_send_allowed() {
        let mut c = SendCooldown::new();
        assert!(acquire(&mut c, A, 0));
    }

    #[test]
    fn test_second_send_inside_window_refused() {
        let mut c = SendCooldown::new();
        assert!(acquire(&mut c, A, 5000));
        assert!(!acquire(&mut c, A, 5001));
        assert!(!acquire(&mut c, A, 5999));
        assert!(acquire(&mut c, A, 6000));
    }

    #[test]
    fn test_refused_send_does_not_extend_window() {
        let mut c = SendCooldown::new();
        assert!(acquire(&mut c, A, 0));
        assert!(!acquire(&mut c, A, 900));
        assert!(acquire(&mut c, A, 1000));
    }

    #[test]
    fn test_unrecorded_check_leaves_window_closed() {
        let mut c = SendCooldown::new();
        assert!(c.is_ready(A, 0));
        assert!(c.is_ready(A, 10));
        assert_eq!(c.tracked(), 0);
        c.record(A, 10);
        assert!(!c.is_ready(A, 500));
    }

    #[test]
    fn test_destinations_are_independent() {
        let mut c = SendCooldown::new();
        assert!(acquire(&mut c, A, 100));
        assert!(acquire(&mut c, B, 150));
        assert!(!acquire(&mut c, A, 200));
    }

    #[test]
    fn test_full_table_drops_expired_entries_first() {
        let mut c = SendCooldown::new();
        for i in 0..COOLDOWN_SLOTS as u8 {
            assert!(acquire(&mut c, Endpoint::node(10, 0, 0, i), 0));
        }
        assert_eq!(c.tracked(), COOLDOWN_SLOTS);
        assert!(acquire(&mut c, Endpoint::node(10, 0, 1, 0), 2000));
        assert_eq!(c.tracked(), 1);
    }

    #[test]
    fn test_full_table_evicts_oldest_when_all_active() {
        let mut c = SendCooldown::new();
        for i in 0..COOLDOWN_SLOTS as u8 {
            assert!(acquire(&mut c, Endpoint::node(10, 0, 0, i), i as u64));
        }
        assert!(acquire(&mut c, Endpoint::node(10, 0, 1, 0), 100));
        assert_eq!(c.tracked(), COOLDOWN_SLOTS);
        // Newest entries are still enforced
        assert!(!acquire(&mut c, Endpoint::node(10, 0, 0, 7), 200));
    }

    proptest! {
        #[test]
        fn prop_never_two_sends_within_window(
            steps in proptest::collection::vec(0u64..400, 1..100),
        ) {
            let mut c = SendCooldown::new();
            let mut now = 0u64;
            let mut last_allowed: Option<u64> = None;
            for step in steps {
                now += step;
                if acquire(&mut c, A, now) {
                    if let Some(prev) = last_allowed {
                        prop_assert!(now - prev >= SEND_COOLDOWN_MS);
                    }
                    last_allowed = Some(now);
                }
            }
        }
    }
}
