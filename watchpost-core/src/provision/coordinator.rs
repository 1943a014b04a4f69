//! Access point bring-up and station reconnect supervision

use core::future::Future;

use embedded_hal_async::delay::DelayNs;

pub const AP_START_ATTEMPTS: u8 = 3;
pub const AP_RETRY_DELAY_MS: u32 = 1000;
/// Minimum time between station join attempts
pub const STA_RECONNECT_COOLDOWN_MS: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ApOutcome {
    Started { attempts: u8 },
    /// The access point never came up; the node continues station-only
    Degraded,
}

/// Radio side of access point bring-up
pub trait AccessPoint {
    /// Configure and start the AP; resolves to whether the radio reports it running
    fn try_start(&mut self) -> impl Future<Output = bool>;
}

/// Try to start the provisioning access point
pub async fn start_access_point(ap: &mut impl AccessPoint, delay: &mut impl DelayNs) -> ApOutcome {
    for n in 1..=AP_START_ATTEMPTS {
        if ap.try_start().await {
            return ApOutcome::Started { attempts: n };
        }
        if n < AP_START_ATTEMPTS {
            delay.delay_ms(AP_RETRY_DELAY_MS).await;
        }
    }
    ApOutcome::Degraded
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StationState {
    /// No attempt made since boot or since the credentials changed
    Pending,
    Connecting,
    Connected,
    Cooldown { until_ms: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StationAction {
    /// Start a join attempt now
    Connect,
    Hold,
}

/// Decides when the station interface should (re)join its network
#[derive(Debug, Clone)]
pub struct StationSupervisor {
    state: StationState,
}

impl Default for StationSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl StationSupervisor {
    pub const fn new() -> Self {
        Self {
            state: StationState::Pending,
        }
    }

    pub fn state(&self) -> StationState {
        self.state
    }

    /// Periodic check with the radio's current link status
    pub fn poll(&mut self, connected: bool, now_ms: u64) -> StationAction {
        use StationState::*;

        if connected {
            self.state = Connected;
            return StationAction::Hold;
        }
        match self.state {
            Pending => {
                self.state = Connecting;
                StationAction::Connect
            }
            Connected => {
                // Link dropped; back off before rejoining
                self.state = Cooldown {
                    until_ms: now_ms + STA_RECONNECT_COOLDOWN_MS,
                };
                StationAction::Hold
            }
            Cooldown { until_ms } if now_ms >= until_ms => {
                self.state = Connecting;
                StationAction::Connect
            }
            _ => StationAction::Hold,
        }
    }

    /// Report the result of a join attempt started by [`Self::poll`]
    pub fn attempt_finished(&mut self, ok: bool, now_ms: u64) {
        self.state = if ok {
            StationState::Connected
        } else {
            StationState::Cooldown {
                until_ms: now_ms + STA_RECONNECT_COOLDOWN_MS,
            }
        };
    }

    /// New credentials were saved; rejoin on the next poll
    pub fn credentials_changed(&mut self) {
        self.state = StationState::Pending;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingDelay;
    use embassy_futures::block_on;

    /// Succeeds on the given attempt, or never
    struct FlakyRadio {
        succeed_on: Option<u8>,
        calls: u8,
    }

    impl FlakyRadio {
        fn new(succeed_on: Option<u8>) -> Self {
            Self {
                succeed_on,
                calls: 0,
            }
        }
    }

    impl AccessPoint for FlakyRadio {
        async fn try_start(&mut self) -> bool {
            self.calls += 1;
            Some(self.calls) == self.succeed_on
        }
    }

    fn total_wait_ms(delay: &RecordingDelay) -> u64 {
        delay.waits_ns.iter().map(|&ns| ns as u64).sum::<u64>() / 1_000_000
    }

    #[test]
    fn test_ap_first_attempt() {
        let mut radio = FlakyRadio::new(Some(1));
        let mut delay = RecordingDelay::default();
        let outcome = block_on(start_access_point(&mut radio, &mut delay));
        assert_eq!(outcome, ApOutcome::Started { attempts: 1 });
        assert!(delay.waits_ns.is_empty());
    }

    #[test]
    fn test_ap_third_attempt() {
        let mut radio = FlakyRadio::new(Some(3));
        let mut delay = RecordingDelay::default();
        let outcome = block_on(start_access_point(&mut radio, &mut delay));
        assert_eq!(outcome, ApOutcome::Started { attempts: 3 });
        assert_eq!(total_wait_ms(&delay), 2 * AP_RETRY_DELAY_MS as u64);
    }

    #[test]
    fn test_ap_degraded_after_three() {
        let mut radio = FlakyRadio::new(None);
        let mut delay = RecordingDelay::default();
        let outcome = block_on(start_access_point(&mut radio, &mut delay));
        assert_eq!(outcome, ApOutcome::Degraded);
        assert_eq!(radio.calls, AP_START_ATTEMPTS);
        // No wait after the final attempt
        assert_eq!(total_wait_ms(&delay), 2 * AP_RETRY_DELAY_MS as u64);
    }

    #[test]
    fn test_station_connects_at_boot() {
        let mut sup = StationSupervisor::new();
        assert_eq!(sup.poll(false, 0), StationAction::Connect);
        assert_eq!(sup.state(), StationState::Connecting);
        // No second attempt while one is outstanding
        assert_eq!(sup.poll(false, 10), StationAction::Hold);
    }

    #[test]
    fn test_failed_attempt_cools_down() {
        let mut sup = StationSupervisor::new();
        sup.poll(false, 0);
        sup.attempt_finished(false, 500);
        assert_eq!(sup.poll(false, 2499), StationAction::Hold);
        assert_eq!(sup.poll(false, 2500), StationAction::Connect);
    }

    #[test]
    fn test_link_drop_reconnects_after_cooldown() {
        let mut sup = StationSupervisor::new();
        sup.poll(false, 0);
        sup.attempt_finished(true, 100);
        assert_eq!(sup.poll(true, 1000), StationAction::Hold);
        assert_eq!(sup.poll(false, 5000), StationAction::Hold);
        assert_eq!(sup.poll(false, 6999), StationAction::Hold);
        assert_eq!(sup.poll(false, 7000), StationAction::Connect);
    }

    #[test]
    fn test_credentials_changed_forces_rejoin() {
        let mut sup = StationSupervisor::new();
        sup.poll(false, 0);
        sup.attempt_finished(false, 0);
        sup.credentials_changed();
        assert_eq!(sup.poll(false, 1), StationAction::Connect);
    }
}
