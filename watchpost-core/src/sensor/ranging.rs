//! Ultrasonic time-of-flight ranging
//!
//! The echo pin is timed from interrupt context. The rising edge stores a
//! start timestamp; the falling edge stores the pulse width and raises the
//! ready flag. The sampling loop picks the width up with [`EchoLatch::take`].

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Speed of sound at room temperature, centimetres per microsecond
pub const SPEED_OF_SOUND_CM_PER_US: f32 = 0.0343;

/// Width of the trigger pulse
pub const TRIGGER_PULSE_US: u32 = 10;

/// Longest wait for an echo; covers the sensor's 4 m range with margin
pub const ECHO_TIMEOUT_MS: u64 = 40;

/// Pause between samples
pub const SAMPLE_PERIOD_MS: u64 = 200;

/// Convert an echo pulse width to a one-way distance
pub fn distance_cm(echo_us: u32) -> f32 {
    echo_us as f32 * SPEED_OF_SOUND_CM_PER_US / 2.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DistanceSample {
    pub timestamp_ms: u64,
    pub distance_cm: f32,
}

impl DistanceSample {
    pub fn from_echo(timestamp_ms: u64, echo_us: u32) -> Self {
        Self {
            timestamp_ms,
            distance_cm: distance_cm(echo_us),
        }
    }
}

/// Echo pulse handoff between the edge interrupt and the sampling loop
///
/// Single writer (interrupt), single reader (loop). Only plain atomic loads
/// and stores are used so the handler stays short on every target.
pub struct EchoLatch {
    rise_us: AtomicU32,
    width_us: AtomicU32,
    ready: AtomicBool,
}

impl Default for EchoLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl EchoLatch {
    pub const fn new() -> Self {
        Self {
            rise_us: AtomicU32::new(0),
            width_us: AtomicU32::new(0),
            ready: AtomicBool::new(false),
        }
    }

    /// Clear any stale measurement before issuing a trigger pulse
    pub fn reset(&self) {
        self.ready.store(false, Ordering::Release);
    }

    /// Interrupt side: echo went high
    pub fn on_rising(&self, now_us: u32) {
        self.rise_us.store(now_us, Ordering::Relaxed);
    }

    /// Interrupt side: echo went low
    pub fn on_falling(&self, now_us: u32) {
        let width = now_us.wrapping_sub(self.rise_us.load(Ordering::Relaxed));
        self.width_us.store(width, Ordering::Relaxed);
        self.ready.store(true, Ordering::Release);
    }

    /// Loop side: take the latched width, if any
    pub fn take(&self) -> Option<u32> {
        if !self.ready.load(Ordering::Acquire) {
            return None;
        }
        self.ready.store(false, Ordering::Relaxed);
        Some(self.width_us.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_conversion() {
        // 1 m round trip is ~5831 us
        let d = distance_cm(5831);
        assert!((d - 100.0).abs() < 0.1, "got {}", d);
        assert_eq!(distance_cm(0), 0.0);
    }

    #[test]
    fn test_latch_reports_pulse_width() {
        let latch = EchoLatch::new();
        latch.reset();
        assert_eq!(latch.take(), None);

        latch.on_rising(1_000);
        assert_eq!(latch.take(), None);
        latch.on_falling(3_915);
        assert_eq!(latch.take(), Some(2_915));
        // consumed
        assert_eq!(latch.take(), None);
    }

    #[test]
    fn test_latch_handles_timer_wrap() {
        let latch = EchoLatch::new();
        latch.on_rising(u32::MAX - 99);
        latch.on_falling(400);
        assert_eq!(latch.take(), Some(500));
    }

    #[test]
    fn test_reset_discards_stale_echo() {
        let latch = EchoLatch::new();
        latch.on_rising(0);
        latch.on_falling(100);
        latch.reset();
        assert_eq!(latch.take(), None);
    }

    #[test]
    fn test_sample_from_echo() {
        let s = DistanceSample::from_echo(42, 2915);
        assert_eq!(s.timestamp_ms, 42);
        assert!((s.distance_cm - 49.99).abs() < 0.05);
    }
}
