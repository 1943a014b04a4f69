//! Motion edge detection
//!
//! An intrusion edge is a drop in distance of more than
//! [`MOTION_THRESHOLD_CM`] between two consecutive samples while armed.
//! Moving away from the sensor never counts.

use super::ranging::DistanceSample;
use crate::ArmState;

/// Distance drop that counts as motion
pub const MOTION_THRESHOLD_CM: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionEdge {
    pub previous_cm: f32,
    pub current_cm: f32,
    pub timestamp_ms: u64,
}

impl MotionEdge {
    pub fn delta_cm(&self) -> f32 {
        self.previous_cm - self.current_cm
    }
}

/// Keeps the current and previous sample
#[derive(Debug, Clone, Default)]
pub struct MotionMonitor {
    previous: Option<DistanceSample>,
    current: Option<DistanceSample>,
}

impl MotionMonitor {
    pub const fn new() -> Self {
        Self {
            previous: None,
            current: None,
        }
    }

    /// Record a sample and report whether it forms an intrusion edge
    ///
    /// Samples are retained while disarmed too, so arming does not compare
    /// against a stale reading.
    pub fn observe(&mut self, sample: DistanceSample, arm: ArmState) -> Option<MotionEdge> {
        self.previous = self.current.replace(sample);

        let previous = self.previous?;
        if !arm.is_armed() {
            return None;
        }
        let delta = previous.distance_cm - sample.distance_cm;
        (delta > MOTION_THRESHOLD_CM).then_some(MotionEdge {
            previous_cm: previous.distance_cm,
            current_cm: sample.distance_cm,
            timestamp_ms: sample.timestamp_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn run(distances: &[f32], arm: ArmState) -> heapless::Vec<usize, 16> {
        let mut m = MotionMonitor::new();
        let mut edges = heapless::Vec::new();
        for (i, &d) in distances.iter().enumerate() {
            let s = DistanceSample {
                timestamp_ms: i as u64 * 200,
                distance_cm: d,
            };
            if m.observe(s, arm).is_some() {
                edges.push(i).unwrap();
            }
        }
        edges
    }

    #[test]
    fn test_armed_drop_of_twelve_is_edge() {
        assert_eq!(run(&[50.0, 50.0, 38.0], ArmState::Armed), [2]);
    }

    #[test]
    fn test_small_drops_are_not_edges() {
        assert!(run(&[50.0, 45.0, 42.0], ArmState::Armed).is_empty());
    }

    #[test]
    fn test_exactly_threshold_is_not_edge() {
        assert!(run(&[50.0, 40.0], ArmState::Armed).is_empty());
    }

    #[test]
    fn test_disarmed_never_alerts() {
        assert!(run(&[300.0, 20.0, 200.0, 5.0], ArmState::Disarmed).is_empty());
    }

    #[test]
    fn test_increase_is_not_edge() {
        assert!(run(&[20.0, 80.0], ArmState::Armed).is_empty());
    }

    #[test]
    fn test_first_sample_has_no_edge() {
        let mut m = MotionMonitor::new();
        let s = DistanceSample {
            timestamp_ms: 0,
            distance_cm: 1.0,
        };
        assert!(m.observe(s, ArmState::Armed).is_none());
        assert_eq!(m.current, Some(s));
        assert_eq!(m.previous, None);
    }

    #[test]
    fn test_edge_reports_delta() {
        let mut m = MotionMonitor::new();
        let at = |t, d| DistanceSample {
            timestamp_ms: t,
            distance_cm: d,
        };
        m.observe(at(0, 50.0), ArmState::Armed);
        let edge = m.observe(at(200, 38.0), ArmState::Armed).unwrap();
        assert_eq!(edge.timestamp_ms, 200);
        assert!((edge.delta_cm() - 12.0).abs() < f32::EPSILON);
    }

    proptest! {
        #[test]
        fn prop_edge_iff_armed_and_drop_exceeds_threshold(
            prev in 0.0f32..500.0,
            cur in 0.0f32..500.0,
            armed in any::<bool>(),
        ) {
            let arm = if armed { ArmState::Armed } else { ArmState::Disarmed };
            let mut m = MotionMonitor::new();
            m.observe(DistanceSample { timestamp_ms: 0, distance_cm: prev }, arm);
            let edge = m.observe(DistanceSample { timestamp_ms: 200, distance_cm: cur }, arm);
            prop_assert_eq!(edge.is_some(), armed && prev - cur > MOTION_THRESHOLD_CM);
        }
    }
}
