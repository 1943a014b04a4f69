//! Sensor node logic
//!
//! [`SensorNode`] is the owned context for one sensor: arm state, the last
//! two distance samples, alert recipients and the keypad path. The firmware
//! constructs it once and drives it from its main loop.

mod fanout;
mod keypad;
mod motion;
mod ranging;

pub use fanout::{
    AlertFanout, AlertReport, RecipientSet, RecipientSetFull, ALERT_REPEAT, ALERT_SEND_GAP_MS,
    MAX_RECIPIENTS,
};
pub use keypad::{KeypadAuth, KeypadOutcome, KEYPAD_CODE_LEN, KEYPAD_SUPPRESS_MS};
pub use motion::{MotionEdge, MotionMonitor, MOTION_THRESHOLD_CM};
pub use ranging::{
    distance_cm, DistanceSample, EchoLatch, ECHO_TIMEOUT_MS, SAMPLE_PERIOD_MS,
    SPEED_OF_SOUND_CM_PER_US, TRIGGER_PULSE_US,
};

use embedded_hal_async::delay::DelayNs;
use watchpost_hal::DatagramSocket;
use watchpost_protocol::{Command, Endpoint};

use crate::auth::{AuthError, Authenticator, Secret};
use crate::channel::MessageChannel;
use crate::ArmState;

/// Reaction to a received command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandAction {
    /// Arm state changed (or was re-asserted); send this acknowledgement
    Acknowledge { reply: Command, to: Endpoint },
    /// Valid command with nothing to do on a sensor
    Ignore,
}

/// Result of feeding one distance sample
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleOutcome {
    Quiet,
    /// Motion edge while armed; broadcast the alert
    Intrusion(MotionEdge),
    /// Motion edge inside the keypad suppression window
    Suppressed(MotionEdge),
}

pub struct SensorNode {
    arm: ArmState,
    monitor: MotionMonitor,
    recipients: RecipientSet,
    fanout: AlertFanout,
    auth: Authenticator,
    keypad: KeypadAuth,
    display: Endpoint,
}

impl SensorNode {
    /// `display` receives arm acknowledgements; `fallbacks` always receive
    /// alerts.
    pub fn new(display: Endpoint, fallbacks: [Endpoint; 2], pin: Secret) -> Self {
        Self {
            arm: ArmState::Disarmed,
            monitor: MotionMonitor::new(),
            recipients: RecipientSet::new(),
            fanout: AlertFanout::new(fallbacks),
            auth: Authenticator::new(pin),
            keypad: KeypadAuth::new(),
            display,
        }
    }

    pub fn arm_state(&self) -> ArmState {
        self.arm
    }

    pub fn handle_command(&mut self, command: Command) -> CommandAction {
        if !command.is_arm_control() {
            return CommandAction::Ignore;
        }
        self.arm = self.arm.apply(command);
        let reply = match self.arm {
            ArmState::Armed => Command::MotionDetectorOn,
            ArmState::Disarmed => Command::MotionDetectorOff,
        };
        CommandAction::Acknowledge {
            reply,
            to: self.display,
        }
    }

    pub fn on_sample(&mut self, sample: DistanceSample, now_ms: u64) -> SampleOutcome {
        match self.monitor.observe(sample, self.arm) {
            None => SampleOutcome::Quiet,
            Some(edge) if self.keypad.alerts_suppressed(now_ms) => SampleOutcome::Suppressed(edge),
            Some(edge) => SampleOutcome::Intrusion(edge),
        }
    }

    /// Send the alert burst for an intrusion edge
    pub async fn raise_alert<S: DatagramSocket, D: DelayNs>(
        &self,
        channel: &mut MessageChannel<S>,
        delay: &mut D,
    ) -> AlertReport {
        self.fanout
            .broadcast(channel, &self.recipients, delay)
            .await
    }

    pub fn on_key(&mut self, key: char, now_ms: u64) -> KeypadOutcome {
        self.keypad.press(key, &mut self.auth, self.arm, now_ms)
    }

    pub fn register_recipient(&mut self, endpoint: Endpoint) -> Result<bool, RecipientSetFull> {
        self.recipients.add(endpoint)
    }

    /// Subscribers registered through `/api/module`, fallbacks excluded
    pub fn recipients(&self) -> &RecipientSet {
        &self.recipients
    }

    pub fn issue_otp(&mut self, otp: &str) -> Result<(), AuthError> {
        self.auth.issue_otp(otp)
    }

    pub fn set_pin(&mut self, pin: &str) -> Result<(), AuthError> {
        self.auth.set_pin(pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::secret_from;
    use crate::testing::{FakeSocket, RecordingDelay};
    use embassy_futures::block_on;

    const DISPLAY: Endpoint = Endpoint::node(192, 168, 10, 1);
    const AGGREGATOR: Endpoint = Endpoint::node(192, 168, 1, 69);

    fn node() -> SensorNode {
        SensorNode::new(DISPLAY, [AGGREGATOR, DISPLAY], secret_from("23012003").unwrap())
    }

    fn sample(t: u64, d: f32) -> DistanceSample {
        DistanceSample {
            timestamp_ms: t,
            distance_cm: d,
        }
    }

    #[test]
    fn test_boots_disarmed() {
        assert_eq!(node().arm_state(), ArmState::Disarmed);
    }

    #[test]
    fn test_arm_command_is_acknowledged() {
        let mut n = node();
        assert_eq!(
            n.handle_command(Command::ArmMotionDetector),
            CommandAction::Acknowledge {
                reply: Command::MotionDetectorOn,
                to: DISPLAY
            }
        );
        assert_eq!(n.arm_state(), ArmState::Armed);
        assert_eq!(
            n.handle_command(Command::DisarmMotionDetector),
            CommandAction::Acknowledge {
                reply: Command::MotionDetectorOff,
                to: DISPLAY
            }
        );
        assert_eq!(n.arm_state(), ArmState::Disarmed);
    }

    #[test]
    fn test_other_commands_ignored() {
        let mut n = node();
        n.handle_command(Command::ArmMotionDetector);
        for cmd in [
            Command::Idle,
            Command::Intruder,
            Command::MotionDetectorOff,
            Command::MotionDetectorOn,
        ] {
            assert_eq!(n.handle_command(cmd), CommandAction::Ignore);
            assert_eq!(n.arm_state(), ArmState::Armed);
        }
    }

    #[test]
    fn test_armed_scenario_alerts_on_third_sample() {
        let mut n = node();
        n.handle_command(Command::ArmMotionDetector);
        assert_eq!(n.on_sample(sample(0, 50.0), 0), SampleOutcome::Quiet);
        assert_eq!(n.on_sample(sample(200, 50.0), 200), SampleOutcome::Quiet);
        assert!(matches!(
            n.on_sample(sample(400, 38.0), 400),
            SampleOutcome::Intrusion(_)
        ));

        let mut ch = MessageChannel::new(FakeSocket::default());
        let mut delay = RecordingDelay::default();
        let report = block_on(n.raise_alert(&mut ch, &mut delay));
        assert_eq!(report.sent, 4);
        assert_eq!(ch.socket_mut().sent_to(AGGREGATOR), 2);
    }

    #[test]
    fn test_gradual_approach_never_alerts() {
        let mut n = node();
        n.handle_command(Command::ArmMotionDetector);
        for (i, d) in [50.0, 45.0, 42.0].into_iter().enumerate() {
            assert_eq!(n.on_sample(sample(i as u64, d), i as u64), SampleOutcome::Quiet);
        }
    }

    #[test]
    fn test_edge_does_not_change_arm_state() {
        let mut n = node();
        n.handle_command(Command::ArmMotionDetector);
        n.on_sample(sample(0, 100.0), 0);
        n.on_sample(sample(200, 10.0), 200);
        assert_eq!(n.arm_state(), ArmState::Armed);
    }

    #[test]
    fn test_keypad_window_suppresses_then_resumes() {
        let mut n = node();
        n.handle_command(Command::ArmMotionDetector);
        for c in "23012003".chars() {
            n.on_key(c, 1_000);
        }
        n.on_sample(sample(1_000, 100.0), 1_000);
        assert!(matches!(
            n.on_sample(sample(1_200, 50.0), 1_200),
            SampleOutcome::Suppressed(_)
        ));
        assert_eq!(n.arm_state(), ArmState::Armed);
        n.on_sample(sample(6_000, 100.0), 6_000);
        assert!(matches!(
            n.on_sample(sample(6_200, 50.0), 6_200),
            SampleOutcome::Intrusion(_)
        ));
    }

    #[test]
    fn test_registered_recipient_receives_alert() {
        let mut n = node();
        let phone = Endpoint::node(192, 168, 10, 50);
        assert_eq!(n.register_recipient(phone), Ok(true));
        assert_eq!(n.register_recipient(phone), Ok(false));
        assert_eq!(n.recipients().len(), 1);
        assert!(n.recipients().contains(phone));
        let mut ch = MessageChannel::new(FakeSocket::default());
        let mut delay = RecordingDelay::default();
        block_on(n.raise_alert(&mut ch, &mut delay));
        assert_eq!(ch.socket_mut().sent_to(phone), 2);
    }
}
