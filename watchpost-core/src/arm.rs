//! Arm state shared by both node roles

use watchpost_protocol::Command;

/// Whether the motion detector raises alerts
///
/// The sensor node owns this value; the display node keeps a mirror that
/// follows its own commands and the sensor's acknowledgements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArmState {
    #[default]
    Disarmed,
    Armed,
}

impl ArmState {
    pub fn is_armed(self) -> bool {
        self == ArmState::Armed
    }

    /// Apply a received command
    ///
    /// Only the arm/disarm keywords (and their acknowledgements) change the
    /// state. Everything else, including intrusion alerts, leaves it as is.
    pub fn apply(self, command: Command) -> Self {
        match command {
            Command::ArmMotionDetector | Command::MotionDetectorOn => ArmState::Armed,
            Command::DisarmMotionDetector | Command::MotionDetectorOff => ArmState::Disarmed,
            Command::Idle | Command::Intruder => self,
        }
    }
}
