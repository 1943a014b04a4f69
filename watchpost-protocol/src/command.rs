//! Command keywords and their wire encoding

/// Largest payload either node will send or accept
pub const MAX_DATAGRAM_LEN: usize = 127;

/// Errors from decoding a received datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Zero-length datagram
    Empty,
    /// Payload exceeds [`MAX_DATAGRAM_LEN`]
    TooLong,
    /// Payload does not start with any known keyword
    Unrecognized,
}

/// The closed set of commands exchanged between nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Arm the motion detector
    ArmMotionDetector,
    /// Disarm the motion detector
    DisarmMotionDetector,
    /// Follow-up sent after arm/disarm; carries no action
    Idle,
    /// Intrusion alert
    Intruder,
    /// Sensor acknowledges it is armed
    MotionDetectorOn,
    /// Sensor acknowledges it is disarmed
    MotionDetectorOff,
}

impl Command {
    /// Every command, longest keyword first so prefix matching never
    /// resolves to a shorter keyword that happens to share a prefix.
    pub const ALL: [Command; 6] = [
        Command::DisarmMotionDetector,
        Command::ArmMotionDetector,
        Command::MotionDetectorOff,
        Command::MotionDetectorOn,
        Command::Intruder,
        Command::Idle,
    ];

    /// ASCII keyword as sent on the wire
    pub const fn keyword(self) -> &'static str {
        match self {
            Command::ArmMotionDetector => "turnonmotiondetectorespmotion",
            Command::DisarmMotionDetector => "turnoffmotiondetectorespmotion",
            Command::Idle => "idle",
            Command::Intruder => "INTRUDER INTRUDER",
            Command::MotionDetectorOn => "MOTION DETECTOR ON",
            Command::MotionDetectorOff => "MOTION DETECTOR OFF",
        }
    }

    /// Keyword bytes, ready to hand to a socket
    pub const fn as_bytes(self) -> &'static [u8] {
        self.keyword().as_bytes()
    }

    /// Decode a received datagram
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        if payload.is_empty() {
            return Err(DecodeError::Empty);
        }
        if payload.len() > MAX_DATAGRAM_LEN {
            return Err(DecodeError::TooLong);
        }

        Self::ALL
            .iter()
            .copied()
            .find(|cmd| payload.starts_with(cmd.as_bytes()))
            .ok_or(DecodeError::Unrecognized)
    }

    /// Whether this command changes the sensor's arm state
    pub fn is_arm_control(self) -> bool {
        matches!(
            self,
            Command::ArmMotionDetector | Command::DisarmMotionDetector
        )
    }
}
