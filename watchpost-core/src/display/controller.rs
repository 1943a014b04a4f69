//! Display node controller
//!
//! Owns the page, the mirrored arm state, the PIN buffer and the
//! authenticator. Touch input and received commands go in; an ordered list
//! of [`Effect`]s comes out for the firmware to carry out.

use heapless::Vec;
use watchpost_protocol::{Command, Endpoint};

use super::layout::{self, HomeTarget, KeypadTarget, TouchPoint};
use super::page::{Page, PageEvent};
use super::pin::PinEntry;
use crate::auth::{AuthError, Authenticator};
use crate::ArmState;

/// Pause between an arm/disarm command and the follow-up `idle`
pub const FOLLOWUP_DELAY_MS: u32 = 1000;

/// How long "DENIED" stays on screen
pub const DENIED_DISPLAY_MS: u32 = 2000;

/// Something the firmware must do, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Effect {
    /// Throttled send to the sensor
    SendToSensor(Command),
    /// Unthrottled send to the sensor closing an arm or disarm exchange
    FollowUpToSensor(Command),
    /// Unthrottled send to an arbitrary endpoint
    Relay(Command, Endpoint),
    /// Block the UI for a fixed time
    Wait(u32),
    StartSetupListener,
    StopSetupListener,
    /// Show the denial banner for the given time, then clear it
    ShowDenied(u32),
    /// Page content changed
    Redraw,
}

pub type Effects = Vec<Effect, 6>;

fn effects(list: &[Effect]) -> Effects {
    // Every list built here is shorter than the capacity
    Vec::from_slice(list).unwrap_or_default()
}

fn append(mut fx: Effects, list: &[Effect]) -> Effects {
    let _ = fx.extend_from_slice(list);
    fx
}

pub struct DisplayController {
    page: Page,
    arm: ArmState,
    pin: PinEntry,
    auth: Authenticator,
    intruder: bool,
    relay: Endpoint,
}

impl DisplayController {
    /// `relay` receives a copy of every intrusion alert this node hears
    pub fn new(auth: Authenticator, relay: Endpoint) -> Self {
        Self {
            page: Page::Home,
            arm: ArmState::Disarmed,
            pin: PinEntry::new(),
            auth,
            intruder: false,
            relay,
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn arm_state(&self) -> ArmState {
        self.arm
    }

    pub fn pin_entry(&self) -> &PinEntry {
        &self.pin
    }

    /// An intrusion alert arrived since the last successful disarm
    pub fn intruder_alert(&self) -> bool {
        self.intruder
    }

    pub fn issue_otp(&mut self, otp: &str) -> Result<(), AuthError> {
        self.auth.issue_otp(otp)
    }

    pub fn set_pin(&mut self, pin: &str) -> Result<(), AuthError> {
        self.auth.set_pin(pin)
    }

    /// Change page, starting or stopping HTTP intake as the new page needs
    fn go(&mut self, event: PageEvent) -> Effects {
        let listening = self.page.listens_for_setup();
        self.page = self.page.transition(event);
        match (listening, self.page.listens_for_setup()) {
            (false, true) => effects(&[Effect::StartSetupListener]),
            (true, false) => effects(&[Effect::StopSetupListener]),
            _ => Effects::new(),
        }
    }

    /// Handle one touch press
    pub fn on_touch(&mut self, point: TouchPoint) -> Effects {
        match self.page {
            Page::Home => self.touch_home(point),
            Page::Setup => {
                if !layout::hit_setup_exit(point) {
                    return Effects::new();
                }
                let fx = self.go(PageEvent::CloseSetup);
                append(fx, &[Effect::Redraw])
            }
            Page::DisarmAuth => self.touch_keypad(point),
        }
    }

    fn touch_home(&mut self, point: TouchPoint) -> Effects {
        match layout::hit_home(point) {
            Some(HomeTarget::Setup) => {
                let fx = self.go(PageEvent::OpenSetup);
                append(fx, &[Effect::Redraw])
            }
            Some(HomeTarget::ArmToggle) => {
                let fx = self.go(PageEvent::ToggleArm(self.arm));
                match self.arm {
                    ArmState::Disarmed => {
                        self.arm = ArmState::Armed;
                        append(
                            fx,
                            &[
                                Effect::Redraw,
                                Effect::SendToSensor(Command::ArmMotionDetector),
                                Effect::Wait(FOLLOWUP_DELAY_MS),
                                Effect::FollowUpToSensor(Command::Idle),
                            ],
                        )
                    }
                    ArmState::Armed => append(fx, &[Effect::Redraw]),
                }
            }
            None => Effects::new(),
        }
    }

    fn touch_keypad(&mut self, point: TouchPoint) -> Effects {
        match layout::hit_keypad(point) {
            Some(KeypadTarget::Key(key)) => {
                if self.pin.push(key) {
                    effects(&[Effect::Redraw])
                } else {
                    Effects::new()
                }
            }
            Some(KeypadTarget::Delete) => {
                if self.pin.delete() {
                    effects(&[Effect::Redraw])
                } else {
                    Effects::new()
                }
            }
            Some(KeypadTarget::Enter) => self.submit(),
            None => Effects::new(),
        }
    }

    /// Compare the entered code; the buffer is wiped either way
    fn submit(&mut self) -> Effects {
        let attempt = self.pin.take();
        match self.auth.verify(&attempt) {
            Some(_) => {
                let fx = self.go(PageEvent::AuthAccepted);
                self.arm = ArmState::Disarmed;
                self.intruder = false;
                append(
                    fx,
                    &[
                        Effect::Redraw,
                        Effect::SendToSensor(Command::DisarmMotionDetector),
                        Effect::Wait(FOLLOWUP_DELAY_MS),
                        Effect::FollowUpToSensor(Command::Idle),
                    ],
                )
            }
            None => {
                let fx = self.go(PageEvent::AuthRejected);
                append(fx, &[Effect::ShowDenied(DENIED_DISPLAY_MS), Effect::Redraw])
            }
        }
    }

    /// Handle a command received from the network
    pub fn on_command(&mut self, command: Command) -> Effects {
        match command {
            Command::MotionDetectorOn | Command::MotionDetectorOff => {
                let next = self.arm.apply(command);
                if next == self.arm {
                    return Effects::new();
                }
                self.arm = next;
                effects(&[Effect::Redraw])
            }
            Command::Intruder => {
                self.intruder = true;
                effects(&[Effect::Relay(Command::Intruder, self.relay), Effect::Redraw])
            }
            // Display-to-sensor keywords echoed back at us
            Command::ArmMotionDetector | Command::DisarmMotionDetector | Command::Idle => {
                Effects::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::secret_from;

    const RELAY: Endpoint = Endpoint::node(192, 168, 1, 74);
    const SETUP: TouchPoint = TouchPoint::new(30, 160);
    const TOGGLE: TouchPoint = TouchPoint::new(290, 120);
    const EXIT: TouchPoint = TouchPoint::new(20, 20);
    const ENTER: TouchPoint = TouchPoint::new(450, 200);
    const DELETE: TouchPoint = TouchPoint::new(440, 50);

    fn key(c: char) -> TouchPoint {
        for (r, row) in layout::KEYPAD_KEYS.iter().enumerate() {
            if let Some(col) = row.iter().position(|&k| k == c) {
                let (x0, _) = layout::KEYPAD_COLUMNS[col];
                let (y0, _) = layout::KEYPAD_ROWS[r];
                return TouchPoint::new(x0 + 5, y0 + 5);
            }
        }
        panic!("no key {}", c);
    }

    fn controller() -> DisplayController {
        DisplayController::new(Authenticator::new(secret_from("23012").unwrap()), RELAY)
    }

    fn armed_at_keypad() -> DisplayController {
        let mut c = controller();
        c.on_touch(TOGGLE);
        c.on_touch(TOGGLE);
        assert_eq!(c.page(), Page::DisarmAuth);
        c
    }

    fn type_code(c: &mut DisplayController, code: &str) {
        for ch in code.chars() {
            c.on_touch(key(ch));
        }
    }

    #[test]
    fn test_arming_sends_arm_then_idle() {
        let mut c = controller();
        let fx = c.on_touch(TOGGLE);
        assert_eq!(
            fx.as_slice(),
            &[
                Effect::Redraw,
                Effect::SendToSensor(Command::ArmMotionDetector),
                Effect::Wait(1000),
                Effect::FollowUpToSensor(Command::Idle),
            ]
        );
        assert_eq!(c.arm_state(), ArmState::Armed);
        assert_eq!(c.page(), Page::Home);
    }

    #[test]
    fn test_idle_follow_up_ignores_open_cooldown() {
        use crate::channel::{MessageChannel, SendOutcome};
        use crate::testing::FakeSocket;

        const SENSOR: Endpoint = Endpoint::node(192, 168, 10, 2);
        let mut c = controller();
        let mut ch = MessageChannel::new(FakeSocket::default());

        // Clock stands still across the wait, so the arm send's window is open
        for effect in c.on_touch(TOGGLE) {
            match effect {
                Effect::SendToSensor(cmd) => {
                    assert_eq!(ch.send(cmd, SENSOR, 5_000), Ok(SendOutcome::Sent));
                }
                Effect::FollowUpToSensor(cmd) => ch.send_unthrottled(cmd, SENSOR).unwrap(),
                _ => {}
            }
        }
        let sent = &ch.socket_mut().sent;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].1, b"idle");
    }

    #[test]
    fn test_toggle_while_armed_requires_auth() {
        let mut c = controller();
        c.on_touch(TOGGLE);
        let fx = c.on_touch(TOGGLE);
        assert_eq!(fx.as_slice(), &[Effect::Redraw]);
        assert_eq!(c.page(), Page::DisarmAuth);
        assert_eq!(c.arm_state(), ArmState::Armed);
    }

    #[test]
    fn test_correct_pin_disarms() {
        let mut c = armed_at_keypad();
        type_code(&mut c, "23012");
        assert_eq!(c.pin_entry().as_str(), "23012");
        let fx = c.on_touch(ENTER);
        assert_eq!(
            fx.as_slice(),
            &[
                Effect::Redraw,
                Effect::SendToSensor(Command::DisarmMotionDetector),
                Effect::Wait(1000),
                Effect::FollowUpToSensor(Command::Idle),
            ]
        );
        assert_eq!(c.page(), Page::Home);
        assert_eq!(c.arm_state(), ArmState::Disarmed);
        assert!(c.pin_entry().is_empty());
    }

    #[test]
    fn test_wrong_pin_is_denied() {
        let mut c = armed_at_keypad();
        type_code(&mut c, "23099");
        let fx = c.on_touch(ENTER);
        assert_eq!(fx.as_slice(), &[Effect::ShowDenied(2000), Effect::Redraw]);
        assert_eq!(c.page(), Page::DisarmAuth);
        assert_eq!(c.arm_state(), ArmState::Armed);
        assert!(c.pin_entry().is_empty());

        // no lockout
        type_code(&mut c, "23012");
        c.on_touch(ENTER);
        assert_eq!(c.page(), Page::Home);
    }

    #[test]
    fn test_empty_submit_is_denied() {
        let mut c = armed_at_keypad();
        let fx = c.on_touch(ENTER);
        assert_eq!(fx[0], Effect::ShowDenied(DENIED_DISPLAY_MS));
        assert_eq!(c.page(), Page::DisarmAuth);
    }

    #[test]
    fn test_delete_corrects_entry() {
        let mut c = armed_at_keypad();
        type_code(&mut c, "230129");
        c.on_touch(DELETE);
        c.on_touch(ENTER);
        assert_eq!(c.page(), Page::Home);
    }

    #[test]
    fn test_keys_beyond_capacity_ignored() {
        let mut c = armed_at_keypad();
        type_code(&mut c, "11111111111111");
        assert!(c.on_touch(key('2')).is_empty());
        assert_eq!(c.pin_entry().len(), 14);
    }

    #[test]
    fn test_delete_on_empty_does_nothing() {
        let mut c = armed_at_keypad();
        assert!(c.on_touch(DELETE).is_empty());
    }

    #[test]
    fn test_otp_disarms_once() {
        let mut c = armed_at_keypad();
        c.issue_otp("555").unwrap();
        type_code(&mut c, "555");
        c.on_touch(ENTER);
        assert_eq!(c.page(), Page::Home);

        c.on_touch(TOGGLE);
        c.on_touch(TOGGLE);
        type_code(&mut c, "555");
        let fx = c.on_touch(ENTER);
        assert_eq!(fx[0], Effect::ShowDenied(DENIED_DISPLAY_MS));
        assert_eq!(c.page(), Page::DisarmAuth);
    }

    #[test]
    fn test_setup_starts_and_stops_listener() {
        let mut c = controller();
        assert_eq!(
            c.on_touch(SETUP).as_slice(),
            &[Effect::StartSetupListener, Effect::Redraw]
        );
        assert_eq!(c.page(), Page::Setup);
        // arm toggle is not reachable from setup
        assert!(c.on_touch(TOGGLE).is_empty());
        assert_eq!(
            c.on_touch(EXIT).as_slice(),
            &[Effect::StopSetupListener, Effect::Redraw]
        );
        assert_eq!(c.page(), Page::Home);
    }

    #[test]
    fn test_touch_outside_targets_ignored() {
        let mut c = controller();
        assert!(c.on_touch(TouchPoint::new(400, 300)).is_empty());
        assert_eq!(c.page(), Page::Home);
    }

    #[test]
    fn test_acknowledgements_update_mirror() {
        let mut c = controller();
        assert_eq!(
            c.on_command(Command::MotionDetectorOn).as_slice(),
            &[Effect::Redraw]
        );
        assert_eq!(c.arm_state(), ArmState::Armed);
        assert!(c.on_command(Command::MotionDetectorOn).is_empty());
        c.on_command(Command::MotionDetectorOff);
        assert_eq!(c.arm_state(), ArmState::Disarmed);
    }

    #[test]
    fn test_intruder_is_relayed_and_flagged() {
        let mut c = controller();
        let fx = c.on_command(Command::Intruder);
        assert_eq!(
            fx.as_slice(),
            &[Effect::Relay(Command::Intruder, RELAY), Effect::Redraw]
        );
        assert!(c.intruder_alert());

        c.on_touch(TOGGLE);
        c.on_touch(TOGGLE);
        type_code(&mut c, "23012");
        c.on_touch(ENTER);
        assert!(!c.intruder_alert());
    }

    #[test]
    fn test_echoed_sensor_keywords_ignored() {
        let mut c = controller();
        assert!(c.on_command(Command::ArmMotionDetector).is_empty());
        assert!(c.on_command(Command::Idle).is_empty());
        assert_eq!(c.arm_state(), ArmState::Disarmed);
    }
}
