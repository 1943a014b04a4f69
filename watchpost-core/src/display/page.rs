//! Display page state machine
//!
//! Exactly one page is active. Page changes are a pure function of the
//! current page and an event; side effects are decided by the controller.

use crate::ArmState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Page {
    /// Arm toggle and Setup entry
    #[default]
    Home,
    /// Provisioning instructions; HTTP intake is listening
    Setup,
    /// PIN keypad shown before disarming
    DisarmAuth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PageEvent {
    /// Setup hit-box on Home
    OpenSetup,
    /// Exit hit-box on Setup
    CloseSetup,
    /// Arm indicator pressed; carries the arm state at the time of the press
    ToggleArm(ArmState),
    /// Submitted code matched
    AuthAccepted,
    /// Submitted code did not match
    AuthRejected,
}

impl Page {
    pub fn transition(self, event: PageEvent) -> Self {
        use Page::*;
        use PageEvent::*;

        match (self, event) {
            (Home, OpenSetup) => Setup,
            (Setup, CloseSetup) => Home,

            // Arming needs no authentication; disarming does
            (Home, ToggleArm(ArmState::Armed)) => DisarmAuth,
            (Home, ToggleArm(ArmState::Disarmed)) => Home,

            (DisarmAuth, AuthAccepted) => Home,
            (DisarmAuth, AuthRejected) => DisarmAuth,

            _ => self,
        }
    }

    /// HTTP intake should be listening on this page
    pub fn listens_for_setup(self) -> bool {
        self == Page::Setup
    }
}
