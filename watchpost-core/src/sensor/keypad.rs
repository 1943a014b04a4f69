//! Local keypad authorization on the sensor node
//!
//! A code is evaluated automatically once [`KEYPAD_CODE_LEN`] keys have been
//! pressed. A correct code while armed opens a short window during which
//! alerts are suppressed so the occupant can walk past the sensor; the arm
//! state itself does not change.

use heapless::String;

use crate::auth::{AuthMatch, Authenticator};
use crate::ArmState;

/// Keys per code
pub const KEYPAD_CODE_LEN: usize = 8;

/// Alert suppression after a correct code while armed
pub const KEYPAD_SUPPRESS_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeypadOutcome {
    /// Key buffered; code not complete yet
    Pending { entered: u8 },
    /// Code accepted
    Approved {
        matched: AuthMatch,
        /// Alerts are suppressed until this time
        suppressed_until: Option<u64>,
    },
    Denied,
}

#[derive(Debug, Clone, Default)]
pub struct KeypadAuth {
    entry: String<KEYPAD_CODE_LEN>,
    suppressed_until: Option<u64>,
}

impl KeypadAuth {
    pub const fn new() -> Self {
        Self {
            entry: String::new(),
            suppressed_until: None,
        }
    }

    /// Feed one key press
    pub fn press(
        &mut self,
        key: char,
        auth: &mut Authenticator,
        arm: ArmState,
        now_ms: u64,
    ) -> KeypadOutcome {
        // Cannot overflow: the buffer is evaluated and cleared when full
        let _ = self.entry.push(key);
        if self.entry.len() < KEYPAD_CODE_LEN {
            return KeypadOutcome::Pending {
                entered: self.entry.len() as u8,
            };
        }

        let result = auth.verify(&self.entry);
        self.entry.clear();

        match result {
            Some(matched) => {
                let suppressed_until = arm.is_armed().then(|| now_ms + KEYPAD_SUPPRESS_MS);
                if suppressed_until.is_some() {
                    self.suppressed_until = suppressed_until;
                }
                KeypadOutcome::Approved {
                    matched,
                    suppressed_until,
                }
            }
            None => KeypadOutcome::Denied,
        }
    }

    /// Whether alerts are currently held back
    pub fn alerts_suppressed(&mut self, now_ms: u64) -> bool {
        match self.suppressed_until {
            Some(until) if now_ms < until => true,
            Some(_) => {
                self.suppressed_until = None;
                false
            }
            None => false,
        }
    }

    pub fn entered(&self) -> usize {
        self.entry.len()
    }
}
