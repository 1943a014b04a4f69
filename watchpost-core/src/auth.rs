//! Disarm authorization against a permanent PIN or a one-time pass
//!
//! Both node roles verify codes the same way: the display through its touch
//! keypad page, the sensor through an optional matrix keypad. There is no
//! attempt counter and no lockout.

use heapless::String;

/// Longest PIN or one-time pass accepted
pub const MAX_SECRET_LEN: usize = 14;

/// A PIN or one-time pass
pub type Secret = String<MAX_SECRET_LEN>;

/// Errors from setting a secret
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AuthError {
    /// Secret is empty
    Empty,
    /// Secret exceeds [`MAX_SECRET_LEN`]
    TooLong,
}

/// Which secret an attempt matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AuthMatch {
    Pin,
    OneTimePass,
}

/// Convert text into a [`Secret`], rejecting empty or oversized values
pub fn secret_from(text: &str) -> Result<Secret, AuthError> {
    if text.is_empty() {
        return Err(AuthError::Empty);
    }
    String::try_from(text).map_err(|_| AuthError::TooLong)
}

#[derive(Debug, Clone)]
pub struct Authenticator {
    pin: Secret,
    otp: Option<Secret>,
}

impl Authenticator {
    pub fn new(pin: Secret) -> Self {
        Self { pin, otp: None }
    }

    /// Replace the permanent PIN
    pub fn set_pin(&mut self, pin: &str) -> Result<(), AuthError> {
        self.pin = secret_from(pin)?;
        Ok(())
    }

    pub fn pin(&self) -> &str {
        &self.pin
    }

    /// Install a new one-time pass, replacing any unused one
    pub fn issue_otp(&mut self, otp: &str) -> Result<(), AuthError> {
        self.otp = Some(secret_from(otp)?);
        Ok(())
    }

    pub fn has_otp(&self) -> bool {
        self.otp.is_some()
    }

    /// Check an attempt
    ///
    /// The PIN is compared first. A one-time pass is consumed by the attempt
    /// that matches it.
    pub fn verify(&mut self, attempt: &str) -> Option<AuthMatch> {
        if attempt.is_empty() {
            return None;
        }
        if !self.pin.is_empty() && attempt == self.pin.as_str() {
            return Some(AuthMatch::Pin);
        }
        if self.otp.as_deref() == Some(attempt) {
            self.otp = None;
            return Some(AuthMatch::OneTimePass);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(pin: &str) -> Authenticator {
        Authenticator::new(secret_from(pin).unwrap())
    }

    #[test]
    fn test_pin_matches_repeatedly() {
        let mut a = auth("23012");
        assert_eq!(a.verify("23012"), Some(AuthMatch::Pin));
        assert_eq!(a.verify("23012"), Some(AuthMatch::Pin));
    }

    #[test]
    fn test_wrong_pin() {
        let mut a = auth("23012");
        assert_eq!(a.verify("23099"), None);
        assert_eq!(a.verify("2301"), None);
        assert_eq!(a.verify("230120"), None);
    }

    #[test]
    fn test_otp_is_single_use() {
        let mut a = auth("23012");
        a.issue_otp("777111").unwrap();
        assert!(a.has_otp());
        assert_eq!(a.verify("777111"), Some(AuthMatch::OneTimePass));
        assert!(!a.has_otp());
        assert_eq!(a.verify("777111"), None);
    }

    #[test]
    fn test_failed_attempt_keeps_otp() {
        let mut a = auth("23012");
        a.issue_otp("4444").unwrap();
        assert_eq!(a.verify("4445"), None);
        assert_eq!(a.verify("4444"), Some(AuthMatch::OneTimePass));
    }

    #[test]
    fn test_pin_takes_precedence_over_equal_otp() {
        let mut a = auth("1234");
        a.issue_otp("1234").unwrap();
        assert_eq!(a.verify("1234"), Some(AuthMatch::Pin));
        assert!(a.has_otp());
    }

    #[test]
    fn test_empty_attempt_never_matches() {
        let mut a = auth("1");
        assert_eq!(a.verify(""), None);
    }

    #[test]
    fn test_secret_validation() {
        assert_eq!(secret_from(""), Err(AuthError::Empty));
        assert_eq!(secret_from("123456789012345"), Err(AuthError::TooLong));
        assert!(secret_from("12345678901234").is_ok());
    }

    #[test]
    fn test_set_pin() {
        let mut a = auth("23012");
        a.set_pin("9999").unwrap();
        assert_eq!(a.verify("23012"), None);
        assert_eq!(a.verify("9999"), Some(AuthMatch::Pin));
        assert_eq!(a.set_pin(""), Err(AuthError::Empty));
        assert_eq!(a.pin(), "9999");
    }
}
