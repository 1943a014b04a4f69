//! `application/x-www-form-urlencoded` bodies for outgoing requests

use core::fmt::Write;

use heapless::String;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Bytes left unescaped by the urlencoded serializer
const FORM_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_');

/// Encoded body does not fit the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FormTooLong;

/// `field=value` with the value percent-encoded
pub fn form_body<const N: usize>(field: &str, value: &str) -> Result<String<N>, FormTooLong> {
    let mut body = String::new();
    write!(body, "{}={}", field, utf8_percent_encode(value, FORM_VALUE))
        .map_err(|_| FormTooLong)?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plain_value() {
        let body = form_body::<32>("otp", "777111").unwrap();
        assert_eq!(body.as_str(), "otp=777111");
    }

    #[test]
    fn test_reserved_characters_are_escaped() {
        let body = form_body::<48>("pass", "a b&c=d").unwrap();
        assert_eq!(body.as_str(), "pass=a%20b%26c%3Dd");
    }

    #[test]
    fn test_dotted_address() {
        let body = form_body::<48>("alert", "192.168.10.2").unwrap();
        assert_eq!(body.as_str(), "alert=192.168.10.2");
    }

    #[test]
    fn test_too_long() {
        assert_eq!(form_body::<8>("pass", "123456"), Err(FormTooLong));
    }

    proptest! {
        #[test]
        fn test_any_length_stays_in_buffer(value in ".{0,600}") {
            if let Ok(body) = form_body::<64>("pass", &value) {
                prop_assert!(body.len() <= 64);
                prop_assert!(body.starts_with("pass="));
            }
        }

        #[test]
        fn test_unreserved_value_fits_iff_room(value in "7{0,200}") {
            let fits = "pass=".len() + value.len() <= 64;
            prop_assert_eq!(form_body::<64>("pass", &value).is_ok(), fits);
        }
    }
}
