//! PIN entry buffer for the disarm keypad

use heapless::String;

use crate::auth::MAX_SECRET_LEN;

/// Characters the entry buffer holds
pub const PIN_CAPACITY: usize = MAX_SECRET_LEN;

/// Transient digit buffer
///
/// Appending at capacity and deleting from empty are no-ops.
#[derive(Debug, Clone, Default)]
pub struct PinEntry {
    digits: String<PIN_CAPACITY>,
}

impl PinEntry {
    pub const fn new() -> Self {
        Self {
            digits: String::new(),
        }
    }

    /// Append a key; returns `false` when full
    pub fn push(&mut self, key: char) -> bool {
        self.digits.push(key).is_ok()
    }

    /// Remove the last key; returns `false` when empty
    pub fn delete(&mut self) -> bool {
        self.digits.pop().is_some()
    }

    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.digits
    }

    /// Hand out the entered code and wipe the buffer
    pub fn take(&mut self) -> String<PIN_CAPACITY> {
        let code = self.digits.clone();
        self.scrub();
        code
    }

    /// Overwrite every stored character, then empty the buffer
    pub fn scrub(&mut self) {
        let used = self.digits.len();
        self.digits.clear();
        for _ in 0..used {
            let _ = self.digits.push('0');
        }
        core::hint::black_box(&self.digits);
        self.digits.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_push_until_full() {
        let mut p = PinEntry::new();
        for _ in 0..PIN_CAPACITY {
            assert!(p.push('7'));
        }
        assert!(!p.push('7'));
        assert_eq!(p.len(), 14);
    }

    #[test]
    fn test_delete_on_empty_is_noop() {
        let mut p = PinEntry::new();
        assert!(!p.delete());
        assert!(p.is_empty());
    }

    #[test]
    fn test_delete_removes_last() {
        let mut p = PinEntry::new();
        p.push('2');
        p.push('3');
        assert!(p.delete());
        assert_eq!(p.as_str(), "2");
    }

    #[test]
    fn test_take_empties_buffer() {
        let mut p = PinEntry::new();
        for c in "23012".chars() {
            p.push(c);
        }
        assert_eq!(p.take().as_str(), "23012");
        assert!(p.is_empty());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Push(char),
        Delete,
        Take,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => proptest::char::range('0', '9').prop_map(Op::Push),
            2 => Just(Op::Delete),
            1 => Just(Op::Take),
        ]
    }

    proptest! {
        #[test]
        fn prop_length_stays_in_bounds(ops in proptest::collection::vec(op(), 0..200)) {
            let mut p = PinEntry::new();
            for op in ops {
                let before = p.len();
                match op {
                    Op::Push(c) => {
                        let pushed = p.push(c);
                        prop_assert_eq!(pushed, before < PIN_CAPACITY);
                    }
                    Op::Delete => {
                        let deleted = p.delete();
                        prop_assert_eq!(deleted, before > 0);
                    }
                    Op::Take => {
                        p.take();
                        prop_assert!(p.is_empty());
                    }
                }
                prop_assert!(p.len() <= PIN_CAPACITY);
            }
        }
    }
}
