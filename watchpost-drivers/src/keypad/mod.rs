//! Key matrix scanners

mod matrix;

pub use matrix::{MatrixKeypad, DEFAULT_KEYMAP, KEYPAD_COLS, KEYPAD_ROWS};
