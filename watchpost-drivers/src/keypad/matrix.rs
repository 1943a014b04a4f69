//! 4x4 matrix keypad
//!
//! Rows are outputs driven high one at a time; columns are inputs with
//! pull-downs. A key closes the contact between its row and column.

use embedded_hal::digital::{InputPin, OutputPin};

pub const KEYPAD_ROWS: usize = 4;
pub const KEYPAD_COLS: usize = 4;

/// Legend of the common membrane keypad, row-major
pub const DEFAULT_KEYMAP: [[char; KEYPAD_COLS]; KEYPAD_ROWS] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['*', '0', '#', 'D'],
];

pub struct MatrixKeypad<R, C> {
    rows: [R; KEYPAD_ROWS],
    cols: [C; KEYPAD_COLS],
    keymap: [[char; KEYPAD_COLS]; KEYPAD_ROWS],
    /// Key seen on the previous poll
    held: Option<char>,
}

impl<R, C, E> MatrixKeypad<R, C>
where
    R: OutputPin<Error = E>,
    C: InputPin<Error = E>,
{
    pub fn new(rows: [R; KEYPAD_ROWS], cols: [C; KEYPAD_COLS]) -> Result<Self, E> {
        Self::with_keymap(rows, cols, DEFAULT_KEYMAP)
    }

    pub fn with_keymap(
        mut rows: [R; KEYPAD_ROWS],
        cols: [C; KEYPAD_COLS],
        keymap: [[char; KEYPAD_COLS]; KEYPAD_ROWS],
    ) -> Result<Self, E> {
        for row in rows.iter_mut() {
            row.set_low()?;
        }
        Ok(Self {
            rows,
            cols,
            keymap,
            held: None,
        })
    }

    /// Key currently held down, lowest row and column first
    pub fn scan(&mut self) -> Result<Option<char>, E> {
        for (r, row) in self.rows.iter_mut().enumerate() {
            row.set_high()?;
            let mut hit = None;
            for (c, col) in self.cols.iter_mut().enumerate() {
                if col.is_high()? {
                    hit = Some(self.keymap[r][c]);
                    break;
                }
            }
            row.set_low()?;
            if hit.is_some() {
                return Ok(hit);
            }
        }
        Ok(None)
    }

    /// Newly pressed key, reported once per press
    pub fn poll(&mut self) -> Result<Option<char>, E> {
        let now = self.scan()?;
        let pressed = match (self.held, now) {
            (None, Some(key)) => Some(key),
            (Some(prev), Some(key)) if prev != key => Some(key),
            _ => None,
        };
        self.held = now;
        Ok(pressed)
    }
}
