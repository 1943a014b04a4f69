//! Touch hit-boxes for the 480x320 landscape panel
//!
//! Regions are half-open (`x0 <= x < x1`) so neighbouring keys never both
//! claim a touch on their shared edge.

/// Panel width in landscape orientation
pub const SCREEN_WIDTH: u16 = 480;
/// Panel height in landscape orientation
pub const SCREEN_HEIGHT: u16 = 320;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchPoint {
    pub x: u16,
    pub y: u16,
}

impl TouchPoint {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hitbox {
    pub x0: u16,
    pub y0: u16,
    pub x1: u16,
    pub y1: u16,
}

impl Hitbox {
    pub const fn new(x0: u16, y0: u16, x1: u16, y1: u16) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn contains(&self, p: TouchPoint) -> bool {
        (self.x0..self.x1).contains(&p.x) && (self.y0..self.y1).contains(&p.y)
    }
}

pub const SETUP_BUTTON: Hitbox = Hitbox::new(0, 150, 66, 186);
pub const ARM_TOGGLE: Hitbox = Hitbox::new(260, 90, 321, 151);
/// Centre of the arm indicator circle
pub const ARM_INDICATOR: (i32, i32) = (290, 120);

pub const SETUP_EXIT: Hitbox = Hitbox::new(0, 0, 101, 41);

pub const KEYPAD_COLUMNS: [(u16, u16); 3] = [(70, 180), (180, 300), (300, 400)];
pub const KEYPAD_ROWS: [(u16, u16); 4] = [(60, 130), (130, 190), (190, 250), (250, 310)];
pub const KEYPAD_KEYS: [[char; 3]; 4] = [
    ['1', '2', '3'],
    ['4', '5', '6'],
    ['7', '8', '9'],
    ['*', '0', '#'],
];
pub const KEYPAD_DELETE: Hitbox = Hitbox::new(400, 10, SCREEN_WIDTH, 111);
pub const KEYPAD_ENTER: Hitbox = Hitbox::new(420, 130, SCREEN_WIDTH, SCREEN_HEIGHT);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomeTarget {
    Setup,
    ArmToggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeypadTarget {
    Key(char),
    Delete,
    Enter,
}

pub fn hit_home(p: TouchPoint) -> Option<HomeTarget> {
    if SETUP_BUTTON.contains(p) {
        Some(HomeTarget::Setup)
    } else if ARM_TOGGLE.contains(p) {
        Some(HomeTarget::ArmToggle)
    } else {
        None
    }
}

pub fn hit_setup_exit(p: TouchPoint) -> bool {
    SETUP_EXIT.contains(p)
}

pub fn hit_keypad(p: TouchPoint) -> Option<KeypadTarget> {
    let col = KEYPAD_COLUMNS
        .iter()
        .position(|&(x0, x1)| (x0..x1).contains(&p.x));
    let row = KEYPAD_ROWS
        .iter()
        .position(|&(y0, y1)| (y0..y1).contains(&p.y));
    if let (Some(col), Some(row)) = (col, row) {
        return Some(KeypadTarget::Key(KEYPAD_KEYS[row][col]));
    }
    if KEYPAD_DELETE.contains(p) {
        return Some(KeypadTarget::Delete);
    }
    if KEYPAD_ENTER.contains(p) {
        return Some(KeypadTarget::Enter);
    }
    None
}
