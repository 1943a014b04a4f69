//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod http;
pub mod intake;
pub mod keypad;
pub mod net;
pub mod radio;
pub mod ranging;
pub mod register;
pub mod wifi;

pub use http::http_task;
pub use intake::intake_task;
pub use keypad::{keypad_task, Keypad};
pub use net::net_task;
pub use radio::radio_task;
pub use ranging::{ranging_task, Ranger};
pub use register::register_task;
pub use wifi::{client_mode, wifi_task};
