//! Inter-task communication channels
//!
//! Defines the statics shared between Embassy tasks. The sensor node state
//! itself lives behind an async mutex handed to each task at spawn time.

use core::sync::atomic::AtomicBool;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;

use watchpost_core::credentials::Password;
use watchpost_core::sensor::SensorNode;
use watchpost_hal_esp32::http::IntakeQueue;

/// Sensor state shared by the ranging, radio, keypad and HTTP tasks
pub type SharedNode = Mutex<CriticalSectionRawMutex, SensorNode>;

/// Armed motion edge seen by the ranging task; the radio task sends the burst
pub static INTRUSION: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Actions accepted by the HTTP API, for the intake task
pub static INTAKE: IntakeQueue = IntakeQueue::new();

/// New display access point password from `/api/mainconnection`
pub static REJOIN: Signal<CriticalSectionRawMutex, Password> = Signal::new();

/// Station link came up (raised on every fresh join)
pub static LINK_UP: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Station currently associated with the display access point
pub static STATION_CONNECTED: AtomicBool = AtomicBool::new(false);
