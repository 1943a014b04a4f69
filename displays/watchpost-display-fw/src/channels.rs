//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.
//! The page controller is owned by the UI task; everything else reaches it
//! through these queues.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use portable_atomic::AtomicBool;

use watchpost_core::auth::Secret;
use watchpost_core::credentials::{Password, Ssid};
use watchpost_core::sensor::RecipientSet;
use watchpost_hal_esp32::http::IntakeQueue;
use watchpost_protocol::{Command, Endpoint};

/// Channel capacity for received commands
const INBOX_SIZE: usize = 8;

/// Channel capacity for datagrams waiting to go out
const OUTBOX_SIZE: usize = 8;

/// Channel capacity for secrets pushed through the HTTP API
const SECRET_CHANNEL_SIZE: usize = 4;

/// A datagram for the radio task to send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Outgoing {
    pub command: Command,
    pub dest: Endpoint,
    /// Subject to the per-destination send cooldown
    pub throttled: bool,
}

/// Secret that changed through the HTTP API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretUpdate {
    OneTimePass(Secret),
    PermanentPin(Secret),
}

/// Commands received over UDP, for the page controller
pub static INBOX: Channel<CriticalSectionRawMutex, Command, INBOX_SIZE> = Channel::new();

/// Datagrams produced by the page controller
pub static OUTBOX: Channel<CriticalSectionRawMutex, Outgoing, OUTBOX_SIZE> = Channel::new();

/// Secrets for the page controller's authenticator
pub static SECRETS: Channel<CriticalSectionRawMutex, SecretUpdate, SECRET_CHANNEL_SIZE> =
    Channel::new();

/// Secrets to forward to every registered module
pub static FORWARD: Channel<CriticalSectionRawMutex, SecretUpdate, SECRET_CHANNEL_SIZE> =
    Channel::new();

/// Actions accepted by the HTTP intake, for the intake task
pub static INTAKE: IntakeQueue = IntakeQueue::new();

/// Modules registered through `/api/module`
pub static MODULES: Mutex<CriticalSectionRawMutex, RecipientSet> = Mutex::new(RecipientSet::new());

/// New home network credentials from the provisioning form
pub static STATION_CREDENTIALS: Signal<CriticalSectionRawMutex, (Ssid, Password)> = Signal::new();

/// New provisioning access point password from `/api/encryptedpass`
pub static AP_PASSWORD: Signal<CriticalSectionRawMutex, Password> = Signal::new();

/// Setup page is showing; the HTTP listener may accept connections
pub static SETUP_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Raised whenever `SETUP_ACTIVE` changes
pub static SETUP_CHANGED: Signal<CriticalSectionRawMutex, bool> = Signal::new();

/// Station currently associated with the home network
pub static STATION_CONNECTED: AtomicBool = AtomicBool::new(false);
