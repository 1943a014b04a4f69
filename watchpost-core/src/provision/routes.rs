//! HTTP intake handlers for both node roles
//!
//! Form bodies arrive already decoded into the structs below; each handler
//! validates one form and returns the [`IntakeAction`] the firmware should
//! carry out once the client has its response. Which paths a role serves is
//! decided by the firmware's router, not here.

use heapless::String;
use serde::{Deserialize, Serialize};
use watchpost_protocol::Endpoint;

use crate::auth::{secret_from, Secret, MAX_SECRET_LEN};
use crate::credentials::{ap_password_from, Password, Ssid, MAX_PASSWORD_LEN};

/// Longest `alert` value, `255.255.255.255:65535`
const MAX_ADDRESS_LEN: usize = 21;

/// Work requested through the HTTP intake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeAction {
    /// Display: store home WiFi credentials and rejoin
    SaveWifi { ssid: Ssid, password: Password },
    /// Display: remember an SSID for the next [`IntakeAction::JoinStaged`]
    StageSsid(Ssid),
    /// Display: join the staged SSID with this password
    JoinStaged(Password),
    /// Display: restart the provisioning access point with a new password
    SetApPassword(Password),
    /// Install a one-time pass (the display also forwards it to modules)
    IssueOtp(Secret),
    /// Replace the permanent PIN (the display also forwards it to modules)
    SetPermanentPin(Secret),
    /// Sensor: store the display access point password and rejoin it
    JoinMainConnection(Password),
    /// Register a module (display) or alert subscriber (sensor)
    RegisterModule(Endpoint),
}

impl IntakeAction {
    /// Carrying this out takes a WiFi link down
    ///
    /// The client's connection may run over that link, so the firmware
    /// gives the response a moment to leave first.
    pub fn disrupts_link(&self) -> bool {
        matches!(
            self,
            IntakeAction::SaveWifi { .. }
                | IntakeAction::JoinStaged(_)
                | IntakeAction::SetApPassword(_)
                | IntakeAction::JoinMainConnection(_)
        )
    }
}

/// Why a form was refused; reported to the client with a 400
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rejection {
    EmptySsid,
    /// Empty or longer than a PIN may be
    InvalidSecret,
    /// `alert` is not an IPv4 address
    InvalidAddress,
    /// Access point password outside 8..=63 characters
    InvalidApPassword,
}

impl Rejection {
    pub fn message(self) -> &'static str {
        match self {
            Rejection::EmptySsid => "ssid must not be empty",
            Rejection::InvalidSecret => "pass must be 1 to 14 characters",
            Rejection::InvalidAddress => "alert must be an IPv4 address",
            Rejection::InvalidApPassword => "pass must be 8 to 63 characters",
        }
    }
}

/// Live values some responses report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeStatus {
    pub station_connected: bool,
}

/// `/api/health` body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Health {
    pub esp32: &'static str,
}

impl Health {
    pub const OK: Self = Self { esp32: "ok" };
}

/// `/api/wifistatus` body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WifiStatus {
    pub connected: bool,
}

impl From<NodeStatus> for WifiStatus {
    fn from(status: NodeStatus) -> Self {
        Self {
            connected: status.station_connected,
        }
    }
}

/// `/save-wifi`, posted by [`PROVISIONING_PAGE`]
#[derive(Debug, Deserialize)]
pub struct WifiForm {
    pub ssid: Ssid,
    #[serde(rename = "wifiPassword", default)]
    pub password: Password,
}

/// `/api/onetimepass`
#[derive(Debug, Deserialize)]
pub struct OtpForm {
    pub otp: String<MAX_SECRET_LEN>,
}

/// Every endpoint whose single field is `pass`
#[derive(Debug, Deserialize)]
pub struct PassForm {
    pub pass: String<MAX_PASSWORD_LEN>,
}

/// `/api/module`
#[derive(Debug, Deserialize)]
pub struct ModuleForm {
    pub alert: String<MAX_ADDRESS_LEN>,
}

/// `/api/newssid`
#[derive(Debug, Deserialize)]
pub struct SsidForm {
    #[serde(rename = "SSID")]
    pub ssid: Ssid,
}

pub const WIFI_SAVED: &str = "Saved. Joining network...";
pub const ACCEPTED: &str = "OK";

pub const PROVISIONING_PAGE: &str = "<!DOCTYPE html>\
<html><head><meta name=\"viewport\" content=\"width=device-width\"><title>Watchpost setup</title></head>\
<body><h2>WiFi setup</h2>\
<form method=\"POST\" action=\"/save-wifi\">\
<label>SSID <input name=\"ssid\" maxlength=\"32\"></label><br>\
<label>Password <input name=\"wifiPassword\" type=\"password\" maxlength=\"64\"></label><br>\
<button type=\"submit\">Save</button>\
</form></body></html>";

fn non_empty_ssid(ssid: Ssid) -> Result<Ssid, Rejection> {
    if ssid.is_empty() {
        return Err(Rejection::EmptySsid);
    }
    Ok(ssid)
}

fn secret(text: &str) -> Result<Secret, Rejection> {
    secret_from(text).map_err(|_| Rejection::InvalidSecret)
}

/// The password may be empty for an open network
pub fn save_wifi(form: WifiForm) -> Result<IntakeAction, Rejection> {
    Ok(IntakeAction::SaveWifi {
        ssid: non_empty_ssid(form.ssid)?,
        password: form.password,
    })
}

pub fn one_time_pass(form: OtpForm) -> Result<IntakeAction, Rejection> {
    secret(&form.otp).map(IntakeAction::IssueOtp)
}

pub fn permanent_pass(form: PassForm) -> Result<IntakeAction, Rejection> {
    secret(&form.pass).map(IntakeAction::SetPermanentPin)
}

pub fn main_connection(form: PassForm) -> Result<IntakeAction, Rejection> {
    Ok(IntakeAction::JoinMainConnection(form.pass))
}

pub fn register_module(form: ModuleForm) -> Result<IntakeAction, Rejection> {
    Endpoint::parse(&form.alert)
        .map(IntakeAction::RegisterModule)
        .ok_or(Rejection::InvalidAddress)
}

pub fn new_ssid(form: SsidForm) -> Result<IntakeAction, Rejection> {
    non_empty_ssid(form.ssid).map(IntakeAction::StageSsid)
}

pub fn new_pass(form: PassForm) -> Result<IntakeAction, Rejection> {
    Ok(IntakeAction::JoinStaged(form.pass))
}

pub fn ap_password(form: PassForm) -> Result<IntakeAction, Rejection> {
    ap_password_from(&form.pass)
        .map(IntakeAction::SetApPassword)
        .map_err(|_| Rejection::InvalidApPassword)
}

/// SSID waiting for its password
///
/// `/api/newssid` and `/api/newpass` arrive as two requests; the second
/// completes the pair.
#[derive(Debug, Clone, Default)]
pub struct StagedStation {
    ssid: Option<Ssid>,
}

impl StagedStation {
    pub const fn new() -> Self {
        Self { ssid: None }
    }

    /// Replace any SSID staged earlier
    pub fn stage(&mut self, ssid: Ssid) {
        self.ssid = Some(ssid);
    }

    /// Pair `password` with the staged SSID, clearing the stage
    pub fn complete(&mut self, password: Password) -> Option<(Ssid, Password)> {
        self.ssid.take().map(|ssid| (ssid, password))
    }
}
