//! Provisioning: access point bring-up, station supervision and the
//! HTTP intake both node roles expose

mod coordinator;
pub mod dhcp;
mod form;
pub mod routes;

pub use coordinator::{
    start_access_point, AccessPoint, ApOutcome, StationAction, StationState, StationSupervisor,
    AP_RETRY_DELAY_MS, AP_START_ATTEMPTS, STA_RECONNECT_COOLDOWN_MS,
};
pub use form::{form_body, FormTooLong};
pub use routes::{
    Health, IntakeAction, NodeStatus, Rejection, StagedStation, WifiStatus, PROVISIONING_PAGE,
};
