//! Access point bring-up and station supervision
//!
//! The radio runs AP+STA: the provisioning access point for sensors and
//! operators, and a station link to the home network. If the AP refuses to
//! start the node degrades to station-only.

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_futures::select::{select3, Either3};
use embassy_net::Stack;
use embassy_time::{Delay, Duration, Instant, Timer, WithTimeout};
use esp_radio::wifi::{AccessPointConfig, AuthMethod, ClientConfig, ModeConfig, WifiController};

use watchpost_core::credentials::{Password, Ssid, PLACEHOLDER};
use watchpost_core::provision::{
    start_access_point, AccessPoint, ApOutcome, StationAction, StationSupervisor,
    STA_RECONNECT_COOLDOWN_MS,
};

use crate::channels::{AP_PASSWORD, STATION_CONNECTED, STATION_CREDENTIALS};
use crate::config;

/// Link status check interval
const POLL_INTERVAL_MS: u64 = 500;

/// Upper bound on association plus DHCP
const JOIN_TIMEOUT: Duration = Duration::from_secs(15);

fn client_config(ssid: &Ssid, password: &Password) -> ClientConfig {
    ClientConfig::default()
        .with_ssid(ssid.as_str().into())
        .with_password(password.as_str().into())
}

fn access_point_config(ap_password: &Password) -> AccessPointConfig {
    AccessPointConfig::default()
        .with_ssid(config::AP_SSID.into())
        .with_password(ap_password.as_str().into())
        .with_auth_method(AuthMethod::Wpa2Personal)
}

/// Radio configuration for the current credentials
fn mode(ap_password: Option<&Password>, ssid: &Ssid, password: &Password) -> ModeConfig {
    match ap_password {
        Some(ap_password) => ModeConfig::ApSta(
            client_config(ssid, password),
            access_point_config(ap_password),
        ),
        None => ModeConfig::Client(client_config(ssid, password)),
    }
}

struct ApRadio<'a> {
    controller: &'a mut WifiController<'static>,
    ap_password: &'a Password,
    ssid: &'a Ssid,
    password: &'a Password,
}

impl AccessPoint for ApRadio<'_> {
    async fn try_start(&mut self) -> bool {
        let config = mode(Some(self.ap_password), self.ssid, self.password);
        if let Err(e) = self.controller.set_config(&config) {
            warn!("Access point config rejected: {:?}", Debug2Format(&e));
            return false;
        }
        if let Err(e) = self.controller.start_async().await {
            warn!("Access point start failed: {:?}", Debug2Format(&e));
            return false;
        }
        true
    }
}

async fn join(controller: &mut WifiController<'static>, stack: Stack<'static>) -> bool {
    if let Err(e) = controller.connect_async().await {
        warn!("Station connect failed: {:?}", Debug2Format(&e));
        return false;
    }
    if stack.wait_config_up().with_timeout(JOIN_TIMEOUT).await.is_err() {
        warn!("No DHCP lease from the home network");
        let _ = controller.disconnect_async().await;
        return false;
    }
    true
}

#[embassy_executor::task]
pub async fn wifi_task(
    mut controller: WifiController<'static>,
    sta_stack: Stack<'static>,
    mut ssid: Ssid,
    mut password: Password,
    mut ap_password: Password,
) {
    info!("WiFi task started");

    let outcome = start_access_point(
        &mut ApRadio {
            controller: &mut controller,
            ap_password: &ap_password,
            ssid: &ssid,
            password: &password,
        },
        &mut Delay,
    )
    .await;

    let ap_up = match outcome {
        ApOutcome::Started { attempts } => {
            info!("Access point {} up after {} attempt(s)", config::AP_SSID, attempts);
            true
        }
        ApOutcome::Degraded => {
            warn!("Access point failed to start, continuing station-only");
            if let Err(e) = controller.set_config(&mode(None, &ssid, &password)) {
                error!("Station config rejected: {:?}", Debug2Format(&e));
            }
            if let Err(e) = controller.start_async().await {
                error!("Radio start failed: {:?}", Debug2Format(&e));
            }
            false
        }
    };

    let mut supervisor = StationSupervisor::new();
    let mut was_connected = false;

    loop {
        let connected = matches!(controller.is_connected(), Ok(true));
        STATION_CONNECTED.store(connected, Ordering::Relaxed);
        if connected != was_connected {
            if connected {
                info!("Joined home network {}", ssid.as_str());
            } else {
                warn!("Lost home network {}", ssid.as_str());
            }
            was_connected = connected;
        }

        // Nothing to join until the portal has stored real credentials
        let provisioned = ssid.as_str() != PLACEHOLDER;
        if provisioned && supervisor.poll(connected, Instant::now().as_millis()) == StationAction::Connect {
            debug!("Joining {}", ssid.as_str());
            let ok = join(&mut controller, sta_stack).await;
            supervisor.attempt_finished(ok, Instant::now().as_millis());
            if !ok {
                warn!("Join failed, retrying in {} ms", STA_RECONNECT_COOLDOWN_MS);
            }
            continue;
        }

        let ap = ap_up.then_some(&ap_password);
        match select3(
            STATION_CREDENTIALS.wait(),
            AP_PASSWORD.wait(),
            Timer::after_millis(POLL_INTERVAL_MS),
        )
        .await
        {
            Either3::First((new_ssid, new_password)) => {
                info!("Home network set to {}, joining", new_ssid.as_str());
                ssid = new_ssid;
                password = new_password;
                let _ = controller.disconnect_async().await;
                if let Err(e) = controller.set_config(&mode(ap, &ssid, &password)) {
                    error!("WiFi reconfiguration failed: {:?}", Debug2Format(&e));
                }
                supervisor.credentials_changed();
            }
            Either3::Second(new_ap_password) => {
                ap_password = new_ap_password;
                if !ap_up {
                    info!("Access point password stored for the next boot");
                    continue;
                }
                info!("Restarting access point {} with its new password", config::AP_SSID);
                if let Err(e) = controller.stop_async().await {
                    warn!("Radio stop failed: {:?}", Debug2Format(&e));
                }
                if let Err(e) = controller.set_config(&mode(Some(&ap_password), &ssid, &password)) {
                    error!("Access point reconfiguration failed: {:?}", Debug2Format(&e));
                }
                if let Err(e) = controller.start_async().await {
                    error!("Radio restart failed: {:?}", Debug2Format(&e));
                }
                supervisor.credentials_changed();
            }
            Either3::Third(()) => {}
        }
    }
}
