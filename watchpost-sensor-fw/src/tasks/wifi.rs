//! Station join supervision
//!
//! Keeps the radio associated with the display access point. A password
//! pushed through `/api/mainconnection` replaces the client configuration
//! and forces a fresh join.

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_net::Stack;
use embassy_time::{Duration, Instant, Timer, WithTimeout};
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController};

use watchpost_core::credentials::{Password, Ssid};
use watchpost_core::provision::{StationAction, StationSupervisor, STA_RECONNECT_COOLDOWN_MS};

use crate::channels::{LINK_UP, REJOIN, STATION_CONNECTED};

/// Link status check interval
const POLL_INTERVAL_MS: u64 = 500;

/// Upper bound on association plus link bring-up
const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

pub fn client_mode(ssid: &Ssid, password: &Password) -> ModeConfig {
    ModeConfig::Client(
        ClientConfig::default()
            .with_ssid(ssid.as_str().into())
            .with_password(password.as_str().into()),
    )
}

async fn join(controller: &mut WifiController<'static>, stack: Stack<'static>) -> bool {
    if !controller.is_started().unwrap_or(false) {
        if let Err(e) = controller.start_async().await {
            warn!("WiFi start failed: {:?}", Debug2Format(&e));
            return false;
        }
    }
    if let Err(e) = controller.connect_async().await {
        warn!("WiFi connect failed: {:?}", Debug2Format(&e));
        return false;
    }
    if stack.wait_link_up().with_timeout(JOIN_TIMEOUT).await.is_err() {
        warn!("Link did not come up after association");
        let _ = controller.disconnect_async().await;
        return false;
    }
    true
}

#[embassy_executor::task]
pub async fn wifi_task(
    mut controller: WifiController<'static>,
    stack: Stack<'static>,
    ssid: Ssid,
    mut password: Password,
) {
    info!("WiFi task started");

    let mut supervisor = StationSupervisor::new();
    let mut was_connected = false;

    loop {
        let connected = matches!(controller.is_connected(), Ok(true));
        STATION_CONNECTED.store(connected, Ordering::Relaxed);
        if connected != was_connected {
            if connected {
                info!("Joined {}", ssid.as_str());
                LINK_UP.signal(());
            } else {
                warn!("Lost connection to {}", ssid.as_str());
            }
            was_connected = connected;
        }

        if supervisor.poll(connected, Instant::now().as_millis()) == StationAction::Connect {
            debug!("Joining {}", ssid.as_str());
            let ok = join(&mut controller, stack).await;
            supervisor.attempt_finished(ok, Instant::now().as_millis());
            if !ok {
                warn!("Join failed, retrying in {} ms", STA_RECONNECT_COOLDOWN_MS);
            }
            continue;
        }

        match select(REJOIN.wait(), Timer::after_millis(POLL_INTERVAL_MS)).await {
            Either::First(new_password) => {
                info!("Station password changed, rejoining");
                password = new_password;
                let _ = controller.disconnect_async().await;
                if let Err(e) = controller.set_config(&client_mode(&ssid, &password)) {
                    error!("WiFi reconfiguration failed: {:?}", Debug2Format(&e));
                }
                supervisor.credentials_changed();
            }
            Either::Second(()) => {}
        }
    }
}
