//! HTTP intake task
//!
//! Carries out what the provisioning routes accepted: persisting
//! credentials, handing secrets to the page controller and the modules,
//! and pointing the radio at new networks.

use defmt::*;
use embassy_time::Timer;

use watchpost_core::credentials::{CredentialStore, Password, Ssid};
use watchpost_core::provision::{IntakeAction, StagedStation};
use watchpost_hal_esp32::flash::EspFlashStorage;
use watchpost_hal_esp32::http::RESPONSE_GRACE_MS;

use crate::channels::{
    SecretUpdate, AP_PASSWORD, FORWARD, INTAKE, MODULES, SECRETS, STATION_CREDENTIALS,
};

pub type Store = CredentialStore<EspFlashStorage<'static>>;

/// Hand a secret to the page controller and queue it for the modules
async fn distribute(update: SecretUpdate) {
    SECRETS.send(update.clone()).await;
    if FORWARD.try_send(update).is_err() {
        warn!("Forward queue full, modules keep their old secret");
    }
}

async fn join_home_network(store: &mut Store, ssid: Ssid, password: Password) {
    match store.save_wifi(&ssid, &password).await {
        Ok(()) => info!("Home network credentials saved"),
        Err(e) => warn!("Home network credentials not persisted: {}", e),
    }
    STATION_CREDENTIALS.signal((ssid, password));
}

async fn apply(action: IntakeAction, store: &mut Store, staged: &mut StagedStation) {
    match action {
        IntakeAction::SaveWifi { ssid, password } => {
            join_home_network(store, ssid, password).await;
        }
        IntakeAction::StageSsid(ssid) => {
            info!("Staged home network {}", ssid.as_str());
            staged.stage(ssid);
        }
        IntakeAction::JoinStaged(password) => match staged.complete(password) {
            Some((ssid, password)) => join_home_network(store, ssid, password).await,
            None => warn!("Station password arrived without an SSID, ignored"),
        },
        IntakeAction::SetApPassword(password) => {
            match store.save_ap_password(&password).await {
                Ok(()) => info!("Access point password saved"),
                Err(e) => warn!("Access point password not persisted: {}", e),
            }
            AP_PASSWORD.signal(password);
        }
        IntakeAction::IssueOtp(otp) => distribute(SecretUpdate::OneTimePass(otp)).await,
        IntakeAction::SetPermanentPin(pin) => {
            if let Err(e) = store.save_pin(&pin).await {
                warn!("Disarm PIN not persisted: {}", e);
            }
            distribute(SecretUpdate::PermanentPin(pin)).await;
        }
        IntakeAction::RegisterModule(endpoint) => match MODULES.lock().await.add(endpoint) {
            Ok(true) => info!("Module {} registered", endpoint),
            Ok(false) => debug!("Module {} already registered", endpoint),
            Err(_) => warn!("Module list full, {} rejected", endpoint),
        },
        IntakeAction::JoinMainConnection(_) => {
            debug!("Ignoring main connection password on the display");
        }
    }
}

#[embassy_executor::task]
pub async fn intake_task(mut store: Store) {
    info!("Intake task started");

    let mut staged = StagedStation::new();

    loop {
        let action = INTAKE.receive().await;
        if action.disrupts_link() {
            Timer::after_millis(RESPONSE_GRACE_MS).await;
        }
        apply(action, &mut store, &mut staged).await;
    }
}
