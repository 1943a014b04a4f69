//! HTTP intake task
//!
//! Applies what the HTTP API accepted once the client has its response.

use defmt::*;
use embassy_time::Timer;

use watchpost_core::credentials::CredentialStore;
use watchpost_core::provision::IntakeAction;
use watchpost_hal_esp32::flash::EspFlashStorage;
use watchpost_hal_esp32::http::RESPONSE_GRACE_MS;

use crate::channels::{SharedNode, INTAKE, REJOIN};

pub type Store = CredentialStore<EspFlashStorage<'static>>;

async fn apply(action: IntakeAction, node: &SharedNode, store: &mut Store) {
    match action {
        IntakeAction::IssueOtp(otp) => match node.lock().await.issue_otp(&otp) {
            Ok(()) => info!("One-time pass installed"),
            Err(e) => warn!("One-time pass rejected: {}", e),
        },
        IntakeAction::SetPermanentPin(pin) => {
            if let Err(e) = node.lock().await.set_pin(&pin) {
                warn!("Keypad PIN rejected: {}", e);
                return;
            }
            match store.save_pin(&pin).await {
                Ok(()) => info!("Keypad PIN updated"),
                Err(e) => warn!("Keypad PIN active but not persisted: {}", e),
            }
        }
        IntakeAction::JoinMainConnection(password) => {
            if let Err(e) = store.save_password(&password).await {
                warn!("Station password not persisted: {}", e);
            }
            REJOIN.signal(password);
        }
        IntakeAction::RegisterModule(endpoint) => {
            let mut node = node.lock().await;
            match node.register_recipient(endpoint) {
                Ok(true) => info!(
                    "Alert subscriber {} registered ({} total)",
                    endpoint,
                    node.recipients().len()
                ),
                Ok(false) => debug!("Alert subscriber {} already known", endpoint),
                Err(_) => warn!("Subscriber list full, {} rejected", endpoint),
            }
        }
        IntakeAction::SaveWifi { .. }
        | IntakeAction::StageSsid(_)
        | IntakeAction::JoinStaged(_)
        | IntakeAction::SetApPassword(_) => {
            debug!("Ignoring display provisioning on a sensor node");
        }
    }
}

#[embassy_executor::task]
pub async fn intake_task(node: &'static SharedNode, mut store: Store) {
    info!("Intake task started");

    loop {
        let action = INTAKE.receive().await;
        if action.disrupts_link() {
            Timer::after_millis(RESPONSE_GRACE_MS).await;
        }
        apply(action, node, &mut store).await;
    }
}
