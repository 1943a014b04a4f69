//! Secret forwarding task
//!
//! Pushes one-time passes and PIN changes to every module registered
//! through `/api/module`, one POST per module.

use defmt::*;
use embassy_net::Stack;

use watchpost_core::sensor::RecipientSet;
use watchpost_hal_esp32::http::post_form;

use crate::channels::{SecretUpdate, FORWARD, MODULES};

#[embassy_executor::task]
pub async fn forward_task(stack: Stack<'static>) {
    info!("Forward task started");

    loop {
        let update = FORWARD.receive().await;
        let (path, field, value) = match &update {
            SecretUpdate::OneTimePass(otp) => ("/api/onetimepass", "otp", otp),
            SecretUpdate::PermanentPin(pin) => ("/api/permanentpass", "pass", pin),
        };

        // Copy out so registration isn't blocked while we talk to modules
        let modules: RecipientSet = MODULES.lock().await.clone();
        for module in modules.iter() {
            match post_form(stack, module.ip, path, field, value).await {
                Ok(()) => info!("Forwarded {} to {}", path, module),
                Err(e) => warn!("Forwarding {} to {} failed: {}", path, module, e),
            }
        }
    }
}
