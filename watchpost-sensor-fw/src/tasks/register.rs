//! Self-registration with the display node
//!
//! After every fresh join the sensor posts its own address to the display's
//! `/api/module` so one-time passes and PIN changes reach it. The display
//! only listens while its Setup page is open, so failures are retried until
//! one succeeds or the link drops.

use core::fmt::Write;
use core::sync::atomic::Ordering;

use defmt::*;
use embassy_net::Stack;
use embassy_time::Timer;
use heapless::String;

use watchpost_hal_esp32::http::post_form;

use crate::channels::{LINK_UP, STATION_CONNECTED};
use crate::config;

const RETRY_MS: u64 = 5000;

#[embassy_executor::task]
pub async fn register_task(stack: Stack<'static>) {
    info!("Register task started");

    let mut own_address = String::<16>::new();
    // "255.255.255.255" fits
    let _ = write!(own_address, "{}", config::ADDRESS);

    loop {
        LINK_UP.wait().await;

        while STATION_CONNECTED.load(Ordering::Relaxed) {
            match post_form(stack, config::DISPLAY.ip, "/api/module", "alert", &own_address).await {
                Ok(()) => {
                    info!("Registered with display at {}", config::DISPLAY);
                    break;
                }
                Err(e) => debug!("Registration not accepted yet: {}", e),
            }
            Timer::after_millis(RETRY_MS).await;
        }
    }
}
