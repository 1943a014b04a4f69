//! Provisioning HTTP task
//!
//! Listens on the access point only while the Setup page is showing.
//! Leaving the page drops the server along with any half-finished exchange.

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_futures::select::select;
use embassy_net::Stack;

use watchpost_core::provision::NodeStatus;
use watchpost_hal_esp32::http::{display_router, serve, Intake};

use crate::channels::{INTAKE, SETUP_ACTIVE, SETUP_CHANGED, STATION_CONNECTED};

fn node_status() -> NodeStatus {
    NodeStatus {
        station_connected: STATION_CONNECTED.load(Ordering::Relaxed),
    }
}

async fn until_setup_active() {
    while !SETUP_ACTIVE.load(Ordering::Relaxed) {
        SETUP_CHANGED.wait().await;
    }
}

async fn until_setup_closed() {
    while SETUP_CHANGED.wait().await {}
}

#[embassy_executor::task]
pub async fn http_task(stack: Stack<'static>) {
    info!("HTTP task started");

    let app = display_router(Intake::new(&INTAKE, node_status));

    loop {
        until_setup_active().await;
        debug!("Setup open, HTTP listener started");
        select(serve(stack, &app), until_setup_closed()).await;
        debug!("Setup closed, HTTP listener stopped");
    }
}
