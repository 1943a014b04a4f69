//! HTTP API task
//!
//! Always listening on the sensor. Accepted forms are queued for the
//! intake task.

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_net::Stack;

use watchpost_core::provision::NodeStatus;
use watchpost_hal_esp32::http::{sensor_router, serve, Intake};

use crate::channels::{INTAKE, STATION_CONNECTED};

fn node_status() -> NodeStatus {
    NodeStatus {
        station_connected: STATION_CONNECTED.load(Ordering::Relaxed),
    }
}

#[embassy_executor::task]
pub async fn http_task(stack: Stack<'static>) {
    info!("HTTP task started");

    let app = sensor_router(Intake::new(&INTAKE, node_status));
    serve(stack, &app).await
}
