//! Network stack runner

use embassy_net::Runner;
use esp_radio::wifi::WifiDevice;

/// Drives embassy-net; must run for the stack to make progress
#[embassy_executor::task]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}
