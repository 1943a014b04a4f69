//! Network stack runners

use embassy_net::Runner;
use esp_radio::wifi::WifiDevice;

/// Drives one embassy-net stack; spawned once for the AP and once for the station
#[embassy_executor::task(pool_size = 2)]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}
