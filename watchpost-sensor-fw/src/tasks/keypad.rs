//! Matrix keypad task

use defmt::*;
use embassy_time::{Duration, Instant, Ticker};
use esp_hal::gpio::{Input, Output};

use watchpost_core::sensor::KeypadOutcome;
use watchpost_drivers::keypad::MatrixKeypad;

use crate::channels::SharedNode;

/// Scan interval; also the effective debounce time
const SCAN_PERIOD_MS: u64 = 20;

pub type Keypad = MatrixKeypad<Output<'static>, Input<'static>>;

#[embassy_executor::task]
pub async fn keypad_task(mut keypad: Keypad, node: &'static SharedNode) {
    info!("Keypad task started");

    let mut ticker = Ticker::every(Duration::from_millis(SCAN_PERIOD_MS));

    loop {
        ticker.next().await;

        let Ok(Some(key)) = keypad.poll() else {
            continue;
        };

        let outcome = node.lock().await.on_key(key, Instant::now().as_millis());
        match outcome {
            KeypadOutcome::Pending { entered } => trace!("Key {} of code entered", entered),
            KeypadOutcome::Approved {
                matched,
                suppressed_until: Some(until_ms),
            } => info!(
                "Keypad code accepted ({}), alerts suppressed until {} ms",
                matched, until_ms
            ),
            KeypadOutcome::Approved { matched, .. } => info!("Keypad code accepted ({})", matched),
            KeypadOutcome::Denied => warn!("Keypad code denied"),
        }
    }
}
