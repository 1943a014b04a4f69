//! Ultrasonic sampling task
//!
//! Pings the HC-SR04 every `SAMPLE_PERIOD_MS` and feeds the distance into
//! the sensor node. An armed motion edge wakes the radio task.

use defmt::*;
use embassy_time::{Delay, Duration, Instant, Ticker};
use esp_hal::gpio::Output;

use watchpost_core::sensor::{DistanceSample, SampleOutcome, SAMPLE_PERIOD_MS};
use watchpost_drivers::ranging::{Hcsr04, RangingError};
use watchpost_hal_esp32::echo::EspEcho;

use crate::channels::{SharedNode, INTRUSION};

pub type Ranger = Hcsr04<Output<'static>>;

#[embassy_executor::task]
pub async fn ranging_task(mut ranger: Ranger, mut echo: EspEcho, node: &'static SharedNode) {
    info!("Ranging task started");

    let mut ticker = Ticker::every(Duration::from_millis(SAMPLE_PERIOD_MS));
    let mut delay = Delay;

    loop {
        ticker.next().await;

        let echo_us = match ranger.ping(&mut echo, &mut delay).await {
            Ok(us) => us,
            Err(RangingError::Timeout) => {
                trace!("No echo");
                continue;
            }
            Err(RangingError::Pin(never)) => match never {},
        };

        let now_ms = Instant::now().as_millis();
        let sample = DistanceSample::from_echo(now_ms, echo_us);
        trace!("Distance {} cm", sample.distance_cm);

        match node.lock().await.on_sample(sample, now_ms) {
            SampleOutcome::Quiet => {}
            SampleOutcome::Intrusion(edge) => {
                warn!("Motion detected ({} cm closer)", edge.delta_cm());
                INTRUSION.signal(());
            }
            SampleOutcome::Suppressed(edge) => {
                info!(
                    "Motion inside keypad window ignored ({} cm closer)",
                    edge.delta_cm()
                );
            }
        }
    }
}
