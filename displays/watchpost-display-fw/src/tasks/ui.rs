//! Touch UI task
//!
//! Owns the LCD, the touch panel and the page controller. Touches, commands
//! from the radio task and secrets from the HTTP intake are fed to the
//! controller; its effects are carried out here in order.

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_futures::select::{select3, Either3};
use embassy_time::{Duration, Ticker, Timer};
use esp_hal::gpio::{Input, Output};
use esp_hal::spi::master::Spi;
use esp_hal::Blocking;

use watchpost_core::display::{DisplayController, Effect, Effects, Page};
use watchpost_display::{render, CalibratedTouch, SetupInfo, View};

use crate::channels::{
    Outgoing, SecretUpdate, INBOX, OUTBOX, SECRETS, SETUP_ACTIVE, SETUP_CHANGED, STATION_CONNECTED,
};
use crate::config;
use crate::ili9488::Ili9488;
use crate::xpt2046::Xpt2046;

pub type Screen = Ili9488<Spi<'static, Blocking>, Output<'static>, Output<'static>, Output<'static>>;
pub type Touch = CalibratedTouch<Xpt2046<Spi<'static, Blocking>, Output<'static>, Input<'static>>>;

/// Touch panel poll interval
const TOUCH_POLL_MS: u64 = 20;

struct Ui {
    screen: Screen,
    controller: DisplayController,
    /// Station status the Setup page currently shows
    shown_connected: bool,
}

impl Ui {
    fn draw(&mut self, denied: bool) {
        self.shown_connected = STATION_CONNECTED.load(Ordering::Relaxed);
        let setup = SetupInfo {
            ap_ssid: config::AP_SSID,
            portal: config::AP_ADDRESS,
            station_connected: self.shown_connected,
        };
        if let Err(e) = render(&mut self.screen, &View::of(&self.controller, denied, setup)) {
            warn!("Render failed: {:?}", Debug2Format(&e));
        }
    }

    async fn apply(&mut self, effects: Effects) {
        for effect in effects {
            trace!("Effect {}", effect);
            match effect {
                Effect::SendToSensor(command) => {
                    OUTBOX
                        .send(Outgoing {
                            command,
                            dest: config::SENSOR,
                            throttled: true,
                        })
                        .await;
                }
                Effect::FollowUpToSensor(command) => {
                    OUTBOX
                        .send(Outgoing {
                            command,
                            dest: config::SENSOR,
                            throttled: false,
                        })
                        .await;
                }
                Effect::Relay(command, dest) => {
                    OUTBOX
                        .send(Outgoing {
                            command,
                            dest,
                            throttled: false,
                        })
                        .await;
                }
                Effect::Wait(ms) => Timer::after_millis(ms as u64).await,
                Effect::StartSetupListener => set_setup_active(true),
                Effect::StopSetupListener => set_setup_active(false),
                Effect::ShowDenied(ms) => {
                    self.draw(true);
                    Timer::after_millis(ms as u64).await;
                    self.draw(false);
                }
                Effect::Redraw => self.draw(false),
            }
        }
    }

    fn apply_secret(&mut self, update: SecretUpdate) {
        let result = match &update {
            SecretUpdate::OneTimePass(otp) => self.controller.issue_otp(otp),
            SecretUpdate::PermanentPin(pin) => self.controller.set_pin(pin),
        };
        match (update, result) {
            (_, Err(e)) => warn!("Secret rejected: {}", e),
            (SecretUpdate::OneTimePass(_), Ok(())) => info!("One-time pass installed"),
            (SecretUpdate::PermanentPin(_), Ok(())) => info!("Disarm PIN updated"),
        }
    }

    /// Keep the Setup page's station status current
    fn refresh_status(&mut self) {
        if self.controller.page() == Page::Setup
            && STATION_CONNECTED.load(Ordering::Relaxed) != self.shown_connected
        {
            self.draw(false);
        }
    }
}

fn set_setup_active(active: bool) {
    if SETUP_ACTIVE.swap(active, Ordering::Relaxed) != active {
        debug!("Setup listener {}", if active { "started" } else { "stopped" });
        SETUP_CHANGED.signal(active);
    }
}

#[embassy_executor::task]
pub async fn ui_task(screen: Screen, mut touch: Touch, controller: DisplayController) {
    info!("UI task started");

    let mut ui = Ui {
        screen,
        controller,
        shown_connected: false,
    };
    ui.draw(false);

    let mut ticker = Ticker::every(Duration::from_millis(TOUCH_POLL_MS));

    loop {
        match select3(ticker.next(), INBOX.receive(), SECRETS.receive()).await {
            Either3::First(()) => {
                match touch.poll() {
                    Ok(Some(point)) => {
                        debug!("Touch at {}", point);
                        let effects = ui.controller.on_touch(point);
                        ui.apply(effects).await;
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Touch read failed: {:?}", Debug2Format(&e)),
                }
                ui.refresh_status();
            }
            Either3::Second(command) => {
                let effects = ui.controller.on_command(command);
                ui.apply(effects).await;
            }
            Either3::Third(update) => ui.apply_secret(update),
        }
    }
}
