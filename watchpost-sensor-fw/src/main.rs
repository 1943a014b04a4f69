//! Watchpost - Sensor Node Firmware
//!
//! Ultrasonic motion sensor for the ESP32. Joins the display node's access
//! point with a static address, takes arm commands over UDP and broadcasts
//! intrusion alerts while armed.

#![no_std]
#![no_main]

mod channels;
mod config;
mod tasks;

use defmt::*;
use embassy_executor::Spawner;
use embassy_net::{Ipv4Cidr, StackResources, StaticConfigV4};
use embassy_sync::mutex::Mutex;
use embassy_time::Timer;
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Input, InputConfig, Io, Level, Output, OutputConfig, Pull};
use esp_hal::timer::timg::TimerGroup;
use static_cell::StaticCell;
use esp_println as _;

use watchpost_core::credentials::{CredentialStore, Credentials};
use watchpost_core::sensor::SensorNode;
use watchpost_drivers::keypad::MatrixKeypad;
use watchpost_drivers::ranging::Hcsr04;
use watchpost_hal_esp32::echo::EspEcho;
use watchpost_hal_esp32::flash::EspFlashStorage;

use crate::channels::SharedNode;

// Static cells for values tasks borrow for the life of the program
static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
static NET_RESOURCES: StaticCell<StackResources<5>> = StaticCell::new();
static NODE: StaticCell<SharedNode> = StaticCell::new();

/// embassy-net seed for TCP sequence numbers and ephemeral ports
const NET_SEED: u64 = 0x7a1c_55e0_93b2_4d18;

esp_bootloader_esp_idf::esp_app_desc!();

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    error!("{}", Display2Format(info));
    loop {}
}

/// Main entry point
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    info!(
        "Watchpost {} ({}) starting...",
        config::IDENTITY.device_name,
        config::IDENTITY.role.as_str()
    );

    let p = esp_hal::init(esp_hal::Config::default().with_cpu_clock(CpuClock::max()));

    // esp-radio requires an allocator
    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 65536);

    let timg0 = TimerGroup::new(p.TIMG0);
    esp_rtos::start(timg0.timer0);
    info!("Peripherals initialized");

    // Credentials from flash, seeded from node.toml on first boot
    let defaults = match Credentials::new(config::AP_SSID, config::AP_PASSWORD, config::DEFAULT_PIN) {
        Ok(defaults) => defaults,
        Err(e) => defmt::panic!("node.toml defaults rejected: {}", e),
    };
    let mut store = CredentialStore::new(EspFlashStorage::new(p.FLASH));
    let (credentials, report) = store.load(&defaults).await;
    if report.reformatted {
        warn!("Credential storage was corrupted and has been reformatted");
    }
    if let Some(e) = report.fallback {
        warn!("Credential storage unavailable ({}), using defaults", e);
    }
    if report.seeded > 0 {
        info!("Seeded {} credential fields", report.seeded);
    }

    let node = NODE.init(Mutex::new(SensorNode::new(
        config::DISPLAY,
        config::FALLBACKS,
        credentials.arm_pin.clone(),
    )));

    // HC-SR04: TRIG=GPIO17, ECHO=GPIO16
    let trigger = Output::new(p.GPIO17, Level::Low, OutputConfig::default());
    let echo_pin = Input::new(p.GPIO16, InputConfig::default().with_pull(Pull::Up));
    let mut io = Io::new(p.IO_MUX);
    let echo = EspEcho::install(&mut io, echo_pin);
    let ranger = match Hcsr04::new(trigger) {
        Ok(ranger) => ranger,
        Err(e) => defmt::panic!("Trigger pin unusable: {:?}", Debug2Format(&e)),
    };
    info!("Ultrasonic sensor initialized");

    // Keypad: rows GPIO18/19/21/22 driven, columns GPIO23/25/26/27 pulled down
    let rows = [
        Output::new(p.GPIO18, Level::Low, OutputConfig::default()),
        Output::new(p.GPIO19, Level::Low, OutputConfig::default()),
        Output::new(p.GPIO21, Level::Low, OutputConfig::default()),
        Output::new(p.GPIO22, Level::Low, OutputConfig::default()),
    ];
    let column = InputConfig::default().with_pull(Pull::Down);
    let cols = [
        Input::new(p.GPIO23, column),
        Input::new(p.GPIO25, column),
        Input::new(p.GPIO26, column),
        Input::new(p.GPIO27, column),
    ];
    let keypad = match MatrixKeypad::new(rows, cols) {
        Ok(keypad) => keypad,
        Err(never) => match never {},
    };
    info!("Keypad initialized");

    // WiFi station on the display access point
    let radio = match esp_radio::init() {
        Ok(radio) => RADIO.init(radio),
        Err(e) => defmt::panic!("esp-radio init failed: {:?}", Debug2Format(&e)),
    };
    let (mut controller, interfaces) =
        match esp_radio::wifi::new(radio, p.WIFI, esp_radio::wifi::Config::default()) {
            Ok(parts) => parts,
            Err(e) => defmt::panic!("WiFi init failed: {:?}", Debug2Format(&e)),
        };
    if let Err(e) = controller.set_config(&tasks::client_mode(&credentials.ssid, &credentials.password)) {
        error!("WiFi client config rejected: {:?}", Debug2Format(&e));
    }

    let net_config = embassy_net::Config::ipv4_static(StaticConfigV4 {
        address: Ipv4Cidr::new(config::ADDRESS, config::PREFIX_LEN),
        gateway: Some(config::GATEWAY),
        dns_servers: heapless::Vec::new(),
    });
    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        net_config,
        NET_RESOURCES.init(StackResources::new()),
        NET_SEED,
    );
    info!("Network stack initialized at {}", Display2Format(&config::ADDRESS));

    // Spawn tasks
    spawner.spawn(unwrap!(tasks::net_task(runner)));
    spawner.spawn(unwrap!(tasks::wifi_task(
        controller,
        stack,
        credentials.ssid,
        credentials.password
    )));
    spawner.spawn(unwrap!(tasks::radio_task(stack, node)));
    spawner.spawn(unwrap!(tasks::ranging_task(ranger, echo, node)));
    spawner.spawn(unwrap!(tasks::keypad_task(keypad, node)));
    spawner.spawn(unwrap!(tasks::http_task(stack)));
    spawner.spawn(unwrap!(tasks::intake_task(node, store)));
    spawner.spawn(unwrap!(tasks::register_task(stack)));

    info!("All tasks spawned, sensor running");

    loop {
        Timer::after_secs(3600).await;
    }
}
