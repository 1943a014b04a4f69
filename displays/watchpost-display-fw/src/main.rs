//! Watchpost - Display Node Firmware
//!
//! Touchscreen arm/disarm authority for the ESP32-S3. Runs the provisioning
//! access point the sensors join, a station link to the home network for
//! the upstream relay, and the 480x320 touch UI.

#![no_std]
#![no_main]

mod channels;
mod config;
mod ili9488;
mod tasks;
mod xpt2046;

use defmt::*;
use embassy_executor::Spawner;
use embassy_net::{Ipv4Cidr, StackResources, StaticConfigV4};
use embassy_time::Timer;
use esp_hal::clock::CpuClock;
use esp_hal::delay::Delay;
use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::spi::Mode;
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use static_cell::StaticCell;
use esp_println as _;

use watchpost_core::auth::Authenticator;
use watchpost_core::credentials::{CredentialStore, Credentials, Password};
use watchpost_core::display::DisplayController;
use watchpost_display::{CalibratedTouch, Calibration, CalibrationSource};
use watchpost_hal_esp32::flash::EspFlashStorage;

use crate::ili9488::Ili9488;
use crate::xpt2046::Xpt2046;

// Static cells for values tasks borrow for the life of the program
static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
static AP_RESOURCES: StaticCell<StackResources<6>> = StaticCell::new();
static STA_RESOURCES: StaticCell<StackResources<4>> = StaticCell::new();

/// embassy-net seeds for TCP sequence numbers and ephemeral ports
const AP_SEED: u64 = 0x51d3_0c7e_a842_9b16;
const STA_SEED: u64 = 0xe20b_6f94_17c5_3a8d;

/// LCD SPI clock
const LCD_SPI_MHZ: u32 = 40;

/// Touch controller SPI clock (XPT2046 tops out near 2.5 MHz)
const TOUCH_SPI_KHZ: u32 = 2000;

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
    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 72 * 1024);

    let timg0 = TimerGroup::new(p.TIMG0);
    esp_rtos::start(timg0.timer0);
    info!("Peripherals initialized");

    // Credentials from flash, seeded from node.toml on first boot
    let defaults = match Credentials::new(
        config::STATION_SSID,
        config::STATION_PASSWORD,
        config::DEFAULT_PIN,
    ) {
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
    if credentials.is_placeholder() {
        info!("No home network configured, use the Setup page");
    }

    let ap_password = match store.load_ap_password(config::AP_PASSWORD).await {
        Ok(password) => password,
        Err(e) => {
            warn!("Access point password unreadable ({}), using node.toml", e);
            Password::try_from(config::AP_PASSWORD).unwrap_or_default()
        }
    };

    let (calibration, source) = Calibration::load_or_seed(store.store_mut()).await;
    match source {
        CalibrationSource::Stored => {}
        CalibrationSource::Seeded => info!("Stored default touch calibration"),
        CalibrationSource::Fallback(e) => warn!("Using default touch calibration ({})", e),
    }

    // LCD on SPI2: SCK=GPIO12, MOSI=GPIO11, MISO=GPIO13, CS=GPIO10, DC=GPIO9, RST=GPIO8
    let lcd_config = SpiConfig::default()
        .with_frequency(Rate::from_mhz(LCD_SPI_MHZ))
        .with_mode(Mode::_0);
    let lcd_spi = match Spi::new(p.SPI2, lcd_config) {
        Ok(spi) => spi
            .with_sck(p.GPIO12)
            .with_mosi(p.GPIO11)
            .with_miso(p.GPIO13),
        Err(e) => defmt::panic!("LCD SPI config rejected: {:?}", Debug2Format(&e)),
    };
    let mut screen = Ili9488::new(
        lcd_spi,
        Output::new(p.GPIO10, Level::High, OutputConfig::default()),
        Output::new(p.GPIO9, Level::Low, OutputConfig::default()),
        Output::new(p.GPIO8, Level::High, OutputConfig::default()),
    );
    match screen.init(&mut Delay::new()) {
        Ok(()) => info!("LCD initialized"),
        Err(e) => error!("LCD init failed: {:?}", Debug2Format(&e)),
    }

    // Touch on SPI3: SCK=GPIO4, MOSI=GPIO5, MISO=GPIO6, CS=GPIO7, IRQ=GPIO15
    let touch_config = SpiConfig::default()
        .with_frequency(Rate::from_khz(TOUCH_SPI_KHZ))
        .with_mode(Mode::_0);
    let touch_spi = match Spi::new(p.SPI3, touch_config) {
        Ok(spi) => spi
            .with_sck(p.GPIO4)
            .with_mosi(p.GPIO5)
            .with_miso(p.GPIO6),
        Err(e) => defmt::panic!("Touch SPI config rejected: {:?}", Debug2Format(&e)),
    };
    let touch = CalibratedTouch::new(
        Xpt2046::new(
            touch_spi,
            Output::new(p.GPIO7, Level::High, OutputConfig::default()),
            Input::new(p.GPIO15, InputConfig::default().with_pull(Pull::Up)),
        ),
        calibration,
    );
    info!("Touch panel initialized");

    let controller = DisplayController::new(
        Authenticator::new(credentials.arm_pin.clone()),
        config::RELAY,
    );

    // WiFi: provisioning access point plus home network station
    let radio = match esp_radio::init() {
        Ok(radio) => RADIO.init(radio),
        Err(e) => defmt::panic!("esp-radio init failed: {:?}", Debug2Format(&e)),
    };
    let (wifi, interfaces) =
        match esp_radio::wifi::new(radio, p.WIFI, esp_radio::wifi::Config::default()) {
            Ok(parts) => parts,
            Err(e) => defmt::panic!("WiFi init failed: {:?}", Debug2Format(&e)),
        };

    let ap_config = embassy_net::Config::ipv4_static(StaticConfigV4 {
        address: Ipv4Cidr::new(config::AP_ADDRESS, config::AP_PREFIX_LEN),
        gateway: None,
        dns_servers: heapless::Vec::new(),
    });
    let (ap_stack, ap_runner) = embassy_net::new(
        interfaces.ap,
        ap_config,
        AP_RESOURCES.init(StackResources::new()),
        AP_SEED,
    );
    let (sta_stack, sta_runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        STA_RESOURCES.init(StackResources::new()),
        STA_SEED,
    );
    info!("Network stacks initialized, portal at {}", Display2Format(&config::AP_ADDRESS));

    // Spawn tasks
    spawner.spawn(unwrap!(tasks::net_task(ap_runner)));
    spawner.spawn(unwrap!(tasks::net_task(sta_runner)));
    spawner.spawn(unwrap!(tasks::wifi_task(
        wifi,
        sta_stack,
        credentials.ssid,
        credentials.password,
        ap_password
    )));
    spawner.spawn(unwrap!(tasks::dhcp_task(ap_stack)));
    spawner.spawn(unwrap!(tasks::radio_task(ap_stack, sta_stack)));
    spawner.spawn(unwrap!(tasks::ui_task(screen, touch, controller)));
    spawner.spawn(unwrap!(tasks::http_task(ap_stack)));
    spawner.spawn(unwrap!(tasks::intake_task(store)));
    spawner.spawn(unwrap!(tasks::forward_task(ap_stack)));

    info!("All tasks spawned, display running");

    loop {
        Timer::after_secs(3600).await;
    }
}
