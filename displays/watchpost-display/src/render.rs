//! Page renderer
//!
//! Draws a complete page from a [`View`] snapshot. Every call repaints the
//! whole screen; pages change rarely and the panel is fast enough.

use core::fmt::Write;
use core::net::Ipv4Addr;

use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use heapless::String;
use watchpost_core::display::layout::{
    Hitbox, ARM_INDICATOR, KEYPAD_COLUMNS, KEYPAD_DELETE, KEYPAD_ENTER, KEYPAD_KEYS, KEYPAD_ROWS,
    SETUP_BUTTON, SETUP_EXIT,
};
use watchpost_core::display::{DisplayController, Page};
use watchpost_core::ArmState;

const BACKGROUND: Rgb565 = Rgb565::BLACK;
const FOREGROUND: Rgb565 = Rgb565::WHITE;
const ARMED: Rgb565 = Rgb565::GREEN;
const ALERT: Rgb565 = Rgb565::RED;
const MUTED: Rgb565 = Rgb565::new(12, 24, 12);

const INDICATOR_RADIUS: u32 = 10;
/// Top-left of the entered PIN (and of the DENIED flash)
const PIN_ORIGIN: Point = Point::new(180, 20);
const INTRUDER_BANNER: Rectangle = Rectangle::new(Point::new(0, 250), Size::new(480, 60));

/// What the Setup page tells the operator
#[derive(Debug, Clone, Copy)]
pub struct SetupInfo<'a> {
    pub ap_ssid: &'a str,
    pub portal: Ipv4Addr,
    pub station_connected: bool,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    pub page: Page,
    pub arm_state: ArmState,
    pub pin: &'a str,
    pub intruder: bool,
    /// DENIED flash active on the DisarmAuth page
    pub denied: bool,
    pub setup: SetupInfo<'a>,
}

impl<'a> View<'a> {
    pub fn of(controller: &'a DisplayController, denied: bool, setup: SetupInfo<'a>) -> Self {
        Self {
            page: controller.page(),
            arm_state: controller.arm_state(),
            pin: controller.pin_entry().as_str(),
            intruder: controller.intruder_alert(),
            denied,
            setup,
        }
    }
}

pub fn render<D>(target: &mut D, view: &View<'_>) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    target.clear(BACKGROUND)?;
    match view.page {
        Page::Home => draw_home(target, view),
        Page::Setup => draw_setup(target, view),
        Page::DisarmAuth => draw_disarm_auth(target, view),
    }
}

fn large(color: Rgb565) -> MonoTextStyle<'static, Rgb565> {
    MonoTextStyle::new(&FONT_10X20, color)
}

fn small(color: Rgb565) -> MonoTextStyle<'static, Rgb565> {
    MonoTextStyle::new(&FONT_6X10, color)
}

fn rect(h: Hitbox) -> Rectangle {
    Rectangle::new(
        Point::new(h.x0 as i32, h.y0 as i32),
        Size::new((h.x1 - h.x0) as u32, (h.y1 - h.y0) as u32),
    )
}

fn text_at<D>(target: &mut D, text: &str, at: Point, color: Rgb565) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    Text::with_baseline(text, at, large(color), Baseline::Top).draw(target)?;
    Ok(())
}

fn text_centred<D>(target: &mut D, text: &str, area: Rectangle, color: Rgb565) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let style = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Middle)
        .build();
    Text::with_text_style(text, area.center(), large(color), style).draw(target)?;
    Ok(())
}

fn draw_home<D>(target: &mut D, view: &View<'_>) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    text_at(target, "Center Interface", Point::zero(), FOREGROUND)?;
    text_at(target, "ARM Motion Detection", Point::new(0, 100), FOREGROUND)?;

    let (cx, cy) = ARM_INDICATOR;
    let indicator = Circle::with_center(Point::new(cx, cy), INDICATOR_RADIUS * 2 + 1);
    if view.arm_state.is_armed() {
        indicator
            .into_styled(PrimitiveStyle::with_fill(ARMED))
            .draw(target)?;
    }
    indicator
        .into_styled(PrimitiveStyle::with_stroke(FOREGROUND, 1))
        .draw(target)?;

    let setup = rect(SETUP_BUTTON);
    text_at(target, "Setup", setup.top_left, FOREGROUND)?;
    let underline = setup.top_left.y + setup.size.height as i32 - 1;
    Line::new(
        Point::new(0, underline),
        Point::new(setup.size.width as i32 - 1, underline),
    )
    .into_styled(PrimitiveStyle::with_stroke(FOREGROUND, 1))
    .draw(target)?;

    if view.intruder {
        INTRUDER_BANNER
            .into_styled(PrimitiveStyle::with_fill(ALERT))
            .draw(target)?;
        text_centred(target, "INTRUDER", INTRUDER_BANNER, FOREGROUND)?;
    }
    Ok(())
}

fn draw_setup<D>(target: &mut D, view: &View<'_>) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    text_at(target, "Exit", rect(SETUP_EXIT).top_left, FOREGROUND)?;
    text_at(target, "Connect to the WIFI", Point::new(0, 60), FOREGROUND)?;
    text_at(target, view.setup.ap_ssid, Point::new(0, 85), FOREGROUND)?;

    let mut portal = String::<32>::new();
    // 25 bytes at most, cannot overflow
    let _ = write!(portal, "Go to {}", view.setup.portal);
    text_at(target, &portal, Point::new(0, 110), FOREGROUND)?;

    let (status, color) = if view.setup.station_connected {
        ("Home WiFi: connected", ARMED)
    } else {
        ("Home WiFi: not connected", MUTED)
    };
    Text::with_baseline(status, Point::new(0, 160), small(color), Baseline::Top).draw(target)?;
    Ok(())
}

fn draw_disarm_auth<D>(target: &mut D, view: &View<'_>) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    if view.denied {
        text_at(target, "DENIED", PIN_ORIGIN, ALERT)?;
    } else {
        text_at(target, view.pin, PIN_ORIGIN, FOREGROUND)?;
    }

    for (r, &(y0, y1)) in KEYPAD_ROWS.iter().enumerate() {
        for (c, &(x0, x1)) in KEYPAD_COLUMNS.iter().enumerate() {
            let cell = rect(Hitbox::new(x0, y0, x1, y1));
            cell.into_styled(PrimitiveStyle::with_stroke(MUTED, 1))
                .draw(target)?;
            let mut label = [0u8; 4];
            let label = KEYPAD_KEYS[r][c].encode_utf8(&mut label);
            text_centred(target, label, cell, FOREGROUND)?;
        }
    }

    text_centred(target, "<-", rect(KEYPAD_DELETE), FOREGROUND)?;
    let enter = rect(KEYPAD_ENTER);
    enter
        .into_styled(PrimitiveStyle::with_stroke(MUTED, 1))
        .draw(target)?;
    let style = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Middle)
        .build();
    // Enter column is too narrow for the large font
    Text::with_text_style("ENTER", enter.center(), small(FOREGROUND), style).draw(target)?;
    Ok(())
}
