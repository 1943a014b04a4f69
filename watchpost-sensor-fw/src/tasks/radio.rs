//! UDP command and alert task
//!
//! Owns the message channel. Received arm commands are applied to the node
//! and acknowledged to the display; an intrusion signal from the ranging
//! task triggers the alert burst.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::Stack;
use embassy_time::Delay;

use watchpost_core::channel::{MessageChannel, Received};
use watchpost_core::sensor::CommandAction;
use watchpost_hal_esp32::udp::EspUdpSocket;

use crate::channels::{SharedNode, INTRUSION};
use crate::config;

const SOCKET_BUFFER_LEN: usize = 512;

type Channel<'a> = MessageChannel<EspUdpSocket<'a>>;

/// Handle every datagram currently queued
async fn drain(channel: &mut Channel<'_>, node: &SharedNode) {
    loop {
        let received = match channel.receive() {
            Ok(Some(received)) => received,
            Ok(None) => return,
            Err(e) => {
                warn!("Receive failed: {}", e);
                return;
            }
        };

        match received {
            Received::Command { command, from } => {
                debug!("Received {} from {}", command, from);
                let action = node.lock().await.handle_command(command);
                if let CommandAction::Acknowledge { reply, to } = action {
                    info!("Arm command applied, acknowledging {}", reply);
                    if let Err(e) = channel.send_unthrottled(reply, to) {
                        warn!("Acknowledgement to {} failed: {}", to, e);
                    }
                }
            }
            Received::Unrecognized { from, len, error } => {
                warn!("Discarding {} byte datagram from {}: {}", len, from, error);
            }
        }
    }
}

#[embassy_executor::task]
pub async fn radio_task(stack: Stack<'static>, node: &'static SharedNode) {
    info!("Radio task started");

    let mut rx_meta = [PacketMetadata::EMPTY; 8];
    let mut rx_buf = [0u8; SOCKET_BUFFER_LEN];
    let mut tx_meta = [PacketMetadata::EMPTY; 8];
    let mut tx_buf = [0u8; SOCKET_BUFFER_LEN];

    let mut socket = UdpSocket::new(stack, &mut rx_meta, &mut rx_buf, &mut tx_meta, &mut tx_buf);
    if let Err(e) = socket.bind(config::UDP_PORT) {
        error!("UDP bind to port {} failed: {:?}", config::UDP_PORT, e);
        return;
    }

    let mut channel = MessageChannel::new(EspUdpSocket::new(stack, socket));
    let mut delay = Delay;

    loop {
        match select(channel.socket_mut().wait_readable(), INTRUSION.wait()).await {
            Either::First(()) => drain(&mut channel, node).await,
            Either::Second(()) => {
                let report = node.lock().await.raise_alert(&mut channel, &mut delay).await;
                info!(
                    "Intrusion alert sent: {} delivered, {} failed",
                    report.sent, report.failed
                );
                if let Some(e) = report.last_error {
                    warn!("Last alert send error: {}", e);
                }
            }
        }
    }
}
