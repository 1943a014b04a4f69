//! UDP message task
//!
//! Bridges the page controller and the network. One socket per interface:
//! sensors live on the access point subnet, the upstream relay is reached
//! through the station link.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::Stack;
use embassy_time::Instant;

use watchpost_core::channel::{MessageChannel, Received, SendOutcome};
use watchpost_hal_esp32::udp::{ApStaSocket, EspUdpSocket, Subnet};

use crate::channels::{Outgoing, INBOX, OUTBOX};
use crate::config;

const SOCKET_BUFFER_LEN: usize = 512;

type Channel<'a> = MessageChannel<ApStaSocket<'a>>;

fn drain(channel: &mut Channel<'_>) {
    loop {
        match channel.receive() {
            Ok(Some(Received::Command { command, from })) => {
                debug!("Received {} from {}", command, from);
                if INBOX.try_send(command).is_err() {
                    warn!("Inbox full, dropping {} from {}", command, from);
                }
            }
            Ok(Some(Received::Unrecognized { from, len, error })) => {
                warn!("Discarding {} byte datagram from {}: {}", len, from, error);
            }
            Ok(None) => return,
            // The failed datagram is consumed; keep draining the rest
            Err(e) => warn!("Receive failed: {}", e),
        }
    }
}

fn transmit(channel: &mut Channel<'_>, out: Outgoing) {
    let result = if out.throttled {
        channel.send(out.command, out.dest, Instant::now().as_millis())
    } else {
        channel.send_unthrottled(out.command, out.dest).map(|()| SendOutcome::Sent)
    };
    match result {
        Ok(SendOutcome::Sent) => debug!("Sent {} to {}", out.command, out.dest),
        Ok(SendOutcome::Throttled) => debug!("Send to {} throttled", out.dest),
        Err(e) => warn!("Send to {} failed: {}", out.dest, e),
    }
}

#[embassy_executor::task]
pub async fn radio_task(ap_stack: Stack<'static>, sta_stack: Stack<'static>) {
    info!("Radio task started");

    let mut ap_rx_meta = [PacketMetadata::EMPTY; 8];
    let mut ap_rx_buf = [0u8; SOCKET_BUFFER_LEN];
    let mut ap_tx_meta = [PacketMetadata::EMPTY; 8];
    let mut ap_tx_buf = [0u8; SOCKET_BUFFER_LEN];
    let mut sta_rx_meta = [PacketMetadata::EMPTY; 4];
    let mut sta_rx_buf = [0u8; SOCKET_BUFFER_LEN];
    let mut sta_tx_meta = [PacketMetadata::EMPTY; 4];
    let mut sta_tx_buf = [0u8; SOCKET_BUFFER_LEN];

    let mut ap = UdpSocket::new(
        ap_stack,
        &mut ap_rx_meta,
        &mut ap_rx_buf,
        &mut ap_tx_meta,
        &mut ap_tx_buf,
    );
    let mut sta = UdpSocket::new(
        sta_stack,
        &mut sta_rx_meta,
        &mut sta_rx_buf,
        &mut sta_tx_meta,
        &mut sta_tx_buf,
    );
    for socket in [&mut ap, &mut sta] {
        if let Err(e) = socket.bind(config::UDP_PORT) {
            error!("UDP bind to port {} failed: {:?}", config::UDP_PORT, e);
            return;
        }
    }

    let mut channel = MessageChannel::new(ApStaSocket::new(
        EspUdpSocket::new(ap_stack, ap),
        EspUdpSocket::new(sta_stack, sta),
        Subnet::new(config::AP_ADDRESS, config::AP_PREFIX_LEN),
    ));

    loop {
        match select(channel.socket_mut().wait_readable(), OUTBOX.receive()).await {
            Either::First(()) => drain(&mut channel),
            Either::Second(out) => transmit(&mut channel, out),
        }
    }
}
