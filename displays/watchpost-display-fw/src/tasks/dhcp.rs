//! DHCP server for the provisioning access point

use core::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use defmt::*;
use edge_dhcp::io::{self, DEFAULT_SERVER_PORT};
use edge_dhcp::server::{Server, ServerOptions};
use edge_nal::UdpBind;
use edge_nal_embassy::{Udp, UdpBuffers};
use embassy_net::{Ipv4Cidr, Stack};
use embassy_time::Timer;

use watchpost_core::provision::dhcp::{lease_range, LEASE_SECS, POOL_SIZE};

use crate::config;

/// Largest DHCP message handled
const PACKET_LEN: usize = 1500;

/// Pause before restarting the server after a socket error
const RESTART_DELAY_MS: u64 = 500;

#[embassy_executor::task]
pub async fn dhcp_task(stack: Stack<'static>) {
    info!("DHCP task started");

    let buffers = UdpBuffers::<1, PACKET_LEN, PACKET_LEN, 4>::new();
    let udp = Udp::new(stack, &buffers);
    let bind_addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, DEFAULT_SERVER_PORT));
    let mut socket = match udp.bind(bind_addr).await {
        Ok(socket) => socket,
        Err(e) => {
            error!("DHCP bind failed: {:?}", Debug2Format(&e));
            return;
        }
    };

    let (first, last) = lease_range(config::AP_ADDRESS);
    let mut server = Server::<_, POOL_SIZE>::new_with_et(config::AP_ADDRESS);
    server.range_start = first;
    server.range_end = last;

    let netmask = Ipv4Cidr::new(config::AP_ADDRESS, config::AP_PREFIX_LEN).netmask();
    let mut gateways = [config::AP_ADDRESS];
    let mut options = ServerOptions::new(config::AP_ADDRESS, Some(&mut gateways));
    options.subnet = Some(netmask);
    options.lease_duration_secs = LEASE_SECS;

    let mut buf = [0u8; PACKET_LEN];

    info!(
        "Leasing {} to {}",
        Display2Format(&first),
        Display2Format(&last)
    );

    loop {
        if let Err(e) = io::server::run(&mut server, &options, &mut socket, &mut buf).await {
            warn!("DHCP server stopped: {:?}", Debug2Format(&e));
        }
        Timer::after_millis(RESTART_DELAY_MS).await;
    }
}
