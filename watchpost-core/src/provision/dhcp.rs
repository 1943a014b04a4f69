//! Lease policy for the provisioning access point
//!
//! The DHCP exchange itself is handled by `edge-dhcp` in the display
//! firmware; this module only fixes which addresses it may hand out.

use core::net::Ipv4Addr;

/// First leased address is `.POOL_START`
pub const POOL_START: u8 = 100;
pub const POOL_SIZE: usize = 20;
pub const LEASE_SECS: u32 = 7200;

/// First and last address leased on the server's /24
pub fn lease_range(server: Ipv4Addr) -> (Ipv4Addr, Ipv4Addr) {
    let [a, b, c, _] = server.octets();
    let last = POOL_START + (POOL_SIZE as u8 - 1);
    (Ipv4Addr::new(a, b, c, POOL_START), Ipv4Addr::new(a, b, c, last))
}
