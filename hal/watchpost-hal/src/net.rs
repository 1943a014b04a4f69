//! Datagram transport abstractions

use core::net::Ipv4Addr;

use watchpost_protocol::Endpoint;

/// Errors from datagram operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NetError {
    /// Interface has no address or link yet
    NotReady,
    /// No route to the destination
    NoRoute,
    /// Transmit buffer full; the datagram was not queued
    WouldBlock,
    /// Datagram larger than the socket buffer
    Truncated,
}

/// Non-blocking UDP socket
///
/// Both operations return immediately. Delivery is best effort: a successful
/// `try_send_to` only means the datagram was queued.
pub trait DatagramSocket {
    /// Queue one datagram for `dest`
    fn try_send_to(&mut self, payload: &[u8], dest: Endpoint) -> Result<(), NetError>;

    /// Take at most one received datagram
    ///
    /// Returns `Ok(None)` when nothing is waiting.
    fn try_recv_from(&mut self, buffer: &mut [u8]) -> Result<Option<(usize, Endpoint)>, NetError>;
}

/// IPv4 network given by an address and prefix length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subnet {
    addr: Ipv4Addr,
    prefix_len: u8,
}

impl Subnet {
    pub const fn new(addr: Ipv4Addr, prefix_len: u8) -> Self {
        Self { addr, prefix_len }
    }

    fn mask(&self) -> u32 {
        match self.prefix_len {
            0 => 0,
            n if n >= 32 => u32::MAX,
            n => u32::MAX << (32 - n),
        }
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let mask = self.mask();
        u32::from(ip) & mask == u32::from(self.addr) & mask
    }
}

/// Two sockets behind one [`DatagramSocket`]
///
/// Destinations inside `local` go out the `local` socket and everything
/// else goes out `upstream`. Receives poll `local` first. A receive error
/// on one side never hides a datagram waiting on the other: the error is
/// held back and returned by the next poll.
pub struct SplitSocket<L, U> {
    local: L,
    upstream: U,
    subnet: Subnet,
    held_error: Option<NetError>,
}

impl<L: DatagramSocket, U: DatagramSocket> SplitSocket<L, U> {
    pub fn new(local: L, upstream: U, subnet: Subnet) -> Self {
        Self {
            local,
            upstream,
            subnet,
            held_error: None,
        }
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    pub fn upstream(&self) -> &U {
        &self.upstream
    }
}

impl<L: DatagramSocket, U: DatagramSocket> DatagramSocket for SplitSocket<L, U> {
    fn try_send_to(&mut self, payload: &[u8], dest: Endpoint) -> Result<(), NetError> {
        if self.subnet.contains(dest.ip) {
            self.local.try_send_to(payload, dest)
        } else {
            self.upstream.try_send_to(payload, dest)
        }
    }

    fn try_recv_from(&mut self, buffer: &mut [u8]) -> Result<Option<(usize, Endpoint)>, NetError> {
        if let Some(e) = self.held_error.take() {
            return Err(e);
        }
        let local_error = match self.local.try_recv_from(buffer) {
            Ok(Some(received)) => return Ok(Some(received)),
            Ok(None) => None,
            Err(e) => Some(e),
        };
        match (self.upstream.try_recv_from(buffer), local_error) {
            (Ok(Some(received)), held) => {
                self.held_error = held;
                Ok(Some(received))
            }
            (Ok(None), None) => Ok(None),
            (Ok(None), Some(e)) => Err(e),
            (Err(e), None) => Err(e),
            (Err(upstream), Some(local)) => {
                self.held_error = Some(upstream);
                Err(local)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AP: Subnet = Subnet::new(Ipv4Addr::new(192, 168, 10, 1), 24);

    /// Socket with one scripted receive result and a send counter
    #[derive(Default)]
    struct Scripted {
        recv: Option<Result<(usize, Endpoint), NetError>>,
        sent: usize,
    }

    impl DatagramSocket for Scripted {
        fn try_send_to(&mut self, _payload: &[u8], _dest: Endpoint) -> Result<(), NetError> {
            self.sent += 1;
            Ok(())
        }

        fn try_recv_from(&mut self, _buffer: &mut [u8]) -> Result<Option<(usize, Endpoint)>, NetError> {
            self.recv.take().transpose()
        }
    }

    fn pair(local: Scripted, upstream: Scripted) -> SplitSocket<Scripted, Scripted> {
        SplitSocket::new(local, upstream, AP)
    }

    #[test]
    fn test_subnet_contains() {
        assert!(AP.contains(Ipv4Addr::new(192, 168, 10, 119)));
        assert!(!AP.contains(Ipv4Addr::new(192, 168, 1, 74)));
        assert!(Subnet::new(Ipv4Addr::UNSPECIFIED, 0).contains(Ipv4Addr::new(8, 8, 8, 8)));
    }

    #[test]
    fn test_send_routes_by_subnet() {
        let mut s = pair(Scripted::default(), Scripted::default());
        s.try_send_to(b"idle", Endpoint::node(192, 168, 10, 2)).unwrap();
        s.try_send_to(b"INTRUDER", Endpoint::node(192, 168, 1, 74)).unwrap();
        s.try_send_to(b"INTRUDER", Endpoint::node(192, 168, 1, 69)).unwrap();
        assert_eq!(s.local().sent, 1);
        assert_eq!(s.upstream().sent, 2);
    }

    #[test]
    fn test_local_error_does_not_starve_upstream() {
        let relay = Endpoint::node(192, 168, 1, 74);
        let mut s = pair(
            Scripted {
                recv: Some(Err(NetError::Truncated)),
                ..Default::default()
            },
            Scripted {
                recv: Some(Ok((8, relay))),
                ..Default::default()
            },
        );
        let mut buf = [0u8; 16];
        assert_eq!(s.try_recv_from(&mut buf), Ok(Some((8, relay))));
        assert_eq!(s.try_recv_from(&mut buf), Err(NetError::Truncated));
        assert_eq!(s.try_recv_from(&mut buf), Ok(None));
    }

    #[test]
    fn test_local_error_without_upstream_data() {
        let mut s = pair(
            Scripted {
                recv: Some(Err(NetError::Truncated)),
                ..Default::default()
            },
            Scripted::default(),
        );
        let mut buf = [0u8; 16];
        assert_eq!(s.try_recv_from(&mut buf), Err(NetError::Truncated));
        assert_eq!(s.try_recv_from(&mut buf), Ok(None));
    }

    #[test]
    fn test_local_is_drained_first() {
        let sensor = Endpoint::node(192, 168, 10, 2);
        let relay = Endpoint::node(192, 168, 1, 74);
        let mut s = pair(
            Scripted {
                recv: Some(Ok((4, sensor))),
                ..Default::default()
            },
            Scripted {
                recv: Some(Ok((8, relay))),
                ..Default::default()
            },
        );
        let mut buf = [0u8; 16];
        assert_eq!(s.try_recv_from(&mut buf), Ok(Some((4, sensor))));
        assert_eq!(s.try_recv_from(&mut buf), Ok(Some((8, relay))));
    }
}
